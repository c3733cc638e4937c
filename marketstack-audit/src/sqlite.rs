//! SQLite-backed mirror.
//!
//! Uses its own database file so audit data stays separate from the flat
//! catalog. Two tables: `products` (one row per mirrored product) and
//! `change_log` (append-only).

use crate::{CatalogMirror, MirrorError, MirrorResult};
use marketstack_model::{Price, ProductRecord};
use marketstack_types::{
    ActorId, Category, ChangeId, ChangeLogEntry, ChangeTimestamp, ProductField, ProductId,
};
use rusqlite::{params, params_from_iter, Connection, OptionalExtension};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::debug;

const CHANGE_COLUMNS: &str =
    "id, product_id, actor_id, field, old_value, new_value, reason, wall_time, logical";

/// The log is append-only, so insertion order is recency order. Timestamps
/// from separate writers can tie or run backwards; `seq` cannot.
const NEWEST_FIRST: &str = "ORDER BY seq DESC";

type ChangeRow = (
    String,
    String,
    String,
    String,
    String,
    String,
    Option<String>,
    i64,
    i64,
);

/// Persistent mirror backed by SQLite.
#[derive(Clone)]
pub struct SqliteMirror {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteMirror {
    /// Opens (or creates) a mirror database at the given path.
    pub fn open(path: &Path) -> MirrorResult<Self> {
        let conn = Connection::open(path).map_err(|e| {
            MirrorError::Storage(format!("failed to open mirror {}: {e}", path.display()))
        })?;
        debug!("Opened mirror at {}", path.display());
        Self::with_connection(conn)
    }

    /// Opens an in-memory mirror.
    pub fn open_in_memory() -> MirrorResult<Self> {
        let conn = Connection::open_in_memory()
            .map_err(|e| MirrorError::Storage(format!("failed to open in-memory mirror: {e}")))?;
        Self::with_connection(conn)
    }

    fn with_connection(conn: Connection) -> MirrorResult<Self> {
        let mirror = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        mirror.init_schema()?;
        Ok(mirror)
    }

    fn lock(&self) -> MirrorResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| MirrorError::Storage("mirror connection lock poisoned".to_string()))
    }

    fn init_schema(&self) -> MirrorResult<()> {
        let conn = self.lock()?;
        conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS products (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                store_name TEXT NOT NULL,
                store_key TEXT NOT NULL,
                quantity INTEGER NOT NULL,
                price_cents INTEGER NOT NULL,
                description TEXT NOT NULL,
                category TEXT NOT NULL,
                UNIQUE(name, store_key)
            );

            CREATE TABLE IF NOT EXISTS change_log (
                seq INTEGER PRIMARY KEY AUTOINCREMENT,
                id TEXT NOT NULL UNIQUE,
                product_id TEXT NOT NULL,
                actor_id TEXT NOT NULL,
                field TEXT NOT NULL,
                old_value TEXT NOT NULL,
                new_value TEXT NOT NULL,
                reason TEXT,
                wall_time INTEGER NOT NULL,
                logical INTEGER NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_change_log_product ON change_log(product_id);
            CREATE INDEX IF NOT EXISTS idx_change_log_actor ON change_log(actor_id);
            ",
        )
        .map_err(|e| MirrorError::Storage(format!("failed to init mirror schema: {e}")))?;
        Ok(())
    }

    // ── Products ─────────────────────────────────────────────────

    /// Loads the mirrored copy of a product.
    pub fn product(&self, id: &ProductId) -> MirrorResult<Option<ProductRecord>> {
        let conn = self.lock()?;
        let row = conn
            .query_row(
                "SELECT name, quantity, price_cents, description, store_name, category
                 FROM products WHERE id = ?1",
                params![id.to_string()],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, i64>(1)?,
                        row.get::<_, i64>(2)?,
                        row.get::<_, String>(3)?,
                        row.get::<_, String>(4)?,
                        row.get::<_, String>(5)?,
                    ))
                },
            )
            .optional()?;

        let Some((name, quantity, cents, description, store_name, category)) = row else {
            return Ok(None);
        };
        let quantity = u32::try_from(quantity)
            .map_err(|_| MirrorError::Storage(format!("invalid quantity in mirror: {quantity}")))?;
        let price = u64::try_from(cents)
            .ok()
            .and_then(|c| Price::from_cents(c).ok())
            .ok_or_else(|| MirrorError::Storage(format!("invalid price in mirror: {cents}")))?;
        let category = Category::from_tag(&category)
            .ok_or_else(|| MirrorError::Storage(format!("invalid category in mirror: {category}")))?;
        Ok(Some(ProductRecord::new(
            name,
            quantity,
            price,
            description,
            store_name,
            category,
        )))
    }

    /// Number of mirrored products.
    pub fn product_count(&self) -> MirrorResult<usize> {
        let conn = self.lock()?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM products", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    /// Number of change-log entries.
    pub fn change_count(&self) -> MirrorResult<usize> {
        let conn = self.lock()?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM change_log", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    // ── Change log ───────────────────────────────────────────────

    fn query_changes(&self, filter: Option<(&str, String)>) -> MirrorResult<Vec<ChangeLogEntry>> {
        let conn = self.lock()?;
        let (sql, args) = match filter {
            Some((column, value)) => (
                format!("SELECT {CHANGE_COLUMNS} FROM change_log WHERE {column} = ?1 {NEWEST_FIRST}"),
                vec![value],
            ),
            None => (
                format!("SELECT {CHANGE_COLUMNS} FROM change_log {NEWEST_FIRST}"),
                Vec::new(),
            ),
        };
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(params_from_iter(args.iter()), |row| {
            let change: ChangeRow = (
                row.get(0)?,
                row.get(1)?,
                row.get(2)?,
                row.get(3)?,
                row.get(4)?,
                row.get(5)?,
                row.get(6)?,
                row.get(7)?,
                row.get(8)?,
            );
            Ok(change)
        })?;

        let mut entries = Vec::new();
        for row in rows {
            entries.push(entry_from_row(row?)?);
        }
        Ok(entries)
    }
}

fn entry_from_row(row: ChangeRow) -> MirrorResult<ChangeLogEntry> {
    let (id, product_id, actor_id, field, old_value, new_value, reason, wall_time, logical) = row;
    let id: ChangeId = id
        .parse()
        .map_err(|e| MirrorError::Storage(format!("invalid change id in mirror: {e}")))?;
    let product_id: ProductId = product_id
        .parse()
        .map_err(|e| MirrorError::Storage(format!("invalid product id in mirror: {e}")))?;
    let field: ProductField = field
        .parse()
        .map_err(|e| MirrorError::Storage(format!("invalid field in mirror: {e}")))?;
    let wall_time = u64::try_from(wall_time)
        .map_err(|_| MirrorError::Storage(format!("invalid wall time in mirror: {wall_time}")))?;
    let logical = u32::try_from(logical)
        .map_err(|_| MirrorError::Storage(format!("invalid logical clock in mirror: {logical}")))?;

    Ok(ChangeLogEntry {
        id,
        product_id,
        actor_id: ActorId::new(actor_id),
        field,
        old_value,
        new_value,
        reason,
        timestamp: ChangeTimestamp::new(wall_time, logical),
    })
}

fn store_key(store_name: &str) -> String {
    store_name.trim().to_ascii_lowercase()
}

impl CatalogMirror for SqliteMirror {
    fn upsert_product(&self, record: &ProductRecord) -> MirrorResult<ProductId> {
        let conn = self.lock()?;
        let key = store_key(&record.store_name);
        conn.execute(
            "INSERT INTO products
                (id, name, store_name, store_key, quantity, price_cents, description, category)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
             ON CONFLICT(name, store_key) DO UPDATE SET
                store_name = excluded.store_name,
                quantity = excluded.quantity,
                price_cents = excluded.price_cents,
                description = excluded.description,
                category = excluded.category",
            params![
                ProductId::new().to_string(),
                record.name,
                record.store_name,
                key,
                i64::from(record.quantity),
                record.price.cents() as i64,
                record.description,
                record.category.as_tag(),
            ],
        )?;
        let id: String = conn.query_row(
            "SELECT id FROM products WHERE name = ?1 AND store_key = ?2",
            params![record.name, key],
            |row| row.get(0),
        )?;
        id.parse()
            .map_err(|e| MirrorError::Storage(format!("invalid product id in mirror: {e}")))
    }

    fn update_product(&self, id: &ProductId, record: &ProductRecord) -> MirrorResult<()> {
        let conn = self.lock()?;
        let updated = conn.execute(
            "UPDATE products SET
                name = ?2, store_name = ?3, store_key = ?4, quantity = ?5,
                price_cents = ?6, description = ?7, category = ?8
             WHERE id = ?1",
            params![
                id.to_string(),
                record.name,
                record.store_name,
                store_key(&record.store_name),
                i64::from(record.quantity),
                record.price.cents() as i64,
                record.description,
                record.category.as_tag(),
            ],
        )?;
        if updated == 0 {
            return Err(MirrorError::NotFound(id.to_string()));
        }
        Ok(())
    }

    fn product_id_for(&self, name: &str, store_name: &str) -> MirrorResult<Option<ProductId>> {
        let conn = self.lock()?;
        let id: Option<String> = conn
            .query_row(
                "SELECT id FROM products WHERE name = ?1 AND store_key = ?2",
                params![name.trim(), store_key(store_name)],
                |row| row.get(0),
            )
            .optional()?;
        id.map(|s| {
            s.parse()
                .map_err(|e| MirrorError::Storage(format!("invalid product id in mirror: {e}")))
        })
        .transpose()
    }

    fn record_change(&self, entry: &ChangeLogEntry) -> MirrorResult<()> {
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO change_log
                (id, product_id, actor_id, field, old_value, new_value, reason, wall_time, logical)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                entry.id.to_string(),
                entry.product_id.to_string(),
                entry.actor_id.as_str(),
                entry.field.as_str(),
                entry.old_value,
                entry.new_value,
                entry.reason,
                entry.timestamp.wall_time() as i64,
                i64::from(entry.timestamp.logical()),
            ],
        )?;
        Ok(())
    }

    fn history(&self, id: &ProductId) -> MirrorResult<Vec<ChangeLogEntry>> {
        self.query_changes(Some(("product_id", id.to_string())))
    }

    fn changes_by_actor(&self, actor: &ActorId) -> MirrorResult<Vec<ChangeLogEntry>> {
        self.query_changes(Some(("actor_id", actor.as_str().to_string())))
    }

    fn all_changes(&self) -> MirrorResult<Vec<ChangeLogEntry>> {
        self.query_changes(None)
    }
}
