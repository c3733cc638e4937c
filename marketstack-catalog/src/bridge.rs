//! Best-effort change logging into the relational mirror.
//!
//! Nothing here fails the caller. Mirror errors are logged with `warn!` and
//! reported through return values (`false`, `None`, empty lists) so that a
//! flat-file mutation always goes ahead.

use marketstack_audit::CatalogMirror;
use marketstack_model::{validate, ProductRecord};
use marketstack_types::{ActorId, ChangeLogEntry, ChangeTimestamp, ProductField, ProductId};
use std::sync::{Arc, Mutex, PoisonError};
use tracing::{debug, warn};

/// Routes product changes to an optional [`CatalogMirror`].
#[derive(Clone, Default)]
pub struct AuditBridge {
    mirror: Option<Arc<dyn CatalogMirror>>,
    /// Last timestamp handed out; shared by clones.
    clock: Arc<Mutex<Option<ChangeTimestamp>>>,
}

impl AuditBridge {
    pub fn new(mirror: Arc<dyn CatalogMirror>) -> Self {
        Self {
            mirror: Some(mirror),
            clock: Arc::default(),
        }
    }

    /// A timestamp strictly after every one this bridge issued before.
    fn next_timestamp(&self) -> ChangeTimestamp {
        let mut last = self.clock.lock().unwrap_or_else(PoisonError::into_inner);
        let next = match *last {
            Some(prev) => prev.tick(),
            None => ChangeTimestamp::now(),
        };
        *last = Some(next);
        next
    }

    /// A bridge that drops everything.
    #[must_use]
    pub fn disabled() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.mirror.is_some()
    }

    /// Upserts `record` and returns its handle.
    pub fn mirror_product(&self, record: &ProductRecord) -> Option<ProductId> {
        let mirror = self.mirror.as_ref()?;
        match mirror.upsert_product(record) {
            Ok(id) => Some(id),
            Err(e) => {
                warn!(
                    "Failed to mirror product {} in {}: {}",
                    record.name, record.store_name, e
                );
                None
            }
        }
    }

    /// Looks up the handle for a product, mirroring it first if needed.
    pub fn resolve(&self, record: &ProductRecord) -> Option<ProductId> {
        let mirror = self.mirror.as_ref()?;
        match mirror.product_id_for(&record.name, &record.store_name) {
            Ok(Some(id)) => Some(id),
            Ok(None) => self.mirror_product(record),
            Err(e) => {
                warn!("Failed to look up product {} in mirror: {}", record.name, e);
                None
            }
        }
    }

    /// Appends one change-log entry. Returns whether it was stored.
    pub fn log_change(
        &self,
        product: &ProductId,
        actor: &ActorId,
        field: ProductField,
        old_value: &str,
        new_value: &str,
    ) -> bool {
        let entry = ChangeLogEntry::new(*product, actor.clone(), field, old_value, new_value)
            .with_timestamp(self.next_timestamp());
        self.log_entry(&entry)
    }

    /// Appends a pre-built entry. Returns whether it was stored.
    pub fn log_entry(&self, entry: &ChangeLogEntry) -> bool {
        let Some(mirror) = &self.mirror else {
            return false;
        };
        match mirror.record_change(entry) {
            Ok(()) => true,
            Err(e) => {
                warn!(
                    "Failed to record {} change for product {}: {}",
                    entry.field, entry.product_id, e
                );
                false
            }
        }
    }

    /// Write-ahead half of an edit: refreshes the mirrored row and records
    /// one entry per changed field. Returns the number of entries stored.
    ///
    /// Entries carry strictly increasing timestamps, across edits as well as
    /// within one, in [`ProductField::ALL`] order.
    pub fn record_edit(
        &self,
        old: &ProductRecord,
        new: &ProductRecord,
        actor: &ActorId,
        reason: Option<&str>,
    ) -> usize {
        let changes = old.diff(new);
        if changes.is_empty() || self.mirror.is_none() {
            return 0;
        }
        let Some(id) = self.resolve(old) else {
            return 0;
        };
        if let Some(mirror) = &self.mirror {
            if let Err(e) = mirror.update_product(&id, new) {
                warn!("Failed to update mirrored product {}: {}", id, e);
            }
        }

        let reason = reason.and_then(validate::change_reason);
        let mut stored = 0;
        for change in changes {
            let mut entry = ChangeLogEntry::new(
                id,
                actor.clone(),
                change.field,
                change.old_value,
                change.new_value,
            )
            .with_timestamp(self.next_timestamp());
            if let Some(reason) = &reason {
                entry = entry.with_reason(reason.as_str());
            }
            if self.log_entry(&entry) {
                stored += 1;
            }
        }
        debug!("Recorded {} field changes for product {}", stored, id);
        stored
    }

    /// Changes for one product, most recent first.
    pub fn history(&self, product: &ProductId) -> Vec<ChangeLogEntry> {
        self.query("history", |m| m.history(product))
    }

    /// Changes for the product mirrored under `name` in `store_name`.
    pub fn history_for(&self, name: &str, store_name: &str) -> Vec<ChangeLogEntry> {
        let Some(mirror) = &self.mirror else {
            return Vec::new();
        };
        match mirror.product_id_for(name, store_name) {
            Ok(Some(id)) => self.history(&id),
            Ok(None) => Vec::new(),
            Err(e) => {
                warn!("Failed to look up product {} in mirror: {}", name, e);
                Vec::new()
            }
        }
    }

    /// Changes made by `actor`, most recent first.
    pub fn changes_by_actor(&self, actor: &ActorId) -> Vec<ChangeLogEntry> {
        self.query("actor history", |m| m.changes_by_actor(actor))
    }

    /// The whole change log, most recent first.
    pub fn all_changes(&self) -> Vec<ChangeLogEntry> {
        self.query("change log", |m| m.all_changes())
    }

    fn query<F>(&self, what: &str, f: F) -> Vec<ChangeLogEntry>
    where
        F: FnOnce(&dyn CatalogMirror) -> marketstack_audit::MirrorResult<Vec<ChangeLogEntry>>,
    {
        let Some(mirror) = &self.mirror else {
            return Vec::new();
        };
        f(mirror.as_ref()).unwrap_or_else(|e| {
            warn!("Failed to read {} from mirror: {}", what, e);
            Vec::new()
        })
    }
}

impl std::fmt::Debug for AuditBridge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuditBridge")
            .field("enabled", &self.is_enabled())
            .finish()
    }
}
