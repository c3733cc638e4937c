//! The in-memory catalog and its mutations.
//!
//! Every mutation follows the same order: validate, change memory, log
//! field changes to the mirror (edits only), then commit the affected line
//! through the [`LedgerWriter`]. Validation failures leave both memory and
//! file untouched. A failed commit leaves memory ahead of the file; the
//! error is returned and logged, the memory change is kept. Stores whose
//! line is ambiguous on disk are refused before memory is touched.

use crate::bridge::AuditBridge;
use crate::codec;
use crate::config::CatalogConfig;
use crate::ledger::LedgerWriter;
use crate::migration;
use crate::search::{self, SearchCriteria};
use crate::{file, CatalogError, CatalogResult};
use marketstack_audit::CatalogMirror;
use marketstack_model::{
    validate, ProductDraft, ProductKey, ProductRecord, SellerRecord, StoreRecord,
};
use marketstack_types::{ActorId, Category, ChangeLogEntry};
use serde::Serialize;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Outcome of [`CatalogStore::sync_mirror`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct MirrorSyncReport {
    pub synced: usize,
    pub failed: usize,
}

/// Returns the seller with identifier `id`, appending it if absent.
pub fn find_or_create_seller<'a>(
    sellers: &'a mut Vec<SellerRecord>,
    id: &str,
) -> &'a mut SellerRecord {
    let id = id.trim();
    let idx = match sellers.iter().position(|s| s.id() == id) {
        Some(idx) => idx,
        None => {
            sellers.push(SellerRecord::new(id));
            sellers.len() - 1
        }
    };
    &mut sellers[idx]
}

/// Builds the seller graph from catalog lines.
///
/// Sellers are merged by identifier and stores by name, ignoring case.
/// Products take their store's name. A product repeated within a store is
/// kept once.
#[must_use]
pub fn build_catalog<S: AsRef<str>>(lines: &[S]) -> Vec<SellerRecord> {
    let mut sellers = Vec::new();
    for line in lines {
        let line = line.as_ref();
        let Some(header) = codec::header(line) else {
            continue;
        };
        let seller = find_or_create_seller(&mut sellers, &header.seller);
        let Some(store_name) = header.store else {
            continue;
        };
        let store = seller.find_or_create_store(&store_name);
        for mut product in codec::decode_line(line) {
            product.store_name = store.name().to_string();
            let name = product.name.clone();
            if !store.add_product(product) {
                debug!("Dropping duplicate product {} in store {}", name, store.name());
            }
        }
    }
    sellers
}

/// Reads, migrates and decodes the catalog at `path`.
///
/// A missing file is an empty catalog. Legacy lines are upgraded on disk
/// before decoding.
pub fn load_all(path: &Path) -> CatalogResult<Vec<SellerRecord>> {
    let (lines, report) = migration::migrate_file(path)?;
    if report.failed > 0 || report.flagged > 0 {
        warn!(
            "Catalog {} has {} unmigratable and {} ambiguous lines",
            path.display(),
            report.failed,
            report.flagged
        );
    }
    Ok(build_catalog(&lines))
}

/// A loaded catalog bound to its file and optional mirror.
#[derive(Debug)]
pub struct CatalogStore {
    config: CatalogConfig,
    sellers: Vec<SellerRecord>,
    ledger: LedgerWriter,
    bridge: AuditBridge,
}

impl CatalogStore {
    /// Opens the catalog described by `config`.
    ///
    /// Copies the legacy catalog into place when configured and the catalog
    /// is missing, creates an empty file when allowed, and opens the mirror.
    /// A mirror that cannot be opened is logged and left out.
    pub fn open(config: CatalogConfig) -> CatalogResult<Self> {
        let bridge = match config.open_mirror() {
            Ok(Some(mirror)) => AuditBridge::new(Arc::new(mirror)),
            Ok(None) => AuditBridge::disabled(),
            Err(e) => {
                warn!("Continuing without mirror: {}", e);
                AuditBridge::disabled()
            }
        };
        Self::open_with_bridge(config, bridge)
    }

    /// Opens the catalog with an explicit mirror, ignoring `config.mirror_path`.
    pub fn with_mirror(
        config: CatalogConfig,
        mirror: Arc<dyn CatalogMirror>,
    ) -> CatalogResult<Self> {
        Self::open_with_bridge(config, AuditBridge::new(mirror))
    }

    fn open_with_bridge(config: CatalogConfig, bridge: AuditBridge) -> CatalogResult<Self> {
        let path = config.catalog_path.clone();
        if let Some(legacy) = &config.legacy_catalog_path {
            match file::copy_if_missing(legacy, &path) {
                Ok(true) => info!(
                    "Copied legacy catalog {} to {}",
                    legacy.display(),
                    path.display()
                ),
                Ok(false) => {}
                Err(e) => warn!("Failed to copy legacy catalog {}: {}", legacy.display(), e),
            }
        }
        if config.create_if_missing && file::ensure_exists(&path)? {
            info!("Created empty catalog at {}", path.display());
        }

        let sellers = load_all(&path)?;
        debug!("Loaded {} sellers from {}", sellers.len(), path.display());
        Ok(Self {
            ledger: LedgerWriter::new(path),
            config,
            sellers,
            bridge,
        })
    }

    /// Re-reads the file, discarding in-memory state.
    pub fn reload(&mut self) -> CatalogResult<()> {
        self.sellers = load_all(self.ledger.path())?;
        Ok(())
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        self.ledger.path()
    }

    #[must_use]
    pub fn config(&self) -> &CatalogConfig {
        &self.config
    }

    #[must_use]
    pub fn bridge(&self) -> &AuditBridge {
        &self.bridge
    }

    /// Every seller except the sentinel, in load order.
    pub fn sellers(&self) -> impl Iterator<Item = &SellerRecord> {
        self.sellers.iter().filter(|s| !s.is_sentinel())
    }

    #[must_use]
    pub fn seller(&self, id: &str) -> Option<&SellerRecord> {
        let id = id.trim();
        self.sellers.iter().find(|s| s.id() == id)
    }

    #[must_use]
    pub fn store(&self, seller_id: &str, store_name: &str) -> Option<&StoreRecord> {
        self.seller(seller_id)?.store(store_name)
    }

    /// Mutable access for collaborators that adjust stock before calling
    /// [`persist_all`](Self::persist_all).
    pub fn store_mut(&mut self, seller_id: &str, store_name: &str) -> Option<&mut StoreRecord> {
        let seller_id = seller_id.trim();
        self.sellers
            .iter_mut()
            .find(|s| s.id() == seller_id)?
            .store_mut(store_name)
    }

    /// In-memory upsert of a seller. Nothing is written.
    pub fn find_or_create_seller(&mut self, id: &str) -> CatalogResult<&mut SellerRecord> {
        validate::seller_id(id)?;
        Ok(find_or_create_seller(&mut self.sellers, id))
    }

    /// In-memory upsert of a store for an existing seller. Nothing is written.
    pub fn find_or_create_store(
        &mut self,
        seller_id: &str,
        store_name: &str,
    ) -> CatalogResult<&mut StoreRecord> {
        validate::store_name(store_name)?;
        Ok(self.seller_mut(seller_id)?.find_or_create_store(store_name))
    }

    fn seller_mut(&mut self, id: &str) -> CatalogResult<&mut SellerRecord> {
        let id = id.trim();
        self.sellers
            .iter_mut()
            .find(|s| s.id() == id && !s.is_sentinel())
            .ok_or_else(|| CatalogError::UnknownSeller(id.to_string()))
    }

    fn store_entry(
        &mut self,
        seller_id: &str,
        store_name: &str,
    ) -> CatalogResult<&mut StoreRecord> {
        let seller = self.seller_mut(seller_id)?;
        let seller_name = seller.id().to_string();
        seller
            .store_mut(store_name)
            .ok_or_else(|| CatalogError::UnknownStore {
                seller: seller_name,
                store: store_name.trim().to_string(),
            })
    }

    fn commit(&self, seller_id: &str, store_name: &str) -> CatalogResult<()> {
        let Some(store) = self.store(seller_id, store_name) else {
            return Err(CatalogError::UnknownStore {
                seller: seller_id.to_string(),
                store: store_name.to_string(),
            });
        };
        if let Err(e) = self.ledger.commit(seller_id.trim(), store) {
            warn!(
                "Catalog file not updated for {}/{}; memory is ahead of disk: {}",
                seller_id,
                store.name(),
                e
            );
            return Err(e);
        }
        Ok(())
    }

    // ── Mutations ────────────────────────────────────────────────

    /// Registers a seller and writes a seller-only line for it.
    /// Returns `false` when the seller already existed.
    pub fn add_seller(&mut self, id: &str) -> CatalogResult<bool> {
        validate::seller_id(id)?;
        if self.seller(id).is_some() {
            return Ok(false);
        }
        find_or_create_seller(&mut self.sellers, id);
        if let Err(e) = self.ledger.register_seller(id) {
            warn!("Catalog file not updated for seller {}: {}", id.trim(), e);
            return Err(e);
        }
        Ok(true)
    }

    /// Opens a new, empty store for an existing seller.
    pub fn add_store(&mut self, seller_id: &str, store_name: &str) -> CatalogResult<()> {
        validate::store_name(store_name)?;
        let seller = self.seller_mut(seller_id)?;
        if seller.has_store(store_name) {
            return Err(CatalogError::DuplicateStore {
                seller: seller.id().to_string(),
                store: store_name.trim().to_string(),
            });
        }
        seller.find_or_create_store(store_name);
        self.commit(seller_id, store_name)
    }

    /// Adds a product to a store and mirrors it.
    pub fn add_product(
        &mut self,
        seller_id: &str,
        store_name: &str,
        draft: ProductDraft,
    ) -> CatalogResult<ProductRecord> {
        self.ledger.ensure_replaceable(seller_id, store_name)?;
        let store = self.store_entry(seller_id, store_name)?;
        let record = draft.into_record(store.name())?;
        if !store.add_product(record.clone()) {
            return Err(CatalogError::DuplicateProduct {
                store: store.name().to_string(),
                name: record.name,
            });
        }
        self.bridge.mirror_product(&record);
        self.commit(seller_id, store_name)?;
        Ok(record)
    }

    /// Removes the product identified by `key` from a store.
    pub fn remove_product(
        &mut self,
        seller_id: &str,
        store_name: &str,
        key: &ProductKey,
    ) -> CatalogResult<ProductRecord> {
        self.ledger.ensure_replaceable(seller_id, store_name)?;
        let store = self.store_entry(seller_id, store_name)?;
        let removed = store
            .remove_product(key)
            .ok_or_else(|| CatalogError::ProductNotFound {
                store: store.name().to_string(),
                name: key.name.clone(),
            })?;
        self.commit(seller_id, store_name)?;
        Ok(removed)
    }

    /// Replaces the product identified by `key` with `draft`.
    ///
    /// Each changed field is logged to the mirror, attributed to `actor`,
    /// before the file is rewritten. The product keeps its position.
    pub fn edit_product(
        &mut self,
        seller_id: &str,
        store_name: &str,
        key: &ProductKey,
        draft: ProductDraft,
        actor: &ActorId,
        reason: Option<&str>,
    ) -> CatalogResult<ProductRecord> {
        self.ledger.ensure_replaceable(seller_id, store_name)?;
        let store = self.store_entry(seller_id, store_name)?;
        let Some(old) = store.get(key).cloned() else {
            return Err(CatalogError::ProductNotFound {
                store: store.name().to_string(),
                name: key.name.clone(),
            });
        };
        let updated = draft.into_record(store.name())?;
        if updated.key() != old.key() && store.contains(&updated.key()) {
            return Err(CatalogError::DuplicateProduct {
                store: store.name().to_string(),
                name: updated.name,
            });
        }

        store.replace_product(key, updated.clone());
        self.bridge.record_edit(&old, &updated, actor, reason);
        self.commit(seller_id, store_name)?;
        Ok(updated)
    }

    // ── Queries ──────────────────────────────────────────────────

    #[must_use]
    pub fn search(&self, criteria: &SearchCriteria) -> Vec<&ProductRecord> {
        search::search(&self.sellers, criteria)
    }

    /// Categories that have at least one product, in first-seen order.
    #[must_use]
    pub fn available_categories(&self) -> Vec<Category> {
        let mut seen = Vec::new();
        for product in self.search(&SearchCriteria::default()) {
            if !seen.contains(&product.category) {
                seen.push(product.category);
            }
        }
        seen
    }

    /// Change history of the product named `name` in `store_name`, most
    /// recent first. Empty without a mirror.
    #[must_use]
    pub fn history(&self, name: &str, store_name: &str) -> Vec<ChangeLogEntry> {
        self.bridge.history_for(name, store_name)
    }

    #[must_use]
    pub fn changes_by_actor(&self, actor: &ActorId) -> Vec<ChangeLogEntry> {
        self.bridge.changes_by_actor(actor)
    }

    #[must_use]
    pub fn all_changes(&self) -> Vec<ChangeLogEntry> {
        self.bridge.all_changes()
    }

    // ── Bulk ─────────────────────────────────────────────────────

    /// Rewrites the whole file from memory, one line per store and one per
    /// store-less seller. The sentinel seller is not written. Refused while
    /// the file holds an ambiguous line.
    pub fn persist_all(&self) -> CatalogResult<()> {
        let lines: Vec<String> = self.sellers().flat_map(codec::encode_seller).collect();
        self.ledger.rewrite_all(&lines)?;
        info!(
            "Persisted {} catalog lines to {}",
            lines.len(),
            self.path().display()
        );
        Ok(())
    }

    /// Upserts every product into the mirror.
    pub fn sync_mirror(&self) -> MirrorSyncReport {
        let mut report = MirrorSyncReport::default();
        if !self.bridge.is_enabled() {
            warn!("No mirror configured; nothing to sync");
            return report;
        }
        for product in self.search(&SearchCriteria::default()) {
            match self.bridge.mirror_product(product) {
                Some(_) => report.synced += 1,
                None => report.failed += 1,
            }
        }
        info!("Mirror sync: {} synced, {} failed", report.synced, report.failed);
        report
    }
}
