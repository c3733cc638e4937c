use crate::StoreRecord;
use serde::{Deserialize, Serialize};

/// A seller and the stores they run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SellerRecord {
    id: String,
    stores: Vec<StoreRecord>,
}

impl SellerRecord {
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        let id: String = id.into();
        Self {
            id: id.trim().to_string(),
            stores: Vec::new(),
        }
    }

    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// The empty-identifier seller a catalog file can produce. Tolerated,
    /// never listed.
    #[must_use]
    pub fn is_sentinel(&self) -> bool {
        self.id.is_empty()
    }

    #[must_use]
    pub fn stores(&self) -> &[StoreRecord] {
        &self.stores
    }

    #[must_use]
    pub fn store(&self, name: &str) -> Option<&StoreRecord> {
        self.stores.iter().find(|s| s.is_named(name))
    }

    pub fn store_mut(&mut self, name: &str) -> Option<&mut StoreRecord> {
        self.stores.iter_mut().find(|s| s.is_named(name))
    }

    #[must_use]
    pub fn has_store(&self, name: &str) -> bool {
        self.store(name).is_some()
    }

    /// Returns the store named `name` (case-insensitively), creating it at
    /// the end of the list if absent.
    pub fn find_or_create_store(&mut self, name: &str) -> &mut StoreRecord {
        let idx = match self.stores.iter().position(|s| s.is_named(name)) {
            Some(idx) => idx,
            None => {
                self.stores.push(StoreRecord::new(name));
                self.stores.len() - 1
            }
        };
        &mut self.stores[idx]
    }

    /// Total number of products across all stores.
    #[must_use]
    pub fn product_count(&self) -> usize {
        self.stores.iter().map(|s| s.products().len()).sum()
    }
}
