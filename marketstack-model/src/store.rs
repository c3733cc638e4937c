use crate::{ProductKey, ProductRecord};
use marketstack_types::Category;
use serde::{Deserialize, Serialize};

/// A store and its products, in file order.
///
/// Holds at most one product per [`ProductKey`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreRecord {
    name: String,
    products: Vec<ProductRecord>,
}

impl StoreRecord {
    /// Creates an empty store.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        let name: String = name.into();
        Self {
            name: name.trim().to_string(),
            products: Vec::new(),
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Case-insensitive name comparison, the rule store names are unique under.
    #[must_use]
    pub fn is_named(&self, name: &str) -> bool {
        self.name.eq_ignore_ascii_case(name.trim())
    }

    #[must_use]
    pub fn products(&self) -> &[ProductRecord] {
        &self.products
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }

    #[must_use]
    pub fn contains(&self, key: &ProductKey) -> bool {
        self.position(key).is_some()
    }

    /// Index of the product identified by `key`.
    #[must_use]
    pub fn position(&self, key: &ProductKey) -> Option<usize> {
        self.products.iter().position(|p| p.matches(key))
    }

    #[must_use]
    pub fn get(&self, key: &ProductKey) -> Option<&ProductRecord> {
        self.products.iter().find(|p| p.matches(key))
    }

    /// First product with the given name, compared case-insensitively.
    #[must_use]
    pub fn find_by_name(&self, name: &str) -> Option<&ProductRecord> {
        let name = name.trim();
        self.products.iter().find(|p| p.name.eq_ignore_ascii_case(name))
    }

    /// Appends a product. Returns `false` and leaves the store untouched when
    /// a product with the same key is already present.
    pub fn add_product(&mut self, product: ProductRecord) -> bool {
        if self.contains(&product.key()) {
            return false;
        }
        self.products.push(product);
        true
    }

    /// Removes and returns the product identified by `key`.
    pub fn remove_product(&mut self, key: &ProductKey) -> Option<ProductRecord> {
        let idx = self.position(key)?;
        Some(self.products.remove(idx))
    }

    /// Replaces the product identified by `key` in place, keeping its position.
    /// Returns the previous record.
    pub fn replace_product(
        &mut self,
        key: &ProductKey,
        product: ProductRecord,
    ) -> Option<ProductRecord> {
        let idx = self.position(key)?;
        Some(std::mem::replace(&mut self.products[idx], product))
    }

    /// Mutable access for collaborators that adjust stock in place.
    pub fn get_mut(&mut self, key: &ProductKey) -> Option<&mut ProductRecord> {
        self.products.iter_mut().find(|p| p.matches(key))
    }

    #[must_use]
    pub fn products_by_category(&self, category: Category) -> Vec<&ProductRecord> {
        self.products
            .iter()
            .filter(|p| p.category == category)
            .collect()
    }
}
