use crate::{validate, Price, ValidationError};
use marketstack_types::{Category, ProductField};
use serde::{Deserialize, Serialize};

/// Stored in place of an empty description.
pub const DESCRIPTION_PLACEHOLDER: &str = "No description provided";

/// One product as it appears in the catalog.
///
/// Equality is structural over every field, including the category.
/// Identity within a store uses [`ProductKey`], which leaves the category out.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductRecord {
    pub name: String,
    pub quantity: u32,
    pub price: Price,
    pub description: String,
    pub store_name: String,
    pub category: Category,
}

impl ProductRecord {
    /// Builds a record, trimming text and substituting the description placeholder.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        quantity: u32,
        price: Price,
        description: impl Into<String>,
        store_name: impl Into<String>,
        category: Category,
    ) -> Self {
        let name: String = name.into();
        let store_name: String = store_name.into();
        Self {
            name: name.trim().to_string(),
            quantity,
            price,
            description: normalize_description(&description.into()),
            store_name: store_name.trim().to_string(),
            category,
        }
    }

    /// Structural identity used for lookups and duplicate detection.
    #[must_use]
    pub fn key(&self) -> ProductKey {
        ProductKey {
            name: self.name.clone(),
            quantity: self.quantity,
            price: self.price,
            description: self.description.clone(),
            store_name: self.store_name.clone(),
        }
    }

    /// Whether `key` identifies this record.
    #[must_use]
    pub fn matches(&self, key: &ProductKey) -> bool {
        self.name == key.name
            && self.quantity == key.quantity
            && self.price == key.price
            && self.description == key.description
            && self.store_name == key.store_name
    }

    /// Whether the product can be bought right now.
    #[must_use]
    pub fn in_stock(&self) -> bool {
        self.quantity > 0
    }

    /// Checks every free-text field against the catalog format rules.
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate::product_name(&self.name)?;
        validate::description(&self.description)?;
        validate::store_name(&self.store_name)?;
        Ok(())
    }

    /// Renders one auditable field the way the change log stores it.
    #[must_use]
    pub fn field_value(&self, field: ProductField) -> String {
        match field {
            ProductField::Price => self.price.to_string(),
            ProductField::Quantity => self.quantity.to_string(),
            ProductField::Name => self.name.clone(),
            ProductField::Category => self.category.as_tag().to_string(),
            ProductField::Description => self.description.clone(),
        }
    }

    /// One [`FieldChange`] per scalar field that differs between `self` and `updated`.
    #[must_use]
    pub fn diff(&self, updated: &ProductRecord) -> Vec<FieldChange> {
        ProductField::ALL
            .into_iter()
            .filter_map(|field| {
                let old_value = self.field_value(field);
                let new_value = updated.field_value(field);
                (old_value != new_value).then_some(FieldChange {
                    field,
                    old_value,
                    new_value,
                })
            })
            .collect()
    }
}

fn normalize_description(description: &str) -> String {
    let trimmed = description.trim();
    if trimmed.is_empty() {
        DESCRIPTION_PLACEHOLDER.to_string()
    } else {
        trimmed.to_string()
    }
}

/// Identifies a product within a store: every field except the category.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProductKey {
    pub name: String,
    pub quantity: u32,
    pub price: Price,
    pub description: String,
    pub store_name: String,
}

impl ProductKey {
    /// Builds a key, applying the same normalisation as [`ProductRecord::new`].
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        quantity: u32,
        price: Price,
        description: impl Into<String>,
        store_name: impl Into<String>,
    ) -> Self {
        let name: String = name.into();
        let store_name: String = store_name.into();
        Self {
            name: name.trim().to_string(),
            quantity,
            price,
            description: normalize_description(&description.into()),
            store_name: store_name.trim().to_string(),
        }
    }
}

/// Caller-supplied product fields for add and edit operations.
///
/// The store name is not part of the draft: it always comes from the store
/// the product is placed in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductDraft {
    pub name: String,
    pub quantity: u32,
    pub price: Price,
    pub description: String,
    pub category: Category,
}

impl ProductDraft {
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        quantity: u32,
        price: Price,
        description: impl Into<String>,
        category: Category,
    ) -> Self {
        Self {
            name: name.into(),
            quantity,
            price,
            description: description.into(),
            category,
        }
    }

    /// Validates the draft and turns it into a record for `store_name`.
    pub fn into_record(self, store_name: &str) -> Result<ProductRecord, ValidationError> {
        validate::product_name(&self.name)?;
        validate::description(&self.description)?;
        validate::store_name(store_name)?;
        Ok(ProductRecord::new(
            self.name,
            self.quantity,
            self.price,
            self.description,
            store_name,
            self.category,
        ))
    }
}

/// A single changed field between two versions of a product.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldChange {
    pub field: ProductField,
    pub old_value: String,
    pub new_value: String,
}
