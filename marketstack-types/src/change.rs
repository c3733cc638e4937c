//! Audit-trail entries for product field changes.
//!
//! Each entry records exactly one field of one product: a full-record edit
//! that touches three fields produces three entries. Entries are immutable
//! once written and are never updated or deleted.

use crate::{ActorId, ChangeId, ChangeTimestamp, ProductId};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A scalar product field that can be changed and audited.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProductField {
    Price,
    Quantity,
    Name,
    Category,
    Description,
}

impl ProductField {
    /// Every auditable field, in the order diffs are reported.
    pub const ALL: [ProductField; 5] = [
        ProductField::Price,
        ProductField::Quantity,
        ProductField::Name,
        ProductField::Category,
        ProductField::Description,
    ];

    /// Lower-case column name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            ProductField::Price => "price",
            ProductField::Quantity => "quantity",
            ProductField::Name => "name",
            ProductField::Category => "category",
            ProductField::Description => "description",
        }
    }

    /// Human-readable change type, e.g. `"Price Update"` or
    /// `"Price Update - seasonal sale"` when a reason is given.
    #[must_use]
    pub fn change_type(&self, reason: Option<&str>) -> String {
        let label = match self {
            ProductField::Price => "Price Update",
            ProductField::Quantity => "Quantity Update",
            ProductField::Name => "Name Update",
            ProductField::Category => "Category Update",
            ProductField::Description => "Description Update",
        };
        match reason.map(str::trim).filter(|r| !r.is_empty()) {
            Some(r) => format!("{label} - {r}"),
            None => label.to_string(),
        }
    }
}

impl fmt::Display for ProductField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProductField {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        Self::ALL
            .into_iter()
            .find(|f| f.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| crate::Error::UnknownField(s.to_string()))
    }
}

/// One immutable audit-trail record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeLogEntry {
    /// Unique identifier for this entry.
    pub id: ChangeId,

    /// Mirror handle of the product that changed.
    pub product_id: ProductId,

    /// Who made the change.
    pub actor_id: ActorId,

    /// Which field changed.
    pub field: ProductField,

    /// Rendered value before the change.
    pub old_value: String,

    /// Rendered value after the change.
    pub new_value: String,

    /// Optional free-text reason supplied by the actor.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,

    /// When the change was recorded.
    pub timestamp: ChangeTimestamp,
}

impl ChangeLogEntry {
    /// Creates an entry stamped with the current time.
    #[must_use]
    pub fn new(
        product_id: ProductId,
        actor_id: ActorId,
        field: ProductField,
        old_value: impl Into<String>,
        new_value: impl Into<String>,
    ) -> Self {
        Self {
            id: ChangeId::new(),
            product_id,
            actor_id,
            field,
            old_value: old_value.into(),
            new_value: new_value.into(),
            reason: None,
            timestamp: ChangeTimestamp::now(),
        }
    }

    /// Attaches a reason; blank reasons are dropped.
    #[must_use]
    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        let reason: String = reason.into();
        let reason = reason.trim();
        self.reason = (!reason.is_empty()).then(|| reason.to_string());
        self
    }

    /// Overrides the timestamp (for replay and ordered batches).
    #[must_use]
    pub fn with_timestamp(mut self, timestamp: ChangeTimestamp) -> Self {
        self.timestamp = timestamp;
        self
    }

    /// The human-readable change type, including the reason if any.
    #[must_use]
    pub fn change_type(&self) -> String {
        self.field.change_type(self.reason.as_deref())
    }
}
