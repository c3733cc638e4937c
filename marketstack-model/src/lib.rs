//! Catalog record model for MarketStack.
//!
//! Defines the in-memory graph the catalog file is replayed into:
//! - [`SellerRecord`]: a seller identifier and its stores
//! - [`StoreRecord`]: a store name and its ordered products
//! - [`ProductRecord`]: one product line item, with its [`Category`]
//! - [`Price`]: a positive amount held as whole cents
//!
//! plus the free-text rules in [`validate`] that keep every value
//! representable in the delimiter-separated catalog format.
//!
//! [`Category`]: marketstack_types::Category

mod price;
mod product;
mod seller;
mod store;
pub mod validate;

pub use price::Price;
pub use product::{FieldChange, ProductDraft, ProductKey, ProductRecord, DESCRIPTION_PLACEHOLDER};
pub use seller::SellerRecord;
pub use store::StoreRecord;
pub use validate::ValidationError;
