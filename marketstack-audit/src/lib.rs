//! Relational mirror for MarketStack catalogs.
//!
//! The flat catalog file is the source of truth for products. The mirror
//! holds a copy of each product under a stable [`ProductId`] so that field
//! changes can be recorded in an append-only change log and queried later.
//!
//! - [`CatalogMirror`]: the contract the catalog core talks to
//! - [`SqliteMirror`]: a SQLite-backed implementation
//!
//! [`ProductId`]: marketstack_types::ProductId

mod error;
mod mirror;
mod sqlite;

pub use error::{MirrorError, MirrorResult};
pub use mirror::CatalogMirror;
pub use sqlite::SqliteMirror;
