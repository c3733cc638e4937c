//! Flat-file catalog store for MarketStack.
//!
//! The catalog is a line-oriented text file, one line per `(seller, store)`:
//!
//! ```text
//! seller,store[,name,quantity,price,description,store,CATEGORY]*
//! ```
//!
//! Older files carry 5-field product groups without the category tag. They
//! are upgraded in place on load.
//!
//! # Components
//!
//! - [`codec`]: line ⇄ product records, format detection
//! - [`migration`]: legacy 5-field to 6-field upgrade
//! - [`CatalogStore`]: the in-memory seller/store/product graph and its mutations
//! - [`LedgerWriter`]: read-modify-write of one `(seller, store)` line
//! - [`AuditBridge`]: best-effort change logging into a [`CatalogMirror`]
//! - [`SearchCriteria`]: product queries over a loaded catalog
//!
//! [`CatalogMirror`]: marketstack_audit::CatalogMirror

pub mod codec;
pub mod migration;

mod bridge;
mod config;
mod error;
mod file;
mod ledger;
mod search;
mod store;

pub use bridge::AuditBridge;
pub use config::{
    CatalogConfig, DEFAULT_CATALOG_PATH, ENV_CATALOG, ENV_LEGACY_CATALOG, ENV_MIRROR,
};
pub use error::{CatalogError, CatalogResult};
pub use ledger::{belongs_to, LedgerCommit, LedgerWriter};
pub use migration::{MigrationEngine, MigrationOutcome, MigrationReport};
pub use search::{search, SearchCriteria};
pub use store::{build_catalog, find_or_create_seller, load_all, CatalogStore, MirrorSyncReport};
