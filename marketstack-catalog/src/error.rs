//! Error types for catalog operations.

use marketstack_audit::MirrorError;
use marketstack_model::ValidationError;
use thiserror::Error;

/// Result type for catalog operations.
pub type CatalogResult<T> = Result<T, CatalogError>;

/// Errors that abort a catalog operation.
///
/// Malformed lines and mirror failures during mutations are not errors:
/// they are logged and the operation carries on.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// The catalog file could not be read or written.
    #[error("catalog I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A caller-supplied value broke a format rule.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("unknown seller: {0}")]
    UnknownSeller(String),

    #[error("seller {seller} has no store named {store}")]
    UnknownStore { seller: String, store: String },

    #[error("seller {seller} already has a store named {store}")]
    DuplicateStore { seller: String, store: String },

    #[error("store {store} already holds an identical product {name}")]
    DuplicateProduct { store: String, name: String },

    #[error("store {store} has no matching product {name}")]
    ProductNotFound { store: String, name: String },

    /// The store's line reads as both legacy and current format. Rewriting
    /// it would lose whichever reading is right, so it must be fixed by hand.
    #[error("catalog line for {seller}/{store} is ambiguous between legacy and current format")]
    AmbiguousLine { seller: String, store: String },

    /// The mirror could not be opened.
    #[error("mirror error: {0}")]
    Mirror(#[from] MirrorError),
}
