//! Error types for the mirror layer.

use thiserror::Error;

/// Result type for mirror operations.
pub type MirrorResult<T> = Result<T, MirrorError>;

/// Errors that can occur while talking to the mirror.
#[derive(Debug, Error)]
pub enum MirrorError {
    /// Database error from SQLite.
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// The mirror is unusable (poisoned lock, corrupt row, failed open).
    #[error("mirror storage error: {0}")]
    Storage(String),

    /// No row for the given product handle.
    #[error("product not found in mirror: {0}")]
    NotFound(String),
}
