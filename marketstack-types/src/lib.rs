//! Core type definitions for MarketStack.
//!
//! This crate defines the small, storage-agnostic types shared by every
//! other crate in the workspace:
//! - Mirror-issued product handles and change identifiers (UUID v7)
//! - Actor identifiers (the seller or user performing a change)
//! - Monotonic change timestamps
//! - The closed product [`Category`] set
//! - Immutable audit-trail entries ([`ChangeLogEntry`])
//!
//! Catalog records themselves (products, stores, sellers) live in
//! `marketstack-model`.

mod category;
mod change;
mod ids;
mod timestamp;

pub use category::Category;
pub use change::{ChangeLogEntry, ProductField};
pub use ids::{ActorId, ChangeId, ProductId};
pub use timestamp::ChangeTimestamp;

/// Result type alias using the crate's error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in type operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("invalid UUID: {0}")]
    InvalidUuid(#[from] uuid::Error),

    #[error("unknown category tag: {0}")]
    UnknownCategory(String),

    #[error("unknown product field: {0}")]
    UnknownField(String),

    #[error("invalid timestamp: {0}")]
    InvalidTimestamp(String),
}
