//! Free-text rules for values stored in the catalog file.
//!
//! The catalog format has no quoting or escaping, so a value containing the
//! delimiter would silently shift every following field. Values are
//! rejected here, at write time, instead.

use thiserror::Error;

/// Field delimiter of the catalog format.
pub const DELIMITER: char = ',';

/// Longest accepted product name, in characters.
pub const MAX_PRODUCT_NAME_LEN: usize = 120;

/// Longest accepted product description, in characters.
pub const MAX_DESCRIPTION_LEN: usize = 300;

/// Longest change reason kept in the audit trail; longer reasons are truncated.
pub const MAX_CHANGE_REASON_LEN: usize = 120;

/// A rejected value.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// A required value was empty or whitespace.
    #[error("{field} must not be empty")]
    Empty { field: &'static str },

    /// A value contains the catalog delimiter or a line break.
    #[error("{field} must not contain commas or line breaks: {value:?}")]
    ContainsDelimiter { field: &'static str, value: String },

    /// A value exceeds its length limit.
    #[error("{field} is {len} characters long (max {max})")]
    TooLong {
        field: &'static str,
        len: usize,
        max: usize,
    },

    /// A price that is not a positive decimal.
    #[error("invalid price: {0}")]
    InvalidPrice(String),

    /// A quantity that is not a non-negative integer.
    #[error("invalid quantity: {0}")]
    InvalidQuantity(String),
}

fn check_text(
    field: &'static str,
    value: &str,
    max: Option<usize>,
    allow_empty: bool,
) -> Result<(), ValidationError> {
    if !allow_empty && value.trim().is_empty() {
        return Err(ValidationError::Empty { field });
    }
    if value.contains([DELIMITER, '\n', '\r']) {
        return Err(ValidationError::ContainsDelimiter {
            field,
            value: value.to_string(),
        });
    }
    if let Some(max) = max {
        let len = value.chars().count();
        if len > max {
            return Err(ValidationError::TooLong { field, len, max });
        }
    }
    Ok(())
}

/// Seller identifiers are the first field of every line they own.
pub fn seller_id(value: &str) -> Result<(), ValidationError> {
    check_text("seller identifier", value, None, false)
}

/// Store names appear twice per product group and once per line.
pub fn store_name(value: &str) -> Result<(), ValidationError> {
    check_text("store name", value, None, false)
}

/// Product names: non-empty, at most [`MAX_PRODUCT_NAME_LEN`] characters.
pub fn product_name(value: &str) -> Result<(), ValidationError> {
    check_text("product name", value, Some(MAX_PRODUCT_NAME_LEN), false)
}

/// Descriptions may be empty (a placeholder is stored instead).
pub fn description(value: &str) -> Result<(), ValidationError> {
    check_text("description", value, Some(MAX_DESCRIPTION_LEN), true)
}

/// Parses a quantity the way the catalog stores it.
pub fn quantity(text: &str) -> Result<u32, ValidationError> {
    let trimmed = text.trim();
    trimmed
        .parse::<u32>()
        .map_err(|_| ValidationError::InvalidQuantity(trimmed.to_string()))
}

/// Trims a change reason and truncates it to [`MAX_CHANGE_REASON_LEN`].
/// Blank reasons become `None`.
#[must_use]
pub fn change_reason(reason: &str) -> Option<String> {
    let trimmed = reason.trim();
    if trimmed.is_empty() {
        return None;
    }
    Some(trimmed.chars().take(MAX_CHANGE_REASON_LEN).collect())
}
