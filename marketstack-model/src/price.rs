use crate::ValidationError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A strictly positive price, stored as whole cents.
///
/// Catalog files carry prices as decimals with two places. Parsing rounds
/// to the nearest cent, so every parsed price renders back to the text it
/// will be parsed from next time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "f64", into = "f64")]
pub struct Price(u64);

impl Price {
    /// Creates a price from cents. Zero is rejected.
    pub fn from_cents(cents: u64) -> Result<Self, ValidationError> {
        if cents == 0 {
            return Err(ValidationError::InvalidPrice("0.00".to_string()));
        }
        Ok(Self(cents))
    }

    /// Creates a price from a decimal amount, rounding to the nearest cent.
    pub fn from_f64(amount: f64) -> Result<Self, ValidationError> {
        let cents = (amount * 100.0).round();
        if !cents.is_finite() || cents < 1.0 || cents >= u64::MAX as f64 {
            return Err(ValidationError::InvalidPrice(amount.to_string()));
        }
        Ok(Self(cents as u64))
    }

    /// Parses a decimal price such as `"99.99"`.
    pub fn parse(text: &str) -> Result<Self, ValidationError> {
        let trimmed = text.trim();
        let amount: f64 = trimmed
            .parse()
            .map_err(|_| ValidationError::InvalidPrice(trimmed.to_string()))?;
        Self::from_f64(amount).map_err(|_| ValidationError::InvalidPrice(trimmed.to_string()))
    }

    /// Whole cents.
    #[must_use]
    pub const fn cents(&self) -> u64 {
        self.0
    }

    /// Decimal amount.
    #[must_use]
    pub fn as_f64(&self) -> f64 {
        self.0 as f64 / 100.0
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:02}", self.0 / 100, self.0 % 100)
    }
}

impl FromStr for Price {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<f64> for Price {
    type Error = ValidationError;

    fn try_from(amount: f64) -> Result<Self, Self::Error> {
        Self::from_f64(amount)
    }
}

impl From<Price> for f64 {
    fn from(price: Price) -> Self {
        price.as_f64()
    }
}
