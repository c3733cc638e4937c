//! Monotonic timestamps for audit-trail ordering.
//!
//! Several field changes produced by one edit land within the same
//! millisecond, so wall time alone cannot order them. A logical counter
//! breaks ties the same way a hybrid logical clock does.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::time::{SystemTime, UNIX_EPOCH};

/// A change timestamp: wall-clock milliseconds plus a logical tie-breaker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChangeTimestamp {
    /// Milliseconds since the Unix epoch.
    wall_time: u64,
    /// Counter for entries sharing the same wall time.
    logical: u32,
}

fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

impl ChangeTimestamp {
    /// Creates a timestamp at the current time.
    #[must_use]
    pub fn now() -> Self {
        Self {
            wall_time: now_millis(),
            logical: 0,
        }
    }

    /// Creates a timestamp from components.
    #[must_use]
    pub const fn new(wall_time: u64, logical: u32) -> Self {
        Self { wall_time, logical }
    }

    /// Returns the wall time component.
    #[must_use]
    pub const fn wall_time(&self) -> u64 {
        self.wall_time
    }

    /// Returns the logical counter.
    #[must_use]
    pub const fn logical(&self) -> u32 {
        self.logical
    }

    /// Returns a timestamp strictly greater than `self`.
    ///
    /// Uses the current wall time when the clock has moved past `self`,
    /// otherwise bumps the logical counter.
    #[must_use]
    pub fn tick(&self) -> Self {
        let now = now_millis();
        if now > self.wall_time {
            Self {
                wall_time: now,
                logical: 0,
            }
        } else {
            Self {
                wall_time: self.wall_time,
                logical: self.logical.saturating_add(1),
            }
        }
    }

    /// Converts the wall time to a UTC date-time.
    pub fn to_datetime(&self) -> crate::Result<DateTime<Utc>> {
        let millis = i64::try_from(self.wall_time)
            .map_err(|_| crate::Error::InvalidTimestamp(self.wall_time.to_string()))?;
        DateTime::<Utc>::from_timestamp_millis(millis)
            .ok_or_else(|| crate::Error::InvalidTimestamp(self.wall_time.to_string()))
    }

    /// Renders the wall time as RFC 3339, or the raw millis if out of range.
    #[must_use]
    pub fn to_rfc3339(&self) -> String {
        self.to_datetime()
            .map(|dt| dt.to_rfc3339())
            .unwrap_or_else(|_| self.wall_time.to_string())
    }
}

impl Default for ChangeTimestamp {
    fn default() -> Self {
        Self::now()
    }
}

impl PartialOrd for ChangeTimestamp {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ChangeTimestamp {
    fn cmp(&self, other: &Self) -> Ordering {
        match self.wall_time.cmp(&other.wall_time) {
            Ordering::Equal => self.logical.cmp(&other.logical),
            other => other,
        }
    }
}
