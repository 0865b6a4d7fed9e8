//! Half-open time intervals for visit scheduling.

use chrono::{Duration, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// A half-open interval `[start, end)`.
///
/// Two intervals conflict iff `a.start < b.end && a.end > b.start`, so
/// back-to-back intervals (one ends exactly when the other starts) do not
/// overlap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VisitInterval {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
}

impl VisitInterval {
    /// Create an interval from its bounds. Bounds are not validated.
    pub fn new(start: NaiveDateTime, end: NaiveDateTime) -> Self {
        Self { start, end }
    }

    /// Check whether `start < end`.
    pub fn is_valid(&self) -> bool {
        self.start < self.end
    }

    /// Strict half-open intersection test.
    pub fn overlaps(&self, other: &VisitInterval) -> bool {
        self.start < other.end && self.end > other.start
    }

    /// Widen the interval by `buffer` on both sides, or `None` if either
    /// bound leaves the representable range.
    ///
    /// A zero buffer returns the interval unchanged.
    pub fn padded(&self, buffer: Duration) -> Option<Self> {
        Some(Self {
            start: self.start.checked_sub_signed(buffer)?,
            end: self.end.checked_add_signed(buffer)?,
        })
    }

    pub fn duration(&self) -> Duration {
        self.end - self.start
    }
}
