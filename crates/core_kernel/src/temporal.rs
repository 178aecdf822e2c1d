//! Date ranges for accounting windows
//!
//! Accounting dates are civil dates without a time component. A `DateRange`
//! is inclusive on both ends, matching how accrual dates are matched against
//! accounting periods.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur when constructing temporal values
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TemporalError {
    #[error("End date {end} is before start date {start}")]
    EndBeforeStart { start: NaiveDate, end: NaiveDate },
}

/// An inclusive range of civil dates with `end >= start`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    start: NaiveDate,
    end: NaiveDate,
}

impl DateRange {
    /// Creates a range, rejecting `end < start`.
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, TemporalError> {
        if end < start {
            return Err(TemporalError::EndBeforeStart { start, end });
        }
        Ok(Self { start, end })
    }

    /// A single-day range.
    pub fn single_day(day: NaiveDate) -> Self {
        Self {
            start: day,
            end: day,
        }
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn end(&self) -> NaiveDate {
        self.end
    }

    /// Returns true if `date` falls within the range, bounds included.
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }

    /// Returns true if the two ranges share at least one day.
    pub fn overlaps(&self, other: &DateRange) -> bool {
        self.start <= other.end && other.start <= self.end
    }
}
