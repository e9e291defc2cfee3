//! Period indexing for metric series (annual or monthly buckets)

use serde::{Deserialize, Serialize};
use std::fmt;

/// One time bucket of a metric series: a year, or a year plus month.
///
/// Ordering is (year, annual-before-monthly, month), so `2023` sorts ahead of
/// `2023-01` and series mixing both granularities stay period-ascending.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Period {
    pub year: i32,
    pub month: Option<u8>,
}

impl Period {
    /// Annual bucket (e.g. `2023`)
    pub fn annual(year: i32) -> Self {
        Self { year, month: None }
    }

    /// Monthly bucket (e.g. `2023-07`); month must be 1-12
    pub fn monthly(year: i32, month: u8) -> Option<Self> {
        if (1..=12).contains(&month) {
            Some(Self {
                year,
                month: Some(month),
            })
        } else {
            None
        }
    }

    /// Parse `"2023"` or `"2023-07"`; malformed input returns None
    pub fn from_str(s: &str) -> Option<Self> {
        match s.split_once('-') {
            None => s.parse::<i32>().ok().map(Self::annual),
            Some((year, month)) => {
                let year = year.parse::<i32>().ok()?;
                let month = month.parse::<u8>().ok()?;
                Self::monthly(year, month)
            }
        }
    }

    /// Month column value for storage: 0 for annual, 1-12 for monthly
    pub fn month_key(&self) -> i64 {
        self.month.map(i64::from).unwrap_or(0)
    }

    /// Rebuild from storage columns (month 0 means annual)
    pub fn from_parts(year: i32, month_key: i64) -> Self {
        if month_key == 0 {
            Self::annual(year)
        } else {
            Self {
                year,
                month: Some(month_key as u8),
            }
        }
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.month {
            Some(month) => write!(f, "{}-{:02}", self.year, month),
            None => write!(f, "{}", self.year),
        }
    }
}

/// Inclusive period range used by every query and evaluation call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeriodRange {
    pub start: Period,
    pub end: Period,
}

impl PeriodRange {
    pub fn new(start: Period, end: Period) -> Self {
        Self { start, end }
    }

    /// Annual range covering `start..=end` years
    pub fn years(start: i32, end: i32) -> Self {
        Self {
            start: Period::annual(start),
            end: Period::annual(end),
        }
    }

    /// A range with start after end matches no period
    pub fn is_empty(&self) -> bool {
        self.start > self.end
    }

    pub fn contains(&self, period: &Period) -> bool {
        *period >= self.start && *period <= self.end
    }
}

impl fmt::Display for PeriodRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..={}", self.start, self.end)
    }
}
