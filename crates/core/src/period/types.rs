//! Accounting period types.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

use kontor_shared::types::PeriodId;

/// Status of an accounting period.
///
/// `Open -> Closed -> Locked`, with reopen taking either back to `Open`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PeriodStatus {
    /// Journals may post.
    Open,
    /// No posting; may be reopened or locked.
    Closed,
    /// No posting; reopening requires the reopen permission.
    Locked,
}

impl PeriodStatus {
    /// Returns the string representation of the status.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Open => "OPEN",
            Self::Closed => "CLOSED",
            Self::Locked => "LOCKED",
        }
    }

    /// Parses a status from a string.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "OPEN" => Some(Self::Open),
            "CLOSED" => Some(Self::Closed),
            "LOCKED" => Some(Self::Locked),
            _ => None,
        }
    }

    /// Returns true if journals may post against the period.
    #[must_use]
    pub const fn allows_posting(&self) -> bool {
        matches!(self, Self::Open)
    }
}

impl fmt::Display for PeriodStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An accounting period within a tenant.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountingPeriod {
    /// Unique identifier.
    pub id: PeriodId,
    /// First day of the period.
    pub start_date: NaiveDate,
    /// Last day of the period, inclusive.
    pub end_date: NaiveDate,
    /// Current status.
    pub status: PeriodStatus,
}

impl AccountingPeriod {
    /// Returns true if the given date falls within this period.
    #[must_use]
    pub fn contains_date(&self, date: NaiveDate) -> bool {
        date >= self.start_date && date <= self.end_date
    }

    /// Returns true if the two periods share at least one day.
    #[must_use]
    pub fn overlaps(&self, start: NaiveDate, end: NaiveDate) -> bool {
        start <= self.end_date && end >= self.start_date
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_status_parse_and_display() {
        assert_eq!(PeriodStatus::parse("open"), Some(PeriodStatus::Open));
        assert_eq!(PeriodStatus::parse("LOCKED"), Some(PeriodStatus::Locked));
        assert_eq!(PeriodStatus::parse("soft_close"), None);
        assert_eq!(PeriodStatus::Closed.to_string(), "CLOSED");
    }

    #[test]
    fn test_only_open_allows_posting() {
        assert!(PeriodStatus::Open.allows_posting());
        assert!(!PeriodStatus::Closed.allows_posting());
        assert!(!PeriodStatus::Locked.allows_posting());
    }

    #[test]
    fn test_contains_and_overlaps() {
        let period = AccountingPeriod {
            id: PeriodId::new(),
            start_date: date(2025, 1, 1),
            end_date: date(2025, 1, 31),
            status: PeriodStatus::Open,
        };
        assert!(period.contains_date(date(2025, 1, 1)));
        assert!(period.contains_date(date(2025, 1, 31)));
        assert!(!period.contains_date(date(2025, 2, 1)));
        assert!(period.overlaps(date(2025, 1, 31), date(2025, 2, 28)));
        assert!(!period.overlaps(date(2025, 2, 1), date(2025, 2, 28)));
    }
}
