//! Period error types.

use chrono::NaiveDate;
use thiserror::Error;

use kontor_shared::AppError;
use kontor_shared::types::PeriodId;

use super::types::PeriodStatus;
use crate::policy::PolicyError;

/// Errors that can occur during period operations.
#[derive(Debug, Error)]
pub enum PeriodError {
    /// Attempted an invalid status transition.
    #[error("Invalid period transition from {from} to {to}")]
    InvalidTransition {
        /// The current status.
        from: PeriodStatus,
        /// The attempted target status.
        to: PeriodStatus,
    },

    /// Checklist items are still outstanding.
    #[error("Checklist incomplete: {}", .outstanding.join(", "))]
    ChecklistIncomplete {
        /// Codes of the outstanding items.
        outstanding: Vec<String>,
    },

    /// The period's end precedes its start.
    #[error("Period end {end} is before start {start}")]
    InvalidDateRange {
        /// Requested start.
        start: NaiveDate,
        /// Requested end.
        end: NaiveDate,
    },

    /// The period overlaps an existing one.
    #[error("Period overlaps existing period {0}")]
    Overlaps(PeriodId),

    /// The period would leave a gap in the tenant's calendar.
    #[error("Period must start on {expected_start} or end on {expected_end}")]
    NotContiguous {
        /// Start date that would extend the calendar forwards.
        expected_start: NaiveDate,
        /// End date that would extend the calendar backwards.
        expected_end: NaiveDate,
    },

    /// No period contains the date.
    #[error("No accounting period contains {0}")]
    NoPeriodForDate(NaiveDate),

    /// Unknown checklist item code.
    #[error("Unknown checklist item {0}")]
    UnknownChecklistItem(String),

    /// Period not found.
    #[error("Period {0} not found")]
    PeriodNotFound(PeriodId),

    /// Permission check failed.
    #[error(transparent)]
    Policy(#[from] PolicyError),

    /// Database error.
    #[error("Database error: {0}")]
    Database(String),
}

impl PeriodError {
    /// Returns the error code for API responses.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidTransition { .. } => "INVALID_STATE_TRANSITION",
            Self::ChecklistIncomplete { .. } => "CHECKLIST_INCOMPLETE",
            Self::InvalidDateRange { .. } => "INVALID_DATE_RANGE",
            Self::Overlaps(_) => "PERIOD_OVERLAP",
            Self::NotContiguous { .. } => "PERIOD_NOT_CONTIGUOUS",
            Self::NoPeriodForDate(_) => "NO_PERIOD_FOR_DATE",
            Self::UnknownChecklistItem(_) => "UNKNOWN_CHECKLIST_ITEM",
            Self::PeriodNotFound(_) => "PERIOD_NOT_FOUND",
            Self::Policy(e) => e.error_code(),
            Self::Database(_) => "DATABASE_ERROR",
        }
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub fn http_status_code(&self) -> u16 {
        match self {
            Self::InvalidDateRange { .. }
            | Self::Overlaps(_)
            | Self::NotContiguous { .. }
            | Self::NoPeriodForDate(_) => 400,
            Self::InvalidTransition { .. } | Self::ChecklistIncomplete { .. } => 409,
            Self::UnknownChecklistItem(_) | Self::PeriodNotFound(_) => 404,
            Self::Policy(e) => e.http_status_code(),
            Self::Database(_) => 500,
        }
    }
}

impl From<PeriodError> for AppError {
    fn from(err: PeriodError) -> Self {
        let message = err.to_string();
        match err {
            PeriodError::InvalidTransition { .. } => Self::InvalidStateTransition(message),
            PeriodError::ChecklistIncomplete { .. } => Self::ChecklistIncomplete(message),
            PeriodError::InvalidDateRange { .. }
            | PeriodError::Overlaps(_)
            | PeriodError::NotContiguous { .. }
            | PeriodError::NoPeriodForDate(_) => Self::Validation(message),
            PeriodError::UnknownChecklistItem(_) | PeriodError::PeriodNotFound(_) => {
                Self::NotFound(message)
            }
            PeriodError::Policy(e) => e.into(),
            PeriodError::Database(_) => Self::Database(message),
        }
    }
}
