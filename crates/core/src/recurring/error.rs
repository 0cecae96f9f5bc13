//! Recurring generation error types.

use thiserror::Error;

use kontor_shared::AppError;
use kontor_shared::types::{PeriodId, TemplateId};

use crate::ledger::LedgerError;
use crate::policy::PolicyError;

/// Errors that can occur while generating from a template.
#[derive(Debug, Error)]
pub enum RecurringError {
    /// The template already produced a journal for the period.
    #[error("Template {template_id} already generated for period {period_id}")]
    AlreadyGenerated {
        /// The template.
        template_id: TemplateId,
        /// The period.
        period_id: PeriodId,
    },

    /// The template is inactive.
    #[error("Template {0} is inactive")]
    TemplateInactive(TemplateId),

    /// Template not found.
    #[error("Template {0} not found")]
    TemplateNotFound(TemplateId),

    /// Period not found.
    #[error("Period {0} not found")]
    PeriodNotFound(PeriodId),

    /// Template lines no longer validate.
    #[error("Template lines are invalid: {0}")]
    InvalidLines(#[from] LedgerError),

    /// Permission check failed.
    #[error(transparent)]
    Policy(#[from] PolicyError),

    /// Database error.
    #[error("Database error: {0}")]
    Database(String),
}

impl RecurringError {
    /// Returns the error code for API responses.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::AlreadyGenerated { .. } => "ALREADY_GENERATED",
            Self::TemplateInactive(_) => "TEMPLATE_INACTIVE",
            Self::TemplateNotFound(_) => "TEMPLATE_NOT_FOUND",
            Self::PeriodNotFound(_) => "PERIOD_NOT_FOUND",
            Self::InvalidLines(e) => e.error_code(),
            Self::Policy(e) => e.error_code(),
            Self::Database(_) => "DATABASE_ERROR",
        }
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub fn http_status_code(&self) -> u16 {
        match self {
            Self::AlreadyGenerated { .. } => 409,
            Self::TemplateInactive(_) => 400,
            Self::TemplateNotFound(_) | Self::PeriodNotFound(_) => 404,
            Self::InvalidLines(e) => e.http_status_code(),
            Self::Policy(e) => e.http_status_code(),
            Self::Database(_) => 500,
        }
    }
}

impl From<RecurringError> for AppError {
    fn from(err: RecurringError) -> Self {
        let message = err.to_string();
        match err {
            RecurringError::AlreadyGenerated { .. } => Self::AlreadyGenerated(message),
            RecurringError::TemplateInactive(_) => Self::Validation(message),
            RecurringError::TemplateNotFound(_) | RecurringError::PeriodNotFound(_) => {
                Self::NotFound(message)
            }
            RecurringError::InvalidLines(e) => e.into(),
            RecurringError::Policy(e) => e.into(),
            RecurringError::Database(_) => Self::Database(message),
        }
    }
}
