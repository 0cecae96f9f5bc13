//! Application-wide error taxonomy.
//!
//! Every domain error in `kontor-core` converts into one of these variants.
//! All of them except the `Database`/`Internal` pair are recoverable by the
//! caller; none are retried automatically.

use thiserror::Error;

/// Result type alias using `AppError`.
pub type AppResult<T> = Result<T, AppError>;

/// Application error types.
#[derive(Debug, Error)]
pub enum AppError {
    /// Authentication failed.
    #[error("Authentication failed: {0}")]
    Unauthorized(String),

    /// Malformed input (unbalanced lines, missing account, bad dates).
    #[error("Validation error: {0}")]
    Validation(String),

    /// The actor lacks the permission the action requires.
    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    /// The actor/role combination recreates a forbidden permission pairing.
    #[error("Segregation of duties violation: {0}")]
    SodViolation(String),

    /// The action is not allowed from the entity's current state.
    #[error("Invalid state transition: {0}")]
    InvalidStateTransition(String),

    /// The accounting period is not open.
    #[error("Period closed: {0}")]
    PeriodClosed(String),

    /// Close attempted with outstanding checklist items.
    #[error("Checklist incomplete: {0}")]
    ChecklistIncomplete(String),

    /// Statement line and payment amounts differ.
    #[error("Amount mismatch: {0}")]
    AmountMismatch(String),

    /// Statement line or payment already reconciled.
    #[error("Already reconciled: {0}")]
    AlreadyReconciled(String),

    /// Recurring template already generated for the period.
    #[error("Already generated: {0}")]
    AlreadyGenerated(String),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Database error.
    #[error("Database error: {0}")]
    Database(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn status_code(&self) -> u16 {
        match self {
            Self::Unauthorized(_) => 401,
            Self::Validation(_) => 400,
            Self::PermissionDenied(_) | Self::SodViolation(_) => 403,
            Self::NotFound(_) => 404,
            Self::InvalidStateTransition(_)
            | Self::PeriodClosed(_)
            | Self::ChecklistIncomplete(_)
            | Self::AmountMismatch(_)
            | Self::AlreadyReconciled(_)
            | Self::AlreadyGenerated(_) => 409,
            Self::Database(_) | Self::Internal(_) => 500,
        }
    }

    /// Returns the error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::Unauthorized(_) => "UNAUTHORIZED",
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::PermissionDenied(_) => "PERMISSION_DENIED",
            Self::SodViolation(_) => "SOD_VIOLATION",
            Self::InvalidStateTransition(_) => "INVALID_STATE_TRANSITION",
            Self::PeriodClosed(_) => "PERIOD_CLOSED",
            Self::ChecklistIncomplete(_) => "CHECKLIST_INCOMPLETE",
            Self::AmountMismatch(_) => "AMOUNT_MISMATCH",
            Self::AlreadyReconciled(_) => "ALREADY_RECONCILED",
            Self::AlreadyGenerated(_) => "ALREADY_GENERATED",
            Self::NotFound(_) => "NOT_FOUND",
            Self::Database(_) => "DATABASE_ERROR",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Returns the human-readable message without the category prefix.
    #[must_use]
    pub fn message(&self) -> &str {
        match self {
            Self::Unauthorized(m)
            | Self::Validation(m)
            | Self::PermissionDenied(m)
            | Self::SodViolation(m)
            | Self::InvalidStateTransition(m)
            | Self::PeriodClosed(m)
            | Self::ChecklistIncomplete(m)
            | Self::AmountMismatch(m)
            | Self::AlreadyReconciled(m)
            | Self::AlreadyGenerated(m)
            | Self::NotFound(m)
            | Self::Database(m)
            | Self::Internal(m) => m,
        }
    }

    /// Returns true for errors caused by the server rather than the caller.
    #[must_use]
    pub const fn is_server_error(&self) -> bool {
        matches!(self, Self::Database(_) | Self::Internal(_))
    }
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
