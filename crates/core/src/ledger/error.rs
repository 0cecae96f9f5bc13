//! Ledger error types for journal validation and lifecycle errors.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use thiserror::Error;

use kontor_shared::AppError;
use kontor_shared::types::{AccountId, JournalId, PeriodId};

use super::types::JournalStatus;
use super::validation::AccountType;
use crate::period::PeriodStatus;
use crate::policy::PolicyError;

/// Errors that can occur during journal operations.
#[derive(Debug, Error)]
pub enum LedgerError {
    // ========== Validation Errors ==========
    /// Journal has no lines.
    #[error("Journal must have at least one line")]
    NoLines,

    /// Line has neither a debit nor a credit.
    #[error("Line {line} has a zero amount")]
    ZeroAmount {
        /// Zero-based line index.
        line: usize,
    },

    /// Line has a negative amount.
    #[error("Line {line} has a negative amount")]
    NegativeAmount {
        /// Zero-based line index.
        line: usize,
    },

    /// Line has both a debit and a credit.
    #[error("Line {line} must be either a debit or a credit, not both")]
    BothSides {
        /// Zero-based line index.
        line: usize,
    },

    /// Line amount is at or beyond the storable magnitude.
    #[error("Line {line} amount is out of range")]
    AmountOutOfRange {
        /// Zero-based line index.
        line: usize,
    },

    /// Line amount has more fractional digits than the ledger stores.
    #[error("Line {line} has more than 4 decimal places")]
    AmountPrecision {
        /// Zero-based line index.
        line: usize,
    },

    /// Debits and credits differ.
    #[error("Journal is not balanced. Debit: {debit}, Credit: {credit}")]
    Unbalanced {
        /// Total debits.
        debit: Decimal,
        /// Total credits.
        credit: Decimal,
    },

    // ========== Account Errors ==========
    /// Account not in the chart of accounts.
    #[error("Account not found: {0}")]
    AccountNotFound(AccountId),

    /// Account is inactive.
    #[error("Account {0} is inactive")]
    AccountInactive(AccountId),

    /// Account does not allow direct posting.
    #[error("Account {0} does not allow direct posting")]
    AccountNoDirectPosting(AccountId),

    /// Account is not of the expected type.
    #[error("Account {account_id} is not a {expected} account")]
    AccountTypeMismatch {
        /// The account.
        account_id: AccountId,
        /// The required type.
        expected: AccountType,
    },

    // ========== Period Errors ==========
    /// No period contains the journal date.
    #[error("No accounting period contains {0}")]
    NoPeriodForDate(NaiveDate),

    /// The journal's period does not allow posting.
    #[error("Period {period_id} is {status}; journals cannot be submitted or posted")]
    PeriodClosed {
        /// The period.
        period_id: PeriodId,
        /// Its status.
        status: PeriodStatus,
    },

    // ========== State Errors ==========
    /// Attempted an invalid status transition.
    #[error("Invalid status transition from {from} to {to}")]
    InvalidTransition {
        /// The current status.
        from: JournalStatus,
        /// The attempted target status.
        to: JournalStatus,
    },

    /// Attempted to edit a journal outside Draft.
    #[error("Cannot modify a {0} journal")]
    CannotModify(JournalStatus),

    /// Rejection reason missing.
    #[error("Rejection reason is required")]
    RejectionReasonRequired,

    /// Journal already has a reversal.
    #[error("Journal {original} is already reversed by {reversal}")]
    AlreadyReversed {
        /// The original journal.
        original: JournalId,
        /// The existing reversal.
        reversal: JournalId,
    },

    /// Journal not found.
    #[error("Journal not found: {0}")]
    JournalNotFound(JournalId),

    // ========== Policy Errors ==========
    /// Permission or SoD check failed.
    #[error(transparent)]
    Policy(#[from] PolicyError),

    // ========== Database Errors ==========
    /// Database error.
    #[error("Database error: {0}")]
    Database(String),
}

impl LedgerError {
    /// Returns the error code for API responses.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::NoLines => "NO_LINES",
            Self::ZeroAmount { .. } => "ZERO_AMOUNT",
            Self::NegativeAmount { .. } => "NEGATIVE_AMOUNT",
            Self::BothSides { .. } => "BOTH_SIDES",
            Self::AmountOutOfRange { .. } => "AMOUNT_OUT_OF_RANGE",
            Self::AmountPrecision { .. } => "AMOUNT_PRECISION",
            Self::Unbalanced { .. } => "UNBALANCED_JOURNAL",
            Self::AccountNotFound(_) => "ACCOUNT_NOT_FOUND",
            Self::AccountInactive(_) => "ACCOUNT_INACTIVE",
            Self::AccountNoDirectPosting(_) => "ACCOUNT_NO_DIRECT_POSTING",
            Self::AccountTypeMismatch { .. } => "ACCOUNT_TYPE_MISMATCH",
            Self::NoPeriodForDate(_) => "NO_PERIOD_FOR_DATE",
            Self::PeriodClosed { .. } => "PERIOD_CLOSED",
            Self::InvalidTransition { .. } | Self::CannotModify(_) => "INVALID_STATE_TRANSITION",
            Self::RejectionReasonRequired => "REJECTION_REASON_REQUIRED",
            Self::AlreadyReversed { .. } => "ALREADY_REVERSED",
            Self::JournalNotFound(_) => "JOURNAL_NOT_FOUND",
            Self::Policy(e) => e.error_code(),
            Self::Database(_) => "DATABASE_ERROR",
        }
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub fn http_status_code(&self) -> u16 {
        match self {
            // 400 Bad Request - validation errors
            Self::NoLines
            | Self::ZeroAmount { .. }
            | Self::NegativeAmount { .. }
            | Self::BothSides { .. }
            | Self::AmountOutOfRange { .. }
            | Self::AmountPrecision { .. }
            | Self::Unbalanced { .. }
            | Self::AccountNotFound(_)
            | Self::AccountInactive(_)
            | Self::AccountNoDirectPosting(_)
            | Self::AccountTypeMismatch { .. }
            | Self::NoPeriodForDate(_)
            | Self::RejectionReasonRequired => 400,

            // 404 Not Found
            Self::JournalNotFound(_) => 404,

            // 409 Conflict - state errors
            Self::PeriodClosed { .. }
            | Self::InvalidTransition { .. }
            | Self::CannotModify(_)
            | Self::AlreadyReversed { .. } => 409,

            Self::Policy(e) => e.http_status_code(),

            // 500 Internal Server Error
            Self::Database(_) => 500,
        }
    }
}

impl From<LedgerError> for AppError {
    fn from(err: LedgerError) -> Self {
        let message = err.to_string();
        match err {
            LedgerError::NoLines
            | LedgerError::ZeroAmount { .. }
            | LedgerError::NegativeAmount { .. }
            | LedgerError::BothSides { .. }
            | LedgerError::AmountOutOfRange { .. }
            | LedgerError::AmountPrecision { .. }
            | LedgerError::Unbalanced { .. }
            | LedgerError::AccountNotFound(_)
            | LedgerError::AccountInactive(_)
            | LedgerError::AccountNoDirectPosting(_)
            | LedgerError::AccountTypeMismatch { .. }
            | LedgerError::NoPeriodForDate(_)
            | LedgerError::RejectionReasonRequired => Self::Validation(message),
            LedgerError::PeriodClosed { .. } => Self::PeriodClosed(message),
            LedgerError::InvalidTransition { .. }
            | LedgerError::CannotModify(_)
            | LedgerError::AlreadyReversed { .. } => Self::InvalidStateTransition(message),
            LedgerError::JournalNotFound(_) => Self::NotFound(message),
            LedgerError::Policy(e) => e.into(),
            LedgerError::Database(_) => Self::Database(message),
        }
    }
}
