//! Reconciliation error types.

use rust_decimal::Decimal;
use thiserror::Error;

use kontor_shared::AppError;
use kontor_shared::types::{BankAccountId, PaymentId, StatementLineId};

use crate::ledger::LedgerError;
use crate::policy::PolicyError;

/// Errors that can occur during reconciliation.
#[derive(Debug, Error)]
pub enum ReconciliationError {
    /// Statement and payment amounts differ.
    #[error("Statement amount {statement_amount} does not equal payment amount {payment_amount}")]
    AmountMismatch {
        /// Statement line amount.
        statement_amount: Decimal,
        /// Payment amount.
        payment_amount: Decimal,
    },

    /// Statement line already reconciled.
    #[error("Statement line {0} is already reconciled")]
    StatementLineReconciled(StatementLineId),

    /// Payment already reconciled.
    #[error("Payment {0} is already reconciled")]
    PaymentReconciled(PaymentId),

    /// Line and payment belong to different bank accounts.
    #[error("Statement line and payment belong to different bank accounts")]
    BankAccountMismatch,

    /// Payment is not posted.
    #[error("Payment {0} is not posted")]
    PaymentNotPosted(PaymentId),

    /// Statement closing balance the ledger cannot hold exactly.
    #[error("Closing balance {0} is out of range or has more than 4 decimal places")]
    ClosingBalanceOutOfRange(Decimal),

    /// There is no difference to adjust.
    #[error("Reconciliation difference is zero; no adjustment needed")]
    NothingToAdjust,

    /// Exact matches are still available.
    #[error("{0} matchable statement line(s) remain; match them before adjusting")]
    MatchablePairsRemain(usize),

    /// Statement line not found.
    #[error("Statement line {0} not found")]
    StatementLineNotFound(StatementLineId),

    /// Payment not found.
    #[error("Payment {0} not found")]
    PaymentNotFound(PaymentId),

    /// Bank account not found.
    #[error("Bank account {0} not found")]
    BankAccountNotFound(BankAccountId),

    /// Adjustment journal failed validation.
    #[error(transparent)]
    Ledger(#[from] LedgerError),

    /// Permission check failed.
    #[error(transparent)]
    Policy(#[from] PolicyError),

    /// Database error.
    #[error("Database error: {0}")]
    Database(String),
}

impl ReconciliationError {
    /// Returns the error code for API responses.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::AmountMismatch { .. } => "AMOUNT_MISMATCH",
            Self::StatementLineReconciled(_) | Self::PaymentReconciled(_) => "ALREADY_RECONCILED",
            Self::BankAccountMismatch => "BANK_ACCOUNT_MISMATCH",
            Self::PaymentNotPosted(_) => "PAYMENT_NOT_POSTED",
            Self::ClosingBalanceOutOfRange(_) => "CLOSING_BALANCE_OUT_OF_RANGE",
            Self::NothingToAdjust => "NOTHING_TO_ADJUST",
            Self::MatchablePairsRemain(_) => "MATCHABLE_PAIRS_REMAIN",
            Self::StatementLineNotFound(_) => "STATEMENT_LINE_NOT_FOUND",
            Self::PaymentNotFound(_) => "PAYMENT_NOT_FOUND",
            Self::BankAccountNotFound(_) => "BANK_ACCOUNT_NOT_FOUND",
            Self::Ledger(e) => e.error_code(),
            Self::Policy(e) => e.error_code(),
            Self::Database(_) => "DATABASE_ERROR",
        }
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub fn http_status_code(&self) -> u16 {
        match self {
            Self::BankAccountMismatch
            | Self::PaymentNotPosted(_)
            | Self::ClosingBalanceOutOfRange(_)
            | Self::NothingToAdjust => 400,
            Self::StatementLineNotFound(_)
            | Self::PaymentNotFound(_)
            | Self::BankAccountNotFound(_) => 404,
            Self::AmountMismatch { .. }
            | Self::StatementLineReconciled(_)
            | Self::PaymentReconciled(_)
            | Self::MatchablePairsRemain(_) => 409,
            Self::Ledger(e) => e.http_status_code(),
            Self::Policy(e) => e.http_status_code(),
            Self::Database(_) => 500,
        }
    }
}

impl From<ReconciliationError> for AppError {
    fn from(err: ReconciliationError) -> Self {
        let message = err.to_string();
        match err {
            ReconciliationError::AmountMismatch { .. } => Self::AmountMismatch(message),
            ReconciliationError::StatementLineReconciled(_)
            | ReconciliationError::PaymentReconciled(_) => Self::AlreadyReconciled(message),
            ReconciliationError::BankAccountMismatch
            | ReconciliationError::PaymentNotPosted(_)
            | ReconciliationError::ClosingBalanceOutOfRange(_)
            | ReconciliationError::NothingToAdjust => Self::Validation(message),
            ReconciliationError::MatchablePairsRemain(_) => Self::InvalidStateTransition(message),
            ReconciliationError::StatementLineNotFound(_)
            | ReconciliationError::PaymentNotFound(_)
            | ReconciliationError::BankAccountNotFound(_) => Self::NotFound(message),
            ReconciliationError::Ledger(e) => e.into(),
            ReconciliationError::Policy(e) => e.into(),
            ReconciliationError::Database(_) => Self::Database(message),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_amount_mismatch_display() {
        let err = ReconciliationError::AmountMismatch {
            statement_amount: dec!(250.55),
            payment_amount: dec!(250.56),
        };
        assert_eq!(
            err.to_string(),
            "Statement amount 250.55 does not equal payment amount 250.56"
        );
        assert_eq!(err.http_status_code(), 409);
        assert!(matches!(AppError::from(err), AppError::AmountMismatch(_)));
    }

    #[test]
    fn test_already_reconciled_mapping() {
        let line = ReconciliationError::StatementLineReconciled(StatementLineId::nil());
        let payment = ReconciliationError::PaymentReconciled(PaymentId::nil());
        assert_eq!(line.error_code(), "ALREADY_RECONCILED");
        assert!(matches!(AppError::from(line), AppError::AlreadyReconciled(_)));
        assert!(matches!(AppError::from(payment), AppError::AlreadyReconciled(_)));
    }
}
