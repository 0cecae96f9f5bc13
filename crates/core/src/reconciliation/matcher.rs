//! Exact-amount statement matching.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use kontor_shared::types::{AccountId, PaymentId, StatementLineId, UserId};

use super::error::ReconciliationError;
use super::types::{PaymentRef, PaymentStatus, StatementLine};
use crate::ledger::JournalLineInput;
use crate::policy::{Permission, PermissionSet, PolicyEvaluator};

/// A validated match, ready to persist.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatchDecision {
    /// The statement line.
    pub statement_line_id: StatementLineId,
    /// The payment.
    pub payment_id: PaymentId,
    /// Who matched.
    pub matched_by: UserId,
    /// When.
    pub matched_at: DateTime<Utc>,
}

/// Stateless matcher.
pub struct Matcher;

impl Matcher {
    /// Validate pairing a statement line with a payment.
    ///
    /// Requires exact decimal equality, the same bank account, a posted
    /// payment, and neither side already reconciled. Matches are permanent.
    pub fn validate_match(
        line: &StatementLine,
        payment: &PaymentRef,
        actor: UserId,
        permissions: &PermissionSet,
    ) -> Result<MatchDecision, ReconciliationError> {
        PolicyEvaluator::check_permission(permissions, Permission::BankReconcile)?;

        if line.is_reconciled() {
            return Err(ReconciliationError::StatementLineReconciled(line.id));
        }
        if payment.is_reconciled {
            return Err(ReconciliationError::PaymentReconciled(payment.id));
        }
        if line.bank_account_id != payment.bank_account_id {
            return Err(ReconciliationError::BankAccountMismatch);
        }
        if payment.status != PaymentStatus::Posted {
            return Err(ReconciliationError::PaymentNotPosted(payment.id));
        }
        if line.amount != payment.amount {
            return Err(ReconciliationError::AmountMismatch {
                statement_amount: line.amount,
                payment_amount: payment.amount,
            });
        }

        Ok(MatchDecision {
            statement_line_id: line.id,
            payment_id: payment.id,
            matched_by: actor,
            matched_at: Utc::now(),
        })
    }

    /// Returns true if the pair would pass `validate_match`.
    #[must_use]
    pub fn is_candidate(line: &StatementLine, payment: &PaymentRef) -> bool {
        !line.is_reconciled()
            && !payment.is_reconciled
            && line.bank_account_id == payment.bank_account_id
            && payment.status == PaymentStatus::Posted
            && line.amount == payment.amount
    }

    /// Payments that would match `line` exactly.
    #[must_use]
    pub fn candidates<'a>(line: &StatementLine, payments: &'a [PaymentRef]) -> Vec<&'a PaymentRef> {
        payments
            .iter()
            .filter(|payment| Self::is_candidate(line, payment))
            .collect()
    }

    /// Number of unreconciled lines that still have at least one candidate.
    #[must_use]
    pub fn matchable_lines(lines: &[StatementLine], payments: &[PaymentRef]) -> usize {
        lines
            .iter()
            .filter(|line| payments.iter().any(|p| Self::is_candidate(line, p)))
            .count()
    }

    /// Lines for an adjustment journal clearing `difference`.
    ///
    /// Only allowed once exact matches are exhausted. A positive difference
    /// (bank holds more than the books explain) debits the bank's ledger
    /// account; a negative one credits it.
    pub fn adjustment_lines(
        difference: Decimal,
        matchable_lines: usize,
        bank_gl_account: AccountId,
        offset_account: AccountId,
        permissions: &PermissionSet,
    ) -> Result<Vec<JournalLineInput>, ReconciliationError> {
        PolicyEvaluator::check_permission(permissions, Permission::BankReconcile)?;

        if difference.is_zero() {
            return Err(ReconciliationError::NothingToAdjust);
        }
        if matchable_lines > 0 {
            return Err(ReconciliationError::MatchablePairsRemain(matchable_lines));
        }

        let amount = difference.abs();
        let memo = Some("Bank reconciliation adjustment".to_string());
        let (mut bank, mut offset) = if difference > Decimal::ZERO {
            (
                JournalLineInput::debit(bank_gl_account, amount),
                JournalLineInput::credit(offset_account, amount),
            )
        } else {
            (
                JournalLineInput::credit(bank_gl_account, amount),
                JournalLineInput::debit(offset_account, amount),
            )
        };
        bank.memo.clone_from(&memo);
        offset.memo = memo;
        Ok(vec![bank, offset])
    }
}
