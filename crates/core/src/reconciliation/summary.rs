//! Reconciliation summary.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;

use super::error::ReconciliationError;
use super::types::{PaymentRef, PaymentStatus, StatementLine};
use crate::ledger::is_storable_amount;

/// Position of a bank account's reconciliation as of a date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReconciliationSummary {
    /// Cut-off date.
    pub as_of: NaiveDate,
    /// Closing balance from the bank statement.
    pub bank_closing_balance: Decimal,
    /// Ledger balance of the bank's account at the cut-off.
    pub system_bank_balance: Decimal,
    /// Statement lines up to the cut-off not yet matched.
    pub unmatched_statement_lines_count: usize,
    /// Statement lines up to the cut-off already matched.
    pub matched_count: usize,
    /// Unreconciled posted disbursements, as a positive amount.
    pub outstanding_payments: Decimal,
    /// Unreconciled posted receipts.
    pub deposits_in_transit: Decimal,
    /// `closing - system - outstanding + in transit`.
    pub difference_preview: Decimal,
}

impl ReconciliationSummary {
    /// Rejects a statement closing balance the amount columns cannot hold.
    ///
    /// # Errors
    ///
    /// Returns `ClosingBalanceOutOfRange` for an unstorable amount.
    pub fn check_closing_balance(closing: Decimal) -> Result<(), ReconciliationError> {
        if is_storable_amount(closing) {
            Ok(())
        } else {
            Err(ReconciliationError::ClosingBalanceOutOfRange(closing))
        }
    }

    /// Computes the summary from a statement and the payment ledger.
    #[must_use]
    pub fn compute(
        as_of: NaiveDate,
        bank_closing_balance: Decimal,
        system_bank_balance: Decimal,
        lines: &[StatementLine],
        payments: &[PaymentRef],
    ) -> Self {
        let in_range = lines.iter().filter(|l| l.transaction_date <= as_of);
        let matched_count = in_range.clone().filter(|l| l.is_reconciled()).count();
        let unmatched_statement_lines_count = in_range.count() - matched_count;

        let (outstanding_payments, deposits_in_transit) = payments
            .iter()
            .filter(|p| {
                p.status == PaymentStatus::Posted && !p.is_reconciled && p.payment_date <= as_of
            })
            .fold((Decimal::ZERO, Decimal::ZERO), |(out, dit), p| {
                if p.amount < Decimal::ZERO {
                    (out - p.amount, dit)
                } else {
                    (out, dit + p.amount)
                }
            });

        Self {
            as_of,
            bank_closing_balance,
            system_bank_balance,
            unmatched_statement_lines_count,
            matched_count,
            outstanding_payments,
            deposits_in_transit,
            difference_preview: bank_closing_balance - system_bank_balance - outstanding_payments
                + deposits_in_transit,
        }
    }

    /// Returns true when the books and the bank agree.
    #[must_use]
    pub fn is_reconciled(&self) -> bool {
        self.difference_preview.is_zero()
    }
}
