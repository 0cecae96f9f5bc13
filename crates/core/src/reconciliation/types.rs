//! Statement and payment views used by the matcher.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

use kontor_shared::types::{BankAccountId, PaymentId, StatementLineId};

/// A line from an imported bank statement.
///
/// Amounts are signed: receipts positive, withdrawals negative.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatementLine {
    /// Unique identifier.
    pub id: StatementLineId,
    /// Bank account the statement belongs to.
    pub bank_account_id: BankAccountId,
    /// Value date.
    pub transaction_date: NaiveDate,
    /// Bank narrative.
    pub description: String,
    /// Signed amount.
    pub amount: Decimal,
    /// Matched payment, once reconciled.
    pub matched_payment_id: Option<PaymentId>,
}

impl StatementLine {
    /// Returns true once matched.
    #[must_use]
    pub const fn is_reconciled(&self) -> bool {
        self.matched_payment_id.is_some()
    }
}

/// Payment lifecycle as seen by reconciliation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    /// Not yet posted to the ledger.
    Pending,
    /// Posted; eligible for matching.
    Posted,
    /// Cancelled.
    Voided,
}

impl PaymentStatus {
    /// Returns the string representation of the status.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Posted => "posted",
            Self::Voided => "voided",
        }
    }

    /// Parses a status from a string.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "pending" => Some(Self::Pending),
            "posted" => Some(Self::Posted),
            "voided" => Some(Self::Voided),
            _ => None,
        }
    }
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A payment owned by the payments ledger. Read-only here.
///
/// Amounts follow the statement convention: receipts positive, disbursements
/// negative.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentRef {
    /// Unique identifier.
    pub id: PaymentId,
    /// Bank account the payment moves money through.
    pub bank_account_id: BankAccountId,
    /// Payment date.
    pub payment_date: NaiveDate,
    /// Signed amount.
    pub amount: Decimal,
    /// Payment status.
    pub status: PaymentStatus,
    /// Whether a statement line is already matched to it.
    pub is_reconciled: bool,
}
