//! Journal domain types.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use kontor_shared::types::{AccountId, UserId};

use super::error::LedgerError;

/// Journal status in the maker-checker chain.
///
/// - Draft → Submitted (submit)
/// - Submitted → Approved (approve)
/// - Approved → Posted (post)
/// - Submitted | Approved → Draft (reject)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JournalStatus {
    /// Being prepared; the only mutable state.
    Draft,
    /// Waiting for a checker.
    Submitted,
    /// Checked; ready to post.
    Approved,
    /// Committed to period balances. Terminal.
    Posted,
}

impl JournalStatus {
    /// Returns the string representation of the status.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Draft => "DRAFT",
            Self::Submitted => "SUBMITTED",
            Self::Approved => "APPROVED",
            Self::Posted => "POSTED",
        }
    }

    /// Parses a status from a string.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "DRAFT" => Some(Self::Draft),
            "SUBMITTED" => Some(Self::Submitted),
            "APPROVED" => Some(Self::Approved),
            "POSTED" => Some(Self::Posted),
            _ => None,
        }
    }

    /// Returns true if lines and date may still change.
    #[must_use]
    pub const fn is_editable(&self) -> bool {
        matches!(self, Self::Draft)
    }

    /// Returns true once posted.
    #[must_use]
    pub const fn is_immutable(&self) -> bool {
        matches!(self, Self::Posted)
    }
}

impl fmt::Display for JournalStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Optional analytic tags on a line.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Dimensions {
    /// Department.
    pub department_id: Option<Uuid>,
    /// Project.
    pub project_id: Option<Uuid>,
    /// Fund.
    pub fund_id: Option<Uuid>,
}

/// Side of a journal line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    /// Debit.
    Debit,
    /// Credit.
    Credit,
}

/// A journal line as supplied by a caller or a template.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JournalLineInput {
    /// The account to post to.
    pub account_id: AccountId,
    /// Debit amount; zero on credit lines.
    #[serde(default)]
    pub debit: Decimal,
    /// Credit amount; zero on debit lines.
    #[serde(default)]
    pub credit: Decimal,
    /// Optional line memo.
    #[serde(default)]
    pub memo: Option<String>,
    /// Analytic dimensions.
    #[serde(default)]
    pub dimensions: Dimensions,
}

impl JournalLineInput {
    /// A debit line.
    #[must_use]
    pub fn debit(account_id: AccountId, amount: Decimal) -> Self {
        Self {
            account_id,
            debit: amount,
            credit: Decimal::ZERO,
            memo: None,
            dimensions: Dimensions::default(),
        }
    }

    /// A credit line.
    #[must_use]
    pub fn credit(account_id: AccountId, amount: Decimal) -> Self {
        Self {
            account_id,
            debit: Decimal::ZERO,
            credit: amount,
            memo: None,
            dimensions: Dimensions::default(),
        }
    }

    /// The line's side, if exactly one amount is non-zero.
    #[must_use]
    pub fn side(&self) -> Option<Side> {
        match (self.debit.is_zero(), self.credit.is_zero()) {
            (false, true) => Some(Side::Debit),
            (true, false) => Some(Side::Credit),
            _ => None,
        }
    }

    /// The non-zero amount, or zero.
    #[must_use]
    pub fn amount(&self) -> Decimal {
        if self.debit.is_zero() {
            self.credit
        } else {
            self.debit
        }
    }
}

/// Sum of debits and credits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JournalTotals {
    /// Total debits.
    pub debit: Decimal,
    /// Total credits.
    pub credit: Decimal,
}

impl JournalTotals {
    /// Totals the given lines without validating them.
    ///
    /// # Errors
    ///
    /// Returns `AmountOutOfRange` for the line at which a sum overflows.
    pub fn of(lines: &[JournalLineInput]) -> Result<Self, LedgerError> {
        lines
            .iter()
            .enumerate()
            .try_fold(Self::default(), |acc, (index, line)| {
                let out_of_range = || LedgerError::AmountOutOfRange { line: index };
                Ok(Self {
                    debit: acc.debit.checked_add(line.debit).ok_or_else(out_of_range)?,
                    credit: acc.credit.checked_add(line.credit).ok_or_else(out_of_range)?,
                })
            })
    }

    /// Exact equality of debits and credits.
    #[must_use]
    pub fn is_balanced(&self) -> bool {
        self.debit == self.credit
    }

    /// Debits minus credits.
    #[must_use]
    pub fn difference(&self) -> Decimal {
        self.debit - self.credit
    }
}

/// What the state machine needs to know about a stored journal.
#[derive(Debug, Clone, Copy)]
pub struct JournalState {
    /// Current status.
    pub status: JournalStatus,
    /// Creator.
    pub created_by: UserId,
    /// Submitter, once submitted.
    pub submitted_by: Option<UserId>,
    /// Approver, once approved.
    pub approved_by: Option<UserId>,
    /// Line totals.
    pub totals: JournalTotals,
}

/// A validated state change, with the audit fields to persist.
#[derive(Debug, Clone)]
pub enum JournalAction {
    /// Draft submitted for approval.
    Submit {
        /// The new status.
        new_status: JournalStatus,
        /// Who submitted.
        submitted_by: UserId,
        /// When.
        submitted_at: DateTime<Utc>,
    },
    /// Submitted journal approved.
    Approve {
        /// The new status.
        new_status: JournalStatus,
        /// Who approved.
        approved_by: UserId,
        /// When.
        approved_at: DateTime<Utc>,
    },
    /// Journal returned to draft.
    Reject {
        /// The new status (Draft).
        new_status: JournalStatus,
        /// Who rejected.
        rejected_by: UserId,
        /// Why.
        reason: String,
    },
    /// Approved journal posted.
    Post {
        /// The new status.
        new_status: JournalStatus,
        /// Who posted.
        posted_by: UserId,
        /// When.
        posted_at: DateTime<Utc>,
    },
}

impl JournalAction {
    /// Returns the new status resulting from this action.
    #[must_use]
    pub const fn new_status(&self) -> JournalStatus {
        match self {
            Self::Submit { new_status, .. }
            | Self::Approve { new_status, .. }
            | Self::Reject { new_status, .. }
            | Self::Post { new_status, .. } => *new_status,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_status_round_trip() {
        for status in [
            JournalStatus::Draft,
            JournalStatus::Submitted,
            JournalStatus::Approved,
            JournalStatus::Posted,
        ] {
            assert_eq!(JournalStatus::parse(status.as_str()), Some(status));
        }
        assert_eq!(JournalStatus::parse("voided"), None);
    }

    #[test]
    fn test_only_draft_editable() {
        assert!(JournalStatus::Draft.is_editable());
        assert!(!JournalStatus::Submitted.is_editable());
        assert!(!JournalStatus::Approved.is_editable());
        assert!(JournalStatus::Posted.is_immutable());
    }

    #[test]
    fn test_line_side() {
        let account = AccountId::new();
        assert_eq!(JournalLineInput::debit(account, dec!(5)).side(), Some(Side::Debit));
        assert_eq!(JournalLineInput::credit(account, dec!(5)).side(), Some(Side::Credit));
        assert_eq!(JournalLineInput::debit(account, dec!(0)).side(), None);

        let both = JournalLineInput {
            credit: dec!(1),
            ..JournalLineInput::debit(account, dec!(1))
        };
        assert_eq!(both.side(), None);
    }

    #[test]
    fn test_line_deserializes_missing_side_as_zero() {
        let json = format!(r#"{{"accountId":"{}","debit":"100.00"}}"#, AccountId::new());
        let line: JournalLineInput = serde_json::from_str(&json).unwrap();
        assert_eq!(line.debit, dec!(100.00));
        assert_eq!(line.credit, Decimal::ZERO);
        assert_eq!(line.dimensions, Dimensions::default());
    }

    #[test]
    fn test_totals() {
        let account = AccountId::new();
        let totals = JournalTotals::of(&[
            JournalLineInput::debit(account, dec!(60.00)),
            JournalLineInput::debit(account, dec!(40.00)),
            JournalLineInput::credit(account, dec!(100.00)),
        ])
        .unwrap();
        assert!(totals.is_balanced());
        assert_eq!(totals.debit, dec!(100.00));
        assert_eq!(totals.difference(), Decimal::ZERO);
    }

    #[test]
    fn test_totals_overflow_names_the_line() {
        let account = AccountId::new();
        let result = JournalTotals::of(&[
            JournalLineInput::debit(account, Decimal::MAX),
            JournalLineInput::credit(account, Decimal::MAX),
            JournalLineInput::debit(account, Decimal::MAX),
        ]);
        assert!(matches!(result, Err(LedgerError::AmountOutOfRange { line: 2 })));
    }
}
