//! Period balance effects of posting.

use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::BTreeMap;

use kontor_shared::types::AccountId;

use super::types::JournalLineInput;

/// Amount a posting adds to one account's period totals.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PeriodBalanceDelta {
    /// The account.
    pub account_id: AccountId,
    /// Debits to add.
    pub debit: Decimal,
    /// Credits to add.
    pub credit: Decimal,
}

/// Committed debit and credit totals for an account in a period.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountPeriodBalance {
    /// The account.
    pub account_id: AccountId,
    /// Total posted debits.
    pub debit_total: Decimal,
    /// Total posted credits.
    pub credit_total: Decimal,
}

impl AccountPeriodBalance {
    /// Debits minus credits.
    #[must_use]
    pub fn net(&self) -> Decimal {
        self.debit_total - self.credit_total
    }

    /// Applies a delta.
    #[must_use]
    pub fn apply(self, delta: &PeriodBalanceDelta) -> Self {
        Self {
            debit_total: self.debit_total + delta.debit,
            credit_total: self.credit_total + delta.credit,
            ..self
        }
    }
}

/// Collapses lines into one delta per account, ordered by account id.
///
/// The ordering gives every posting transaction the same lock order on
/// balance rows.
#[must_use]
pub fn aggregate_deltas(lines: &[JournalLineInput]) -> Vec<PeriodBalanceDelta> {
    let mut by_account: BTreeMap<AccountId, (Decimal, Decimal)> = BTreeMap::new();
    for line in lines {
        let entry = by_account.entry(line.account_id).or_default();
        entry.0 += line.debit;
        entry.1 += line.credit;
    }
    by_account
        .into_iter()
        .map(|(account_id, (debit, credit))| PeriodBalanceDelta {
            account_id,
            debit,
            credit,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_aggregate_merges_accounts() {
        let cash = AccountId::new();
        let revenue = AccountId::new();
        let deltas = aggregate_deltas(&[
            JournalLineInput::debit(cash, dec!(40.00)),
            JournalLineInput::debit(cash, dec!(60.00)),
            JournalLineInput::credit(revenue, dec!(100.00)),
        ]);
        assert_eq!(deltas.len(), 2);
        let cash_delta = deltas.iter().find(|d| d.account_id == cash).unwrap();
        assert_eq!(cash_delta.debit, dec!(100.00));
        assert_eq!(cash_delta.credit, Decimal::ZERO);
    }

    #[test]
    fn test_aggregate_is_sorted() {
        let lines: Vec<_> = (0..5)
            .map(|_| JournalLineInput::debit(AccountId::new(), dec!(1)))
            .rev()
            .collect();
        let deltas = aggregate_deltas(&lines);
        assert!(deltas.windows(2).all(|w| w[0].account_id < w[1].account_id));
    }

    #[test]
    fn test_apply_and_net() {
        let account_id = AccountId::new();
        let balance = AccountPeriodBalance {
            account_id,
            debit_total: dec!(10),
            credit_total: dec!(4),
        }
        .apply(&PeriodBalanceDelta {
            account_id,
            debit: dec!(1),
            credit: dec!(2),
        });
        assert_eq!(balance.debit_total, dec!(11));
        assert_eq!(balance.credit_total, dec!(6));
        assert_eq!(balance.net(), dec!(5));
    }
}
