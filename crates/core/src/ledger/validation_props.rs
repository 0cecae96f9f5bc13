//! Property-based tests for journal line validation.

use proptest::prelude::*;
use rust_decimal::Decimal;
use std::collections::HashMap;

use kontor_shared::types::AccountId;

use super::error::LedgerError;
use super::types::{JournalLineInput, JournalTotals};
use super::validation::{AccountInfo, AccountType, validate_lines};

/// Strategy to generate a valid positive amount (> 0).
fn positive_amount() -> impl Strategy<Value = Decimal> {
    // 0.01 to 1,000,000.00
    (1i64..100_000_000i64).prop_map(|cents| Decimal::new(cents, 2))
}

fn open_chart(ids: &[AccountId]) -> HashMap<AccountId, AccountInfo> {
    ids.iter()
        .map(|id| {
            (
                *id,
                AccountInfo {
                    id: *id,
                    account_type: AccountType::Asset,
                    is_active: true,
                    allow_direct_posting: true,
                    requires_final_post: false,
                },
            )
        })
        .collect()
}

/// Balanced lines: random debits, and credits that split the same total.
fn balanced_lines() -> impl Strategy<Value = Vec<JournalLineInput>> {
    (prop::collection::vec(positive_amount(), 1..6), 1usize..4).prop_map(|(debits, splits)| {
        let debit_account = AccountId::new();
        let credit_account = AccountId::new();
        let total: Decimal = debits.iter().copied().sum();

        let mut lines: Vec<_> = debits
            .into_iter()
            .map(|amount| JournalLineInput::debit(debit_account, amount))
            .collect();

        let cents = (total * Decimal::ONE_HUNDRED).trunc();
        let share = (cents / Decimal::from(splits)).trunc() / Decimal::ONE_HUNDRED;
        let mut remaining = total;
        for _ in 1..splits {
            if share > Decimal::ZERO {
                lines.push(JournalLineInput::credit(credit_account, share));
                remaining -= share;
            }
        }
        lines.push(JournalLineInput::credit(credit_account, remaining));
        lines
    })
}

fn accounts_of(lines: &[JournalLineInput]) -> Vec<AccountId> {
    lines.iter().map(|l| l.account_id).collect()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Balanced lines on open accounts always validate, with matching totals.
    #[test]
    fn prop_balanced_lines_validate(lines in balanced_lines()) {
        let chart = open_chart(&accounts_of(&lines));
        let totals = validate_lines(&lines, |id| chart.get(&id).cloned());
        prop_assert!(totals.is_ok(), "got {:?}", totals);
        let totals = totals.unwrap();
        prop_assert_eq!(totals.debit, totals.credit);
        prop_assert_eq!(totals, JournalTotals::of(&lines).unwrap());
    }

    /// Nudging any single line by one cent breaks the balance.
    #[test]
    fn prop_one_cent_off_is_rejected(lines in balanced_lines(), pick in any::<prop::sample::Index>()) {
        let mut lines = lines;
        let index = pick.index(lines.len());
        let cent = Decimal::new(1, 2);
        if lines[index].debit.is_zero() {
            lines[index].credit += cent;
        } else {
            lines[index].debit += cent;
        }
        let chart = open_chart(&accounts_of(&lines));
        let is_unbalanced = matches!(
            validate_lines(&lines, |id| chart.get(&id).cloned()),
            Err(LedgerError::Unbalanced { .. })
        );
        prop_assert!(is_unbalanced);
    }

    /// A zero line anywhere is rejected with its index.
    #[test]
    fn prop_zero_line_rejected(lines in balanced_lines(), pick in any::<prop::sample::Index>()) {
        let mut lines = lines;
        let index = pick.index(lines.len() + 1);
        lines.insert(index, JournalLineInput::debit(AccountId::new(), Decimal::ZERO));
        let chart = open_chart(&accounts_of(&lines));
        let result = validate_lines(&lines, |id| chart.get(&id).cloned());
        let is_zero_at_index = matches!(result, Err(LedgerError::ZeroAmount { line }) if line == index);
        prop_assert!(is_zero_at_index);
    }

    /// Lines on accounts missing from the chart are rejected.
    #[test]
    fn prop_unknown_account_rejected(lines in balanced_lines()) {
        let result = validate_lines(&lines, |_| None);
        let is_not_found = matches!(result, Err(LedgerError::AccountNotFound(_)));
        prop_assert!(is_not_found);
    }
}
