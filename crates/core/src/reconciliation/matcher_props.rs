//! Property-based tests for statement matching.

use chrono::NaiveDate;
use proptest::prelude::*;
use rust_decimal::Decimal;

use kontor_shared::types::{BankAccountId, PaymentId, StatementLineId, UserId};

use super::error::ReconciliationError;
use super::matcher::Matcher;
use super::summary::ReconciliationSummary;
use super::types::{PaymentRef, PaymentStatus, StatementLine};
use crate::policy::{Permission, PermissionSet};

/// Signed cent amounts between -100,000.00 and 100,000.00, never zero.
fn arb_amount() -> impl Strategy<Value = Decimal> {
    prop_oneof![
        (1i64..10_000_000).prop_map(|c| Decimal::new(c, 2)),
        (1i64..10_000_000).prop_map(|c| Decimal::new(-c, 2)),
    ]
}

fn all() -> PermissionSet {
    Permission::ALL.into_iter().collect()
}

fn line(bank: BankAccountId, amount: Decimal) -> StatementLine {
    StatementLine {
        id: StatementLineId::new(),
        bank_account_id: bank,
        transaction_date: NaiveDate::from_ymd_opt(2025, 1, 10).unwrap_or_default(),
        description: String::new(),
        amount,
        matched_payment_id: None,
    }
}

fn payment(bank: BankAccountId, amount: Decimal) -> PaymentRef {
    PaymentRef {
        id: PaymentId::new(),
        bank_account_id: bank,
        payment_date: NaiveDate::from_ymd_opt(2025, 1, 10).unwrap_or_default(),
        amount,
        status: PaymentStatus::Posted,
        is_reconciled: false,
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Two unreconciled sides on one account match iff the amounts are equal.
    #[test]
    fn prop_match_iff_equal(a in arb_amount(), b in arb_amount()) {
        let bank = BankAccountId::new();
        let result = Matcher::validate_match(&line(bank, a), &payment(bank, b), UserId::new(), &all());
        if a == b {
            prop_assert!(result.is_ok());
        } else {
            let is_mismatch = matches!(result, Err(ReconciliationError::AmountMismatch { .. }));
            prop_assert!(is_mismatch);
        }
    }

    /// Once a line is matched it never matches again.
    #[test]
    fn prop_no_rematch(a in arb_amount()) {
        let bank = BankAccountId::new();
        let mut l = line(bank, a);
        let p = payment(bank, a);
        let decision = Matcher::validate_match(&l, &p, UserId::new(), &all());
        prop_assert!(decision.is_ok());
        l.matched_payment_id = Some(p.id);

        let again = payment(bank, a);
        prop_assert!(Matcher::validate_match(&l, &again, UserId::new(), &all()).is_err());
        prop_assert!(Matcher::candidates(&l, &[again]).is_empty());
    }

    /// Adding an unreconciled receipt moves the difference by exactly its amount,
    /// and an unreconciled disbursement moves it back by its magnitude.
    #[test]
    fn prop_difference_tracks_outstanding_items(
        closing in arb_amount(),
        system in arb_amount(),
        item in arb_amount(),
    ) {
        let bank = BankAccountId::new();
        let as_of = NaiveDate::from_ymd_opt(2025, 1, 31).unwrap_or_default();
        let base = ReconciliationSummary::compute(as_of, closing, system, &[], &[]);
        let with_item = ReconciliationSummary::compute(as_of, closing, system, &[], &[payment(bank, item)]);
        prop_assert_eq!(base.difference_preview, closing - system);
        prop_assert_eq!(with_item.difference_preview - base.difference_preview, item);
    }
}
