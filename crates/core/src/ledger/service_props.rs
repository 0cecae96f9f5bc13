//! Property-based tests for the journal state machine.

use chrono::NaiveDate;
use proptest::prelude::*;
use rust_decimal::Decimal;
use uuid::Uuid;

use kontor_shared::types::{PeriodId, UserId};

use super::error::LedgerError;
use super::service::JournalService;
use super::types::{JournalState, JournalStatus, JournalTotals};
use crate::period::{AccountingPeriod, PeriodStatus};
use crate::policy::{Permission, PermissionSet, SodRule};

fn arb_status() -> impl Strategy<Value = JournalStatus> {
    prop_oneof![
        Just(JournalStatus::Draft),
        Just(JournalStatus::Submitted),
        Just(JournalStatus::Approved),
        Just(JournalStatus::Posted),
    ]
}

fn arb_period_status() -> impl Strategy<Value = PeriodStatus> {
    prop_oneof![
        Just(PeriodStatus::Open),
        Just(PeriodStatus::Closed),
        Just(PeriodStatus::Locked),
    ]
}

fn arb_user() -> impl Strategy<Value = UserId> {
    any::<u128>().prop_map(|n| UserId::from_uuid(Uuid::from_u128(n)))
}

fn arb_totals() -> impl Strategy<Value = JournalTotals> {
    (1i64..1_000_000, 0i64..3).prop_map(|(cents, skew)| JournalTotals {
        debit: Decimal::new(cents, 2),
        credit: Decimal::new(cents + skew, 2),
    })
}

fn all() -> PermissionSet {
    Permission::ALL.into_iter().collect()
}

fn baseline() -> Vec<SodRule> {
    SodRule::BASELINE
        .iter()
        .map(|(a, b, d)| SodRule::new(*a, *b, d))
        .collect()
}

fn period(status: PeriodStatus) -> AccountingPeriod {
    AccountingPeriod {
        id: PeriodId::new(),
        start_date: NaiveDate::from_ymd_opt(2025, 1, 1).unwrap_or_default(),
        end_date: NaiveDate::from_ymd_opt(2025, 1, 31).unwrap_or_default(),
        status,
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Every successful transition is one the state table allows.
    #[test]
    fn prop_transitions_follow_table(
        status in arb_status(),
        period_status in arb_period_status(),
        creator in arb_user(),
        actor in arb_user(),
        totals in arb_totals(),
    ) {
        let state = JournalState {
            status,
            created_by: creator,
            submitted_by: Some(creator),
            approved_by: None,
            totals,
        };
        let rules = baseline();
        let p = period(period_status);

        let results = [
            JournalService::submit(&state, actor, &all(), &rules, &p),
            JournalService::approve(&state, actor, &all(), &rules),
            JournalService::post(&state, actor, &all(), &rules, false, &p),
            JournalService::reject(&state, actor, &all(), "reason".into()),
        ];
        for action in results.into_iter().flatten() {
            prop_assert!(JournalService::is_valid_transition(status, action.new_status()));
        }
    }

    /// Nothing leaves POSTED.
    #[test]
    fn prop_posted_is_terminal(actor in arb_user(), creator in arb_user()) {
        let state = JournalState {
            status: JournalStatus::Posted,
            created_by: creator,
            submitted_by: Some(creator),
            approved_by: Some(actor),
            totals: JournalTotals::default(),
        };
        let open = period(PeriodStatus::Open);
        prop_assert!(JournalService::submit(&state, actor, &all(), &[], &open).is_err());
        prop_assert!(JournalService::approve(&state, actor, &all(), &[]).is_err());
        prop_assert!(JournalService::post(&state, actor, &all(), &[], false, &open).is_err());
        prop_assert!(JournalService::reject(&state, actor, &all(), "r".into()).is_err());
        prop_assert!(JournalService::validate_can_edit(state.status).is_err());
    }

    /// Submission never lets an unbalanced journal through.
    #[test]
    fn prop_submit_requires_balance(totals in arb_totals(), actor in arb_user()) {
        let state = JournalState {
            status: JournalStatus::Draft,
            created_by: actor,
            submitted_by: None,
            approved_by: None,
            totals,
        };
        let result = JournalService::submit(&state, actor, &all(), &[], &period(PeriodStatus::Open));
        prop_assert_eq!(result.is_ok(), totals.is_balanced());
    }

    /// Approve by the creator always fails with a policy error.
    #[test]
    fn prop_creator_never_approves(creator in arb_user(), submitter in arb_user()) {
        let state = JournalState {
            status: JournalStatus::Submitted,
            created_by: creator,
            submitted_by: Some(submitter),
            approved_by: None,
            totals: JournalTotals::default(),
        };
        let is_policy = matches!(
            JournalService::approve(&state, creator, &all(), &baseline()),
            Err(LedgerError::Policy(_))
        );
        prop_assert!(is_policy);
    }

    /// Posting succeeds only into an open period.
    #[test]
    fn prop_post_needs_open_period(period_status in arb_period_status(), actor in arb_user()) {
        let state = JournalState {
            status: JournalStatus::Approved,
            created_by: UserId::new(),
            submitted_by: Some(UserId::new()),
            approved_by: Some(UserId::new()),
            totals: JournalTotals::default(),
        };
        let result = JournalService::post(&state, actor, &all(), &baseline(), false, &period(period_status));
        match period_status {
            PeriodStatus::Open => prop_assert!(result.is_ok()),
            _ => {
                let is_closed = matches!(result, Err(LedgerError::PeriodClosed { .. }));
                prop_assert!(is_closed);
            }
        }
    }
}
