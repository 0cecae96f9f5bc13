//! Property-based tests for PeriodService.

use chrono::Utc;
use proptest::prelude::*;

use kontor_shared::types::UserId;

use crate::period::checklist::ChecklistItem;
use crate::period::error::PeriodError;
use crate::period::service::{PeriodAction, PeriodService};
use crate::period::types::PeriodStatus;
use crate::policy::{Permission, PermissionSet};

fn arb_status() -> impl Strategy<Value = PeriodStatus> {
    prop_oneof![
        Just(PeriodStatus::Open),
        Just(PeriodStatus::Closed),
        Just(PeriodStatus::Locked),
    ]
}

/// Baseline checklist with each item independently completed or not.
fn arb_checklist() -> impl Strategy<Value = Vec<ChecklistItem>> {
    prop::collection::vec(any::<bool>(), 6).prop_map(|done| {
        ChecklistItem::baseline()
            .into_iter()
            .zip(done)
            .map(|(mut item, complete)| {
                if complete {
                    item.completed_by = Some(UserId::new());
                    item.completed_at = Some(Utc::now());
                }
                item
            })
            .collect()
    })
}

fn all() -> PermissionSet {
    Permission::ALL.into_iter().collect()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// An open period closes iff every item is complete.
    #[test]
    fn prop_close_iff_checklist_complete(checklist in arb_checklist()) {
        let complete = checklist.iter().all(ChecklistItem::is_complete);
        let result = PeriodService::close(PeriodStatus::Open, UserId::new(), &all(), &checklist, true);
        match result {
            Ok(action) => {
                prop_assert!(complete);
                prop_assert_eq!(action.new_status(), PeriodStatus::Closed);
            }
            Err(PeriodError::ChecklistIncomplete { outstanding }) => {
                prop_assert!(!complete);
                let expected = checklist.iter().filter(|i| !i.is_complete()).count();
                prop_assert_eq!(outstanding.len(), expected);
            }
            Err(other) => prop_assert!(false, "unexpected error {other:?}"),
        }
    }

    /// Without the relevant permission nothing transitions.
    #[test]
    fn prop_transitions_require_permission(status in arb_status()) {
        let none = PermissionSet::new();
        let actor = UserId::new();
        prop_assert!(PeriodService::close(status, actor, &none, &[], false).is_err());
        prop_assert!(PeriodService::lock(status, actor, &none).is_err());
        prop_assert!(PeriodService::reopen(status, actor, &none).is_err());
    }

    /// Every successful action lands in a status allowed for it.
    #[test]
    fn prop_action_targets(status in arb_status()) {
        let actor = UserId::new();
        if let Ok(action) = PeriodService::close(status, actor, &all(), &[], false) {
            prop_assert_eq!(action.new_status(), PeriodStatus::Closed);
        }
        if let Ok(action) = PeriodService::lock(status, actor, &all()) {
            prop_assert_eq!(action.new_status(), PeriodStatus::Locked);
        }
        if let Ok(action) = PeriodService::reopen(status, actor, &all()) {
            let is_transition = matches!(action, PeriodAction::Transition { .. });
            prop_assert!(is_transition);
            prop_assert_eq!(action.new_status(), PeriodStatus::Open);
        }
    }
}
