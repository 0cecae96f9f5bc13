//! Period state transitions and calendar rules.

use chrono::{DateTime, NaiveDate, Utc};

use kontor_shared::types::UserId;

use super::checklist::{ChecklistCompletion, ChecklistItem};
use super::error::PeriodError;
use super::types::{AccountingPeriod, PeriodStatus};
use crate::policy::{Permission, PermissionSet, PolicyEvaluator};

/// Outcome of a period transition request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PeriodAction {
    /// The status changes.
    Transition {
        /// Status before.
        from: PeriodStatus,
        /// Status after.
        to: PeriodStatus,
        /// Who performed it.
        actor: UserId,
        /// When it was performed.
        at: DateTime<Utc>,
    },
    /// The period is already in the requested state.
    Unchanged(PeriodStatus),
}

impl PeriodAction {
    /// Returns the status after this action.
    #[must_use]
    pub const fn new_status(&self) -> PeriodStatus {
        match self {
            Self::Transition { to, .. } => *to,
            Self::Unchanged(status) => *status,
        }
    }

    fn transition(from: PeriodStatus, to: PeriodStatus, actor: UserId) -> Self {
        Self::Transition {
            from,
            to,
            actor,
            at: Utc::now(),
        }
    }
}

/// Stateless service for accounting period rules.
pub struct PeriodService;

impl PeriodService {
    /// Close an open period.
    ///
    /// Closing a closed period is a no-op. When `require_checklist` is set,
    /// every checklist item must be complete.
    pub fn close(
        current: PeriodStatus,
        actor: UserId,
        permissions: &PermissionSet,
        checklist: &[ChecklistItem],
        require_checklist: bool,
    ) -> Result<PeriodAction, PeriodError> {
        PolicyEvaluator::check_permission(permissions, Permission::PeriodClose)?;

        match current {
            PeriodStatus::Open => {
                if require_checklist {
                    let outstanding = Self::outstanding_items(checklist);
                    if !outstanding.is_empty() {
                        return Err(PeriodError::ChecklistIncomplete { outstanding });
                    }
                }
                Ok(PeriodAction::transition(current, PeriodStatus::Closed, actor))
            }
            PeriodStatus::Closed => Ok(PeriodAction::Unchanged(current)),
            PeriodStatus::Locked => Err(PeriodError::InvalidTransition {
                from: current,
                to: PeriodStatus::Closed,
            }),
        }
    }

    /// Lock a closed period. Locking a locked period is a no-op.
    pub fn lock(
        current: PeriodStatus,
        actor: UserId,
        permissions: &PermissionSet,
    ) -> Result<PeriodAction, PeriodError> {
        PolicyEvaluator::check_permission(permissions, Permission::PeriodLock)?;

        match current {
            PeriodStatus::Closed => Ok(PeriodAction::transition(current, PeriodStatus::Locked, actor)),
            PeriodStatus::Locked => Ok(PeriodAction::Unchanged(current)),
            PeriodStatus::Open => Err(PeriodError::InvalidTransition {
                from: current,
                to: PeriodStatus::Locked,
            }),
        }
    }

    /// Reopen a closed or locked period.
    pub fn reopen(
        current: PeriodStatus,
        actor: UserId,
        permissions: &PermissionSet,
    ) -> Result<PeriodAction, PeriodError> {
        PolicyEvaluator::check_permission(permissions, Permission::PeriodReopen)?;

        match current {
            PeriodStatus::Closed | PeriodStatus::Locked => {
                Ok(PeriodAction::transition(current, PeriodStatus::Open, actor))
            }
            PeriodStatus::Open => Err(PeriodError::InvalidTransition {
                from: current,
                to: PeriodStatus::Open,
            }),
        }
    }

    /// Sign off a checklist item. Idempotent.
    pub fn complete_item(
        item: &ChecklistItem,
        actor: UserId,
        permissions: &PermissionSet,
    ) -> Result<ChecklistCompletion, PeriodError> {
        PolicyEvaluator::check_permission(permissions, Permission::PeriodChecklistComplete)?;

        if item.is_complete() {
            return Ok(ChecklistCompletion::AlreadyComplete);
        }
        Ok(ChecklistCompletion::Completed {
            completed_by: actor,
            completed_at: Utc::now(),
        })
    }

    /// Codes of items not yet signed off.
    #[must_use]
    pub fn outstanding_items(checklist: &[ChecklistItem]) -> Vec<String> {
        checklist
            .iter()
            .filter(|item| !item.is_complete())
            .map(|item| item.code.clone())
            .collect()
    }

    /// Validates a new period against the tenant's existing calendar.
    ///
    /// Periods may not overlap and must extend the calendar at either end
    /// without leaving a gap.
    pub fn validate_new_period(
        start: NaiveDate,
        end: NaiveDate,
        existing: &[AccountingPeriod],
    ) -> Result<(), PeriodError> {
        if end < start {
            return Err(PeriodError::InvalidDateRange { start, end });
        }

        if let Some(clash) = existing.iter().find(|p| p.overlaps(start, end)) {
            return Err(PeriodError::Overlaps(clash.id));
        }

        let (Some(first_start), Some(last_end)) = (
            existing.iter().map(|p| p.start_date).min(),
            existing.iter().map(|p| p.end_date).max(),
        ) else {
            return Ok(());
        };

        let expected_start = last_end
            .succ_opt()
            .ok_or(PeriodError::InvalidDateRange { start, end })?;
        let expected_end = first_start
            .pred_opt()
            .ok_or(PeriodError::InvalidDateRange { start, end })?;

        if start == expected_start || end == expected_end {
            Ok(())
        } else {
            Err(PeriodError::NotContiguous {
                expected_start,
                expected_end,
            })
        }
    }

    /// Finds the period containing `date`.
    pub fn find_period_for_date(
        periods: &[AccountingPeriod],
        date: NaiveDate,
    ) -> Result<&AccountingPeriod, PeriodError> {
        periods
            .iter()
            .find(|p| p.contains_date(date))
            .ok_or(PeriodError::NoPeriodForDate(date))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kontor_shared::types::PeriodId;
    use rstest::rstest;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn all() -> PermissionSet {
        Permission::ALL.into_iter().collect()
    }

    fn period(start: NaiveDate, end: NaiveDate) -> AccountingPeriod {
        AccountingPeriod {
            id: PeriodId::new(),
            start_date: start,
            end_date: end,
            status: PeriodStatus::Open,
        }
    }

    fn completed_checklist() -> Vec<ChecklistItem> {
        ChecklistItem::baseline()
            .into_iter()
            .map(|mut item| {
                item.completed_by = Some(UserId::new());
                item.completed_at = Some(Utc::now());
                item
            })
            .collect()
    }

    #[test]
    fn test_close_requires_checklist() {
        let result = PeriodService::close(
            PeriodStatus::Open,
            UserId::new(),
            &all(),
            &ChecklistItem::baseline(),
            true,
        );
        match result {
            Err(PeriodError::ChecklistIncomplete { outstanding }) => assert_eq!(outstanding.len(), 6),
            other => panic!("expected ChecklistIncomplete, got {other:?}"),
        }
    }

    #[test]
    fn test_close_without_checklist_policy() {
        let action = PeriodService::close(
            PeriodStatus::Open,
            UserId::new(),
            &all(),
            &ChecklistItem::baseline(),
            false,
        )
        .unwrap();
        assert_eq!(action.new_status(), PeriodStatus::Closed);
    }

    #[test]
    fn test_close_is_idempotent() {
        let checklist = completed_checklist();
        let first = PeriodService::close(PeriodStatus::Open, UserId::new(), &all(), &checklist, true).unwrap();
        assert!(matches!(first, PeriodAction::Transition { to: PeriodStatus::Closed, .. }));
        let again = PeriodService::close(first.new_status(), UserId::new(), &all(), &checklist, true).unwrap();
        assert_eq!(again, PeriodAction::Unchanged(PeriodStatus::Closed));
    }

    #[rstest]
    #[case(PeriodStatus::Closed, PeriodStatus::Open)]
    #[case(PeriodStatus::Locked, PeriodStatus::Open)]
    fn test_reopen(#[case] from: PeriodStatus, #[case] to: PeriodStatus) {
        let action = PeriodService::reopen(from, UserId::new(), &all()).unwrap();
        assert_eq!(action.new_status(), to);
    }

    #[test]
    fn test_reopen_requires_permission() {
        let perms: PermissionSet = [Permission::PeriodClose, Permission::PeriodLock].into();
        let result = PeriodService::reopen(PeriodStatus::Locked, UserId::new(), &perms);
        assert!(matches!(result, Err(PeriodError::Policy(_))));
    }

    #[test]
    fn test_lock_only_from_closed() {
        assert!(matches!(
            PeriodService::lock(PeriodStatus::Open, UserId::new(), &all()),
            Err(PeriodError::InvalidTransition { .. })
        ));
        let locked = PeriodService::lock(PeriodStatus::Closed, UserId::new(), &all()).unwrap();
        assert_eq!(locked.new_status(), PeriodStatus::Locked);
        assert!(matches!(
            PeriodService::close(PeriodStatus::Locked, UserId::new(), &all(), &[], false),
            Err(PeriodError::InvalidTransition { .. })
        ));
    }

    #[test]
    fn test_complete_item_idempotent() {
        let mut item = ChecklistItem::new("BANK_RECONCILED", "Bank");
        let actor = UserId::new();
        let first = PeriodService::complete_item(&item, actor, &all()).unwrap();
        let ChecklistCompletion::Completed { completed_by, completed_at } = first else {
            panic!("expected completion");
        };
        assert_eq!(completed_by, actor);
        item.completed_by = Some(completed_by);
        item.completed_at = Some(completed_at);
        assert_eq!(
            PeriodService::complete_item(&item, UserId::new(), &all()).unwrap(),
            ChecklistCompletion::AlreadyComplete
        );
    }

    #[test]
    fn test_new_period_layout() {
        let existing = vec![period(date(2025, 1, 1), date(2025, 1, 31))];

        assert!(PeriodService::validate_new_period(date(2025, 2, 1), date(2025, 2, 28), &existing).is_ok());
        assert!(PeriodService::validate_new_period(date(2024, 12, 1), date(2024, 12, 31), &existing).is_ok());
        assert!(matches!(
            PeriodService::validate_new_period(date(2025, 1, 15), date(2025, 2, 15), &existing),
            Err(PeriodError::Overlaps(_))
        ));
        assert!(matches!(
            PeriodService::validate_new_period(date(2025, 3, 1), date(2025, 3, 31), &existing),
            Err(PeriodError::NotContiguous { .. })
        ));
        assert!(matches!(
            PeriodService::validate_new_period(date(2025, 3, 31), date(2025, 3, 1), &[]),
            Err(PeriodError::InvalidDateRange { .. })
        ));
    }

    #[test]
    fn test_find_period_for_date() {
        let periods = vec![
            period(date(2025, 1, 1), date(2025, 1, 31)),
            period(date(2025, 2, 1), date(2025, 2, 28)),
        ];
        let found = PeriodService::find_period_for_date(&periods, date(2025, 2, 14)).unwrap();
        assert_eq!(found.id, periods[1].id);
        assert!(matches!(
            PeriodService::find_period_for_date(&periods, date(2025, 3, 1)),
            Err(PeriodError::NoPeriodForDate(_))
        ));
    }
}
