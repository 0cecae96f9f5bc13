//! Journal lifecycle state machine.
//!
//! Every method is a pure check: given the stored facts, decide whether the
//! transition is allowed and return the fields to persist.

use chrono::{NaiveDate, Utc};

use kontor_shared::types::{AccountId, PeriodId, UserId};

use super::error::LedgerError;
use super::types::{JournalAction, JournalLineInput, JournalState, JournalStatus, JournalTotals};
use super::validation::{AccountInfo, validate_lines};
use crate::period::{AccountingPeriod, PeriodService};
use crate::policy::{ActionContext, Permission, PermissionSet, PolicyEvaluator, PriorStep, SodRule};

/// A validated draft ready to persist.
#[derive(Debug, Clone, Copy)]
pub struct DraftJournal {
    /// Period containing the journal date.
    pub period_id: PeriodId,
    /// Line totals.
    pub totals: JournalTotals,
}

/// Stateless service for journal validation and transitions.
pub struct JournalService;

impl JournalService {
    /// Validate lines and resolve the period for a draft journal.
    ///
    /// No permission check; callers creating drafts on behalf of templates or
    /// reconciliation check their own permission first.
    pub fn prepare_draft<A>(
        lines: &[JournalLineInput],
        journal_date: NaiveDate,
        periods: &[AccountingPeriod],
        account_lookup: A,
    ) -> Result<DraftJournal, LedgerError>
    where
        A: Fn(AccountId) -> Option<AccountInfo>,
    {
        let period = PeriodService::find_period_for_date(periods, journal_date)
            .map_err(|_| LedgerError::NoPeriodForDate(journal_date))?;
        let totals = validate_lines(lines, account_lookup)?;
        Ok(DraftJournal {
            period_id: period.id,
            totals,
        })
    }

    /// Create a draft journal.
    pub fn create<A>(
        permissions: &PermissionSet,
        lines: &[JournalLineInput],
        journal_date: NaiveDate,
        periods: &[AccountingPeriod],
        account_lookup: A,
    ) -> Result<DraftJournal, LedgerError>
    where
        A: Fn(AccountId) -> Option<AccountInfo>,
    {
        PolicyEvaluator::check_permission(permissions, Permission::JournalCreate)?;
        Self::prepare_draft(lines, journal_date, periods, account_lookup)
    }

    /// Replace the lines and date of a draft journal. Last write wins.
    pub fn edit<A>(
        current_status: JournalStatus,
        permissions: &PermissionSet,
        lines: &[JournalLineInput],
        journal_date: NaiveDate,
        periods: &[AccountingPeriod],
        account_lookup: A,
    ) -> Result<DraftJournal, LedgerError>
    where
        A: Fn(AccountId) -> Option<AccountInfo>,
    {
        PolicyEvaluator::check_permission(permissions, Permission::JournalCreate)?;
        Self::validate_can_edit(current_status)?;
        Self::prepare_draft(lines, journal_date, periods, account_lookup)
    }

    /// Submit a draft journal for approval.
    ///
    /// The journal must balance and its period must be open.
    pub fn submit(
        state: &JournalState,
        actor: UserId,
        permissions: &PermissionSet,
        rules: &[SodRule],
        period: &AccountingPeriod,
    ) -> Result<JournalAction, LedgerError> {
        PolicyEvaluator::check_permission(permissions, Permission::JournalSubmit)?;
        Self::require_status(state.status, JournalStatus::Draft, JournalStatus::Submitted)?;

        if !state.totals.is_balanced() {
            return Err(LedgerError::Unbalanced {
                debit: state.totals.debit,
                credit: state.totals.credit,
            });
        }

        Self::check_sod(state, actor, Permission::JournalSubmit, rules)?;
        Self::require_open(period)?;

        Ok(JournalAction::Submit {
            new_status: JournalStatus::Submitted,
            submitted_by: actor,
            submitted_at: Utc::now(),
        })
    }

    /// Approve a submitted journal.
    ///
    /// The creator and the submitter can never approve.
    pub fn approve(
        state: &JournalState,
        actor: UserId,
        permissions: &PermissionSet,
        rules: &[SodRule],
    ) -> Result<JournalAction, LedgerError> {
        PolicyEvaluator::check_permission(permissions, Permission::JournalApprove)?;
        Self::require_status(state.status, JournalStatus::Submitted, JournalStatus::Approved)?;
        Self::check_sod(state, actor, Permission::JournalApprove, rules)?;

        Ok(JournalAction::Approve {
            new_status: JournalStatus::Approved,
            approved_by: actor,
            approved_at: Utc::now(),
        })
    }

    /// Return a submitted or approved journal to draft.
    pub fn reject(
        state: &JournalState,
        actor: UserId,
        permissions: &PermissionSet,
        reason: String,
    ) -> Result<JournalAction, LedgerError> {
        PolicyEvaluator::check_permission(permissions, Permission::JournalApprove)?;

        if reason.trim().is_empty() {
            return Err(LedgerError::RejectionReasonRequired);
        }

        match state.status {
            JournalStatus::Submitted | JournalStatus::Approved => Ok(JournalAction::Reject {
                new_status: JournalStatus::Draft,
                rejected_by: actor,
                reason,
            }),
            from => Err(LedgerError::InvalidTransition {
                from,
                to: JournalStatus::Draft,
            }),
        }
    }

    /// Post an approved journal.
    ///
    /// Journals touching controller-only accounts need `journal.final_post`;
    /// others accept `journal.post` or `journal.final_post`. The period must
    /// still be open at the time of posting.
    pub fn post(
        state: &JournalState,
        actor: UserId,
        permissions: &PermissionSet,
        rules: &[SodRule],
        requires_final_post: bool,
        period: &AccountingPeriod,
    ) -> Result<JournalAction, LedgerError> {
        let exercised = if requires_final_post {
            PolicyEvaluator::check_permission(permissions, Permission::JournalFinalPost)?;
            Permission::JournalFinalPost
        } else {
            PolicyEvaluator::check_any_permission(
                permissions,
                &[Permission::JournalPost, Permission::JournalFinalPost],
            )?
        };

        Self::require_status(state.status, JournalStatus::Approved, JournalStatus::Posted)?;
        Self::check_sod(state, actor, exercised, rules)?;
        Self::require_open(period)?;

        Ok(JournalAction::Post {
            new_status: JournalStatus::Posted,
            posted_by: actor,
            posted_at: Utc::now(),
        })
    }

    /// Only drafts may change.
    pub fn validate_can_edit(status: JournalStatus) -> Result<(), LedgerError> {
        if status.is_editable() {
            Ok(())
        } else {
            Err(LedgerError::CannotModify(status))
        }
    }

    /// Check if a status transition is valid.
    #[must_use]
    pub fn is_valid_transition(from: JournalStatus, to: JournalStatus) -> bool {
        matches!(
            (from, to),
            (JournalStatus::Draft, JournalStatus::Submitted)
                | (JournalStatus::Submitted, JournalStatus::Approved | JournalStatus::Draft)
                | (JournalStatus::Approved, JournalStatus::Posted | JournalStatus::Draft)
        )
    }

    fn require_status(
        current: JournalStatus,
        expected: JournalStatus,
        target: JournalStatus,
    ) -> Result<(), LedgerError> {
        if current == expected {
            Ok(())
        } else {
            Err(LedgerError::InvalidTransition {
                from: current,
                to: target,
            })
        }
    }

    fn require_open(period: &AccountingPeriod) -> Result<(), LedgerError> {
        if period.status.allows_posting() {
            Ok(())
        } else {
            Err(LedgerError::PeriodClosed {
                period_id: period.id,
                status: period.status,
            })
        }
    }

    fn check_sod(
        state: &JournalState,
        actor: UserId,
        permission: Permission,
        rules: &[SodRule],
    ) -> Result<(), LedgerError> {
        let makers: Vec<UserId> = std::iter::once(state.created_by)
            .chain(state.submitted_by)
            .collect();
        let prior_steps = Self::prior_steps(state);
        let ctx = ActionContext {
            actor,
            permission,
            makers: &makers,
            prior_steps: &prior_steps,
        };
        PolicyEvaluator::check_action(&ctx, rules)?;
        Ok(())
    }

    fn prior_steps(state: &JournalState) -> Vec<PriorStep> {
        let mut steps = vec![PriorStep {
            actor: state.created_by,
            permission: Permission::JournalCreate,
        }];
        if let Some(actor) = state.submitted_by {
            steps.push(PriorStep {
                actor,
                permission: Permission::JournalSubmit,
            });
        }
        if let Some(actor) = state.approved_by {
            steps.push(PriorStep {
                actor,
                permission: Permission::JournalApprove,
            });
        }
        steps
    }
}
