//! Accounting period repository.
//!
//! Period transitions lock the period row `FOR UPDATE`; posting takes a
//! shared lock on the same row, so a close and a post of the same period
//! never interleave.

use chrono::{NaiveDate, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr, EntityTrait,
    QueryFilter, QueryOrder, QuerySelect, Set,
};
use tracing::{info, warn};

use kontor_core::period::{
    AccountingPeriod, ChecklistCompletion, ChecklistItem, PeriodAction, PeriodError,
    PeriodService, PeriodStatus,
};
use kontor_core::policy::{Permission, PolicyEvaluator};
use kontor_shared::types::{PeriodId, TenantId, UserId};

use crate::entities::{
    account_period_balances, accounting_periods, period_checklist_items,
    sea_orm_active_enums::PeriodStatus as DbPeriodStatus,
};
use crate::repositories::policy::load_permissions;
use crate::tenant::TenantTransaction;

const CALENDAR_LOCK_SCOPE: &str = "kontor.periods";

/// Loads every period of the tenant, oldest first.
///
/// # Errors
///
/// Returns an error if the database query fails.
pub async fn load_periods<C: ConnectionTrait>(
    conn: &C,
    tenant_id: TenantId,
) -> Result<Vec<AccountingPeriod>, DbErr> {
    let rows = accounting_periods::Entity::find()
        .filter(accounting_periods::Column::TenantId.eq(tenant_id.into_inner()))
        .order_by_asc(accounting_periods::Column::StartDate)
        .all(conn)
        .await?;
    Ok(rows.iter().map(to_period).collect())
}

/// Loads one period under a shared row lock, blocking concurrent
/// transitions until the caller's transaction ends.
///
/// # Errors
///
/// Returns an error if the database query fails.
pub async fn find_period_shared<C: ConnectionTrait>(
    conn: &C,
    tenant_id: TenantId,
    period_id: PeriodId,
) -> Result<Option<accounting_periods::Model>, DbErr> {
    accounting_periods::Entity::find_by_id(period_id.into_inner())
        .filter(accounting_periods::Column::TenantId.eq(tenant_id.into_inner()))
        .lock_shared()
        .one(conn)
        .await
}

/// Maps a period row to the domain view.
#[must_use]
pub fn to_period(row: &accounting_periods::Model) -> AccountingPeriod {
    AccountingPeriod {
        id: PeriodId::from_uuid(row.id),
        start_date: row.start_date,
        end_date: row.end_date,
        status: row.status.into(),
    }
}

fn to_checklist_item(row: &period_checklist_items::Model) -> ChecklistItem {
    ChecklistItem {
        code: row.code.clone(),
        label: row.label.clone(),
        completed_by: row.completed_by.map(UserId::from_uuid),
        completed_at: row.completed_at.map(|at| at.with_timezone(&Utc)),
    }
}

fn db_error(err: DbErr) -> PeriodError {
    PeriodError::Database(err.to_string())
}

/// Input for creating a period.
#[derive(Debug, Clone)]
pub struct CreatePeriodInput {
    /// Display name; derived from the dates when absent.
    pub name: Option<String>,
    /// First day.
    pub start_date: NaiveDate,
    /// Last day, inclusive.
    pub end_date: NaiveDate,
}

/// A period with its close checklist.
#[derive(Debug, Clone)]
pub struct PeriodWithChecklist {
    /// The period record.
    pub period: accounting_periods::Model,
    /// Checklist items, in baseline order.
    pub checklist: Vec<period_checklist_items::Model>,
}

/// Accounting period repository.
#[derive(Debug, Clone)]
pub struct PeriodRepository {
    db: DatabaseConnection,
}

impl PeriodRepository {
    /// Creates a new period repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Creates an OPEN period with the baseline checklist.
    ///
    /// The new period must not overlap an existing one and must extend the
    /// calendar at either end.
    ///
    /// # Errors
    ///
    /// Returns an error if the actor lacks `period.close`, the dates are
    /// invalid, or a database operation fails.
    pub async fn create(
        &self,
        tenant_id: TenantId,
        actor: UserId,
        input: CreatePeriodInput,
    ) -> Result<PeriodWithChecklist, PeriodError> {
        let tx = TenantTransaction::begin(&self.db, tenant_id)
            .await
            .map_err(db_error)?;
        tx.advisory_lock(CALENDAR_LOCK_SCOPE)
            .await
            .map_err(db_error)?;

        let permissions = load_permissions(tx.transaction(), tenant_id, actor)
            .await
            .map_err(db_error)?;
        PolicyEvaluator::check_permission(&permissions, Permission::PeriodClose)?;

        let existing = load_periods(tx.transaction(), tenant_id)
            .await
            .map_err(db_error)?;
        PeriodService::validate_new_period(input.start_date, input.end_date, &existing)?;

        let now = Utc::now().into();
        let period_id = PeriodId::new().into_inner();
        let name = input
            .name
            .unwrap_or_else(|| format!("{} to {}", input.start_date, input.end_date));

        let period = accounting_periods::ActiveModel {
            id: Set(period_id),
            tenant_id: Set(tenant_id.into_inner()),
            name: Set(name),
            start_date: Set(input.start_date),
            end_date: Set(input.end_date),
            status: Set(DbPeriodStatus::Open),
            closed_by: Set(None),
            closed_at: Set(None),
            locked_by: Set(None),
            locked_at: Set(None),
            reopened_by: Set(None),
            reopened_at: Set(None),
            created_by: Set(actor.into_inner()),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(tx.transaction())
        .await
        .map_err(db_error)?;

        let mut checklist = Vec::new();
        for item in ChecklistItem::baseline() {
            let row = period_checklist_items::ActiveModel {
                id: Set(kontor_shared::types::ChecklistItemId::new().into_inner()),
                tenant_id: Set(tenant_id.into_inner()),
                period_id: Set(period_id),
                code: Set(item.code),
                label: Set(item.label),
                completed_by: Set(None),
                completed_at: Set(None),
                created_at: Set(now),
            }
            .insert(tx.transaction())
            .await
            .map_err(db_error)?;
            checklist.push(row);
        }

        tx.commit().await.map_err(db_error)?;
        info!(tenant_id = %tenant_id, period_id = %period_id, "Accounting period created");

        Ok(PeriodWithChecklist { period, checklist })
    }

    /// Gets a period with its checklist.
    ///
    /// # Errors
    ///
    /// Returns an error if the period does not exist or the query fails.
    pub async fn get(
        &self,
        tenant_id: TenantId,
        period_id: PeriodId,
    ) -> Result<PeriodWithChecklist, PeriodError> {
        let tx = TenantTransaction::begin(&self.db, tenant_id)
            .await
            .map_err(db_error)?;
        let period = accounting_periods::Entity::find_by_id(period_id.into_inner())
            .filter(accounting_periods::Column::TenantId.eq(tenant_id.into_inner()))
            .one(tx.transaction())
            .await
            .map_err(db_error)?
            .ok_or(PeriodError::PeriodNotFound(period_id))?;
        let checklist = Self::checklist(&tx, period_id).await?;
        tx.commit().await.map_err(db_error)?;

        Ok(PeriodWithChecklist { period, checklist })
    }

    /// Lists the tenant's periods, oldest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn list(
        &self,
        tenant_id: TenantId,
    ) -> Result<Vec<accounting_periods::Model>, PeriodError> {
        let tx = TenantTransaction::begin(&self.db, tenant_id)
            .await
            .map_err(db_error)?;
        let rows = accounting_periods::Entity::find()
            .filter(accounting_periods::Column::TenantId.eq(tenant_id.into_inner()))
            .order_by_asc(accounting_periods::Column::StartDate)
            .all(tx.transaction())
            .await
            .map_err(db_error)?;
        tx.commit().await.map_err(db_error)?;
        Ok(rows)
    }

    /// Closes an open period. Closing a closed period is a no-op.
    ///
    /// # Errors
    ///
    /// Returns `ChecklistIncomplete` while checklist items are outstanding
    /// (when `require_checklist` is set), `InvalidTransition` on a locked
    /// period, or a permission/database error.
    pub async fn close(
        &self,
        tenant_id: TenantId,
        actor: UserId,
        period_id: PeriodId,
        require_checklist: bool,
    ) -> Result<PeriodWithChecklist, PeriodError> {
        self.transition(tenant_id, actor, period_id, |status, permissions, checklist| {
            PeriodService::close(status, actor, permissions, checklist, require_checklist)
        })
        .await
    }

    /// Locks a closed period.
    ///
    /// # Errors
    ///
    /// Returns `InvalidTransition` on an open period, or a permission or
    /// database error.
    pub async fn lock(
        &self,
        tenant_id: TenantId,
        actor: UserId,
        period_id: PeriodId,
    ) -> Result<PeriodWithChecklist, PeriodError> {
        self.transition(tenant_id, actor, period_id, |status, permissions, _| {
            PeriodService::lock(status, actor, permissions)
        })
        .await
    }

    /// Reopens a closed or locked period.
    ///
    /// # Errors
    ///
    /// Returns `InvalidTransition` on an open period, or a permission or
    /// database error.
    pub async fn reopen(
        &self,
        tenant_id: TenantId,
        actor: UserId,
        period_id: PeriodId,
    ) -> Result<PeriodWithChecklist, PeriodError> {
        self.transition(tenant_id, actor, period_id, |status, permissions, _| {
            PeriodService::reopen(status, actor, permissions)
        })
        .await
    }

    /// Signs off a checklist item. Completing a completed item returns it
    /// unchanged.
    ///
    /// # Errors
    ///
    /// Returns an error if the period or item does not exist, the actor lacks
    /// `period.checklist.complete`, or a database operation fails.
    pub async fn complete_checklist_item(
        &self,
        tenant_id: TenantId,
        actor: UserId,
        period_id: PeriodId,
        code: &str,
    ) -> Result<period_checklist_items::Model, PeriodError> {
        let tx = TenantTransaction::begin(&self.db, tenant_id)
            .await
            .map_err(db_error)?;

        // Serializes with close, which locks the period row exclusively.
        find_period_shared(tx.transaction(), tenant_id, period_id)
            .await
            .map_err(db_error)?
            .ok_or(PeriodError::PeriodNotFound(period_id))?;

        let row = period_checklist_items::Entity::find()
            .filter(period_checklist_items::Column::TenantId.eq(tenant_id.into_inner()))
            .filter(period_checklist_items::Column::PeriodId.eq(period_id.into_inner()))
            .filter(period_checklist_items::Column::Code.eq(code))
            .lock_exclusive()
            .one(tx.transaction())
            .await
            .map_err(db_error)?
            .ok_or_else(|| PeriodError::UnknownChecklistItem(code.to_string()))?;

        let permissions = load_permissions(tx.transaction(), tenant_id, actor)
            .await
            .map_err(db_error)?;

        let row = match PeriodService::complete_item(
            &to_checklist_item(&row),
            actor,
            &permissions,
        )? {
            ChecklistCompletion::AlreadyComplete => row,
            ChecklistCompletion::Completed {
                completed_by,
                completed_at,
            } => {
                let mut active: period_checklist_items::ActiveModel = row.into();
                active.completed_by = Set(Some(completed_by.into_inner()));
                active.completed_at = Set(Some(completed_at.into()));
                let updated = active.update(tx.transaction()).await.map_err(db_error)?;
                info!(
                    tenant_id = %tenant_id,
                    period_id = %period_id,
                    code,
                    "Checklist item completed"
                );
                updated
            }
        };

        tx.commit().await.map_err(db_error)?;
        Ok(row)
    }

    /// Per-account debit and credit totals committed to a period by posting.
    ///
    /// # Errors
    ///
    /// Returns an error if the period does not exist or the query fails.
    pub async fn balances(
        &self,
        tenant_id: TenantId,
        period_id: PeriodId,
    ) -> Result<Vec<account_period_balances::Model>, PeriodError> {
        let tx = TenantTransaction::begin(&self.db, tenant_id)
            .await
            .map_err(db_error)?;
        accounting_periods::Entity::find_by_id(period_id.into_inner())
            .filter(accounting_periods::Column::TenantId.eq(tenant_id.into_inner()))
            .one(tx.transaction())
            .await
            .map_err(db_error)?
            .ok_or(PeriodError::PeriodNotFound(period_id))?;

        let rows = account_period_balances::Entity::find()
            .filter(account_period_balances::Column::TenantId.eq(tenant_id.into_inner()))
            .filter(account_period_balances::Column::PeriodId.eq(period_id.into_inner()))
            .order_by_asc(account_period_balances::Column::AccountId)
            .all(tx.transaction())
            .await
            .map_err(db_error)?;
        tx.commit().await.map_err(db_error)?;
        Ok(rows)
    }

    /// Shared read-lock-decide-write path for close, lock and reopen.
    async fn transition<F>(
        &self,
        tenant_id: TenantId,
        actor: UserId,
        period_id: PeriodId,
        decide: F,
    ) -> Result<PeriodWithChecklist, PeriodError>
    where
        F: FnOnce(
            PeriodStatus,
            &kontor_core::policy::PermissionSet,
            &[ChecklistItem],
        ) -> Result<PeriodAction, PeriodError>,
    {
        let tx = TenantTransaction::begin(&self.db, tenant_id)
            .await
            .map_err(db_error)?;

        let period = accounting_periods::Entity::find_by_id(period_id.into_inner())
            .filter(accounting_periods::Column::TenantId.eq(tenant_id.into_inner()))
            .lock_exclusive()
            .one(tx.transaction())
            .await
            .map_err(db_error)?
            .ok_or(PeriodError::PeriodNotFound(period_id))?;

        let checklist = Self::checklist(&tx, period_id).await?;
        let items: Vec<ChecklistItem> = checklist.iter().map(to_checklist_item).collect();
        let permissions = load_permissions(tx.transaction(), tenant_id, actor)
            .await
            .map_err(db_error)?;

        let action = decide(period.status.into(), &permissions, &items)?;

        let period = match action {
            PeriodAction::Unchanged(_) => period,
            PeriodAction::Transition { from, to, actor, at } => {
                let at = at.into();
                let mut active: accounting_periods::ActiveModel = period.into();
                active.status = Set(to.into());
                active.updated_at = Set(at);
                match to {
                    PeriodStatus::Closed => {
                        active.closed_by = Set(Some(actor.into_inner()));
                        active.closed_at = Set(Some(at));
                    }
                    PeriodStatus::Locked => {
                        active.locked_by = Set(Some(actor.into_inner()));
                        active.locked_at = Set(Some(at));
                    }
                    PeriodStatus::Open => {
                        active.reopened_by = Set(Some(actor.into_inner()));
                        active.reopened_at = Set(Some(at));
                    }
                }
                let updated = active.update(tx.transaction()).await.map_err(db_error)?;

                if to == PeriodStatus::Open {
                    warn!(
                        tenant_id = %tenant_id,
                        period_id = %period_id,
                        actor_id = %actor,
                        %from,
                        "Accounting period reopened"
                    );
                } else {
                    info!(tenant_id = %tenant_id, period_id = %period_id, %from, %to, "Period status changed");
                }
                updated
            }
        };

        tx.commit().await.map_err(db_error)?;
        Ok(PeriodWithChecklist { period, checklist })
    }

    async fn checklist(
        tx: &TenantTransaction,
        period_id: PeriodId,
    ) -> Result<Vec<period_checklist_items::Model>, PeriodError> {
        period_checklist_items::Entity::find()
            .filter(period_checklist_items::Column::TenantId.eq(tx.tenant_id().into_inner()))
            .filter(period_checklist_items::Column::PeriodId.eq(period_id.into_inner()))
            .order_by_asc(period_checklist_items::Column::CreatedAt)
            .order_by_asc(period_checklist_items::Column::Id)
            .all(tx.transaction())
            .await
            .map_err(db_error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn test_to_checklist_item_maps_completion() {
        let user = Uuid::now_v7();
        let row = period_checklist_items::Model {
            id: Uuid::now_v7(),
            tenant_id: Uuid::now_v7(),
            period_id: Uuid::now_v7(),
            code: "BANK_RECONCILED".into(),
            label: "Bank accounts reconciled".into(),
            completed_by: Some(user),
            completed_at: Some(Utc::now().into()),
            created_at: Utc::now().into(),
        };

        let item = to_checklist_item(&row);
        assert!(item.is_complete());
        assert_eq!(item.completed_by, Some(UserId::from_uuid(user)));
    }

    #[test]
    fn test_to_period_maps_status() {
        let now = Utc::now().into();
        let row = accounting_periods::Model {
            id: Uuid::now_v7(),
            tenant_id: Uuid::now_v7(),
            name: "January".into(),
            start_date: NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
            end_date: NaiveDate::from_ymd_opt(2025, 1, 31).unwrap(),
            status: DbPeriodStatus::Locked,
            closed_by: None,
            closed_at: None,
            locked_by: None,
            locked_at: None,
            reopened_by: None,
            reopened_at: None,
            created_by: Uuid::now_v7(),
            created_at: now,
            updated_at: now,
        };

        let period = to_period(&row);
        assert_eq!(period.status, PeriodStatus::Locked);
        assert!(!period.status.allows_posting());
    }
}
