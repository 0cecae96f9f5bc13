//! Journal repository: drafts, the maker-checker lifecycle and posting.
//!
//! Every transition runs in one tenant transaction: the journal row is locked
//! `FOR UPDATE`, the core state machine decides, then the new status and
//! attribution columns are written. Posting also takes a shared lock on the
//! period row and commits per-account period balances before returning.

use chrono::{NaiveDate, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set, Statement,
};
use tracing::{debug, info};
use uuid::Uuid;

use kontor_core::ledger::{
    Dimensions, JournalAction, JournalLineInput, JournalService, JournalState, JournalStatus,
    JournalTotals, LedgerError, PeriodBalanceDelta, ReversalService, aggregate_deltas,
    requires_final_post,
};
use kontor_core::period::AccountingPeriod;
use kontor_shared::types::{
    AccountId, JournalId, JournalLineId, PageRequest, PeriodId, TemplateId, TenantId, UserId,
};

use crate::entities::{
    journal_lines, journals, sea_orm_active_enums::JournalStatus as DbJournalStatus,
};
use crate::repositories::account::ChartOfAccounts;
use crate::repositories::period::{find_period_shared, load_periods, to_period};
use crate::repositories::policy::{load_permissions, load_rules};
use crate::tenant::TenantTransaction;

fn db_error(err: DbErr) -> LedgerError {
    LedgerError::Database(err.to_string())
}

/// Input for creating or replacing a draft journal.
#[derive(Debug, Clone)]
pub struct JournalInput {
    /// Posting date; determines the period.
    pub journal_date: NaiveDate,
    /// Optional narrative.
    pub description: Option<String>,
    /// Debit and credit lines.
    pub lines: Vec<JournalLineInput>,
}

/// Filter options for listing journals.
#[derive(Debug, Clone, Default)]
pub struct JournalFilter {
    /// Only journals in this status.
    pub status: Option<JournalStatus>,
    /// Only journals in this period.
    pub period_id: Option<PeriodId>,
}

/// A journal with its lines in line-number order.
#[derive(Debug, Clone)]
pub struct JournalWithLines {
    /// The journal header.
    pub journal: journals::Model,
    /// The lines.
    pub lines: Vec<journal_lines::Model>,
}

/// A validated draft about to be written.
#[derive(Debug, Clone)]
pub(crate) struct NewDraft {
    pub journal_date: NaiveDate,
    pub period_id: PeriodId,
    pub description: Option<String>,
    pub lines: Vec<JournalLineInput>,
    pub totals: JournalTotals,
    pub reverses_journal_id: Option<JournalId>,
    pub source_template_id: Option<TemplateId>,
}

/// Writes a DRAFT journal and its lines inside the caller's transaction.
///
/// Shared by manual creation, reversal, recurring generation and
/// reconciliation adjustments.
pub(crate) async fn insert_draft<C: ConnectionTrait>(
    conn: &C,
    tenant_id: TenantId,
    actor: UserId,
    draft: NewDraft,
) -> Result<JournalWithLines, DbErr> {
    let now = Utc::now().into();
    let journal_id = JournalId::new().into_inner();

    let journal = journals::ActiveModel {
        id: Set(journal_id),
        tenant_id: Set(tenant_id.into_inner()),
        period_id: Set(draft.period_id.into_inner()),
        journal_date: Set(draft.journal_date),
        description: Set(draft.description),
        status: Set(DbJournalStatus::Draft),
        total_debit: Set(draft.totals.debit),
        total_credit: Set(draft.totals.credit),
        created_by: Set(actor.into_inner()),
        submitted_by: Set(None),
        submitted_at: Set(None),
        approved_by: Set(None),
        approved_at: Set(None),
        posted_by: Set(None),
        posted_at: Set(None),
        rejected_by: Set(None),
        rejected_at: Set(None),
        rejection_reason: Set(None),
        reverses_journal_id: Set(draft.reverses_journal_id.map(JournalId::into_inner)),
        source_template_id: Set(draft.source_template_id.map(TemplateId::into_inner)),
        created_at: Set(now),
        updated_at: Set(now),
    }
    .insert(conn)
    .await?;

    let lines = insert_lines(conn, tenant_id, journal_id, &draft.lines).await?;
    Ok(JournalWithLines { journal, lines })
}

async fn insert_lines<C: ConnectionTrait>(
    conn: &C,
    tenant_id: TenantId,
    journal_id: Uuid,
    lines: &[JournalLineInput],
) -> Result<Vec<journal_lines::Model>, DbErr> {
    let now = Utc::now().into();
    let mut rows = Vec::with_capacity(lines.len());
    for (line_number, line) in (1_i32..).zip(lines) {
        let row = journal_lines::ActiveModel {
            id: Set(JournalLineId::new().into_inner()),
            tenant_id: Set(tenant_id.into_inner()),
            journal_id: Set(journal_id),
            line_number: Set(line_number),
            account_id: Set(line.account_id.into_inner()),
            debit: Set(line.debit),
            credit: Set(line.credit),
            memo: Set(line.memo.clone()),
            department_id: Set(line.dimensions.department_id),
            project_id: Set(line.dimensions.project_id),
            fund_id: Set(line.dimensions.fund_id),
            created_at: Set(now),
        }
        .insert(conn)
        .await?;
        rows.push(row);
    }
    Ok(rows)
}

/// Loads a journal's lines in line-number order.
pub(crate) async fn load_lines<C: ConnectionTrait>(
    conn: &C,
    journal_id: Uuid,
) -> Result<Vec<journal_lines::Model>, DbErr> {
    journal_lines::Entity::find()
        .filter(journal_lines::Column::JournalId.eq(journal_id))
        .order_by_asc(journal_lines::Column::LineNumber)
        .all(conn)
        .await
}

/// Maps stored lines back to the input shape used by validation.
#[must_use]
pub fn lines_to_inputs(rows: &[journal_lines::Model]) -> Vec<JournalLineInput> {
    rows.iter()
        .map(|row| JournalLineInput {
            account_id: AccountId::from_uuid(row.account_id),
            debit: row.debit,
            credit: row.credit,
            memo: row.memo.clone(),
            dimensions: Dimensions {
                department_id: row.department_id,
                project_id: row.project_id,
                fund_id: row.fund_id,
            },
        })
        .collect()
}

/// The state-machine view of a stored journal.
#[must_use]
pub fn to_state(row: &journals::Model) -> JournalState {
    JournalState {
        status: row.status.into(),
        created_by: UserId::from_uuid(row.created_by),
        submitted_by: row.submitted_by.map(UserId::from_uuid),
        approved_by: row.approved_by.map(UserId::from_uuid),
        totals: JournalTotals {
            debit: row.total_debit,
            credit: row.total_credit,
        },
    }
}

/// Adds posted amounts to the per-account period totals.
///
/// Deltas arrive ordered by account id, so concurrent postings lock balance
/// rows in the same order.
async fn apply_balance_deltas<C: ConnectionTrait>(
    conn: &C,
    tenant_id: TenantId,
    period_id: PeriodId,
    deltas: &[PeriodBalanceDelta],
) -> Result<(), DbErr> {
    for delta in deltas {
        conn.execute(Statement::from_sql_and_values(
            conn.get_database_backend(),
            r"
            INSERT INTO account_period_balances
                (period_id, account_id, tenant_id, debit_total, credit_total, updated_at)
            VALUES ($1, $2, $3, $4, $5, NOW())
            ON CONFLICT (period_id, account_id) DO UPDATE SET
                debit_total = account_period_balances.debit_total + EXCLUDED.debit_total,
                credit_total = account_period_balances.credit_total + EXCLUDED.credit_total,
                updated_at = NOW()
            ",
            [
                period_id.into_inner().into(),
                delta.account_id.into_inner().into(),
                tenant_id.into_inner().into(),
                delta.debit.into(),
                delta.credit.into(),
            ],
        ))
        .await?;
    }
    Ok(())
}

/// Journal repository.
#[derive(Debug, Clone)]
pub struct JournalRepository {
    db: DatabaseConnection,
}

impl JournalRepository {
    /// Creates a new journal repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Creates a DRAFT journal.
    ///
    /// # Errors
    ///
    /// Returns a validation error for empty, zero-amount, unbalanced or
    /// invalid-account lines, `NoPeriodForDate` when no period contains the
    /// date, or a permission/database error.
    pub async fn create(
        &self,
        tenant_id: TenantId,
        actor: UserId,
        input: JournalInput,
    ) -> Result<JournalWithLines, LedgerError> {
        let tx = TenantTransaction::begin(&self.db, tenant_id)
            .await
            .map_err(db_error)?;
        let conn = tx.transaction();

        let permissions = load_permissions(conn, tenant_id, actor)
            .await
            .map_err(db_error)?;
        let periods = load_periods(conn, tenant_id).await.map_err(db_error)?;
        let chart = ChartOfAccounts::for_lines(conn, tenant_id, &input.lines, &[])
            .await
            .map_err(db_error)?;

        let draft = JournalService::create(
            &permissions,
            &input.lines,
            input.journal_date,
            &periods,
            |id| chart.lookup(id),
        )?;

        let created = insert_draft(
            conn,
            tenant_id,
            actor,
            NewDraft {
                journal_date: input.journal_date,
                period_id: draft.period_id,
                description: input.description,
                lines: input.lines,
                totals: draft.totals,
                reverses_journal_id: None,
                source_template_id: None,
            },
        )
        .await
        .map_err(db_error)?;

        tx.commit().await.map_err(db_error)?;
        info!(
            tenant_id = %tenant_id,
            journal_id = %created.journal.id,
            lines = created.lines.len(),
            "Draft journal created"
        );
        Ok(created)
    }

    /// Replaces the date, description and lines of a DRAFT journal.
    ///
    /// # Errors
    ///
    /// Returns `CannotModify` unless the journal is a draft, plus the same
    /// validation errors as [`Self::create`].
    pub async fn update(
        &self,
        tenant_id: TenantId,
        actor: UserId,
        journal_id: JournalId,
        input: JournalInput,
    ) -> Result<JournalWithLines, LedgerError> {
        let tx = TenantTransaction::begin(&self.db, tenant_id)
            .await
            .map_err(db_error)?;
        let conn = tx.transaction();

        let journal = Self::find_for_update(conn, tenant_id, journal_id).await?;
        let permissions = load_permissions(conn, tenant_id, actor)
            .await
            .map_err(db_error)?;
        let periods = load_periods(conn, tenant_id).await.map_err(db_error)?;
        let chart = ChartOfAccounts::for_lines(conn, tenant_id, &input.lines, &[])
            .await
            .map_err(db_error)?;

        let draft = JournalService::edit(
            journal.status.into(),
            &permissions,
            &input.lines,
            input.journal_date,
            &periods,
            |id| chart.lookup(id),
        )?;

        journal_lines::Entity::delete_many()
            .filter(journal_lines::Column::JournalId.eq(journal.id))
            .exec(conn)
            .await
            .map_err(db_error)?;
        let lines = insert_lines(conn, tenant_id, journal.id, &input.lines)
            .await
            .map_err(db_error)?;

        let mut active: journals::ActiveModel = journal.into();
        active.journal_date = Set(input.journal_date);
        active.period_id = Set(draft.period_id.into_inner());
        active.description = Set(input.description);
        active.total_debit = Set(draft.totals.debit);
        active.total_credit = Set(draft.totals.credit);
        active.updated_at = Set(Utc::now().into());
        let journal = active.update(conn).await.map_err(db_error)?;

        tx.commit().await.map_err(db_error)?;
        debug!(tenant_id = %tenant_id, journal_id = %journal_id, "Draft journal replaced");
        Ok(JournalWithLines { journal, lines })
    }

    /// Gets a journal with its lines.
    ///
    /// # Errors
    ///
    /// Returns `JournalNotFound` or a database error.
    pub async fn get(
        &self,
        tenant_id: TenantId,
        journal_id: JournalId,
    ) -> Result<JournalWithLines, LedgerError> {
        let tx = TenantTransaction::begin(&self.db, tenant_id)
            .await
            .map_err(db_error)?;
        let journal = journals::Entity::find_by_id(journal_id.into_inner())
            .filter(journals::Column::TenantId.eq(tenant_id.into_inner()))
            .one(tx.transaction())
            .await
            .map_err(db_error)?
            .ok_or(LedgerError::JournalNotFound(journal_id))?;
        let lines = load_lines(tx.transaction(), journal.id)
            .await
            .map_err(db_error)?;
        tx.commit().await.map_err(db_error)?;
        Ok(JournalWithLines { journal, lines })
    }

    /// Lists journal headers, newest first, with the total match count.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn list(
        &self,
        tenant_id: TenantId,
        filter: &JournalFilter,
        page: &PageRequest,
    ) -> Result<(Vec<journals::Model>, u64), LedgerError> {
        let tx = TenantTransaction::begin(&self.db, tenant_id)
            .await
            .map_err(db_error)?;

        let mut query =
            journals::Entity::find().filter(journals::Column::TenantId.eq(tenant_id.into_inner()));
        if let Some(status) = filter.status {
            query = query.filter(journals::Column::Status.eq(DbJournalStatus::from(status)));
        }
        if let Some(period_id) = filter.period_id {
            query = query.filter(journals::Column::PeriodId.eq(period_id.into_inner()));
        }

        let total = query
            .clone()
            .count(tx.transaction())
            .await
            .map_err(db_error)?;
        let rows = query
            .order_by_desc(journals::Column::JournalDate)
            .order_by_desc(journals::Column::Id)
            .offset(page.offset())
            .limit(page.limit())
            .all(tx.transaction())
            .await
            .map_err(db_error)?;

        tx.commit().await.map_err(db_error)?;
        Ok((rows, total))
    }

    /// Submits a DRAFT journal.
    ///
    /// # Errors
    ///
    /// Returns `InvalidTransition` from any other status, `Unbalanced`,
    /// `PeriodClosed` unless the period is open, or a permission/SoD error.
    pub async fn submit(
        &self,
        tenant_id: TenantId,
        actor: UserId,
        journal_id: JournalId,
    ) -> Result<JournalWithLines, LedgerError> {
        let tx = TenantTransaction::begin(&self.db, tenant_id)
            .await
            .map_err(db_error)?;
        let conn = tx.transaction();

        let journal = Self::find_for_update(conn, tenant_id, journal_id).await?;
        let period = Self::journal_period(conn, tenant_id, &journal).await?;
        let permissions = load_permissions(conn, tenant_id, actor)
            .await
            .map_err(db_error)?;
        let rules = load_rules(conn, tenant_id).await.map_err(db_error)?;

        let action =
            JournalService::submit(&to_state(&journal), actor, &permissions, &rules, &period)?;
        let journal = Self::apply(conn, journal, action).await?;
        let lines = load_lines(conn, journal.id).await.map_err(db_error)?;

        tx.commit().await.map_err(db_error)?;
        info!(tenant_id = %tenant_id, journal_id = %journal_id, actor_id = %actor, "Journal submitted");
        Ok(JournalWithLines { journal, lines })
    }

    /// Approves a SUBMITTED journal.
    ///
    /// # Errors
    ///
    /// Returns `InvalidTransition` from any other status, a maker-checker or
    /// SoD violation, or a permission/database error.
    pub async fn approve(
        &self,
        tenant_id: TenantId,
        actor: UserId,
        journal_id: JournalId,
    ) -> Result<JournalWithLines, LedgerError> {
        let tx = TenantTransaction::begin(&self.db, tenant_id)
            .await
            .map_err(db_error)?;
        let conn = tx.transaction();

        let journal = Self::find_for_update(conn, tenant_id, journal_id).await?;
        let permissions = load_permissions(conn, tenant_id, actor)
            .await
            .map_err(db_error)?;
        let rules = load_rules(conn, tenant_id).await.map_err(db_error)?;

        let action = JournalService::approve(&to_state(&journal), actor, &permissions, &rules)?;
        let journal = Self::apply(conn, journal, action).await?;
        let lines = load_lines(conn, journal.id).await.map_err(db_error)?;

        tx.commit().await.map_err(db_error)?;
        info!(tenant_id = %tenant_id, journal_id = %journal_id, actor_id = %actor, "Journal approved");
        Ok(JournalWithLines { journal, lines })
    }

    /// Returns a SUBMITTED or APPROVED journal to DRAFT.
    ///
    /// # Errors
    ///
    /// Returns `RejectionReasonRequired` for a blank reason,
    /// `InvalidTransition` from DRAFT or POSTED, or a permission/database
    /// error.
    pub async fn reject(
        &self,
        tenant_id: TenantId,
        actor: UserId,
        journal_id: JournalId,
        reason: String,
    ) -> Result<JournalWithLines, LedgerError> {
        let tx = TenantTransaction::begin(&self.db, tenant_id)
            .await
            .map_err(db_error)?;
        let conn = tx.transaction();

        let journal = Self::find_for_update(conn, tenant_id, journal_id).await?;
        let permissions = load_permissions(conn, tenant_id, actor)
            .await
            .map_err(db_error)?;

        let action = JournalService::reject(&to_state(&journal), actor, &permissions, reason)?;
        let journal = Self::apply(conn, journal, action).await?;
        let lines = load_lines(conn, journal.id).await.map_err(db_error)?;

        tx.commit().await.map_err(db_error)?;
        info!(tenant_id = %tenant_id, journal_id = %journal_id, actor_id = %actor, "Journal rejected");
        Ok(JournalWithLines { journal, lines })
    }

    /// Posts an APPROVED journal and commits its period balances.
    ///
    /// The period is re-read under a shared lock inside the posting
    /// transaction, so a concurrent close either waits for this post or makes
    /// it fail with `PeriodClosed`. On any error nothing is written and the
    /// journal stays APPROVED.
    ///
    /// # Errors
    ///
    /// Returns `InvalidTransition` from any other status, `PeriodClosed`,
    /// a permission or SoD error, or a database error.
    pub async fn post(
        &self,
        tenant_id: TenantId,
        actor: UserId,
        journal_id: JournalId,
    ) -> Result<JournalWithLines, LedgerError> {
        let tx = TenantTransaction::begin(&self.db, tenant_id)
            .await
            .map_err(db_error)?;
        let conn = tx.transaction();

        let journal = Self::find_for_update(conn, tenant_id, journal_id).await?;
        let period = Self::journal_period(conn, tenant_id, &journal).await?;
        let lines = load_lines(conn, journal.id).await.map_err(db_error)?;
        let inputs = lines_to_inputs(&lines);
        let chart = ChartOfAccounts::for_lines(conn, tenant_id, &inputs, &[])
            .await
            .map_err(db_error)?;
        let permissions = load_permissions(conn, tenant_id, actor)
            .await
            .map_err(db_error)?;
        let rules = load_rules(conn, tenant_id).await.map_err(db_error)?;

        let final_post = requires_final_post(&inputs, |id| chart.lookup(id));
        let action = JournalService::post(
            &to_state(&journal),
            actor,
            &permissions,
            &rules,
            final_post,
            &period,
        )?;

        let journal = Self::apply(conn, journal, action).await?;
        apply_balance_deltas(conn, tenant_id, period.id, &aggregate_deltas(&inputs))
            .await
            .map_err(db_error)?;

        tx.commit().await.map_err(db_error)?;
        info!(
            tenant_id = %tenant_id,
            journal_id = %journal_id,
            period_id = %period.id,
            actor_id = %actor,
            final_post,
            "Journal posted"
        );
        Ok(JournalWithLines { journal, lines })
    }

    /// Creates a DRAFT journal reversing a POSTED one.
    ///
    /// The reversal is dated `reversal_date`, or today when absent, and goes
    /// through the normal lifecycle.
    ///
    /// # Errors
    ///
    /// Returns `InvalidTransition` unless the original is posted,
    /// `AlreadyReversed` on a second reversal, `NoPeriodForDate`, or a
    /// permission/database error.
    pub async fn reverse(
        &self,
        tenant_id: TenantId,
        actor: UserId,
        journal_id: JournalId,
        reversal_date: Option<NaiveDate>,
    ) -> Result<JournalWithLines, LedgerError> {
        let tx = TenantTransaction::begin(&self.db, tenant_id)
            .await
            .map_err(db_error)?;
        let conn = tx.transaction();

        let original = Self::find_for_update(conn, tenant_id, journal_id).await?;
        let existing = journals::Entity::find()
            .filter(journals::Column::TenantId.eq(tenant_id.into_inner()))
            .filter(journals::Column::ReversesJournalId.eq(original.id))
            .one(conn)
            .await
            .map_err(db_error)?
            .map(|row| JournalId::from_uuid(row.id));
        let permissions = load_permissions(conn, tenant_id, actor)
            .await
            .map_err(db_error)?;

        ReversalService::validate_reversal(
            journal_id,
            original.status.into(),
            existing,
            &permissions,
        )?;

        let reversal_date = reversal_date.unwrap_or_else(|| Utc::now().date_naive());
        let lines = ReversalService::reverse_lines(&lines_to_inputs(
            &load_lines(conn, original.id).await.map_err(db_error)?,
        ));
        let periods = load_periods(conn, tenant_id).await.map_err(db_error)?;
        let chart = ChartOfAccounts::for_lines(conn, tenant_id, &lines, &[])
            .await
            .map_err(db_error)?;
        let draft =
            JournalService::prepare_draft(&lines, reversal_date, &periods, |id| chart.lookup(id))?;

        let description = original
            .description
            .as_ref()
            .map_or_else(|| format!("Reversal of {journal_id}"), |d| format!("Reversal of {d}"));
        let reversal = insert_draft(
            conn,
            tenant_id,
            actor,
            NewDraft {
                journal_date: reversal_date,
                period_id: draft.period_id,
                description: Some(description),
                lines,
                totals: draft.totals,
                reverses_journal_id: Some(journal_id),
                source_template_id: None,
            },
        )
        .await
        .map_err(db_error)?;

        tx.commit().await.map_err(db_error)?;
        info!(
            tenant_id = %tenant_id,
            journal_id = %journal_id,
            reversal_id = %reversal.journal.id,
            "Reversing journal created"
        );
        Ok(reversal)
    }

    async fn find_for_update<C: ConnectionTrait>(
        conn: &C,
        tenant_id: TenantId,
        journal_id: JournalId,
    ) -> Result<journals::Model, LedgerError> {
        journals::Entity::find_by_id(journal_id.into_inner())
            .filter(journals::Column::TenantId.eq(tenant_id.into_inner()))
            .lock_exclusive()
            .one(conn)
            .await
            .map_err(db_error)?
            .ok_or(LedgerError::JournalNotFound(journal_id))
    }

    async fn journal_period<C: ConnectionTrait>(
        conn: &C,
        tenant_id: TenantId,
        journal: &journals::Model,
    ) -> Result<AccountingPeriod, LedgerError> {
        find_period_shared(conn, tenant_id, PeriodId::from_uuid(journal.period_id))
            .await
            .map_err(db_error)?
            .map(|row| to_period(&row))
            .ok_or(LedgerError::NoPeriodForDate(journal.journal_date))
    }

    async fn apply<C: ConnectionTrait>(
        conn: &C,
        journal: journals::Model,
        action: JournalAction,
    ) -> Result<journals::Model, LedgerError> {
        let now = Utc::now();
        let mut active: journals::ActiveModel = journal.into();
        active.status = Set(action.new_status().into());
        active.updated_at = Set(now.into());

        match action {
            JournalAction::Submit {
                submitted_by,
                submitted_at,
                ..
            } => {
                active.submitted_by = Set(Some(submitted_by.into_inner()));
                active.submitted_at = Set(Some(submitted_at.into()));
            }
            JournalAction::Approve {
                approved_by,
                approved_at,
                ..
            } => {
                active.approved_by = Set(Some(approved_by.into_inner()));
                active.approved_at = Set(Some(approved_at.into()));
            }
            JournalAction::Reject {
                rejected_by,
                reason,
                ..
            } => {
                active.submitted_by = Set(None);
                active.submitted_at = Set(None);
                active.approved_by = Set(None);
                active.approved_at = Set(None);
                active.rejected_by = Set(Some(rejected_by.into_inner()));
                active.rejected_at = Set(Some(now.into()));
                active.rejection_reason = Set(Some(reason));
            }
            JournalAction::Post {
                posted_by,
                posted_at,
                ..
            } => {
                active.posted_by = Set(Some(posted_by.into_inner()));
                active.posted_at = Set(Some(posted_at.into()));
            }
        }

        active.update(conn).await.map_err(db_error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn journal_row(status: DbJournalStatus) -> journals::Model {
        let now = Utc::now().into();
        journals::Model {
            id: Uuid::now_v7(),
            tenant_id: Uuid::now_v7(),
            period_id: Uuid::now_v7(),
            journal_date: NaiveDate::from_ymd_opt(2025, 3, 14).unwrap(),
            description: None,
            status,
            total_debit: dec!(100.00),
            total_credit: dec!(100.00),
            created_by: Uuid::now_v7(),
            submitted_by: Some(Uuid::now_v7()),
            submitted_at: Some(now),
            approved_by: None,
            approved_at: None,
            posted_by: None,
            posted_at: None,
            rejected_by: None,
            rejected_at: None,
            rejection_reason: None,
            reverses_journal_id: None,
            source_template_id: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_to_state_carries_attribution() {
        let row = journal_row(DbJournalStatus::Submitted);
        let state = to_state(&row);

        assert_eq!(state.status, JournalStatus::Submitted);
        assert_eq!(state.created_by, UserId::from_uuid(row.created_by));
        assert_eq!(state.submitted_by, row.submitted_by.map(UserId::from_uuid));
        assert!(state.approved_by.is_none());
        assert!(state.totals.is_balanced());
    }

    #[test]
    fn test_lines_to_inputs_keeps_dimensions() {
        let project = Uuid::now_v7();
        let row = journal_lines::Model {
            id: Uuid::now_v7(),
            tenant_id: Uuid::now_v7(),
            journal_id: Uuid::now_v7(),
            line_number: 1,
            account_id: Uuid::now_v7(),
            debit: dec!(42.50),
            credit: dec!(0),
            memo: Some("rent".into()),
            department_id: None,
            project_id: Some(project),
            fund_id: None,
            created_at: Utc::now().into(),
        };

        let inputs = lines_to_inputs(std::slice::from_ref(&row));
        assert_eq!(inputs.len(), 1);
        assert_eq!(inputs[0].debit, dec!(42.50));
        assert_eq!(inputs[0].dimensions.project_id, Some(project));
        assert_eq!(inputs[0].memo.as_deref(), Some("rent"));
    }
}
