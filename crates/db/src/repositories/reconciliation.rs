//! Bank reconciliation: matching, suggestions, summary and adjustments.
//!
//! A match is recorded on the statement line only. A payment counts as
//! reconciled exactly when some statement line references it; the partial
//! unique index on `matched_payment_id` keeps that one-to-one.

use std::collections::HashSet;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr, EntityTrait,
    FromQueryResult, QueryFilter, QueryOrder, QuerySelect, Set, SqlErr, Statement,
};
use tracing::info;
use uuid::Uuid;

use kontor_core::ledger::JournalService;
use kontor_core::reconciliation::{
    Matcher, PaymentRef, ReconciliationError, ReconciliationSummary, StatementLine,
};
use kontor_shared::types::{
    AccountId, BankAccountId, PaymentId, StatementLineId, TenantId, UserId,
};

use crate::entities::{bank_accounts, bank_statement_lines, payments};
use crate::repositories::account::ChartOfAccounts;
use crate::repositories::journal::{JournalWithLines, NewDraft, insert_draft};
use crate::repositories::period::load_periods;
use crate::repositories::policy::load_permissions;
use crate::tenant::TenantTransaction;

fn db_error(err: DbErr) -> ReconciliationError {
    ReconciliationError::Database(err.to_string())
}

fn to_statement_line(row: &bank_statement_lines::Model) -> StatementLine {
    StatementLine {
        id: StatementLineId::from_uuid(row.id),
        bank_account_id: BankAccountId::from_uuid(row.bank_account_id),
        transaction_date: row.transaction_date,
        description: row.description.clone(),
        amount: row.amount,
        matched_payment_id: row.matched_payment_id.map(PaymentId::from_uuid),
    }
}

fn to_payment_ref(row: &payments::Model, reconciled: &HashSet<Uuid>) -> PaymentRef {
    PaymentRef {
        id: PaymentId::from_uuid(row.id),
        bank_account_id: BankAccountId::from_uuid(row.bank_account_id),
        payment_date: row.payment_date,
        amount: row.amount,
        status: row.status.into(),
        is_reconciled: reconciled.contains(&row.id),
    }
}

#[derive(Debug, FromQueryResult)]
struct BalanceRow {
    balance: Option<Decimal>,
}

/// Net posted movement on a GL account up to and including `as_of`.
async fn system_balance<C: ConnectionTrait>(
    conn: &C,
    tenant_id: TenantId,
    gl_account_id: Uuid,
    as_of: NaiveDate,
) -> Result<Decimal, DbErr> {
    let row = BalanceRow::find_by_statement(Statement::from_sql_and_values(
        conn.get_database_backend(),
        r"
        SELECT SUM(jl.debit - jl.credit) AS balance
        FROM journal_lines jl
        JOIN journals j ON j.id = jl.journal_id
        WHERE j.tenant_id = $1
          AND j.status = 'POSTED'
          AND j.journal_date <= $2
          AND jl.account_id = $3
        ",
        [
            tenant_id.into_inner().into(),
            as_of.into(),
            gl_account_id.into(),
        ],
    ))
    .one(conn)
    .await?;

    Ok(row.and_then(|r| r.balance).unwrap_or(Decimal::ZERO))
}

/// Everything the matcher needs to know about one bank account.
struct BankPosition {
    account: bank_accounts::Model,
    lines: Vec<StatementLine>,
    payments: Vec<PaymentRef>,
}

impl BankPosition {
    async fn load<C: ConnectionTrait>(
        conn: &C,
        tenant_id: TenantId,
        bank_account_id: BankAccountId,
    ) -> Result<Self, ReconciliationError> {
        let account = bank_accounts::Entity::find_by_id(bank_account_id.into_inner())
            .filter(bank_accounts::Column::TenantId.eq(tenant_id.into_inner()))
            .one(conn)
            .await
            .map_err(db_error)?
            .ok_or(ReconciliationError::BankAccountNotFound(bank_account_id))?;

        let line_rows = bank_statement_lines::Entity::find()
            .filter(bank_statement_lines::Column::TenantId.eq(tenant_id.into_inner()))
            .filter(bank_statement_lines::Column::BankAccountId.eq(account.id))
            .order_by_asc(bank_statement_lines::Column::TransactionDate)
            .all(conn)
            .await
            .map_err(db_error)?;
        let reconciled: HashSet<Uuid> = line_rows
            .iter()
            .filter_map(|row| row.matched_payment_id)
            .collect();

        let payment_rows = payments::Entity::find()
            .filter(payments::Column::TenantId.eq(tenant_id.into_inner()))
            .filter(payments::Column::BankAccountId.eq(account.id))
            .order_by_asc(payments::Column::PaymentDate)
            .all(conn)
            .await
            .map_err(db_error)?;

        Ok(Self {
            account,
            lines: line_rows.iter().map(to_statement_line).collect(),
            payments: payment_rows
                .iter()
                .map(|row| to_payment_ref(row, &reconciled))
                .collect(),
        })
    }

    async fn summary<C: ConnectionTrait>(
        &self,
        conn: &C,
        tenant_id: TenantId,
        as_of: NaiveDate,
        closing_balance: Decimal,
    ) -> Result<ReconciliationSummary, ReconciliationError> {
        ReconciliationSummary::check_closing_balance(closing_balance)?;
        let system = system_balance(conn, tenant_id, self.account.gl_account_id, as_of)
            .await
            .map_err(db_error)?;
        Ok(ReconciliationSummary::compute(
            as_of,
            closing_balance,
            system,
            &self.lines,
            &self.payments,
        ))
    }
}

/// Bank reconciliation repository.
#[derive(Debug, Clone)]
pub struct ReconciliationRepository {
    db: DatabaseConnection,
}

impl ReconciliationRepository {
    /// Creates a new reconciliation repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Matches a statement line to a posted payment of exactly equal amount.
    ///
    /// Both rows are locked for the duration; on any error neither side is
    /// reconciled. There is no unmatch.
    ///
    /// # Errors
    ///
    /// Returns `AmountMismatch`, an already-reconciled error for either side,
    /// `BankAccountMismatch`, `PaymentNotPosted`, not-found errors, or a
    /// permission/database error.
    pub async fn match_line(
        &self,
        tenant_id: TenantId,
        actor: UserId,
        statement_line_id: StatementLineId,
        payment_id: PaymentId,
    ) -> Result<bank_statement_lines::Model, ReconciliationError> {
        let tx = TenantTransaction::begin(&self.db, tenant_id)
            .await
            .map_err(db_error)?;
        let conn = tx.transaction();

        let line_row = bank_statement_lines::Entity::find_by_id(statement_line_id.into_inner())
            .filter(bank_statement_lines::Column::TenantId.eq(tenant_id.into_inner()))
            .lock_exclusive()
            .one(conn)
            .await
            .map_err(db_error)?
            .ok_or(ReconciliationError::StatementLineNotFound(statement_line_id))?;

        let payment_row = payments::Entity::find_by_id(payment_id.into_inner())
            .filter(payments::Column::TenantId.eq(tenant_id.into_inner()))
            .lock_exclusive()
            .one(conn)
            .await
            .map_err(db_error)?
            .ok_or(ReconciliationError::PaymentNotFound(payment_id))?;

        let reconciled: HashSet<Uuid> = bank_statement_lines::Entity::find()
            .filter(bank_statement_lines::Column::TenantId.eq(tenant_id.into_inner()))
            .filter(bank_statement_lines::Column::MatchedPaymentId.eq(payment_row.id))
            .one(conn)
            .await
            .map_err(db_error)?
            .and_then(|row| row.matched_payment_id)
            .into_iter()
            .collect();

        let permissions = load_permissions(conn, tenant_id, actor)
            .await
            .map_err(db_error)?;
        let decision = Matcher::validate_match(
            &to_statement_line(&line_row),
            &to_payment_ref(&payment_row, &reconciled),
            actor,
            &permissions,
        )?;

        let mut active: bank_statement_lines::ActiveModel = line_row.into();
        active.matched_payment_id = Set(Some(decision.payment_id.into_inner()));
        active.matched_by = Set(Some(decision.matched_by.into_inner()));
        active.matched_at = Set(Some(decision.matched_at.into()));
        let line = active
            .update(conn)
            .await
            .map_err(|err| match err.sql_err() {
                Some(SqlErr::UniqueConstraintViolation(_)) => {
                    ReconciliationError::PaymentReconciled(payment_id)
                }
                _ => db_error(err),
            })?;

        tx.commit().await.map_err(db_error)?;
        info!(
            tenant_id = %tenant_id,
            statement_line_id = %statement_line_id,
            payment_id = %payment_id,
            actor_id = %actor,
            "Statement line matched"
        );
        Ok(line)
    }

    /// Posted, unreconciled payments of the same bank account whose amount
    /// exactly equals the statement line's.
    ///
    /// # Errors
    ///
    /// Returns not-found errors or a database error.
    pub async fn candidates(
        &self,
        tenant_id: TenantId,
        bank_account_id: BankAccountId,
        statement_line_id: StatementLineId,
    ) -> Result<Vec<PaymentRef>, ReconciliationError> {
        let tx = TenantTransaction::begin(&self.db, tenant_id)
            .await
            .map_err(db_error)?;
        let position = BankPosition::load(tx.transaction(), tenant_id, bank_account_id).await?;
        tx.commit().await.map_err(db_error)?;

        let line = position
            .lines
            .iter()
            .find(|line| line.id == statement_line_id)
            .ok_or(ReconciliationError::StatementLineNotFound(statement_line_id))?;

        Ok(Matcher::candidates(line, &position.payments)
            .into_iter()
            .cloned()
            .collect())
    }

    /// Reconciliation position of a bank account as of a date.
    ///
    /// # Errors
    ///
    /// Returns `ClosingBalanceOutOfRange`, `BankAccountNotFound` or a
    /// database error.
    pub async fn summary(
        &self,
        tenant_id: TenantId,
        bank_account_id: BankAccountId,
        as_of: NaiveDate,
        closing_balance: Decimal,
    ) -> Result<ReconciliationSummary, ReconciliationError> {
        let tx = TenantTransaction::begin(&self.db, tenant_id)
            .await
            .map_err(db_error)?;
        let position = BankPosition::load(tx.transaction(), tenant_id, bank_account_id).await?;
        let summary = position
            .summary(tx.transaction(), tenant_id, as_of, closing_balance)
            .await?;
        tx.commit().await.map_err(db_error)?;
        Ok(summary)
    }

    /// Raises a DRAFT adjustment journal for the remaining difference.
    ///
    /// Only allowed once no statement line has an exact-amount candidate
    /// left. A positive difference debits the bank's GL account.
    ///
    /// # Errors
    ///
    /// Returns `NothingToAdjust`, `MatchablePairsRemain`, a ledger validation
    /// error for the generated lines, or a permission/database error.
    pub async fn create_adjustment(
        &self,
        tenant_id: TenantId,
        actor: UserId,
        bank_account_id: BankAccountId,
        as_of: NaiveDate,
        closing_balance: Decimal,
        offset_account_id: AccountId,
    ) -> Result<JournalWithLines, ReconciliationError> {
        let tx = TenantTransaction::begin(&self.db, tenant_id)
            .await
            .map_err(db_error)?;
        tx.advisory_lock(&format!("kontor.bank.{bank_account_id}"))
            .await
            .map_err(db_error)?;
        let conn = tx.transaction();

        let position = BankPosition::load(conn, tenant_id, bank_account_id).await?;
        let summary = position
            .summary(conn, tenant_id, as_of, closing_balance)
            .await?;
        let open_lines: Vec<StatementLine> = position
            .lines
            .iter()
            .filter(|line| line.transaction_date <= as_of)
            .cloned()
            .collect();

        let permissions = load_permissions(conn, tenant_id, actor)
            .await
            .map_err(db_error)?;
        let bank_gl = AccountId::from_uuid(position.account.gl_account_id);
        let lines = Matcher::adjustment_lines(
            summary.difference_preview,
            Matcher::matchable_lines(&open_lines, &position.payments),
            bank_gl,
            offset_account_id,
            &permissions,
        )?;

        let periods = load_periods(conn, tenant_id).await.map_err(db_error)?;
        let chart = ChartOfAccounts::for_lines(conn, tenant_id, &lines, &[])
            .await
            .map_err(db_error)?;
        let draft = JournalService::prepare_draft(&lines, as_of, &periods, |id| chart.lookup(id))?;

        let created = insert_draft(
            conn,
            tenant_id,
            actor,
            NewDraft {
                journal_date: as_of,
                period_id: draft.period_id,
                description: Some(format!(
                    "Bank reconciliation adjustment: {} as of {as_of}",
                    position.account.name
                )),
                lines,
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
            bank_account_id = %bank_account_id,
            journal_id = %created.journal.id,
            difference = %summary.difference_preview,
            "Reconciliation adjustment drafted"
        );
        Ok(created)
    }
}
