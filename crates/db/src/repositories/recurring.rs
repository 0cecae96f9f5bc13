//! Recurring template storage and journal generation.

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter,
    QueryOrder, QuerySelect, Set, SqlErr,
};
use tracing::{info, warn};

use kontor_core::ledger::{JournalLineInput, validate_lines};
use kontor_core::policy::{Permission, PolicyEvaluator};
use kontor_core::recurring::{RecurringError, RecurringGenerator, RecurringTemplate, Schedule};
use kontor_shared::types::{PeriodId, TemplateId, TenantId, UserId};

use crate::entities::{accounting_periods, recurring_generations, recurring_templates};
use crate::repositories::account::ChartOfAccounts;
use crate::repositories::journal::{JournalWithLines, NewDraft, insert_draft};
use crate::repositories::period::to_period;
use crate::repositories::policy::load_permissions;
use crate::tenant::TenantTransaction;

fn db_error(err: DbErr) -> RecurringError {
    RecurringError::Database(err.to_string())
}

/// Maps a template row to the generator's view.
///
/// # Errors
///
/// Returns an error if the stored lines are not a valid line array.
pub fn to_template(row: &recurring_templates::Model) -> Result<RecurringTemplate, RecurringError> {
    let lines: Vec<JournalLineInput> = serde_json::from_value(row.lines.clone())
        .map_err(|e| RecurringError::Database(format!("Malformed template lines: {e}")))?;
    Ok(RecurringTemplate {
        id: TemplateId::from_uuid(row.id),
        name: row.name.clone(),
        lines,
        schedule: row.schedule.into(),
        is_active: row.is_active,
        last_generated_period_id: row.last_generated_period_id.map(PeriodId::from_uuid),
    })
}

/// Input for creating a template.
#[derive(Debug, Clone)]
pub struct CreateTemplateInput {
    /// Template name.
    pub name: String,
    /// Informational schedule.
    pub schedule: Schedule,
    /// Lines copied into each generated journal.
    pub lines: Vec<JournalLineInput>,
}

/// Recurring template repository.
#[derive(Debug, Clone)]
pub struct RecurringRepository {
    db: DatabaseConnection,
}

impl RecurringRepository {
    /// Creates a new recurring repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Stores a template after validating its lines against the chart.
    ///
    /// # Errors
    ///
    /// Returns an error if the actor lacks `recurring.generate`, the lines
    /// are invalid, or a database operation fails.
    pub async fn create_template(
        &self,
        tenant_id: TenantId,
        actor: UserId,
        input: CreateTemplateInput,
    ) -> Result<recurring_templates::Model, RecurringError> {
        let tx = TenantTransaction::begin(&self.db, tenant_id)
            .await
            .map_err(db_error)?;
        let conn = tx.transaction();

        let permissions = load_permissions(conn, tenant_id, actor)
            .await
            .map_err(db_error)?;
        PolicyEvaluator::check_permission(&permissions, Permission::RecurringGenerate)?;

        let chart = ChartOfAccounts::for_lines(conn, tenant_id, &input.lines, &[])
            .await
            .map_err(db_error)?;
        validate_lines(&input.lines, |id| chart.lookup(id))?;

        let lines = serde_json::to_value(&input.lines)
            .map_err(|e| RecurringError::Database(e.to_string()))?;
        let now = Utc::now().into();
        let template = recurring_templates::ActiveModel {
            id: Set(TemplateId::new().into_inner()),
            tenant_id: Set(tenant_id.into_inner()),
            name: Set(input.name),
            schedule: Set(input.schedule.into()),
            lines: Set(lines),
            is_active: Set(true),
            last_generated_period_id: Set(None),
            created_by: Set(actor.into_inner()),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(conn)
        .await
        .map_err(db_error)?;

        tx.commit().await.map_err(db_error)?;
        info!(tenant_id = %tenant_id, template_id = %template.id, "Recurring template created");
        Ok(template)
    }

    /// Lists the tenant's templates by name.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn list_templates(
        &self,
        tenant_id: TenantId,
    ) -> Result<Vec<recurring_templates::Model>, RecurringError> {
        let tx = TenantTransaction::begin(&self.db, tenant_id)
            .await
            .map_err(db_error)?;
        let rows = recurring_templates::Entity::find()
            .filter(recurring_templates::Column::TenantId.eq(tenant_id.into_inner()))
            .order_by_asc(recurring_templates::Column::Name)
            .all(tx.transaction())
            .await
            .map_err(db_error)?;
        tx.commit().await.map_err(db_error)?;
        Ok(rows)
    }

    /// Gets a template.
    ///
    /// # Errors
    ///
    /// Returns `TemplateNotFound` or a database error.
    pub async fn get_template(
        &self,
        tenant_id: TenantId,
        template_id: TemplateId,
    ) -> Result<recurring_templates::Model, RecurringError> {
        let tx = TenantTransaction::begin(&self.db, tenant_id)
            .await
            .map_err(db_error)?;
        let row = recurring_templates::Entity::find_by_id(template_id.into_inner())
            .filter(recurring_templates::Column::TenantId.eq(tenant_id.into_inner()))
            .one(tx.transaction())
            .await
            .map_err(db_error)?
            .ok_or(RecurringError::TemplateNotFound(template_id))?;
        tx.commit().await.map_err(db_error)?;
        Ok(row)
    }

    /// Generates one DRAFT journal from a template for a period.
    ///
    /// The template row is locked for the duration, and the
    /// `(template, period)` unique index backs the check, so concurrent
    /// requests for the same pair produce exactly one journal.
    ///
    /// # Errors
    ///
    /// Returns `AlreadyGenerated` for a repeated pair, `InvalidLines` when
    /// the template no longer validates, not-found errors, or a
    /// permission/database error.
    pub async fn generate(
        &self,
        tenant_id: TenantId,
        actor: UserId,
        template_id: TemplateId,
        period_id: PeriodId,
    ) -> Result<JournalWithLines, RecurringError> {
        let tx = TenantTransaction::begin(&self.db, tenant_id)
            .await
            .map_err(db_error)?;
        let conn = tx.transaction();

        let row = recurring_templates::Entity::find_by_id(template_id.into_inner())
            .filter(recurring_templates::Column::TenantId.eq(tenant_id.into_inner()))
            .lock_exclusive()
            .one(conn)
            .await
            .map_err(db_error)?
            .ok_or(RecurringError::TemplateNotFound(template_id))?;
        let template = to_template(&row)?;

        let period = accounting_periods::Entity::find_by_id(period_id.into_inner())
            .filter(accounting_periods::Column::TenantId.eq(tenant_id.into_inner()))
            .one(conn)
            .await
            .map_err(db_error)?
            .map(|row| to_period(&row))
            .ok_or(RecurringError::PeriodNotFound(period_id))?;

        let already_generated = recurring_generations::Entity::find()
            .filter(recurring_generations::Column::TenantId.eq(tenant_id.into_inner()))
            .filter(recurring_generations::Column::TemplateId.eq(template_id.into_inner()))
            .filter(recurring_generations::Column::PeriodId.eq(period_id.into_inner()))
            .one(conn)
            .await
            .map_err(db_error)?
            .is_some();

        let permissions = load_permissions(conn, tenant_id, actor)
            .await
            .map_err(db_error)?;
        let chart = ChartOfAccounts::for_lines(conn, tenant_id, &template.lines, &[])
            .await
            .map_err(db_error)?;

        let generated = RecurringGenerator::generate(
            &template,
            &period,
            already_generated,
            &permissions,
            |id| chart.lookup(id),
        )
        .inspect_err(|err| {
            if matches!(err, RecurringError::InvalidLines(_)) {
                warn!(tenant_id = %tenant_id, template_id = %template_id, error = %err, "Template no longer validates");
            }
        })?;

        let created = insert_draft(
            conn,
            tenant_id,
            actor,
            NewDraft {
                journal_date: generated.journal_date,
                period_id,
                description: Some(generated.description),
                lines: generated.lines,
                totals: generated.totals,
                reverses_journal_id: None,
                source_template_id: Some(template_id),
            },
        )
        .await
        .map_err(db_error)?;

        recurring_generations::ActiveModel {
            id: Set(uuid::Uuid::now_v7()),
            tenant_id: Set(tenant_id.into_inner()),
            template_id: Set(template_id.into_inner()),
            period_id: Set(period_id.into_inner()),
            journal_id: Set(created.journal.id),
            generated_by: Set(actor.into_inner()),
            generated_at: Set(Utc::now().into()),
        }
        .insert(conn)
        .await
        .map_err(|err| match err.sql_err() {
            Some(SqlErr::UniqueConstraintViolation(_)) => RecurringError::AlreadyGenerated {
                template_id,
                period_id,
            },
            _ => db_error(err),
        })?;

        let mut active: recurring_templates::ActiveModel = row.into();
        active.last_generated_period_id = Set(Some(period_id.into_inner()));
        active.updated_at = Set(Utc::now().into());
        active.update(conn).await.map_err(db_error)?;

        tx.commit().await.map_err(db_error)?;
        info!(
            tenant_id = %tenant_id,
            template_id = %template_id,
            period_id = %period_id,
            journal_id = %created.journal.id,
            "Recurring journal generated"
        );
        Ok(created)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kontor_shared::types::AccountId;
    use rust_decimal_macros::dec;
    use uuid::Uuid;

    use crate::entities::sea_orm_active_enums::RecurringSchedule;

    fn template_row(lines: serde_json::Value) -> recurring_templates::Model {
        let now = Utc::now().into();
        recurring_templates::Model {
            id: Uuid::now_v7(),
            tenant_id: Uuid::now_v7(),
            name: "Monthly rent".into(),
            schedule: RecurringSchedule::Monthly,
            lines,
            is_active: true,
            last_generated_period_id: None,
            created_by: Uuid::now_v7(),
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_to_template_reads_stored_lines() {
        let expense = AccountId::new();
        let bank = AccountId::new();
        let lines = vec![
            JournalLineInput::debit(expense, dec!(1500.00)),
            JournalLineInput::credit(bank, dec!(1500.00)),
        ];
        let row = template_row(serde_json::to_value(&lines).unwrap());

        let template = to_template(&row).unwrap();
        assert_eq!(template.lines, lines);
        assert_eq!(template.schedule, Schedule::Monthly);
        assert!(template.last_generated_period_id.is_none());
    }

    #[test]
    fn test_to_template_rejects_malformed_lines() {
        let row = template_row(serde_json::json!({"not": "an array"}));
        assert!(matches!(
            to_template(&row),
            Err(RecurringError::Database(_))
        ));
    }
}
