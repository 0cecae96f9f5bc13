//! Enables FORCE ROW LEVEL SECURITY on every tenant table.
//!
//! Without it the table owner (usually the migration role) bypasses the
//! tenant policies.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        db.execute_unprepared(FORCE_RLS_SQL).await?;
        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        db.execute_unprepared(DISABLE_FORCE_RLS_SQL).await?;
        Ok(())
    }
}

const FORCE_RLS_SQL: &str = r"
ALTER TABLE roles FORCE ROW LEVEL SECURITY;
ALTER TABLE role_permissions FORCE ROW LEVEL SECURITY;
ALTER TABLE user_roles FORCE ROW LEVEL SECURITY;
ALTER TABLE sod_rules FORCE ROW LEVEL SECURITY;
ALTER TABLE accounts FORCE ROW LEVEL SECURITY;
ALTER TABLE accounting_periods FORCE ROW LEVEL SECURITY;
ALTER TABLE period_checklist_items FORCE ROW LEVEL SECURITY;
ALTER TABLE journals FORCE ROW LEVEL SECURITY;
ALTER TABLE journal_lines FORCE ROW LEVEL SECURITY;
ALTER TABLE account_period_balances FORCE ROW LEVEL SECURITY;
ALTER TABLE recurring_templates FORCE ROW LEVEL SECURITY;
ALTER TABLE recurring_generations FORCE ROW LEVEL SECURITY;
ALTER TABLE bank_accounts FORCE ROW LEVEL SECURITY;
ALTER TABLE payments FORCE ROW LEVEL SECURITY;
ALTER TABLE bank_statement_lines FORCE ROW LEVEL SECURITY;
ALTER TABLE audit_records FORCE ROW LEVEL SECURITY;
";

const DISABLE_FORCE_RLS_SQL: &str = r"
ALTER TABLE roles NO FORCE ROW LEVEL SECURITY;
ALTER TABLE role_permissions NO FORCE ROW LEVEL SECURITY;
ALTER TABLE user_roles NO FORCE ROW LEVEL SECURITY;
ALTER TABLE sod_rules NO FORCE ROW LEVEL SECURITY;
ALTER TABLE accounts NO FORCE ROW LEVEL SECURITY;
ALTER TABLE accounting_periods NO FORCE ROW LEVEL SECURITY;
ALTER TABLE period_checklist_items NO FORCE ROW LEVEL SECURITY;
ALTER TABLE journals NO FORCE ROW LEVEL SECURITY;
ALTER TABLE journal_lines NO FORCE ROW LEVEL SECURITY;
ALTER TABLE account_period_balances NO FORCE ROW LEVEL SECURITY;
ALTER TABLE recurring_templates NO FORCE ROW LEVEL SECURITY;
ALTER TABLE recurring_generations NO FORCE ROW LEVEL SECURITY;
ALTER TABLE bank_accounts NO FORCE ROW LEVEL SECURITY;
ALTER TABLE payments NO FORCE ROW LEVEL SECURITY;
ALTER TABLE bank_statement_lines NO FORCE ROW LEVEL SECURITY;
ALTER TABLE audit_records NO FORCE ROW LEVEL SECURITY;
";
