//! `SeaORM` entity definitions.
//!
//! Every tenant-owned table carries `tenant_id`; row-level security filters
//! on it inside a [`crate::TenantTransaction`].

pub mod prelude;

pub mod account_period_balances;
pub mod accounting_periods;
pub mod accounts;
pub mod audit_records;
pub mod bank_accounts;
pub mod bank_statement_lines;
pub mod journal_lines;
pub mod journals;
pub mod payments;
pub mod period_checklist_items;
pub mod permissions;
pub mod recurring_generations;
pub mod recurring_templates;
pub mod role_permissions;
pub mod roles;
pub mod sea_orm_active_enums;
pub mod sod_rules;
pub mod user_roles;
