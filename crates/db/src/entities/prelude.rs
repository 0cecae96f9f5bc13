//! Entity re-exports.

pub use super::account_period_balances::Entity as AccountPeriodBalances;
pub use super::accounting_periods::Entity as AccountingPeriods;
pub use super::accounts::Entity as Accounts;
pub use super::audit_records::Entity as AuditRecords;
pub use super::bank_accounts::Entity as BankAccounts;
pub use super::bank_statement_lines::Entity as BankStatementLines;
pub use super::journal_lines::Entity as JournalLines;
pub use super::journals::Entity as Journals;
pub use super::payments::Entity as Payments;
pub use super::period_checklist_items::Entity as PeriodChecklistItems;
pub use super::permissions::Entity as Permissions;
pub use super::recurring_generations::Entity as RecurringGenerations;
pub use super::recurring_templates::Entity as RecurringTemplates;
pub use super::role_permissions::Entity as RolePermissions;
pub use super::roles::Entity as Roles;
pub use super::sod_rules::Entity as SodRules;
pub use super::user_roles::Entity as UserRoles;
