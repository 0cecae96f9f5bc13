//! Repository abstractions for data access.
//!
//! Each repository opens a [`TenantTransaction`](crate::TenantTransaction)
//! per operation, loads the facts the core services need (row-locked where
//! the operation transitions state), lets the core decide, and writes the
//! result before committing.

pub mod account;
pub mod audit;
pub mod journal;
pub mod period;
pub mod policy;
pub mod recurring;
pub mod reconciliation;

pub use account::ChartOfAccounts;
pub use audit::AuditRepository;
pub use journal::{JournalFilter, JournalInput, JournalRepository, JournalWithLines};
pub use period::{CreatePeriodInput, PeriodRepository, PeriodWithChecklist};
pub use policy::{CreateRoleInput, PolicyRepository, RoleWithPermissions};
pub use recurring::{CreateTemplateInput, RecurringRepository};
pub use reconciliation::ReconciliationRepository;
