//! Database layer with `SeaORM` entities and repositories.
//!
//! This crate provides:
//! - `SeaORM` entity definitions
//! - Tenant-scoped transactions backed by row-level security
//! - Repositories that load facts, run the `kontor-core` checks and persist
//!   the outcome in one transaction
//! - Database migrations

pub mod entities;
pub mod migration;
pub mod repositories;
pub mod tenant;

pub use repositories::{
    AuditRepository, ChartOfAccounts, CreatePeriodInput, CreateRoleInput, CreateTemplateInput,
    JournalFilter, JournalInput, JournalRepository, JournalWithLines, PeriodRepository,
    PeriodWithChecklist, PolicyRepository, ReconciliationRepository, RecurringRepository,
    RoleWithPermissions,
};
pub use tenant::{TenantExt, TenantTransaction};

use sea_orm::{ConnectOptions, Database, DatabaseConnection, DbErr};

use kontor_shared::config::DatabaseConfig;

/// Establishes a connection pool to the database.
///
/// # Errors
///
/// Returns an error if the connection cannot be established.
pub async fn connect(config: &DatabaseConfig) -> Result<DatabaseConnection, DbErr> {
    let mut options = ConnectOptions::new(config.url.clone());
    options
        .max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .sqlx_logging(false);
    Database::connect(options).await
}
