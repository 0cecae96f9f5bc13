//! Tenant-scoped transactions.
//!
//! Every repository operation runs inside a [`TenantTransaction`], which sets
//! the `PostgreSQL` session variable `app.current_tenant_id` so that the
//! row-level security policies only expose the caller's tenant.
//!
//! ```ignore
//! let tx = TenantTransaction::begin(&db, tenant_id).await?;
//! let journals = journals::Entity::find().all(tx.transaction()).await?;
//! tx.commit().await?;
//! ```

use sea_orm::{
    ConnectionTrait, DatabaseConnection, DatabaseTransaction, DbBackend, DbErr, Statement,
    TransactionTrait,
};

use kontor_shared::types::TenantId;

/// A database transaction bound to one tenant.
pub struct TenantTransaction {
    txn: DatabaseTransaction,
    tenant_id: TenantId,
}

impl TenantTransaction {
    /// Begins a transaction and sets the tenant context with `SET LOCAL`,
    /// scoping it to this transaction only.
    ///
    /// # Errors
    ///
    /// Returns an error if the transaction cannot be started or the context
    /// cannot be set.
    pub async fn begin(db: &DatabaseConnection, tenant_id: TenantId) -> Result<Self, DbErr> {
        let txn = db.begin().await?;
        txn.execute_unprepared(&tenant_context_sql(tenant_id)).await?;
        Ok(Self { txn, tenant_id })
    }

    /// The tenant this transaction is scoped to.
    #[must_use]
    pub const fn tenant_id(&self) -> TenantId {
        self.tenant_id
    }

    /// Returns the underlying transaction for executing queries.
    #[must_use]
    pub fn transaction(&self) -> &DatabaseTransaction {
        &self.txn
    }

    /// Serializes writers of one tenant-wide resource (period calendar,
    /// role grants) until this transaction ends.
    ///
    /// # Errors
    ///
    /// Returns an error if the lock query fails.
    pub async fn advisory_lock(&self, scope: &str) -> Result<(), DbErr> {
        let key = format!("{scope}:{}", self.tenant_id);
        self.txn
            .execute(Statement::from_sql_and_values(
                DbBackend::Postgres,
                "SELECT pg_advisory_xact_lock(hashtextextended($1, 0))",
                [key.into()],
            ))
            .await?;
        Ok(())
    }

    /// Commits the transaction.
    ///
    /// # Errors
    ///
    /// Returns an error if the commit fails.
    pub async fn commit(self) -> Result<(), DbErr> {
        self.txn.commit().await
    }

    /// Rolls back the transaction.
    ///
    /// # Errors
    ///
    /// Returns an error if the rollback fails.
    pub async fn rollback(self) -> Result<(), DbErr> {
        self.txn.rollback().await
    }
}

/// Extension trait for `DatabaseConnection` to open tenant transactions.
#[async_trait::async_trait]
pub trait TenantExt {
    /// Opens a transaction scoped to `tenant_id`.
    ///
    /// # Errors
    ///
    /// Returns an error if the transaction cannot be created.
    async fn for_tenant(&self, tenant_id: TenantId) -> Result<TenantTransaction, DbErr>;
}

#[async_trait::async_trait]
impl TenantExt for DatabaseConnection {
    async fn for_tenant(&self, tenant_id: TenantId) -> Result<TenantTransaction, DbErr> {
        TenantTransaction::begin(self, tenant_id).await
    }
}

/// The tenant id is a parsed UUID, so interpolation cannot inject SQL.
fn tenant_context_sql(tenant_id: TenantId) -> String {
    format!("SET LOCAL app.current_tenant_id = '{tenant_id}'")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tenant_context_sql_format() {
        let tenant_id: TenantId = "550e8400-e29b-41d4-a716-446655440000".parse().unwrap();
        assert_eq!(
            tenant_context_sql(tenant_id),
            "SET LOCAL app.current_tenant_id = '550e8400-e29b-41d4-a716-446655440000'"
        );
    }
}
