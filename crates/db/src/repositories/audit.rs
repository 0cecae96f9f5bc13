//! Audit trail persistence.
//!
//! Records are written in their own tenant transaction after the audited
//! operation has committed or rolled back, so refused operations leave a
//! trace too.

use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter,
    QueryOrder, Set,
};
use tracing::error;
use uuid::Uuid;

use kontor_core::audit::AuditRecord;
use kontor_shared::types::TenantId;

use crate::entities::audit_records;
use crate::tenant::TenantTransaction;

/// Audit record repository.
#[derive(Debug, Clone)]
pub struct AuditRepository {
    db: DatabaseConnection,
}

impl AuditRepository {
    /// Creates a new audit repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Persists a record. A failed write is logged, never propagated: the
    /// audited operation's result stands either way.
    pub async fn record(&self, record: AuditRecord) {
        let action = record.action;
        let entity_id = record.entity_id;
        if let Err(err) = self.insert(record).await {
            error!(%action, %entity_id, error = %err, "Failed to write audit record");
        }
    }

    async fn insert(&self, record: AuditRecord) -> Result<(), DbErr> {
        let tx = TenantTransaction::begin(&self.db, record.tenant_id).await?;
        audit_records::ActiveModel {
            id: Set(record.id.into_inner()),
            tenant_id: Set(record.tenant_id.into_inner()),
            actor_id: Set(record.actor_id.into_inner()),
            action: Set(record.action.as_str().to_string()),
            entity_id: Set(record.entity_id),
            outcome: Set(record.outcome.into()),
            error_code: Set(record.error_code),
            detail: Set(record.detail),
            occurred_at: Set(record.occurred_at.into()),
        }
        .insert(tx.transaction())
        .await?;
        tx.commit().await
    }

    /// Lists the audit trail of one entity, oldest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn list_for_entity(
        &self,
        tenant_id: TenantId,
        entity_id: Uuid,
    ) -> Result<Vec<audit_records::Model>, DbErr> {
        let tx = TenantTransaction::begin(&self.db, tenant_id).await?;
        let rows = audit_records::Entity::find()
            .filter(audit_records::Column::TenantId.eq(tenant_id.into_inner()))
            .filter(audit_records::Column::EntityId.eq(entity_id))
            .order_by_asc(audit_records::Column::OccurredAt)
            .all(tx.transaction())
            .await?;
        tx.commit().await?;
        Ok(rows)
    }
}
