//! Audit hook for mutating handlers.
//!
//! Every mutating handler funnels its result through [`Audit`], which
//! writes one record per attempt (success or refusal) and converts the
//! result into the handler's return type.

use serde_json::Value;
use uuid::Uuid;

use kontor_core::audit::{AuditAction, AuditRecord};
use kontor_db::AuditRepository;
use kontor_shared::AppError;

use crate::error::ApiError;
use crate::{AppState, middleware::AuthUser};

/// Pending audit record for one handler invocation.
pub struct Audit {
    repo: AuditRepository,
    record: AuditRecord,
}

impl Audit {
    /// Starts a record for `action` on `entity_id`.
    #[must_use]
    pub fn new(state: &AppState, auth: &AuthUser, action: AuditAction, entity_id: Uuid) -> Self {
        Self {
            repo: AuditRepository::new((*state.db).clone()),
            record: AuditRecord::new(auth.tenant_id(), auth.user_id(), action, entity_id),
        }
    }

    /// Starts a record for a create, whose entity id is known only on success.
    #[must_use]
    pub fn create(state: &AppState, auth: &AuthUser, action: AuditAction) -> Self {
        Self::new(state, auth, action, Uuid::nil())
    }

    /// Attaches context to the record.
    #[must_use]
    pub fn detail(mut self, detail: Value) -> Self {
        self.record = self.record.with_detail(detail);
        self
    }

    /// Writes the record for `result` and hands the result back.
    pub async fn finish<T, E>(self, result: Result<T, E>) -> Result<T, ApiError>
    where
        E: Into<AppError>,
    {
        self.finish_with(result, |_| None).await
    }

    /// Like [`Self::finish`], taking the entity id from the created value.
    pub async fn finish_created<T, E>(
        self,
        result: Result<T, E>,
        entity_id: impl FnOnce(&T) -> Uuid,
    ) -> Result<T, ApiError>
    where
        E: Into<AppError>,
    {
        self.finish_with(result, |value| Some(entity_id(value))).await
    }

    async fn finish_with<T, E>(
        self,
        result: Result<T, E>,
        entity_id: impl FnOnce(&T) -> Option<Uuid>,
    ) -> Result<T, ApiError>
    where
        E: Into<AppError>,
    {
        let result: Result<T, AppError> = result.map_err(Into::into);
        let mut record = self.record.finish(&result);
        if let Ok(value) = &result {
            if let Some(id) = entity_id(value) {
                record.entity_id = id;
            }
        }
        self.repo.record(record).await;
        result.map_err(ApiError)
    }
}
