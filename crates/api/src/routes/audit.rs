//! Audit trail query.

use axum::{
    Json, Router,
    extract::{Query, State},
    routing::get,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use kontor_db::AuditRepository;
use kontor_db::entities::{audit_records, sea_orm_active_enums::AuditOutcome};
use kontor_shared::AppError;

use crate::error::ApiError;
use crate::{AppState, middleware::AuthUser};

/// Creates the audit routes.
pub fn routes() -> Router<AppState> {
    Router::new().route("/audit", get(list_audit))
}

/// Query parameters for the audit trail.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditQuery {
    /// Journal, period, template, statement line, role or user.
    pub entity_id: Uuid,
}

/// One audit record.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditResponse {
    /// Record ID.
    pub id: Uuid,
    /// Acting user.
    pub actor_id: Uuid,
    /// Action code.
    pub action: String,
    /// Entity acted on.
    pub entity_id: Uuid,
    /// `success` or `failure`.
    pub result: &'static str,
    /// Error code on failure.
    pub error_code: Option<String>,
    /// Context.
    pub detail: Option<serde_json::Value>,
    /// When.
    pub timestamp: String,
}

impl From<audit_records::Model> for AuditResponse {
    fn from(r: audit_records::Model) -> Self {
        Self {
            id: r.id,
            actor_id: r.actor_id,
            action: r.action,
            entity_id: r.entity_id,
            result: match r.outcome {
                AuditOutcome::Success => "success",
                AuditOutcome::Failure => "failure",
            },
            error_code: r.error_code,
            detail: r.detail,
            timestamp: r.occurred_at.to_rfc3339(),
        }
    }
}

/// GET `/audit?entityId=` - Audit trail of one entity, oldest first.
async fn list_audit(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(query): Query<AuditQuery>,
) -> Result<Json<Vec<AuditResponse>>, ApiError> {
    let records = AuditRepository::new((*state.db).clone())
        .list_for_entity(auth.tenant_id(), query.entity_id)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;
    Ok(Json(records.into_iter().map(Into::into).collect()))
}
