//! Recurring template routes.

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use uuid::Uuid;

use kontor_core::audit::AuditAction;
use kontor_core::ledger::JournalLineInput;
use kontor_core::recurring::{RecurringError, Schedule};
use kontor_db::entities::recurring_templates;
use kontor_db::{CreateTemplateInput, RecurringRepository};
use kontor_shared::types::{PeriodId, TemplateId};

use super::journals::JournalResponse;
use crate::audit::Audit;
use crate::error::ApiError;
use crate::{AppState, middleware::AuthUser};

/// Creates the recurring template routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route(
            "/recurring-templates",
            get(list_templates).post(create_template),
        )
        .route("/recurring-templates/{template_id}", get(get_template))
        .route(
            "/recurring-templates/{template_id}/generate",
            post(generate_journal),
        )
}

/// Request body for creating a template.
#[derive(Debug, Deserialize)]
pub struct CreateTemplateRequest {
    /// Template name.
    pub name: String,
    /// `monthly`, `quarterly` or `annually`.
    pub schedule: Schedule,
    /// Balanced lines copied into every generated journal.
    pub lines: Vec<JournalLineInput>,
}

/// Request body for generating a journal.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateRequest {
    /// Target period; must be OPEN.
    pub period_id: PeriodId,
}

/// A stored template.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplateResponse {
    /// Template ID.
    pub id: Uuid,
    /// Name.
    pub name: String,
    /// Schedule.
    pub schedule: Schedule,
    /// Line template.
    pub lines: serde_json::Value,
    /// Whether generation is allowed.
    pub is_active: bool,
    /// Most recent period generated for.
    pub last_generated_period_id: Option<Uuid>,
    /// Created at timestamp.
    pub created_at: String,
}

impl From<recurring_templates::Model> for TemplateResponse {
    fn from(t: recurring_templates::Model) -> Self {
        Self {
            id: t.id,
            name: t.name,
            schedule: t.schedule.into(),
            lines: t.lines,
            is_active: t.is_active,
            last_generated_period_id: t.last_generated_period_id,
            created_at: t.created_at.to_rfc3339(),
        }
    }
}

fn repo(state: &AppState) -> RecurringRepository {
    RecurringRepository::new((*state.db).clone())
}

/// POST `/recurring-templates` - Store a template after validating its lines.
async fn create_template(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(payload): Json<CreateTemplateRequest>,
) -> Result<(StatusCode, Json<TemplateResponse>), ApiError> {
    let input = CreateTemplateInput {
        name: payload.name,
        schedule: payload.schedule,
        lines: payload.lines,
    };
    let result = repo(&state)
        .create_template(auth.tenant_id(), auth.user_id(), input)
        .await;
    let template = Audit::create(&state, &auth, AuditAction::TemplateCreate)
        .finish_created(result, |t| t.id)
        .await?;
    Ok((StatusCode::CREATED, Json(template.into())))
}

/// GET `/recurring-templates` - List templates by name.
async fn list_templates(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<Vec<TemplateResponse>>, ApiError> {
    let templates = repo(&state).list_templates(auth.tenant_id()).await?;
    Ok(Json(templates.into_iter().map(Into::into).collect()))
}

/// GET `/recurring-templates/{template_id}` - Get a template.
async fn get_template(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(template_id): Path<TemplateId>,
) -> Result<Json<TemplateResponse>, ApiError> {
    let template = repo(&state)
        .get_template(auth.tenant_id(), template_id)
        .await?;
    Ok(Json(template.into()))
}

/// POST `/recurring-templates/{template_id}/generate` - One DRAFT per (template, period).
async fn generate_journal(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(template_id): Path<TemplateId>,
    Json(payload): Json<GenerateRequest>,
) -> Result<(StatusCode, Json<JournalResponse>), ApiError> {
    let result: Result<_, RecurringError> = repo(&state)
        .generate(auth.tenant_id(), auth.user_id(), template_id, payload.period_id)
        .await;
    let journal = Audit::new(&state, &auth, AuditAction::RecurringGenerate, template_id.into_inner())
        .detail(json!({ "periodId": payload.period_id }))
        .finish(result)
        .await?;
    Ok((StatusCode::CREATED, Json(journal.into())))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_request_parses_schedule() {
        let body = json!({
            "name": "Monthly rent",
            "schedule": "quarterly",
            "lines": []
        });
        let req: CreateTemplateRequest = serde_json::from_value(body).unwrap();
        assert_eq!(req.schedule, Schedule::Quarterly);
    }

    #[test]
    fn test_create_request_rejects_unknown_schedule() {
        let body = json!({ "name": "x", "schedule": "weekly", "lines": [] });
        assert!(serde_json::from_value::<CreateTemplateRequest>(body).is_err());
    }
}
