//! Accounting period routes: creation, close, lock, reopen and the close checklist.

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::{get, patch},
};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::json;
use uuid::Uuid;

use kontor_core::audit::AuditAction;
use kontor_core::period::PeriodStatus;
use kontor_db::entities::{account_period_balances, accounting_periods, period_checklist_items};
use kontor_db::{CreatePeriodInput, PeriodRepository, PeriodWithChecklist};
use kontor_shared::types::PeriodId;

use crate::audit::Audit;
use crate::error::ApiError;
use crate::{AppState, middleware::AuthUser};

/// Creates the period routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/periods", get(list_periods).post(create_period))
        .route("/periods/{period_id}", get(get_period))
        .route("/periods/{period_id}/close", patch(close_period))
        .route("/periods/{period_id}/lock", patch(lock_period))
        .route("/periods/{period_id}/reopen", patch(reopen_period))
        .route(
            "/periods/{period_id}/checklist/{code}/complete",
            patch(complete_checklist_item),
        )
        .route("/periods/{period_id}/balances", get(period_balances))
}

// ============================================================================
// Request/Response Types
// ============================================================================

/// Request body for creating a period.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePeriodRequest {
    /// Display name; defaults to the date range.
    pub name: Option<String>,
    /// First day, inclusive.
    pub start_date: NaiveDate,
    /// Last day, inclusive.
    pub end_date: NaiveDate,
}

/// Period header.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PeriodSummary {
    /// Period ID.
    pub id: Uuid,
    /// Display name.
    pub name: String,
    /// First day.
    pub start_date: NaiveDate,
    /// Last day.
    pub end_date: NaiveDate,
    /// `OPEN`, `CLOSED` or `LOCKED`.
    pub status: &'static str,
    /// Last closer.
    pub closed_by: Option<Uuid>,
    /// Last close timestamp.
    pub closed_at: Option<String>,
    /// Locker.
    pub locked_by: Option<Uuid>,
    /// Lock timestamp.
    pub locked_at: Option<String>,
    /// Last reopener.
    pub reopened_by: Option<Uuid>,
    /// Last reopen timestamp.
    pub reopened_at: Option<String>,
}

impl From<accounting_periods::Model> for PeriodSummary {
    fn from(p: accounting_periods::Model) -> Self {
        Self {
            id: p.id,
            name: p.name,
            start_date: p.start_date,
            end_date: p.end_date,
            status: PeriodStatus::from(p.status).as_str(),
            closed_by: p.closed_by,
            closed_at: p.closed_at.map(|t| t.to_rfc3339()),
            locked_by: p.locked_by,
            locked_at: p.locked_at.map(|t| t.to_rfc3339()),
            reopened_by: p.reopened_by,
            reopened_at: p.reopened_at.map(|t| t.to_rfc3339()),
        }
    }
}

/// One close checklist item.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChecklistItemResponse {
    /// Stable item code.
    pub code: String,
    /// Human label.
    pub label: String,
    /// Whether the item is signed off.
    pub completed: bool,
    /// Who signed it off.
    pub completed_by: Option<Uuid>,
    /// When.
    pub completed_at: Option<String>,
}

impl From<period_checklist_items::Model> for ChecklistItemResponse {
    fn from(item: period_checklist_items::Model) -> Self {
        Self {
            code: item.code,
            label: item.label,
            completed: item.completed_at.is_some(),
            completed_by: item.completed_by,
            completed_at: item.completed_at.map(|t| t.to_rfc3339()),
        }
    }
}

/// A period with its checklist.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PeriodResponse {
    /// Header.
    #[serde(flatten)]
    pub period: PeriodSummary,
    /// Close checklist.
    pub checklist: Vec<ChecklistItemResponse>,
}

impl From<PeriodWithChecklist> for PeriodResponse {
    fn from(p: PeriodWithChecklist) -> Self {
        Self {
            period: p.period.into(),
            checklist: p.checklist.into_iter().map(Into::into).collect(),
        }
    }
}

/// Posted totals for one account in a period.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BalanceResponse {
    /// Account.
    pub account_id: Uuid,
    /// Sum of posted debits.
    pub debit_total: Decimal,
    /// Sum of posted credits.
    pub credit_total: Decimal,
    /// Debits minus credits.
    pub net: Decimal,
}

impl From<account_period_balances::Model> for BalanceResponse {
    fn from(b: account_period_balances::Model) -> Self {
        Self {
            account_id: b.account_id,
            net: b.debit_total - b.credit_total,
            debit_total: b.debit_total,
            credit_total: b.credit_total,
        }
    }
}

fn repo(state: &AppState) -> PeriodRepository {
    PeriodRepository::new((*state.db).clone())
}

// ============================================================================
// Route Handlers
// ============================================================================

/// POST `/periods` - Create an OPEN period with the baseline checklist.
async fn create_period(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(payload): Json<CreatePeriodRequest>,
) -> Result<(StatusCode, Json<PeriodResponse>), ApiError> {
    let detail = json!({ "startDate": payload.start_date, "endDate": payload.end_date });
    let input = CreatePeriodInput {
        name: payload.name,
        start_date: payload.start_date,
        end_date: payload.end_date,
    };
    let result = repo(&state)
        .create(auth.tenant_id(), auth.user_id(), input)
        .await;
    let period = Audit::create(&state, &auth, AuditAction::PeriodCreate)
        .detail(detail)
        .finish_created(result, |p| p.period.id)
        .await?;
    Ok((StatusCode::CREATED, Json(period.into())))
}

/// GET `/periods` - List periods by start date.
async fn list_periods(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<Vec<PeriodSummary>>, ApiError> {
    let periods = repo(&state).list(auth.tenant_id()).await?;
    Ok(Json(periods.into_iter().map(Into::into).collect()))
}

/// GET `/periods/{period_id}` - Get a period with its checklist.
async fn get_period(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(period_id): Path<PeriodId>,
) -> Result<Json<PeriodResponse>, ApiError> {
    let period = repo(&state).get(auth.tenant_id(), period_id).await?;
    Ok(Json(period.into()))
}

/// PATCH `/periods/{period_id}/close` - OPEN to CLOSED.
async fn close_period(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(period_id): Path<PeriodId>,
) -> Result<Json<PeriodResponse>, ApiError> {
    let require_checklist = state.ledger.require_close_checklist;
    let result = repo(&state)
        .close(auth.tenant_id(), auth.user_id(), period_id, require_checklist)
        .await;
    let period = Audit::new(&state, &auth, AuditAction::PeriodClose, period_id.into_inner())
        .detail(json!({ "requireChecklist": require_checklist }))
        .finish(result)
        .await?;
    Ok(Json(period.into()))
}

/// PATCH `/periods/{period_id}/lock` - CLOSED to LOCKED.
async fn lock_period(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(period_id): Path<PeriodId>,
) -> Result<Json<PeriodResponse>, ApiError> {
    let result = repo(&state)
        .lock(auth.tenant_id(), auth.user_id(), period_id)
        .await;
    let period = Audit::new(&state, &auth, AuditAction::PeriodLock, period_id.into_inner())
        .finish(result)
        .await?;
    Ok(Json(period.into()))
}

/// PATCH `/periods/{period_id}/reopen` - CLOSED or LOCKED back to OPEN.
async fn reopen_period(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(period_id): Path<PeriodId>,
) -> Result<Json<PeriodResponse>, ApiError> {
    let result = repo(&state)
        .reopen(auth.tenant_id(), auth.user_id(), period_id)
        .await;
    let period = Audit::new(&state, &auth, AuditAction::PeriodReopen, period_id.into_inner())
        .finish(result)
        .await?;
    Ok(Json(period.into()))
}

/// PATCH `/periods/{period_id}/checklist/{code}/complete` - Sign off an item.
async fn complete_checklist_item(
    State(state): State<AppState>,
    auth: AuthUser,
    Path((period_id, code)): Path<(PeriodId, String)>,
) -> Result<Json<ChecklistItemResponse>, ApiError> {
    let result = repo(&state)
        .complete_checklist_item(auth.tenant_id(), auth.user_id(), period_id, &code)
        .await;
    let item = Audit::new(&state, &auth, AuditAction::ChecklistComplete, period_id.into_inner())
        .detail(json!({ "code": code }))
        .finish(result)
        .await?;
    Ok(Json(item.into()))
}

/// GET `/periods/{period_id}/balances` - Posted per-account totals.
async fn period_balances(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(period_id): Path<PeriodId>,
) -> Result<Json<Vec<BalanceResponse>>, ApiError> {
    let balances = repo(&state).balances(auth.tenant_id(), period_id).await?;
    Ok(Json(balances.into_iter().map(Into::into).collect()))
}
