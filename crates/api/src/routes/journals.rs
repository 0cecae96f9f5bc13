//! Journal routes: drafting, the maker-checker chain, posting and reversal.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::json;

use kontor_core::audit::AuditAction;
use kontor_core::ledger::{JournalLineInput, JournalStatus};
use kontor_db::entities::{journal_lines, journals};
use kontor_db::{JournalFilter, JournalInput, JournalRepository, JournalWithLines};
use kontor_shared::AppError;
use kontor_shared::types::{JournalId, PageRequest, PageResponse, PeriodId};

use crate::audit::Audit;
use crate::error::ApiError;
use crate::{AppState, middleware::AuthUser};

/// Creates the journal routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/journals", get(list_journals).post(create_journal))
        .route("/journals/{journal_id}", get(get_journal).put(update_journal))
        .route("/journals/{journal_id}/submit", post(submit_journal))
        .route("/journals/{journal_id}/approve", post(approve_journal))
        .route("/journals/{journal_id}/reject", post(reject_journal))
        .route("/journals/{journal_id}/post", post(post_journal))
        .route("/journals/{journal_id}/reverse", post(reverse_journal))
}

// ============================================================================
// Request/Response Types
// ============================================================================

/// Request body for creating or editing a draft.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JournalRequest {
    /// Accounting date; some period must contain it.
    pub journal_date: NaiveDate,
    /// Optional narrative.
    pub description: Option<String>,
    /// One or more lines whose debits equal credits.
    pub lines: Vec<JournalLineInput>,
}

impl From<JournalRequest> for JournalInput {
    fn from(req: JournalRequest) -> Self {
        Self {
            journal_date: req.journal_date,
            description: req.description,
            lines: req.lines,
        }
    }
}

/// Query parameters for listing journals.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListJournalsQuery {
    /// Filter by status (`DRAFT`, `SUBMITTED`, `APPROVED`, `POSTED`).
    pub status: Option<String>,
    /// Filter by period.
    pub period_id: Option<PeriodId>,
    /// Page number (1-indexed).
    pub page: Option<u32>,
    /// Page size.
    pub per_page: Option<u32>,
}

impl ListJournalsQuery {
    fn filter(&self) -> Result<JournalFilter, AppError> {
        let status = self
            .status
            .as_deref()
            .map(|s| {
                JournalStatus::parse(s)
                    .ok_or_else(|| AppError::Validation(format!("Unknown journal status: {s}")))
            })
            .transpose()?;
        Ok(JournalFilter {
            status,
            period_id: self.period_id,
        })
    }

    fn page(&self) -> PageRequest {
        let defaults = PageRequest::default();
        PageRequest {
            page: self.page.unwrap_or(defaults.page),
            per_page: self.per_page.unwrap_or(defaults.per_page),
        }
    }
}

/// Request body for rejecting a journal.
#[derive(Debug, Deserialize)]
pub struct RejectRequest {
    /// Why the journal goes back to draft.
    pub reason: String,
}

/// Request body for reversing a posted journal.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReverseRequest {
    /// Date of the reversing journal; defaults to today.
    pub reversal_date: Option<NaiveDate>,
}

/// Journal header without lines.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JournalSummary {
    /// Journal ID.
    pub id: uuid::Uuid,
    /// Period the journal belongs to.
    pub period_id: uuid::Uuid,
    /// Accounting date.
    pub journal_date: NaiveDate,
    /// Narrative.
    pub description: Option<String>,
    /// Current status.
    pub status: &'static str,
    /// Sum of debits.
    pub total_debit: Decimal,
    /// Sum of credits.
    pub total_credit: Decimal,
    /// Creator.
    pub created_by: uuid::Uuid,
    /// Submitter.
    pub submitted_by: Option<uuid::Uuid>,
    /// Approver.
    pub approved_by: Option<uuid::Uuid>,
    /// Poster.
    pub posted_by: Option<uuid::Uuid>,
    /// Posting timestamp.
    pub posted_at: Option<String>,
    /// Last rejection reason.
    pub rejection_reason: Option<String>,
    /// The journal this one reverses.
    pub reverses_journal_id: Option<uuid::Uuid>,
    /// The template this one was generated from.
    pub source_template_id: Option<uuid::Uuid>,
    /// Created at timestamp.
    pub created_at: String,
    /// Updated at timestamp.
    pub updated_at: String,
}

impl From<journals::Model> for JournalSummary {
    fn from(j: journals::Model) -> Self {
        Self {
            id: j.id,
            period_id: j.period_id,
            journal_date: j.journal_date,
            description: j.description,
            status: JournalStatus::from(j.status).as_str(),
            total_debit: j.total_debit,
            total_credit: j.total_credit,
            created_by: j.created_by,
            submitted_by: j.submitted_by,
            approved_by: j.approved_by,
            posted_by: j.posted_by,
            posted_at: j.posted_at.map(|t| t.to_rfc3339()),
            rejection_reason: j.rejection_reason,
            reverses_journal_id: j.reverses_journal_id,
            source_template_id: j.source_template_id,
            created_at: j.created_at.to_rfc3339(),
            updated_at: j.updated_at.to_rfc3339(),
        }
    }
}

/// One journal line.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JournalLineResponse {
    /// Line ID.
    pub id: uuid::Uuid,
    /// Position within the journal, from 1.
    pub line_number: i32,
    /// Account.
    pub account_id: uuid::Uuid,
    /// Debit amount.
    pub debit: Decimal,
    /// Credit amount.
    pub credit: Decimal,
    /// Line memo.
    pub memo: Option<String>,
    /// Department dimension.
    pub department_id: Option<uuid::Uuid>,
    /// Project dimension.
    pub project_id: Option<uuid::Uuid>,
    /// Fund dimension.
    pub fund_id: Option<uuid::Uuid>,
}

impl From<journal_lines::Model> for JournalLineResponse {
    fn from(l: journal_lines::Model) -> Self {
        Self {
            id: l.id,
            line_number: l.line_number,
            account_id: l.account_id,
            debit: l.debit,
            credit: l.credit,
            memo: l.memo,
            department_id: l.department_id,
            project_id: l.project_id,
            fund_id: l.fund_id,
        }
    }
}

/// A journal with its lines.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JournalResponse {
    /// Header.
    #[serde(flatten)]
    pub journal: JournalSummary,
    /// Lines in order.
    pub lines: Vec<JournalLineResponse>,
}

impl From<JournalWithLines> for JournalResponse {
    fn from(j: JournalWithLines) -> Self {
        Self {
            journal: j.journal.into(),
            lines: j.lines.into_iter().map(Into::into).collect(),
        }
    }
}

fn repo(state: &AppState) -> JournalRepository {
    JournalRepository::new((*state.db).clone())
}

// ============================================================================
// Route Handlers
// ============================================================================

/// POST `/journals` - Create a draft journal.
async fn create_journal(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(payload): Json<JournalRequest>,
) -> Result<(StatusCode, Json<JournalResponse>), ApiError> {
    let result = repo(&state)
        .create(auth.tenant_id(), auth.user_id(), payload.into())
        .await;
    let created = Audit::create(&state, &auth, AuditAction::JournalCreate)
        .finish_created(result, |j| j.journal.id)
        .await?;
    Ok((StatusCode::CREATED, Json(created.into())))
}

/// GET `/journals` - List journals, newest first.
async fn list_journals(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(query): Query<ListJournalsQuery>,
) -> Result<Json<PageResponse<JournalSummary>>, ApiError> {
    let filter = query.filter()?;
    let page = query.page();
    let (rows, total) = repo(&state).list(auth.tenant_id(), &filter, &page).await?;
    let data = rows.into_iter().map(Into::into).collect();
    Ok(Json(PageResponse::new(data, &page, total)))
}

/// GET `/journals/{journal_id}` - Get a journal with its lines.
async fn get_journal(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(journal_id): Path<JournalId>,
) -> Result<Json<JournalResponse>, ApiError> {
    let journal = repo(&state).get(auth.tenant_id(), journal_id).await?;
    Ok(Json(journal.into()))
}

/// PUT `/journals/{journal_id}` - Replace a draft's date, description and lines.
async fn update_journal(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(journal_id): Path<JournalId>,
    Json(payload): Json<JournalRequest>,
) -> Result<Json<JournalResponse>, ApiError> {
    let result = repo(&state)
        .update(auth.tenant_id(), auth.user_id(), journal_id, payload.into())
        .await;
    let journal = Audit::new(&state, &auth, AuditAction::JournalUpdate, journal_id.into_inner())
        .finish(result)
        .await?;
    Ok(Json(journal.into()))
}

/// POST `/journals/{journal_id}/submit` - DRAFT to SUBMITTED.
async fn submit_journal(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(journal_id): Path<JournalId>,
) -> Result<Json<JournalResponse>, ApiError> {
    let result = repo(&state)
        .submit(auth.tenant_id(), auth.user_id(), journal_id)
        .await;
    let journal = Audit::new(&state, &auth, AuditAction::JournalSubmit, journal_id.into_inner())
        .finish(result)
        .await?;
    Ok(Json(journal.into()))
}

/// POST `/journals/{journal_id}/approve` - SUBMITTED to APPROVED.
async fn approve_journal(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(journal_id): Path<JournalId>,
) -> Result<Json<JournalResponse>, ApiError> {
    let result = repo(&state)
        .approve(auth.tenant_id(), auth.user_id(), journal_id)
        .await;
    let journal = Audit::new(&state, &auth, AuditAction::JournalApprove, journal_id.into_inner())
        .finish(result)
        .await?;
    Ok(Json(journal.into()))
}

/// POST `/journals/{journal_id}/reject` - Back to DRAFT with a reason.
async fn reject_journal(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(journal_id): Path<JournalId>,
    Json(payload): Json<RejectRequest>,
) -> Result<Json<JournalResponse>, ApiError> {
    let detail = json!({ "reason": payload.reason });
    let result = repo(&state)
        .reject(auth.tenant_id(), auth.user_id(), journal_id, payload.reason)
        .await;
    let journal = Audit::new(&state, &auth, AuditAction::JournalReject, journal_id.into_inner())
        .detail(detail)
        .finish(result)
        .await?;
    Ok(Json(journal.into()))
}

/// POST `/journals/{journal_id}/post` - APPROVED to POSTED.
async fn post_journal(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(journal_id): Path<JournalId>,
) -> Result<Json<JournalResponse>, ApiError> {
    let result = repo(&state)
        .post(auth.tenant_id(), auth.user_id(), journal_id)
        .await;
    let journal = Audit::new(&state, &auth, AuditAction::JournalPost, journal_id.into_inner())
        .finish(result)
        .await?;
    Ok(Json(journal.into()))
}

/// POST `/journals/{journal_id}/reverse` - Draft a reversal of a posted journal.
async fn reverse_journal(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(journal_id): Path<JournalId>,
    payload: Option<Json<ReverseRequest>>,
) -> Result<(StatusCode, Json<JournalResponse>), ApiError> {
    let Json(payload) = payload.unwrap_or_default();
    let result = repo(&state)
        .reverse(auth.tenant_id(), auth.user_id(), journal_id, payload.reversal_date)
        .await;
    let reversal = Audit::new(&state, &auth, AuditAction::JournalReverse, journal_id.into_inner())
        .finish(result)
        .await?;
    Ok((StatusCode::CREATED, Json(reversal.into())))
}
