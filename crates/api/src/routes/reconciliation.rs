//! Bank reconciliation routes: matching, suggestions, summary and adjustment.

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
use uuid::Uuid;

use kontor_core::audit::AuditAction;
use kontor_core::reconciliation::{PaymentRef, ReconciliationSummary};
use kontor_db::ReconciliationRepository;
use kontor_db::entities::bank_statement_lines;
use kontor_shared::types::{AccountId, BankAccountId, PaymentId, StatementLineId};

use super::journals::JournalResponse;
use crate::audit::Audit;
use crate::error::ApiError;
use crate::{AppState, middleware::AuthUser};

/// Creates the bank reconciliation routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/bank-reconciliation/match", post(match_line))
        .route(
            "/bank-reconciliation/{bank_account_id}/candidates/{statement_line_id}",
            get(candidates),
        )
        .route(
            "/bank-reconciliation/{bank_account_id}/summary",
            get(summary),
        )
        .route(
            "/bank-reconciliation/{bank_account_id}/adjustment",
            post(create_adjustment),
        )
}

// ============================================================================
// Request/Response Types
// ============================================================================

/// Request body for matching a statement line to a payment.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchRequest {
    /// The bank statement line.
    pub statement_line_id: StatementLineId,
    /// The payment it settles.
    pub payment_id: PaymentId,
}

/// Result of a successful match.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchResponse {
    /// Always true; refused matches are errors.
    pub matched: bool,
    /// Statement line ID.
    pub statement_line_id: Uuid,
    /// Matched payment ID.
    pub payment_id: Option<Uuid>,
    /// Line amount.
    pub amount: Decimal,
    /// Who matched it.
    pub matched_by: Option<Uuid>,
    /// When.
    pub matched_at: Option<String>,
}

impl From<bank_statement_lines::Model> for MatchResponse {
    fn from(line: bank_statement_lines::Model) -> Self {
        Self {
            matched: true,
            statement_line_id: line.id,
            payment_id: line.matched_payment_id,
            amount: line.amount,
            matched_by: line.matched_by,
            matched_at: line.matched_at.map(|t| t.to_rfc3339()),
        }
    }
}

/// Query parameters for the summary.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryQuery {
    /// Statement date.
    pub as_of: NaiveDate,
    /// Closing balance printed on the statement.
    pub closing_balance: Decimal,
}

/// Request body for raising an adjustment.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdjustmentRequest {
    /// Statement date; becomes the journal date.
    pub as_of: NaiveDate,
    /// Closing balance printed on the statement.
    pub closing_balance: Decimal,
    /// Account absorbing the difference.
    pub offset_account_id: AccountId,
}

fn repo(state: &AppState) -> ReconciliationRepository {
    ReconciliationRepository::new((*state.db).clone())
}

// ============================================================================
// Route Handlers
// ============================================================================

/// POST `/bank-reconciliation/match` - Match one line to one payment.
async fn match_line(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(payload): Json<MatchRequest>,
) -> Result<Json<MatchResponse>, ApiError> {
    let result = repo(&state)
        .match_line(
            auth.tenant_id(),
            auth.user_id(),
            payload.statement_line_id,
            payload.payment_id,
        )
        .await;
    let line = Audit::new(
        &state,
        &auth,
        AuditAction::BankMatch,
        payload.statement_line_id.into_inner(),
    )
    .detail(json!({ "paymentId": payload.payment_id }))
    .finish(result)
    .await?;
    Ok(Json(line.into()))
}

/// GET `/bank-reconciliation/{bank_account_id}/candidates/{statement_line_id}`
/// - Unreconciled payments with exactly the line's amount.
async fn candidates(
    State(state): State<AppState>,
    auth: AuthUser,
    Path((bank_account_id, statement_line_id)): Path<(BankAccountId, StatementLineId)>,
) -> Result<Json<Vec<PaymentRef>>, ApiError> {
    let payments = repo(&state)
        .candidates(auth.tenant_id(), bank_account_id, statement_line_id)
        .await?;
    Ok(Json(payments))
}

/// GET `/bank-reconciliation/{bank_account_id}/summary` - Reconciliation position.
async fn summary(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(bank_account_id): Path<BankAccountId>,
    Query(query): Query<SummaryQuery>,
) -> Result<Json<ReconciliationSummary>, ApiError> {
    let summary = repo(&state)
        .summary(
            auth.tenant_id(),
            bank_account_id,
            query.as_of,
            query.closing_balance,
        )
        .await?;
    Ok(Json(summary))
}

/// POST `/bank-reconciliation/{bank_account_id}/adjustment` - Draft a journal
/// for the remaining difference.
async fn create_adjustment(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(bank_account_id): Path<BankAccountId>,
    Json(payload): Json<AdjustmentRequest>,
) -> Result<(StatusCode, Json<JournalResponse>), ApiError> {
    let result = repo(&state)
        .create_adjustment(
            auth.tenant_id(),
            auth.user_id(),
            bank_account_id,
            payload.as_of,
            payload.closing_balance,
            payload.offset_account_id,
        )
        .await;
    let journal = Audit::new(
        &state,
        &auth,
        AuditAction::BankAdjustment,
        bank_account_id.into_inner(),
    )
    .detail(json!({
        "asOf": payload.as_of,
        "closingBalance": payload.closing_balance,
        "offsetAccountId": payload.offset_account_id,
    }))
    .finish(result)
    .await?;
    Ok((StatusCode::CREATED, Json(journal.into())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use rust_decimal_macros::dec;

    #[test]
    fn test_match_response_from_line() {
        let payment = Uuid::now_v7();
        let line = bank_statement_lines::Model {
            id: Uuid::now_v7(),
            tenant_id: Uuid::now_v7(),
            bank_account_id: Uuid::now_v7(),
            transaction_date: NaiveDate::from_ymd_opt(2025, 1, 20).unwrap(),
            description: "ACME LTD".into(),
            amount: dec!(-250.00),
            matched_payment_id: Some(payment),
            matched_by: Some(Uuid::now_v7()),
            matched_at: Some(Utc::now().into()),
            created_at: Utc::now().into(),
        };
        let response = MatchResponse::from(line);
        assert!(response.matched);
        assert_eq!(response.payment_id, Some(payment));
        assert_eq!(response.amount, dec!(-250.00));
    }

    #[test]
    fn test_summary_query_accepts_string_balance() {
        let query: SummaryQuery = serde_json::from_value(json!({
            "asOf": "2025-01-31",
            "closingBalance": "10250.75"
        }))
        .unwrap();
        assert_eq!(query.closing_balance, dec!(10250.75));
    }
}
