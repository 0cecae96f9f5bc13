//! Health check endpoints.

use axum::{Json, Router, extract::State, routing::get};
use serde::Serialize;
use tracing::warn;

use crate::AppState;

/// Health check response.
#[derive(Serialize)]
pub struct HealthResponse {
    /// Service status: `healthy` or `degraded`.
    pub status: &'static str,
    /// Service version.
    pub version: &'static str,
    /// Database reachability: `up` or `down`.
    pub database: &'static str,
}

/// Health check handler.
async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let (status, database) = match state.db.ping().await {
        Ok(()) => ("healthy", "up"),
        Err(e) => {
            warn!(error = %e, "Database ping failed");
            ("degraded", "down")
        }
    };

    Json(HealthResponse {
        status,
        version: env!("CARGO_PKG_VERSION"),
        database,
    })
}

/// Creates health check routes.
pub fn routes() -> Router<AppState> {
    Router::new().route("/health", get(health_check))
}
