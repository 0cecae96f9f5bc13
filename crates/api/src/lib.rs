//! HTTP API layer with Axum routes and middleware.
//!
//! This crate provides:
//! - REST API routes for journals, periods, SoD administration, recurring
//!   templates, bank reconciliation and the audit trail
//! - Bearer-token authentication middleware
//! - Error rendering for the shared error taxonomy
//! - The audit hook every mutating handler goes through

pub mod audit;
pub mod error;
pub mod middleware;
pub mod routes;

use axum::Router;
use sea_orm::DatabaseConnection;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use kontor_shared::{JwtService, LedgerPolicyConfig};

pub use error::ApiError;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub db: Arc<DatabaseConnection>,
    /// JWT service for token validation.
    pub jwt_service: Arc<JwtService>,
    /// Close-checklist and SoD enforcement policy.
    pub ledger: LedgerPolicyConfig,
}

/// Creates the main application router.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .nest("/api/v1", routes::api_routes_with_state(state.clone()))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}
