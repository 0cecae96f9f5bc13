//! Authentication middleware for protected routes.

use axum::{
    Json,
    extract::{FromRequestParts, Request, State},
    http::{StatusCode, header::AUTHORIZATION, request::Parts},
    middleware::Next,
    response::{IntoResponse, Response},
};
use serde_json::json;
use tracing::debug;

use crate::AppState;
use kontor_shared::types::{TenantId, UserId};
use kontor_shared::{Claims, JwtError};

/// Extracts the bearer token from the Authorization header.
fn extract_bearer_token(header: &str) -> Option<&str> {
    header
        .strip_prefix("Bearer ")
        .or_else(|| header.strip_prefix("bearer "))
}

fn unauthorized(error: &str, message: &str) -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(json!({ "error": error, "message": message })),
    )
        .into_response()
}

/// Authentication middleware that validates JWT tokens.
///
/// This middleware:
/// 1. Extracts the Bearer token from the Authorization header
/// 2. Validates the token using the JWT service
/// 3. Stores the claims in request extensions for handlers to access
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let auth_header = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok());

    let Some(token) = auth_header.and_then(extract_bearer_token) else {
        return unauthorized(
            "missing_token",
            "Authorization header with Bearer token is required",
        );
    };

    match state.jwt_service.validate_token(token) {
        Ok(claims) => {
            request.extensions_mut().insert(claims);
            next.run(request).await
        }
        Err(JwtError::Expired) => unauthorized("token_expired", "Token has expired"),
        Err(e) => {
            debug!(error = %e, "Rejected bearer token");
            unauthorized("invalid_token", "Invalid or malformed token")
        }
    }
}

/// Extractor for the authenticated principal.
///
/// Every ledger operation runs as `user_id()` inside `tenant_id()`.
#[derive(Debug, Clone)]
pub struct AuthUser(pub Claims);

impl AuthUser {
    /// Returns the acting user.
    #[must_use]
    pub const fn user_id(&self) -> UserId {
        self.0.user_id()
    }

    /// Returns the tenant the token is scoped to.
    #[must_use]
    pub const fn tenant_id(&self) -> TenantId {
        self.0.tenant_id()
    }
}

impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Claims>()
            .cloned()
            .map(AuthUser)
            .ok_or_else(|| unauthorized("unauthorized", "Authentication required"))
    }
}
