//! API route definitions.

use axum::{Router, middleware};

use crate::{AppState, middleware::auth::auth_middleware};

pub mod audit;
pub mod health;
pub mod journals;
pub mod periods;
pub mod policy;
pub mod reconciliation;
pub mod recurring;

/// Creates the API router; everything except `/health` requires a bearer token.
#[allow(clippy::needless_pass_by_value)]
pub fn api_routes_with_state(state: AppState) -> Router<AppState> {
    let protected_routes = Router::new()
        .merge(journals::routes())
        .merge(periods::routes())
        .merge(policy::routes())
        .merge(recurring::routes())
        .merge(reconciliation::routes())
        .merge(audit::routes())
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    Router::new()
        .merge(health::routes())
        .merge(protected_routes)
}
