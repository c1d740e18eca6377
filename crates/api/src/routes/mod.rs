//! API route definitions.

use axum::{Router, middleware};

use crate::{AppState, middleware::auth_middleware};

pub mod applications;
pub mod health;
pub mod payments;
pub mod signatures;
pub mod workflow;

/// Creates the API router; everything except health and the gateway
/// callback requires a bearer token.
#[allow(clippy::needless_pass_by_value)]
pub fn api_routes_with_state(state: AppState) -> Router<AppState> {
    let protected_routes = Router::new()
        .merge(applications::routes())
        .merge(signatures::routes())
        .merge(payments::routes())
        .merge(workflow::routes())
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    Router::new()
        .merge(health::routes())
        .merge(payments::public_routes())
        .merge(protected_routes)
}
