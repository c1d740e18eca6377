//! Fee payment routes.
//!
//! The gateway callback is public: it is authenticated by its checksum,
//! not by a bearer token.

use axum::{
    Form, Json, Router,
    extract::{Path, State},
    response::IntoResponse,
    routing::post,
};
use tracing::info;
use uuid::Uuid;

use crate::{AppState, error::ApiResult, events::log_events, middleware::AuthUser};
use permitflow_core::payment::PaymentCallback;

/// Routes that need a signed-in applicant.
pub fn routes() -> Router<AppState> {
    Router::new().route("/applications/{id}/payments", post(initiate_payment))
}

/// Routes the gateway calls.
pub fn public_routes() -> Router<AppState> {
    Router::new().route("/payments/callback", post(payment_callback))
}

async fn initiate_payment(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<impl IntoResponse> {
    let outcome = state.workflow.initiate_payment(id, &user.actor()).await?;
    log_events(&outcome.events);
    Ok(Json(outcome))
}

async fn payment_callback(
    State(state): State<AppState>,
    Form(callback): Form<PaymentCallback>,
) -> ApiResult<impl IntoResponse> {
    info!(order_id = %callback.order_id, status = %callback.status, "Payment callback");
    let outcome = state.workflow.payment_callback(&callback).await?;
    log_events(&outcome.events);
    Ok(Json(outcome))
}
