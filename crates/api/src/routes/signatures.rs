//! OTP-gated signing of the current stage.

use axum::{
    Json, Router,
    extract::{Path, State},
    response::IntoResponse,
    routing::post,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::{AppState, error::ApiResult, events::log_events, middleware::AuthUser};

/// Creates the signature routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/applications/{id}/signature/otp", post(request_otp))
        .route("/applications/{id}/signature", post(sign))
}

/// Request body for signing.
#[derive(Debug, Deserialize)]
pub struct SignRequest {
    /// Code received by the officer.
    pub otp: String,
    /// Optional review remarks.
    #[serde(default)]
    pub remarks: Option<String>,
}

/// Sends a fresh OTP to the assigned officer. The code itself never
/// appears in the response.
async fn request_otp(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<impl IntoResponse> {
    let ticket = state
        .workflow
        .request_signature_otp(id, &user.actor())
        .await?;
    Ok(Json(ticket))
}

async fn sign(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(body): Json<SignRequest>,
) -> ApiResult<impl IntoResponse> {
    let outcome = state
        .workflow
        .sign(id, &user.actor(), body.otp.trim(), body.remarks)
        .await?;
    log_events(&outcome.events);
    Ok(Json(outcome))
}
