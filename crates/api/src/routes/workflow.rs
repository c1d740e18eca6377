//! Officer work queue.

use axum::{
    Json, Router,
    extract::{Query, State},
    response::IntoResponse,
    routing::get,
};

use crate::{AppState, error::ApiResult, middleware::AuthUser};
use permitflow_shared::types::PageRequest;

/// Creates the workflow routes.
pub fn routes() -> Router<AppState> {
    Router::new().route("/workflow/queue", get(officer_queue))
}

/// Applications currently waiting on the calling officer.
async fn officer_queue(
    State(state): State<AppState>,
    user: AuthUser,
    Query(page): Query<PageRequest>,
) -> ApiResult<impl IntoResponse> {
    let queue = state.workflow.officer_queue(&user.actor(), &page).await?;
    Ok(Json(queue))
}
