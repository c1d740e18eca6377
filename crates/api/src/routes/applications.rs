//! Application routes: drafts, documents, submission, review and the
//! final certificate.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::Deserialize;
use tracing::info;
use uuid::Uuid;

use crate::{
    AppState,
    error::{ApiError, ApiResult},
    events::log_events,
    middleware::AuthUser,
};
use permitflow_core::verification::DocumentType;
use permitflow_core::workflow::PositionType;
use permitflow_db::repositories::CreateApplicationInput;
use permitflow_shared::{AppError, types::PageRequest};

/// Creates the application routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route(
            "/applications",
            post(create_application).get(list_applications),
        )
        .route("/applications/{id}", get(get_application))
        .route("/applications/{id}/documents", post(upload_document))
        .route(
            "/applications/{id}/documents/{document_id}/verify",
            post(verify_document),
        )
        .route("/applications/{id}/submit", post(submit_application))
        .route("/applications/{id}/reject", post(reject_application))
        .route("/applications/{id}/certificate", get(download_certificate))
}

/// Request body for a new draft.
#[derive(Debug, Deserialize)]
pub struct CreateApplicationRequest {
    /// Applicant's full name.
    pub applicant_name: String,
    /// Contact email.
    pub applicant_email: String,
    /// Contact mobile.
    #[serde(default)]
    pub applicant_mobile: Option<String>,
    /// Position applied for.
    pub position_type: PositionType,
}

/// Request body for a document upload.
#[derive(Debug, Deserialize)]
pub struct UploadDocumentRequest {
    /// Kind of document.
    pub document_type: DocumentType,
    /// Original file name.
    pub file_name: String,
    /// File content, standard base64.
    pub content_base64: String,
}

/// Request body for a verification decision.
#[derive(Debug, Deserialize)]
pub struct VerifyDocumentRequest {
    /// Whether the document is accepted.
    pub approved: bool,
    /// Officer remarks.
    #[serde(default)]
    pub remarks: Option<String>,
}

/// Request body for a rejection.
#[derive(Debug, Deserialize)]
pub struct RejectRequest {
    /// Reason shown to the applicant.
    #[serde(default)]
    pub comments: String,
}

async fn create_application(
    State(state): State<AppState>,
    user: AuthUser,
    Json(body): Json<CreateApplicationRequest>,
) -> ApiResult<impl IntoResponse> {
    let input = CreateApplicationInput {
        applicant_name: body.applicant_name,
        applicant_email: body.applicant_email,
        applicant_mobile: body.applicant_mobile,
        position_type: body.position_type,
    };
    let draft = state.applications.create_draft(&user.actor(), input).await?;

    info!(application_id = %draft.id, number = %draft.application_number, "Draft created");
    Ok((StatusCode::CREATED, Json(draft)))
}

async fn list_applications(
    State(state): State<AppState>,
    user: AuthUser,
    Query(page): Query<PageRequest>,
) -> ApiResult<impl IntoResponse> {
    let page = state
        .applications
        .list_for_applicant(user.user_id(), &page)
        .await?;
    Ok(Json(page))
}

async fn get_application(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<impl IntoResponse> {
    let details = state.applications.details(id, &user.actor()).await?;
    Ok(Json(details))
}

async fn upload_document(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(body): Json<UploadDocumentRequest>,
) -> ApiResult<impl IntoResponse> {
    let bytes = STANDARD
        .decode(body.content_base64.as_bytes())
        .map_err(|e| AppError::Validation(format!("content_base64: {e}")))?;

    let document = state
        .workflow
        .attach_document(id, &user.actor(), body.document_type, &body.file_name, bytes)
        .await?;
    Ok((StatusCode::CREATED, Json(document)))
}

async fn verify_document(
    State(state): State<AppState>,
    user: AuthUser,
    Path((id, document_id)): Path<(Uuid, Uuid)>,
    Json(body): Json<VerifyDocumentRequest>,
) -> ApiResult<impl IntoResponse> {
    let document = state
        .workflow
        .verify_document(id, document_id, &user.actor(), body.approved, body.remarks)
        .await?;
    Ok(Json(document))
}

async fn submit_application(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<impl IntoResponse> {
    let outcome = state.workflow.submit(id, &user.actor()).await?;
    log_events(&outcome.events);
    Ok(Json(outcome))
}

async fn reject_application(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(body): Json<RejectRequest>,
) -> ApiResult<impl IntoResponse> {
    let outcome = state
        .workflow
        .reject(id, &user.actor(), body.comments)
        .await?;
    log_events(&outcome.events);
    Ok(Json(outcome))
}

async fn download_certificate(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Response, ApiError> {
    let file = state.workflow.certificate(id, &user.actor()).await?;
    let disposition = format!("attachment; filename=\"{}\"", file.file_name);

    Ok((
        [
            (header::CONTENT_TYPE, "application/pdf".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        file.bytes,
    )
        .into_response())
}
