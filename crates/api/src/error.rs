//! Error responses.
//!
//! Every failure leaves the API as `{"error": CODE, "message": text}` with
//! the status code the error type itself declares.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use tracing::error;

use permitflow_core::workflow::WorkflowError;
use permitflow_shared::AppError;

/// Anything a handler can fail with.
#[derive(Debug)]
pub enum ApiError {
    /// Workflow taxonomy.
    Workflow(WorkflowError),
    /// Generic API failure.
    App(AppError),
}

impl From<WorkflowError> for ApiError {
    fn from(err: WorkflowError) -> Self {
        Self::Workflow(err)
    }
}

impl From<AppError> for ApiError {
    fn from(err: AppError) -> Self {
        Self::App(err)
    }
}

impl ApiError {
    fn parts(&self) -> (u16, &'static str, String) {
        match self {
            Self::Workflow(e) => (e.status_code(), e.error_code(), e.to_string()),
            Self::App(e) => (e.status_code(), e.error_code(), e.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code, message) = self.parts();
        let status = StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        // Internal details stay in the logs.
        let message = if status.is_server_error() && status != StatusCode::SERVICE_UNAVAILABLE {
            error!(code, error = %message, "Request failed");
            "An internal error occurred".to_string()
        } else {
            message
        };

        (status, Json(json!({ "error": code, "message": message }))).into_response()
    }
}

/// Result type for handlers.
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;
    use permitflow_core::payment::PaymentError;
    use rstest::rstest;
    use uuid::Uuid;

    #[rstest]
    #[case(WorkflowError::OtpMismatch, StatusCode::BAD_REQUEST)]
    #[case(WorkflowError::ApplicationNotFound(Uuid::nil()), StatusCode::NOT_FOUND)]
    #[case(WorkflowError::Payment(PaymentError::ChecksumMismatch), StatusCode::BAD_REQUEST)]
    #[case(
        WorkflowError::SignerServiceUnavailable("down".to_string()),
        StatusCode::SERVICE_UNAVAILABLE
    )]
    #[case(WorkflowError::Database("boom".to_string()), StatusCode::INTERNAL_SERVER_ERROR)]
    fn test_workflow_error_status(#[case] err: WorkflowError, #[case] status: StatusCode) {
        assert_eq!(ApiError::from(err).into_response().status(), status);
    }

    #[test]
    fn test_app_error_status() {
        let response = ApiError::from(AppError::Validation("bad".to_string())).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
