//! Workflow error types for the application lifecycle.
//!
//! Every failure an officer, applicant or the payment callback can hit
//! maps to one variant, with a stable HTTP status and error code.

use thiserror::Error;
use uuid::Uuid;

use crate::payment::PaymentError;
use crate::workflow::types::{ApplicationStatus, OfficerRole, PositionType};

/// Errors that can occur during workflow operations.
#[derive(Debug, Error)]
pub enum WorkflowError {
    /// Actor lacks the role, is not the assigned officer, or does not own the application.
    #[error("Not authorized: {0}")]
    Unauthorized(String),

    /// The action is not allowed in the current status.
    #[error("Cannot {action} while application is {status}")]
    InvalidStageAction {
        /// Status at the time of the attempt.
        status: ApplicationStatus,
        /// The attempted action.
        action: &'static str,
    },

    /// The active OTP has lapsed.
    #[error("OTP has expired")]
    OtpExpired,

    /// The entered OTP does not match.
    #[error("OTP does not match")]
    OtpMismatch,

    /// No active OTP exists for this signature.
    #[error("No active OTP; request a new one")]
    OtpNotFound,

    /// The HSM could not deliver the OTP.
    #[error("OTP service unavailable: {0}")]
    OtpServiceUnavailable(String),

    /// The HSM could not apply the signature.
    #[error("Signing service unavailable: {0}")]
    SignerServiceUnavailable(String),

    /// Documents are not verified for this stage.
    #[error("Documents not verified: {0}")]
    DocumentNotVerified(String),

    /// Document not found on this application.
    #[error("Document {0} not found")]
    DocumentNotFound(Uuid),

    /// Application not found.
    #[error("Application {0} not found")]
    ApplicationNotFound(Uuid),

    /// No active officer holds the required role.
    #[error("No active {0} available for assignment")]
    NoOfficerAvailable(OfficerRole),

    /// Rejection comments are required but not provided.
    #[error("Rejection comments are required")]
    RejectionReasonRequired,

    /// No HSM key label is configured for the signer.
    #[error("No signing key configured for {role} on {position} applications")]
    MissingKeyLabel {
        /// Signing officer role.
        role: OfficerRole,
        /// Application position type.
        position: PositionType,
    },

    /// Request input is invalid.
    #[error("Validation error: {0}")]
    Validation(String),

    /// Payment processing error.
    #[error(transparent)]
    Payment(#[from] PaymentError),

    /// Document storage error.
    #[error("Storage error: {0}")]
    Storage(String),

    /// PDF rendering error.
    #[error("Rendering error: {0}")]
    Rendering(String),

    /// Database error.
    #[error("Database error: {0}")]
    Database(String),
}

impl WorkflowError {
    /// Returns the HTTP status code for this error.
    #[must_use]
    pub fn status_code(&self) -> u16 {
        match self {
            Self::OtpExpired
            | Self::OtpMismatch
            | Self::OtpNotFound
            | Self::RejectionReasonRequired
            | Self::Validation(_) => 400,

            Self::Unauthorized(_) => 403,

            Self::DocumentNotFound(_) | Self::ApplicationNotFound(_) => 404,

            Self::InvalidStageAction { .. } => 409,

            Self::DocumentNotVerified(_) => 422,

            Self::OtpServiceUnavailable(_)
            | Self::SignerServiceUnavailable(_)
            | Self::NoOfficerAvailable(_) => 503,

            Self::Payment(e) => e.status_code(),

            Self::MissingKeyLabel { .. }
            | Self::Storage(_)
            | Self::Rendering(_)
            | Self::Database(_) => 500,
        }
    }

    /// Returns the error code for API responses.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Unauthorized(_) => "UNAUTHORIZED",
            Self::InvalidStageAction { .. } => "INVALID_STAGE_ACTION",
            Self::OtpExpired => "OTP_EXPIRED",
            Self::OtpMismatch => "OTP_MISMATCH",
            Self::OtpNotFound => "OTP_NOT_FOUND",
            Self::OtpServiceUnavailable(_) => "OTP_SERVICE_UNAVAILABLE",
            Self::SignerServiceUnavailable(_) => "SIGNER_SERVICE_UNAVAILABLE",
            Self::DocumentNotVerified(_) => "DOCUMENT_NOT_VERIFIED",
            Self::DocumentNotFound(_) => "DOCUMENT_NOT_FOUND",
            Self::ApplicationNotFound(_) => "APPLICATION_NOT_FOUND",
            Self::NoOfficerAvailable(_) => "NO_OFFICER_AVAILABLE",
            Self::RejectionReasonRequired => "REJECTION_REASON_REQUIRED",
            Self::MissingKeyLabel { .. } => "MISSING_KEY_LABEL",
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::Payment(e) => e.error_code(),
            Self::Storage(_) => "STORAGE_ERROR",
            Self::Rendering(_) => "RENDERING_ERROR",
            Self::Database(_) => "DATABASE_ERROR",
        }
    }

    /// Shorthand for an action that the current status does not allow.
    #[must_use]
    pub const fn invalid(status: ApplicationStatus, action: &'static str) -> Self {
        Self::InvalidStageAction { status, action }
    }
}
