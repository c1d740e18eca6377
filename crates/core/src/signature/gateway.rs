//! Signature gateway abstraction.
//!
//! The HSM both delivers OTPs and applies signatures. The trait keeps the
//! workflow independent of the transport; [`super::HsmClient`] is the HTTP
//! implementation.

use std::future::Future;

use serde::Serialize;
use thiserror::Error;

use crate::signature::layout::SignatureCoordinates;

/// Request to deliver an OTP to the officer behind a key label.
#[derive(Debug, Clone, Serialize)]
pub struct OtpDispatch {
    /// HSM key label of the signer.
    pub key_label: String,
    /// Correlates OTP and signature calls.
    pub transaction_ref: String,
    /// The code to deliver.
    pub otp: String,
}

/// Request to sign a PDF.
#[derive(Debug, Clone)]
pub struct SignRequest {
    /// HSM key label of the signer.
    pub key_label: String,
    /// The OTP the officer entered.
    pub otp: String,
    /// Same reference as the OTP dispatch.
    pub transaction_ref: String,
    /// PDF to sign.
    pub document: Vec<u8>,
    /// Where the signature goes.
    pub coordinates: SignatureCoordinates,
}

/// Transport-level failures talking to the HSM.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// Connection, DNS or timeout failure.
    #[error("transport error: {0}")]
    Transport(String),

    /// Non-success HTTP status.
    #[error("HSM returned status {status}: {body}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Response body.
        body: String,
    },

    /// Response could not be decoded.
    #[error("invalid HSM response: {0}")]
    InvalidResponse(String),
}

impl GatewayError {
    /// Whether retrying may help.
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        match self {
            Self::Transport(_) => true,
            Self::Status { status, .. } => *status == 429 || *status >= 500,
            Self::InvalidResponse(_) => false,
        }
    }
}

/// OTP delivery and document signing.
pub trait SignatureGateway: Send + Sync {
    /// Delivers an OTP to the officer behind `request.key_label`.
    fn send_otp(
        &self,
        request: &OtpDispatch,
    ) -> impl Future<Output = Result<(), GatewayError>> + Send;

    /// Signs a PDF and returns the signed bytes.
    fn sign_document(
        &self,
        request: &SignRequest,
    ) -> impl Future<Output = Result<Vec<u8>, GatewayError>> + Send;
}
