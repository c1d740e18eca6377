//! HTTP client for the HSM signing service.

use std::time::Duration;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use permitflow_shared::config::HsmConfig;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::retry::{RetryPolicy, retry_with_backoff};
use crate::signature::gateway::{GatewayError, OtpDispatch, SignRequest, SignatureGateway};
use crate::signature::layout::SignatureCoordinates;

#[derive(Debug, Serialize)]
struct SignBody<'a> {
    key_label: &'a str,
    otp: &'a str,
    transaction_ref: &'a str,
    document_base64: String,
    coordinates: SignatureCoordinates,
}

#[derive(Debug, Deserialize)]
struct SignResponse {
    signed_document_base64: String,
}

/// Talks to the HSM over JSON/HTTP with an `X-Api-Key` header.
#[derive(Debug, Clone)]
pub struct HsmClient {
    base_url: String,
    api_key: String,
    client: Client,
    retry: RetryPolicy,
}

impl HsmClient {
    /// Creates a client from configuration.
    ///
    /// # Errors
    ///
    /// Returns `Transport` if the HTTP client cannot be built.
    pub fn from_config(config: &HsmConfig) -> Result<Self, GatewayError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs.max(1)))
            .build()
            .map_err(|e| GatewayError::Transport(e.to_string()))?;

        Ok(Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            client,
            retry: RetryPolicy::from_settings(&config.retry),
        })
    }

    async fn post<B: Serialize + Sync>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<reqwest::Response, GatewayError> {
        let url = format!("{}{path}", self.base_url);
        let response = self
            .client
            .post(&url)
            .header("X-Api-Key", &self.api_key)
            .json(body)
            .send()
            .await
            .map_err(|e| GatewayError::Transport(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            Ok(response)
        } else {
            let body = response.text().await.unwrap_or_default();
            Err(GatewayError::Status {
                status: status.as_u16(),
                body,
            })
        }
    }

    async fn sign_once(&self, body: &SignBody<'_>) -> Result<Vec<u8>, GatewayError> {
        let response = self.post("/sign", body).await?;
        let decoded: SignResponse = response
            .json()
            .await
            .map_err(|e| GatewayError::InvalidResponse(e.to_string()))?;
        STANDARD
            .decode(decoded.signed_document_base64.as_bytes())
            .map_err(|e| GatewayError::InvalidResponse(e.to_string()))
    }
}

impl SignatureGateway for HsmClient {
    async fn send_otp(&self, request: &OtpDispatch) -> Result<(), GatewayError> {
        debug!(key_label = %request.key_label, transaction_ref = %request.transaction_ref, "Dispatching OTP");
        retry_with_backoff(&self.retry, "hsm_send_otp", GatewayError::is_transient, || async {
            self.post("/otp/generate", request).await.map(|_| ())
        })
        .await?;
        info!(transaction_ref = %request.transaction_ref, "OTP dispatched");
        Ok(())
    }

    async fn sign_document(&self, request: &SignRequest) -> Result<Vec<u8>, GatewayError> {
        let body = SignBody {
            key_label: &request.key_label,
            otp: &request.otp,
            transaction_ref: &request.transaction_ref,
            document_base64: STANDARD.encode(&request.document),
            coordinates: request.coordinates,
        };
        let signed = retry_with_backoff(&self.retry, "hsm_sign", GatewayError::is_transient, || {
            self.sign_once(&body)
        })
        .await?;
        info!(
            transaction_ref = %request.transaction_ref,
            bytes = signed.len(),
            "Document signed"
        );
        Ok(signed)
    }
}
