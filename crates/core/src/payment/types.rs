//! Payment records and gateway messages.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Lifecycle of a payment row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    /// Created, awaiting the gateway.
    Pending,
    /// Gateway confirmed the payment.
    Completed,
    /// Gateway reported a failure.
    Failed,
    /// Money returned to the applicant.
    Refunded,
}

impl PaymentStatus {
    /// Returns the string representation of the status.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Completed => "completed",
            Self::Failed => "failed",
            Self::Refunded => "refunded",
        }
    }

    /// Parses a stored status.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "pending" => Some(Self::Pending),
            "completed" => Some(Self::Completed),
            "failed" => Some(Self::Failed),
            "refunded" => Some(Self::Refunded),
            _ => None,
        }
    }
}

impl std::fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Form the applicant's browser posts to the gateway.
#[derive(Debug, Clone, Serialize)]
pub struct PaymentRedirect {
    /// Gateway URL.
    pub url: String,
    /// HTTP method, always `POST`.
    pub method: &'static str,
    /// Form fields including the checksum.
    pub fields: BTreeMap<String, String>,
}

/// Fields the gateway sends back.
#[derive(Debug, Clone, Deserialize)]
pub struct PaymentCallback {
    /// Our order id.
    pub order_id: String,
    /// Gateway transaction id.
    pub transaction_id: String,
    /// Gateway status, e.g. `success`.
    pub status: String,
    /// Amount in rupees, e.g. `2500.00`.
    pub amount: String,
    /// Hex HMAC-SHA256 checksum.
    pub checksum: String,
}

/// Verified result of a callback.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallbackOutcome {
    /// Money received.
    Succeeded {
        /// Gateway transaction id.
        transaction_id: String,
        /// Amount in paise.
        amount_paise: i64,
    },
    /// Payment did not go through.
    Failed {
        /// Gateway transaction id.
        transaction_id: String,
        /// Status the gateway reported.
        reason: String,
    },
}

impl CallbackOutcome {
    /// Payment status to persist.
    #[must_use]
    pub const fn payment_status(&self) -> PaymentStatus {
        match self {
            Self::Succeeded { .. } => PaymentStatus::Completed,
            Self::Failed { .. } => PaymentStatus::Failed,
        }
    }

    /// Gateway transaction id.
    #[must_use]
    pub fn transaction_id(&self) -> &str {
        match self {
            Self::Succeeded { transaction_id, .. } | Self::Failed { transaction_id, .. } => {
                transaction_id
            }
        }
    }
}
