//! Payment error types.

use thiserror::Error;

use crate::workflow::types::PositionType;

/// Errors raised while initiating or confirming a payment.
#[derive(Debug, Error)]
pub enum PaymentError {
    /// Callback checksum does not match the shared secret.
    #[error("payment checksum mismatch")]
    ChecksumMismatch,

    /// Callback amount differs from the amount requested.
    #[error("payment amount mismatch: expected {expected} paise, received {received} paise")]
    AmountMismatch {
        /// Requested amount in paise.
        expected: i64,
        /// Reported amount in paise.
        received: i64,
    },

    /// No payment exists for the order id.
    #[error("payment order not found: {0}")]
    OrderNotFound(String),

    /// Amount could not be parsed or is not positive.
    #[error("invalid payment amount: {0}")]
    InvalidAmount(String),

    /// Gateway reported a status we do not know.
    #[error("unknown payment status: {0}")]
    UnknownStatus(String),

    /// No fee configured for the position.
    #[error("no fee configured for {0}")]
    FeeNotConfigured(PositionType),
}

impl PaymentError {
    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn status_code(&self) -> u16 {
        match self {
            Self::ChecksumMismatch
            | Self::AmountMismatch { .. }
            | Self::InvalidAmount(_)
            | Self::UnknownStatus(_) => 400,
            Self::OrderNotFound(_) => 404,
            Self::FeeNotConfigured(_) => 500,
        }
    }

    /// Returns the error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::ChecksumMismatch => "CHECKSUM_MISMATCH",
            Self::AmountMismatch { .. } => "AMOUNT_MISMATCH",
            Self::OrderNotFound(_) => "PAYMENT_ORDER_NOT_FOUND",
            Self::InvalidAmount(_) => "INVALID_AMOUNT",
            Self::UnknownStatus(_) => "UNKNOWN_PAYMENT_STATUS",
            Self::FeeNotConfigured(_) => "FEE_NOT_CONFIGURED",
        }
    }
}
