//! OTP-gated digital signatures.
//!
//! - OTP generation and verification
//! - HSM key-label lookup
//! - Signature placement on generated PDFs
//! - HSM transport

pub mod gateway;
pub mod hsm_client;
pub mod key_registry;
pub mod layout;
pub mod otp;

pub use gateway::{GatewayError, OtpDispatch, SignRequest, SignatureGateway};
pub use hsm_client::HsmClient;
pub use key_registry::KeyLabelRegistry;
pub use layout::{SignatureCoordinates, SignatureLayout};
pub use otp::{DEFAULT_OTP_VALIDITY_SECS, OtpRecord, OtpService, OtpTicket};
