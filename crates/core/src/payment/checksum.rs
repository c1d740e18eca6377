//! Gateway checksums: hex HMAC-SHA256 keyed by the shared secret.
//!
//! Each field is fed as its byte length (big-endian `u64`) followed by its
//! bytes, so no choice of field contents can collide with another split.

use hmac::{Hmac, Mac};
use sha2::Sha256;

use super::error::PaymentError;

/// Signs and verifies gateway messages with a shared secret.
#[derive(Clone)]
pub struct Checksum {
    secret: String,
}

impl std::fmt::Debug for Checksum {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Checksum").field("secret", &"[REDACTED]").finish()
    }
}

impl Checksum {
    /// Creates a checksum helper.
    #[must_use]
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
        }
    }

    /// Computes the checksum of `fields` in order.
    #[must_use]
    pub fn compute(&self, fields: &[&str]) -> String {
        // HMAC takes keys of any length; an empty digest never verifies.
        let Ok(mut mac) = Hmac::<Sha256>::new_from_slice(self.secret.as_bytes()) else {
            return String::new();
        };
        for field in fields {
            mac.update(&(field.len() as u64).to_be_bytes());
            mac.update(field.as_bytes());
        }
        format!("{:x}", mac.finalize().into_bytes())
    }

    /// Verifies a received checksum. Comparison is case-insensitive and constant-time.
    ///
    /// # Errors
    ///
    /// Returns `ChecksumMismatch` if it does not match.
    pub fn verify(&self, fields: &[&str], received: &str) -> Result<(), PaymentError> {
        let expected = self.compute(fields);
        let received = received.trim().to_ascii_lowercase();
        if expected.is_empty() || expected.len() != received.len() {
            return Err(PaymentError::ChecksumMismatch);
        }
        let diff = expected
            .bytes()
            .zip(received.bytes())
            .fold(0u8, |acc, (a, b)| acc | (a ^ b));
        if diff == 0 {
            Ok(())
        } else {
            Err(PaymentError::ChecksumMismatch)
        }
    }
}
