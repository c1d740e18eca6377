//! One-time passwords authorising a signature.
//!
//! Codes are six random digits. Only their SHA-256 digest is stored.

use chrono::{DateTime, Duration, Utc};
use rand::Rng;
use serde::Serialize;
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::workflow::error::WorkflowError;
use crate::workflow::types::Stage;

/// Default validity window in seconds.
pub const DEFAULT_OTP_VALIDITY_SECS: i64 = 300;

/// Stored state of an OTP.
#[derive(Debug, Clone)]
pub struct OtpRecord {
    /// SHA-256 hex digest of the code.
    pub code_hash: String,
    /// Not yet consumed or superseded.
    pub is_active: bool,
    /// End of validity.
    pub expires_at: DateTime<Utc>,
}

/// Returned to the officer after an OTP was dispatched.
#[derive(Debug, Clone, Serialize)]
pub struct OtpTicket {
    /// Stored OTP row.
    pub otp_id: Uuid,
    /// Application being signed.
    pub application_id: Uuid,
    /// Stage being signed.
    pub stage: Stage,
    /// End of validity.
    pub expires_at: DateTime<Utc>,
}

/// Stateless OTP helpers.
pub struct OtpService;

impl OtpService {
    /// Generates a fresh six-digit code.
    #[must_use]
    pub fn generate_code() -> String {
        let value: u32 = rand::rng().random_range(0..1_000_000);
        format!("{value:06}")
    }

    /// Hashes a code for storage.
    #[must_use]
    pub fn hash_code(code: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(code.trim().as_bytes());
        format!("{:x}", hasher.finalize())
    }

    /// Identifier an OTP is issued to.
    #[must_use]
    pub fn identifier_for(officer_id: Uuid) -> String {
        format!("officer:{officer_id}")
    }

    /// Purpose scoping an OTP to one signature in one review cycle.
    #[must_use]
    pub fn purpose_for(application_id: Uuid, cycle: i32, stage: Stage) -> String {
        format!("{}{cycle}:{}", Self::purpose_prefix(application_id), stage.code())
    }

    /// Prefix shared by every signing purpose of an application.
    #[must_use]
    pub fn purpose_prefix(application_id: Uuid) -> String {
        format!("sign:{application_id}:")
    }

    /// End of validity for an OTP issued at `now`.
    #[must_use]
    pub fn expires_at(now: DateTime<Utc>, validity_secs: i64) -> DateTime<Utc> {
        now + Duration::seconds(validity_secs.max(1))
    }

    /// Checks an entered code against the active OTP.
    ///
    /// Expiry is checked before the code so a lapsed OTP never verifies.
    ///
    /// # Errors
    ///
    /// * `OtpNotFound` if the OTP is no longer active
    /// * `OtpExpired` if `now` is past `expires_at`
    /// * `OtpMismatch` if the code differs
    pub fn check(record: &OtpRecord, code: &str, now: DateTime<Utc>) -> Result<(), WorkflowError> {
        if !record.is_active {
            return Err(WorkflowError::OtpNotFound);
        }
        if now > record.expires_at {
            return Err(WorkflowError::OtpExpired);
        }
        if !constant_time_eq(record.code_hash.as_bytes(), Self::hash_code(code).as_bytes()) {
            return Err(WorkflowError::OtpMismatch);
        }
        Ok(())
    }
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(code: &str, expires_in: i64) -> OtpRecord {
        OtpRecord {
            code_hash: OtpService::hash_code(code),
            is_active: true,
            expires_at: Utc::now() + Duration::seconds(expires_in),
        }
    }

    #[test]
    fn test_generated_code_is_six_digits() {
        for _ in 0..50 {
            let code = OtpService::generate_code();
            assert_eq!(code.len(), 6);
            assert!(code.chars().all(|c| c.is_ascii_digit()));
        }
    }

    #[test]
    fn test_hash_is_hex_sha256() {
        let hash = OtpService::hash_code("123456");
        assert_eq!(hash.len(), 64);
        assert_ne!(hash, OtpService::hash_code("123457"));
        assert_eq!(hash, OtpService::hash_code(" 123456 "));
    }

    #[test]
    fn test_check_accepts_matching_code() {
        assert!(OtpService::check(&record("482913", 60), "482913", Utc::now()).is_ok());
    }

    #[test]
    fn test_check_mismatch() {
        assert!(matches!(
            OtpService::check(&record("482913", 60), "000000", Utc::now()),
            Err(WorkflowError::OtpMismatch)
        ));
    }

    #[test]
    fn test_check_expired_even_with_right_code() {
        assert!(matches!(
            OtpService::check(&record("482913", -1), "482913", Utc::now()),
            Err(WorkflowError::OtpExpired)
        ));
    }

    #[test]
    fn test_check_consumed() {
        let mut consumed = record("482913", 60);
        consumed.is_active = false;
        assert!(matches!(
            OtpService::check(&consumed, "482913", Utc::now()),
            Err(WorkflowError::OtpNotFound)
        ));
    }

    #[test]
    fn test_purpose_is_stage_scoped() {
        let id = Uuid::new_v4();
        assert_ne!(
            OtpService::purpose_for(id, 1, Stage::ExecutiveEngineerStage1),
            OtpService::purpose_for(id, 1, Stage::ExecutiveEngineerStage2)
        );
    }

    #[test]
    fn test_purpose_is_cycle_scoped() {
        let id = Uuid::new_v4();
        let first = OtpService::purpose_for(id, 1, Stage::JuniorEngineer);
        let second = OtpService::purpose_for(id, 2, Stage::JuniorEngineer);

        assert_ne!(first, second);
        assert!(first.starts_with(&OtpService::purpose_prefix(id)));
        assert!(second.starts_with(&OtpService::purpose_prefix(id)));
    }

    #[test]
    fn test_expires_at_uses_validity() {
        let now = Utc::now();
        assert_eq!(
            OtpService::expires_at(now, DEFAULT_OTP_VALIDITY_SECS) - now,
            Duration::seconds(300)
        );
    }
}
