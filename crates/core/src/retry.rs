//! Bounded retry with fixed or exponential backoff.
//!
//! - Exponential: `delay = initial_ms * multiplier^(attempt-1)`, clamped to `max_ms`
//! - Integer arithmetic only, saturating on overflow
//! - Non-retryable errors return immediately
//! - Every retry path sleeps; no busy loop

use std::future::Future;
use std::time::Duration;

use permitflow_shared::config::{BackoffStrategy, RetrySettings};
use tracing::warn;

/// Delay schedule between attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backoff {
    /// Same delay every time.
    Fixed {
        /// Delay in milliseconds.
        delay_ms: u64,
    },
    /// Growing delay with a cap.
    Exponential {
        /// First delay in milliseconds.
        initial_ms: u64,
        /// Growth factor per attempt.
        multiplier: u32,
        /// Upper bound in milliseconds.
        max_ms: u64,
    },
}

/// How often and how patiently to retry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts including the first. Zero is treated as one.
    pub max_attempts: u32,
    /// Delay schedule.
    pub backoff: Backoff,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_settings(&RetrySettings::default())
    }
}

impl RetryPolicy {
    /// Builds a policy from configuration.
    #[must_use]
    pub fn from_settings(settings: &RetrySettings) -> Self {
        let backoff = match settings.strategy {
            BackoffStrategy::Fixed => Backoff::Fixed {
                delay_ms: settings.initial_delay_ms,
            },
            BackoffStrategy::Exponential => Backoff::Exponential {
                initial_ms: settings.initial_delay_ms,
                multiplier: settings.multiplier.max(1),
                max_ms: settings.max_delay_ms,
            },
        };
        Self {
            max_attempts: settings.max_attempts,
            backoff,
        }
    }

    /// A single attempt, no retries.
    #[must_use]
    pub const fn no_retry() -> Self {
        Self {
            max_attempts: 1,
            backoff: Backoff::Fixed { delay_ms: 0 },
        }
    }

    /// Delay before retry number `attempt` (1-indexed: the wait after the first failure is attempt 1).
    #[must_use]
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let millis = match self.backoff {
            Backoff::Fixed { delay_ms } => delay_ms,
            Backoff::Exponential {
                initial_ms,
                multiplier,
                max_ms,
            } => {
                let exponent = attempt.saturating_sub(1);
                let factor = u64::from(multiplier)
                    .checked_pow(exponent)
                    .unwrap_or(u64::MAX);
                initial_ms.saturating_mul(factor).min(max_ms)
            }
        };
        Duration::from_millis(millis)
    }

    fn attempts(&self) -> u32 {
        self.max_attempts.max(1)
    }
}

/// Runs `operation` until it succeeds, fails with a non-retryable error,
/// or the policy's attempts are used up. Returns the last error.
pub async fn retry_with_backoff<F, Fut, T, E>(
    policy: &RetryPolicy,
    operation_name: &str,
    is_retryable: impl Fn(&E) -> bool,
    mut operation: F,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: std::fmt::Display,
{
    let max_attempts = policy.attempts();
    let mut attempt: u32 = 1;

    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(error) => {
                if attempt >= max_attempts || !is_retryable(&error) {
                    return Err(error);
                }
                let delay = policy.delay_for(attempt);
                warn!(
                    operation = operation_name,
                    attempt,
                    max_attempts,
                    delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                    error = %error,
                    "Retrying after transient failure"
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
        }
    }
}
