//! Bounded retries with exponential backoff
//!
//! Only transient failures are retried. The delay before attempt `n + 1`
//! is `base_delay * 2^(n - 1)`, capped at `max_delay`.

use std::future::Future;
use std::time::Duration;

use davsync_core::config::RetryConfig;
use tracing::{info, warn};

use crate::SyncError;

/// How often and how patiently a remote operation is retried
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts including the first one
    pub max_attempts: u32,
    /// Delay after the first failed attempt
    pub base_delay: Duration,
    /// Upper bound for any single delay
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(30),
        }
    }
}

impl From<&RetryConfig> for RetryPolicy {
    fn from(config: &RetryConfig) -> Self {
        Self {
            max_attempts: config.max_attempts,
            base_delay: config.base_delay(),
            max_delay: config.max_delay(),
        }
    }
}

impl RetryPolicy {
    /// Backoff to wait after failed attempt number `attempt` (1-based)
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let factor = 1u32
            .checked_shl(attempt.saturating_sub(1))
            .unwrap_or(u32::MAX);
        self.base_delay.saturating_mul(factor).min(self.max_delay)
    }

    /// Runs `operation` until it succeeds, fails permanently or runs out
    /// of attempts
    ///
    /// The closure receives the 1-based attempt number. Returns the final
    /// result together with the number of attempts made.
    pub async fn run<T, F, Fut>(&self, name: &str, mut operation: F) -> (Result<T, SyncError>, u32)
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T, SyncError>>,
    {
        let max_attempts = self.max_attempts.max(1);
        let mut attempt = 1;

        loop {
            match operation(attempt).await {
                Ok(value) => {
                    if attempt > 1 {
                        info!(operation = name, attempt, "Operation succeeded after retry");
                    }
                    return (Ok(value), attempt);
                }
                Err(err) if attempt < max_attempts && err.is_transient() => {
                    let delay = self.delay_for(attempt);
                    warn!(
                        operation = name,
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        error = %err,
                        "Transient error, retrying"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(err) => return (Err(err), attempt),
            }
        }
    }
}
