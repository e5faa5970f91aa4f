//! Bounded retry with exponential backoff.
//!
//! The policy is a plain value object so handlers can carry it in shared
//! state and tests can shrink the delays to nothing.

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

use tracing::warn;

/// Retry budget for a transient store operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first one. Never zero.
    pub max_attempts: u32,
    /// Delay before the second attempt.
    pub base_delay: Duration,
    /// Backoff factor applied per subsequent attempt.
    pub multiplier: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(500),
            multiplier: 2,
        }
    }
}

impl RetryPolicy {
    /// Policy with no waiting between attempts, for tests.
    pub fn immediate(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            base_delay: Duration::ZERO,
            multiplier: 1,
        }
    }

    /// Delay to sleep after `failed_attempt` (1-based) before the next try.
    pub fn delay_after(&self, failed_attempt: u32) -> Duration {
        self.base_delay * self.multiplier.saturating_pow(failed_attempt.saturating_sub(1))
    }
}

/// Runs `attempt_fn` until it succeeds or the retry budget is exhausted.
///
/// Each failure short of the budget is logged at warn level and followed by
/// the policy's backoff delay. The final error is returned unwrapped; the
/// caller knows the attempt count from its own policy.
pub async fn run_with_retry<T, E, F, Fut>(
    policy: &RetryPolicy,
    operation: &str,
    mut attempt_fn: F,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Display,
{
    let mut attempt: u32 = 1;
    loop {
        match attempt_fn().await {
            Ok(value) => return Ok(value),
            Err(err) => {
                warn!(
                    operation,
                    attempt,
                    max_attempts = policy.max_attempts,
                    error = %err,
                    "operation failed"
                );
                if attempt >= policy.max_attempts.max(1) {
                    return Err(err);
                }
                tokio::time::sleep(policy.delay_after(attempt)).await;
                attempt += 1;
            }
        }
    }
}
