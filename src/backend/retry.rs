//! Retry policy and executor
//!
//! One executor shared by every resource type: each attempt is bounded by
//! its own timeout, failed attempts are followed by a fixed delay, and the
//! last attempt's error is returned once the attempts are exhausted.

use std::future::Future;
use std::time::Duration;

use tracing::{debug, warn};

use crate::error::{FetchError, FetchResult};

/// How many times to try, and how long each try may take
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub per_attempt_timeout: Duration,
    pub inter_attempt_delay: Duration,
}

impl RetryPolicy {
    /// Catalog-class requests
    pub const CATALOG: RetryPolicy = RetryPolicy {
        max_attempts: 2,
        per_attempt_timeout: Duration::from_secs(15),
        inter_attempt_delay: Duration::from_secs(1),
    };

    /// Coupon, additions, referral and delivery lookups
    pub const LOOKUP: RetryPolicy = RetryPolicy {
        max_attempts: 2,
        per_attempt_timeout: Duration::from_secs(10),
        inter_attempt_delay: Duration::from_secs(1),
    };

    /// Same timeout, no retries
    pub fn single_attempt(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: 1,
            ..*self
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::CATALOG
    }
}

/// Runs `attempt` until it succeeds or the policy is exhausted
///
/// The closure receives the 1-based attempt number. A timed-out attempt is
/// dropped, which aborts its in-flight request.
pub async fn execute_with_retry<T, F, Fut>(
    policy: &RetryPolicy,
    operation: &str,
    mut attempt: F,
) -> FetchResult<T>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = FetchResult<T>>,
{
    let max_attempts = policy.max_attempts.max(1);
    let mut last_error = FetchError::Network(format!("{}: no attempt made", operation));

    for number in 1..=max_attempts {
        debug!(operation = %operation, attempt = number, "Starting attempt");

        match tokio::time::timeout(policy.per_attempt_timeout, attempt(number)).await {
            Ok(Ok(value)) => return Ok(value),
            Ok(Err(e)) => {
                warn!(
                    operation = %operation,
                    attempt = number,
                    max_attempts = max_attempts,
                    error = %e,
                    "Attempt failed"
                );
                last_error = e;
            }
            Err(_) => {
                warn!(
                    operation = %operation,
                    attempt = number,
                    max_attempts = max_attempts,
                    timeout_ms = policy.per_attempt_timeout.as_millis() as u64,
                    "Attempt timed out"
                );
                last_error = FetchError::Timeout(policy.per_attempt_timeout);
            }
        }

        if number < max_attempts {
            tokio::time::sleep(policy.inter_attempt_delay).await;
        }
    }

    Err(last_error)
}
