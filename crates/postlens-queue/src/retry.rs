//! Bounded retry with exponential backoff.

use std::future::Future;
use std::time::Duration;

use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::error::{RequestError, RequestResult};
use crate::response::HttpResponse;

pub const DEFAULT_ATTEMPTS: u32 = 3;
pub const DEFAULT_BASE_DELAY: Duration = Duration::from_millis(500);

/// How many times to try a request and how long to wait between tries.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first (at least 1).
    pub attempts: u32,
    /// Wait before the first retry; doubles for each retry after it.
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            attempts: DEFAULT_ATTEMPTS,
            base_delay: DEFAULT_BASE_DELAY,
        }
    }
}

impl RetryPolicy {
    pub fn new(attempts: u32, base_delay: Duration) -> Self {
        Self {
            attempts: attempts.max(1),
            base_delay,
        }
    }

    pub fn from_millis(attempts: u32, base_delay_ms: u64) -> Self {
        Self::new(attempts, Duration::from_millis(base_delay_ms))
    }

    /// One attempt, no waiting.
    pub fn single_attempt() -> Self {
        Self::new(1, Duration::ZERO)
    }

    /// Wait before retry number `retry` (1-based): `base_delay * 2^(retry - 1)`.
    pub fn delay_for_retry(&self, retry: u32) -> Duration {
        let exponent = retry.saturating_sub(1).min(31);
        self.base_delay.saturating_mul(1u32 << exponent)
    }
}

/// Run `operation` until it yields a 2xx response with a JSON body, or until
/// `policy.attempts` attempts have failed.
///
/// Transport errors, non-2xx statuses, and undecodable bodies all count as
/// failures. The error returned is the one from the final attempt; earlier
/// errors are discarded. There is no overall timeout.
pub async fn execute_with_retry<T, F, Fut>(policy: &RetryPolicy, mut operation: F) -> RequestResult<T>
where
    T: DeserializeOwned,
    F: FnMut() -> Fut,
    Fut: Future<Output = RequestResult<HttpResponse>>,
{
    let attempts = policy.attempts.max(1);
    let mut attempt = 0u32;

    loop {
        attempt += 1;
        let err = match settle(operation().await) {
            Ok(value) => return Ok(value),
            Err(err) => err,
        };

        if attempt >= attempts {
            debug!(attempts, error = %err, "request failed, no attempts left");
            return Err(err);
        }

        let delay = policy.delay_for_retry(attempt);
        warn!(
            attempt,
            attempts,
            delay_ms = delay.as_millis() as u64,
            error = %err,
            "request failed, retrying"
        );
        tokio::time::sleep(delay).await;
    }
}

fn settle<T: DeserializeOwned>(result: RequestResult<HttpResponse>) -> RequestResult<T> {
    let response = result?;
    if !response.is_success() {
        return Err(RequestError::Status {
            status: response.status,
        });
    }
    response.json()
}
