//! Retry of transport failures with linear backoff.

use std::future::Future;
use std::time::Duration;

use crate::error::Result;

/// Default pause step between attempts.
pub const DEFAULT_BACKOFF: Duration = Duration::from_millis(300);

/// Default number of retries after the first attempt.
pub const DEFAULT_RETRY_BUDGET: u32 = 2;

/// Run `f` until it succeeds, fails with a non-retryable error, or the budget
/// is spent.
///
/// Retry `n` (1-based) sleeps `backoff * n` first, so the default policy waits
/// 300 ms and then 600 ms. Only [`crate::Error::Network`] is retried.
pub async fn with_retry<F, Fut, T>(
    retry_budget: u32,
    backoff: Duration,
    endpoint: &str,
    mut f: F,
) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let mut attempt = 0u32;
    loop {
        match f().await {
            Ok(value) => return Ok(value),
            Err(e) if !e.is_retryable() || attempt >= retry_budget => return Err(e),
            Err(e) => {
                attempt += 1;
                let delay = backoff * attempt;
                tracing::warn!(
                    endpoint = endpoint,
                    attempt = attempt,
                    max_retries = retry_budget,
                    backoff_ms = delay.as_millis() as u64,
                    error = %e,
                    "Request failed, retrying"
                );
                tokio::time::sleep(delay).await;
            }
        }
    }
}
