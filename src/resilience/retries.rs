//! Retry logic.
//!
//! # Responsibilities
//! - Re-run a fallible async operation up to a fixed attempt budget
//! - Stop on the first success
//! - Surface the last error once the budget is exhausted
//!
//! # Design Decisions
//! - Budget is attempt-count only; there is no wall-clock bound
//! - Retries are immediate, no backoff between attempts
//! - The caller's transport enforces any per-attempt timeout

use std::fmt::Display;
use std::future::Future;

use crate::observability::metrics;

/// Attempt budget for fetching a monitor during one status poll.
pub const FETCH_ATTEMPTS: u32 = 3;

/// Run `operation` until it succeeds or `attempts` tries have failed.
///
/// The closure receives the 1-based attempt number. A budget of zero is
/// treated as one attempt.
pub async fn retry_fixed<T, E, F, Fut>(attempts: u32, label: &str, mut operation: F) -> Result<T, E>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Display,
{
    let attempts = attempts.max(1);
    let mut attempt = 1;

    loop {
        match operation(attempt).await {
            Ok(value) => return Ok(value),
            Err(e) if attempt < attempts => {
                tracing::warn!(operation = label, attempt, max_attempts = attempts, error = %e, "Attempt failed, retrying");
                metrics::record_fetch_retry();
                attempt += 1;
            }
            Err(e) => {
                tracing::error!(operation = label, attempts, error = %e, "All attempts failed");
                return Err(e);
            }
        }
    }
}
