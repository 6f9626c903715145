//! Retry loop: run a closure until success or policy says stop.

use std::time::Duration;

use super::policy::{ErrorKind, RetryDecision, RetryPolicy};

/// Runs `f` until it succeeds or the retry policy says to stop.
/// On retryable failure, calls `sleep` with the backoff duration then tries again.
pub fn run_with_retry<T, E, F, C, S>(
    policy: &RetryPolicy,
    classify: C,
    mut sleep: S,
    mut f: F,
) -> Result<T, E>
where
    F: FnMut() -> Result<T, E>,
    C: Fn(&E) -> ErrorKind,
    S: FnMut(Duration),
{
    let mut attempt = 1u32;
    loop {
        match f() {
            Ok(v) => return Ok(v),
            Err(e) => match policy.decide(attempt, classify(&e)) {
                RetryDecision::NoRetry => return Err(e),
                RetryDecision::RetryAfter(d) => {
                    tracing::debug!(attempt, delay_ms = d.as_millis() as u64, "retrying");
                    sleep(d);
                    attempt += 1;
                }
            },
        }
    }
}
