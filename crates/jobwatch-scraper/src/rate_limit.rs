//! Request pacing and fixed-delay retry for the job page fetcher.
//!
//! [`Pacer`] enforces a minimum gap between any two outbound requests.
//! [`retry_fixed_delay`] repeats a fallible operation a bounded number of
//! times with a constant pause between attempts, pacing every attempt.

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

use tokio::time::Instant;

/// Tracks when the last request went out and holds callers back until the
/// minimum interval has passed.
#[derive(Debug)]
pub(crate) struct Pacer {
    min_interval: Duration,
    last_request: Option<Instant>,
}

impl Pacer {
    pub(crate) fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            last_request: None,
        }
    }

    /// Sleeps until `min_interval` has elapsed since the last recorded request.
    /// Returns immediately before the first request or once the gap is met.
    pub(crate) async fn wait_turn(&self) {
        let Some(last) = self.last_request else {
            return;
        };
        let elapsed = last.elapsed();
        if let Some(remaining) = self.min_interval.checked_sub(elapsed) {
            if remaining.is_zero() {
                return;
            }
            tracing::debug!(
                wait_ms = u64::try_from(remaining.as_millis()).unwrap_or(u64::MAX),
                "pacing outbound request"
            );
            tokio::time::sleep(remaining).await;
        }
    }

    /// Records that a request just finished (successfully or not).
    pub(crate) fn mark(&mut self) {
        self.last_request = Some(Instant::now());
    }
}

/// The final error of an operation that failed on every attempt.
#[derive(Debug)]
pub(crate) struct Exhausted<E> {
    pub attempts: u32,
    pub last: E,
}

/// Runs `operation` up to `max_attempts` times, sleeping `delay` after each
/// failure except the last.
///
/// Every attempt first waits its turn on `pacer` and marks it afterwards, so
/// the pacing gap holds across retries as well as across separate fetches.
/// `operation` receives the 1-based attempt number. A `max_attempts` of zero
/// is treated as one.
pub(crate) async fn retry_fixed_delay<T, E, F, Fut>(
    pacer: &mut Pacer,
    max_attempts: u32,
    delay: Duration,
    mut operation: F,
) -> Result<T, Exhausted<E>>
where
    E: Display,
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    let max_attempts = max_attempts.max(1);
    let mut attempt = 0u32;

    loop {
        attempt += 1;
        pacer.wait_turn().await;
        let result = operation(attempt).await;
        pacer.mark();

        match result {
            Ok(value) => return Ok(value),
            Err(last) if attempt >= max_attempts => {
                return Err(Exhausted {
                    attempts: attempt,
                    last,
                })
            }
            Err(err) => {
                tracing::warn!(
                    attempt,
                    max_attempts,
                    delay_secs = delay.as_secs(),
                    error = %err,
                    "request failed, retrying after fixed delay"
                );
                tokio::time::sleep(delay).await;
            }
        }
    }
}
