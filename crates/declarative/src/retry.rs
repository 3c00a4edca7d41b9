//! Deadline-bounded retry with exponential backoff.
//!
//! Operations classify their own failures: a [`RetryError::Retryable`]
//! error is attempted again after a backoff delay while the time budget
//! lasts, a [`RetryError::NonRetryable`] one stops the loop immediately.

use std::fmt;
use std::thread;
use std::time::{Duration, Instant};

/// A failed attempt, classified by the operation.
#[derive(Debug)]
pub enum RetryError<E> {
    /// Transient failure; try again if time remains
    Retryable(E),
    /// Terminal failure; stop now
    NonRetryable(E),
}

impl<E> RetryError<E> {
    /// The underlying error.
    pub fn into_inner(self) -> E {
        match self {
            RetryError::Retryable(e) | RetryError::NonRetryable(e) => e,
        }
    }

    /// Whether another attempt may be made.
    pub fn is_retryable(&self) -> bool {
        matches!(self, RetryError::Retryable(_))
    }
}

/// Backoff settings between attempts.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Delay after the first failed attempt
    pub base_delay: Duration,
    /// Multiplier applied per attempt
    pub backoff_factor: f64,
    /// Upper bound for a single delay
    pub max_delay: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            base_delay: Duration::from_millis(500),
            backoff_factor: 2.0,
            max_delay: Duration::from_secs(10),
        }
    }
}

impl RetryConfig {
    /// Delay before attempt `attempt + 1` (0-indexed).
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let factor = self.backoff_factor.powi(attempt as i32);
        let delay = self.base_delay.as_secs_f64() * factor;
        let capped = delay.min(self.max_delay.as_secs_f64());
        Duration::from_secs_f64(capped.max(0.0))
    }
}

/// Callback trait for retry progress notifications.
pub trait RetryCallback {
    /// Called before sleeping for another attempt.
    ///
    /// # Arguments
    /// * `attempt` - Attempt that just failed (1-indexed)
    /// * `error` - The error that triggered the retry
    /// * `delay` - Time until the next attempt
    /// * `remaining` - Time left in the budget after the delay
    fn on_retry(&self, attempt: u32, error: &dyn fmt::Display, delay: Duration, remaining: Duration);
}

/// Callback that logs retries at warn level.
pub struct LogCallback;

impl RetryCallback for LogCallback {
    fn on_retry(&self, attempt: u32, error: &dyn fmt::Display, delay: Duration, remaining: Duration) {
        log::warn!(
            "Attempt {} failed: {}. Retrying in {:.1}s ({}s left)",
            attempt,
            error,
            delay.as_secs_f64(),
            remaining.as_secs()
        );
    }
}

/// Run `operation` until it succeeds, fails terminally, or `timeout` runs out.
///
/// At least one attempt is always made. When the next delay would cross the
/// deadline the last retryable error is returned.
pub fn retry<T, E, F>(
    timeout: Duration,
    config: &RetryConfig,
    callback: Option<&dyn RetryCallback>,
    mut operation: F,
) -> Result<T, E>
where
    E: fmt::Display,
    F: FnMut() -> Result<T, RetryError<E>>,
{
    let start = Instant::now();
    let mut attempt: u32 = 0;

    loop {
        let err = match operation() {
            Ok(value) => return Ok(value),
            Err(RetryError::NonRetryable(e)) => return Err(e),
            Err(RetryError::Retryable(e)) => e,
        };

        let delay = config.delay_for_attempt(attempt);
        attempt += 1;

        let elapsed = start.elapsed();
        if elapsed + delay >= timeout {
            log::debug!(
                "Giving up after {} attempt(s) in {:.1}s: {}",
                attempt,
                elapsed.as_secs_f64(),
                err
            );
            return Err(err);
        }

        if let Some(cb) = callback {
            cb.on_retry(attempt, &err, delay, timeout - elapsed - delay);
        }

        thread::sleep(delay);
    }
}
