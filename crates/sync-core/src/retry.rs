//! Capped exponential backoff for calls to external services.
//!
//! The policy retries only the failures its caller classifies as transient
//! (connection refused, timeouts). Everything else is returned on the spot.
//! There is no attempt limit: the loop ends when the service comes back.

use std::future::Future;
use std::time::Duration;

use tokio::time::sleep;
use tracing::{info, warn};

/// Backoff parameters plus the name of the service being called.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    service: String,
    start_delay: Duration,
    factor: f64,
    max_delay: Duration,
}

impl RetryPolicy {
    pub const DEFAULT_START_DELAY: Duration = Duration::from_millis(100);
    pub const DEFAULT_FACTOR: f64 = 2.0;
    pub const DEFAULT_MAX_DELAY: Duration = Duration::from_secs(10);

    /// Create a policy with the default backoff (0.1s, x2, capped at 10s).
    pub fn new(service: impl Into<String>) -> Self {
        Self {
            service: service.into(),
            start_delay: Self::DEFAULT_START_DELAY,
            factor: Self::DEFAULT_FACTOR,
            max_delay: Self::DEFAULT_MAX_DELAY,
        }
    }

    pub fn with_start_delay(mut self, start_delay: Duration) -> Self {
        self.start_delay = start_delay;
        self
    }

    /// Growth factor between consecutive delays. Values below 1.0 (and NaN)
    /// are treated as 1.0 so delays never shrink.
    pub fn with_factor(mut self, factor: f64) -> Self {
        self.factor = if factor >= 1.0 { factor } else { 1.0 };
        self
    }

    pub fn with_max_delay(mut self, max_delay: Duration) -> Self {
        self.max_delay = max_delay;
        self
    }

    pub fn service(&self) -> &str {
        &self.service
    }

    /// Delay used after the first failed attempt.
    pub fn initial_delay(&self) -> Duration {
        self.start_delay.min(self.max_delay)
    }

    /// Delay following `current`: grown by the factor, capped at the ceiling.
    pub fn next_delay(&self, current: Duration) -> Duration {
        let grown = current.as_nanos() as f64 * self.factor;
        let ceiling = self.max_delay.as_nanos() as f64;
        if grown >= ceiling || !grown.is_finite() {
            self.max_delay
        } else {
            Duration::from_nanos(grown as u64)
        }
    }

    /// The infinite sequence of sleeps this policy performs between attempts.
    pub fn delays(&self) -> impl Iterator<Item = Duration> + '_ {
        std::iter::successors(Some(self.initial_delay()), move |d| Some(self.next_delay(*d)))
    }

    /// Run `operation` until it succeeds or fails with a non-retryable error.
    ///
    /// After each retryable failure the policy sleeps for the current delay,
    /// then grows the delay for the next round.
    pub async fn retry<T, E, F, Fut, P>(&self, is_retryable: P, mut operation: F) -> Result<T, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        P: Fn(&E) -> bool,
        E: std::fmt::Display,
    {
        let mut delay = self.initial_delay();
        let mut attempt: u64 = 1;

        loop {
            info!(
                service = %self.service,
                attempt,
                delay_ms = delay.as_millis() as u64,
                "Trying to connect to {} (interval {:?})",
                self.service,
                delay
            );

            match operation().await {
                Ok(value) => return Ok(value),
                Err(e) if is_retryable(&e) => {
                    warn!(
                        service = %self.service,
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        "{} is not available: {e}",
                        self.service
                    );
                    sleep(delay).await;
                    delay = self.next_delay(delay);
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }
}
