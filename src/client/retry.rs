//! Centralized retry policy for transient fetch failures
//!
//! Crawlers carry no retry logic of their own; the fetch client applies
//! this one policy uniformly. Only failures classified as retryable by
//! [`FetchError::is_retryable`] consume attempts.

use crate::FetchError;
use std::time::Duration;

/// Exponential backoff policy with an upper cap and optional jitter.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Retry attempts after the initial request
    pub max_retries: u32,
    /// Backoff before the first retry
    pub initial_backoff: Duration,
    /// Ceiling for any single backoff
    pub max_backoff: Duration,
    /// Growth factor between consecutive backoffs
    pub backoff_multiplier: f64,
    /// Proportional jitter applied to each backoff (0.0 disables)
    pub jitter_factor: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_backoff: Duration::from_millis(500),
            max_backoff: Duration::from_secs(30),
            backoff_multiplier: 2.0,
            jitter_factor: 0.1,
        }
    }
}

impl RetryPolicy {
    /// Policy with a given retry budget and the default curve.
    pub fn with_retries(max_retries: u32) -> Self {
        Self {
            max_retries,
            ..Default::default()
        }
    }

    /// Schedule for one request. Use this rather than calling [`backoff`]
    /// per attempt: the raw curve flattens at `max_backoff` and jitter can
    /// locally shrink it, while the schedule keeps every delay strictly
    /// longer than the one before.
    ///
    /// [`backoff`]: RetryPolicy::backoff
    pub fn schedule(&self) -> BackoffSchedule {
        BackoffSchedule {
            policy: self.clone(),
            last: None,
        }
    }

    /// Raw backoff sample before retry number `attempt` (1-based):
    /// exponential growth, capped, with proportional jitter.
    pub fn backoff(&self, attempt: u32) -> Duration {
        let base = self.initial_backoff.as_secs_f64()
            * self.backoff_multiplier.powi(attempt.saturating_sub(1) as i32);
        let capped = base.min(self.max_backoff.as_secs_f64());

        let with_jitter = if self.jitter_factor > 0.0 {
            let range = capped * self.jitter_factor;
            let jitter = rand::random_range(-range..=range);
            (capped + jitter).max(0.0)
        } else {
            capped
        };

        Duration::from_secs_f64(with_jitter)
    }

    /// Whether another attempt is allowed for this failure.
    pub fn should_retry(&self, attempt: u32, error: &FetchError) -> bool {
        attempt < self.max_retries && error.is_retryable()
    }
}

/// Per-request backoff state: delays handed out are strictly increasing
/// across the whole retry budget, even once the exponential curve has hit
/// `max_backoff` or jitter draws a locally smaller sample.
#[derive(Debug)]
pub struct BackoffSchedule {
    policy: RetryPolicy,
    last: Option<Duration>,
}

impl BackoffSchedule {
    /// Delay before retry number `attempt` (1-based).
    pub fn next_delay(&mut self, attempt: u32) -> Duration {
        let raw = self.policy.backoff(attempt);
        let delay = match self.last {
            Some(last) if raw <= last => last + Duration::from_millis(1),
            _ => raw,
        };
        self.last = Some(delay);
        delay
    }
}
