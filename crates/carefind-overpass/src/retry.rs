//! Retry policy for a single Overpass endpoint plus the cursor that walks the
//! ordered endpoint list.
//!
//! The state machine is clock-agnostic: callers pass `now` and a jitter factor
//! so the schedule can be tested without sleeping. The async driver in
//! [`crate::engine`] supplies `Instant::now()` and
//! [`random_jitter`].

use std::time::Duration;

use carefind_core::EngineConfig;
use tokio::time::Instant;

use crate::error::{is_transient, QueryError};

const MAX_BACKOFF: Duration = Duration::from_secs(10);

/// Limits applied to each endpoint before failing over.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Additional attempts after the first one.
    pub max_retries: u32,
    pub backoff_base: Duration,
    pub max_backoff: Duration,
    pub attempt_timeout: Duration,
    /// Wall-clock budget for all attempts and back-off sleeps on one endpoint.
    pub endpoint_budget: Duration,
}

impl RetryPolicy {
    #[must_use]
    pub fn from_config(config: &EngineConfig) -> Self {
        Self {
            max_retries: config.per_endpoint_retry_count,
            backoff_base: config.retry_backoff_base(),
            max_backoff: MAX_BACKOFF,
            attempt_timeout: config.per_attempt_timeout(),
            endpoint_budget: config.per_endpoint_budget(),
        }
    }

    /// Un-jittered delay before retry number `retry` (1-based).
    ///
    /// | Retry | Delay with `backoff_base = 500 ms` |
    /// |-------|------------------------------------|
    /// | 1     | 500 ms                             |
    /// | 2     | 1 000 ms                           |
    /// | 3     | 2 000 ms                           |
    ///
    /// Capped at `max_backoff`.
    #[must_use]
    pub fn backoff(&self, retry: u32) -> Duration {
        let exponent = retry.saturating_sub(1).min(10);
        self.backoff_base
            .saturating_mul(1u32 << exponent)
            .min(self.max_backoff)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_config(&EngineConfig::default())
    }
}

/// Jitter factor in `[0.75, 1.25)`.
#[must_use]
pub fn random_jitter() -> f64 {
    rand::random::<f64>() * 0.5 + 0.75
}

/// What to do after a failed attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    RetryAfter(Duration),
    /// Stop using this endpoint and advance the cursor.
    FailOver,
}

/// Attempt counter and budget for one endpoint.
#[derive(Debug)]
pub struct EndpointRetryState {
    policy: RetryPolicy,
    started: Instant,
    attempts: u32,
}

impl EndpointRetryState {
    #[must_use]
    pub fn new(policy: RetryPolicy, started: Instant) -> Self {
        Self {
            policy,
            started,
            attempts: 0,
        }
    }

    #[must_use]
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    fn deadline(&self) -> Instant {
        self.started + self.policy.endpoint_budget
    }

    /// Timeout for the next attempt, or `None` when the budget is spent.
    ///
    /// Counts the attempt when one is granted. The timeout is the smaller of the
    /// per-attempt limit and the remaining endpoint budget.
    pub fn begin_attempt(&mut self, now: Instant) -> Option<Duration> {
        let remaining = self.deadline().saturating_duration_since(now);
        if remaining.is_zero() || self.attempts > self.policy.max_retries {
            return None;
        }
        self.attempts += 1;
        Some(remaining.min(self.policy.attempt_timeout))
    }

    /// Decides whether `err` is retried on this endpoint.
    ///
    /// A back-off that would end past the endpoint budget fails over instead
    /// of sleeping into a doomed attempt. `Retry-After` raises the delay but
    /// never the budget.
    pub fn on_failure(&self, err: &QueryError, now: Instant, jitter: f64) -> RetryDecision {
        if !is_transient(err) || self.attempts > self.policy.max_retries {
            return RetryDecision::FailOver;
        }

        let mut delay = self.policy.backoff(self.attempts).mul_f64(jitter.max(0.0));
        if let QueryError::RateLimited {
            retry_after_secs: Some(secs),
            ..
        } = err
        {
            delay = delay.max(Duration::from_secs(*secs));
        }

        if now + delay >= self.deadline() {
            RetryDecision::FailOver
        } else {
            RetryDecision::RetryAfter(delay)
        }
    }
}

/// Position in the ordered endpoint list. Never moves backwards.
#[derive(Debug, Clone)]
pub struct EndpointCursor {
    index: usize,
    len: usize,
}

impl EndpointCursor {
    #[must_use]
    pub fn new(len: usize) -> Self {
        Self { index: 0, len }
    }

    /// Index of the endpoint to use, or `None` once every endpoint was tried.
    #[must_use]
    pub fn current(&self) -> Option<usize> {
        (self.index < self.len).then_some(self.index)
    }

    pub fn advance(&mut self) {
        self.index = (self.index + 1).min(self.len);
    }

    #[must_use]
    pub fn is_exhausted(&self) -> bool {
        self.index >= self.len
    }
}
