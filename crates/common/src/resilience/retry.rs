//! Retry executor gated by a circuit breaker
//!
//! [`RetryExecutor::execute`] runs an async operation up to
//! `max_attempts` times. Each attempt is admitted by a [`CircuitBreaker`],
//! bounded by `attempt_timeout`, and followed on failure by an exponential
//! backoff sleep. Both the attempt and the sleep race the caller's
//! [`CancellationToken`], so cancellation surfaces as its own error instead of
//! looking like an exhausted retry budget.
//!
//! Errors are classified by a [`RetryPolicy`]. [`RetryDecision::Stop`] marks
//! an error that proves the dependency is reachable but the operation cannot
//! succeed (for example missing authorization): it is propagated at once and
//! recorded as a breaker success.

use std::fmt;
use std::future::Future;
use std::time::Duration;

use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use super::circuit_breaker::CircuitBreaker;
use crate::time::Clock;

/// Errors produced by [`RetryExecutor::execute`]
#[derive(Debug, Error)]
pub enum RetryError<E> {
    /// The breaker rejected the call; the operation was not invoked
    #[error("{label} is temporarily unavailable")]
    CircuitOpen { label: String },

    /// The policy refused to retry this error
    #[error("{label} failed: {error}")]
    NonRetryable { label: String, error: E },

    /// Every attempt failed or timed out
    ///
    /// `last_error` is `None` when the final attempt timed out.
    #[error("failed to execute {label} after {attempts} attempts")]
    Exhausted { label: String, attempts: u32, last_error: Option<E> },

    /// The caller cancelled while an attempt or backoff was in flight
    #[error("{label} cancelled after {attempts} attempts")]
    Cancelled { label: String, attempts: u32 },

    /// The retry configuration is invalid
    #[error("Invalid retry configuration: {message}")]
    InvalidConfiguration { message: String },
}

/// Result type for retry operations
pub type RetryResult<T, E> = Result<T, RetryError<E>>;

/// Decision for whether to retry an operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    /// Count the failure against the breaker and retry after backoff
    Retry,
    /// Propagate immediately without tripping the breaker
    Stop,
}

/// Trait for determining whether an error should be retried
pub trait RetryPolicy<E> {
    /// Classify `error`, raised by the given 1-based attempt
    fn should_retry(&self, error: &E, attempt: u32) -> RetryDecision;
}

/// Configuration for [`RetryExecutor`]
#[derive(Debug, Clone, PartialEq)]
pub struct RetryConfig {
    /// Total attempts including the first call
    pub max_attempts: u32,
    /// Sleep after the first failed attempt
    pub initial_backoff: Duration,
    /// Factor applied to the backoff after each further failure
    pub multiplier: f64,
    /// Upper bound for a single backoff sleep
    pub max_backoff: Duration,
    /// Deadline for each individual attempt
    pub attempt_timeout: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_backoff: Duration::from_millis(500),
            multiplier: 2.0,
            max_backoff: Duration::from_secs(10),
            attempt_timeout: Duration::from_secs(8),
        }
    }
}

impl RetryConfig {
    /// Create a new builder
    pub fn builder() -> RetryConfigBuilder {
        RetryConfigBuilder::new()
    }

    /// Validate the configuration
    pub fn validate<E>(&self) -> RetryResult<(), E> {
        if self.max_attempts == 0 {
            return Err(RetryError::InvalidConfiguration {
                message: "max_attempts must be greater than 0".to_string(),
            });
        }
        if !self.multiplier.is_finite() || self.multiplier < 1.0 {
            return Err(RetryError::InvalidConfiguration {
                message: format!("multiplier must be at least 1.0, got {}", self.multiplier),
            });
        }
        if self.attempt_timeout.is_zero() {
            return Err(RetryError::InvalidConfiguration {
                message: "attempt_timeout must be greater than 0".to_string(),
            });
        }
        if self.max_backoff < self.initial_backoff {
            return Err(RetryError::InvalidConfiguration {
                message: "max_backoff must not be smaller than initial_backoff".to_string(),
            });
        }
        Ok(())
    }

    /// Backoff slept after the given 1-based failed attempt
    ///
    /// `initial_backoff * multiplier^(attempt - 1)`, capped at `max_backoff`.
    pub fn backoff_after(&self, attempt: u32) -> Duration {
        let exponent = i32::try_from(attempt.saturating_sub(1)).unwrap_or(i32::MAX);
        let secs = self.initial_backoff.as_secs_f64() * self.multiplier.powi(exponent);
        Duration::try_from_secs_f64(secs).map_or(self.max_backoff, |d| d.min(self.max_backoff))
    }
}

/// Builder for [`RetryConfig`]
#[derive(Debug, Default)]
pub struct RetryConfigBuilder {
    config: RetryConfig,
}

impl RetryConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn max_attempts(mut self, attempts: u32) -> Self {
        self.config.max_attempts = attempts;
        self
    }

    pub fn initial_backoff(mut self, backoff: Duration) -> Self {
        self.config.initial_backoff = backoff;
        self
    }

    pub fn multiplier(mut self, multiplier: f64) -> Self {
        self.config.multiplier = multiplier;
        self
    }

    pub fn max_backoff(mut self, backoff: Duration) -> Self {
        self.config.max_backoff = backoff;
        self
    }

    pub fn attempt_timeout(mut self, timeout: Duration) -> Self {
        self.config.attempt_timeout = timeout;
        self
    }

    pub fn build<E>(self) -> RetryResult<RetryConfig, E> {
        self.config.validate()?;
        Ok(self.config)
    }
}

/// The main retry executor
#[derive(Debug, Clone)]
pub struct RetryExecutor<P> {
    config: RetryConfig,
    policy: P,
}

impl<P> RetryExecutor<P> {
    /// Create a new retry executor with the given configuration and policy
    pub fn new(config: RetryConfig, policy: P) -> Self {
        Self { config, policy }
    }

    /// Create with default configuration
    pub fn with_policy(policy: P) -> Self {
        Self::new(RetryConfig::default(), policy)
    }

    /// Active retry configuration
    pub fn config(&self) -> &RetryConfig {
        &self.config
    }

    /// Execute `operation` with retries, timeouts and breaker gating
    ///
    /// `label` names the operation in logs and errors.
    pub async fn execute<C, F, Fut, T, E>(
        &self,
        cancel: &CancellationToken,
        breaker: &CircuitBreaker<C>,
        label: &str,
        mut operation: F,
    ) -> RetryResult<T, E>
    where
        C: Clock,
        P: RetryPolicy<E>,
        E: fmt::Display,
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        self.config.validate()?;

        let max_attempts = self.config.max_attempts;
        let mut last_error = None;

        for attempt in 1..=max_attempts {
            if cancel.is_cancelled() {
                return Err(RetryError::Cancelled {
                    label: label.to_string(),
                    attempts: attempt - 1,
                });
            }

            if !breaker.allow() {
                warn!(operation = label, breaker = breaker.name(), "call rejected by open circuit");
                return Err(RetryError::CircuitOpen { label: label.to_string() });
            }

            debug!(operation = label, attempt, max_attempts, "executing attempt");

            let outcome = tokio::select! {
                biased;
                () = cancel.cancelled() => {
                    breaker.release();
                    return Err(RetryError::Cancelled {
                        label: label.to_string(),
                        attempts: attempt,
                    });
                }
                outcome = tokio::time::timeout(self.config.attempt_timeout, operation()) => outcome,
            };

            match outcome {
                Ok(Ok(value)) => {
                    breaker.record_success();
                    if attempt > 1 {
                        debug!(operation = label, attempt, "succeeded after retry");
                    }
                    return Ok(value);
                }
                Ok(Err(error)) => match self.policy.should_retry(&error, attempt) {
                    RetryDecision::Stop => {
                        breaker.record_success();
                        debug!(operation = label, attempt, %error, "non-retryable failure");
                        return Err(RetryError::NonRetryable { label: label.to_string(), error });
                    }
                    RetryDecision::Retry => {
                        breaker.record_failure();
                        warn!(operation = label, attempt, %error, "attempt failed");
                        last_error = Some(error);
                    }
                },
                Err(_) => {
                    breaker.record_failure();
                    warn!(
                        operation = label,
                        attempt,
                        timeout = ?self.config.attempt_timeout,
                        "attempt timed out"
                    );
                    last_error = None;
                }
            }

            if attempt < max_attempts {
                let delay = self.config.backoff_after(attempt);
                debug!(operation = label, attempt, ?delay, "backing off");
                tokio::select! {
                    biased;
                    () = cancel.cancelled() => {
                        return Err(RetryError::Cancelled {
                            label: label.to_string(),
                            attempts: attempt,
                        });
                    }
                    () = tokio::time::sleep(delay) => {}
                }
            }
        }

        warn!(operation = label, attempts = max_attempts, "retry attempts exhausted");
        Err(RetryError::Exhausted { label: label.to_string(), attempts: max_attempts, last_error })
    }
}

/// Pre-defined retry policies for common scenarios
pub mod policies {
    use super::{RetryDecision, RetryPolicy};

    /// Always retry policy - retries on any error
    #[derive(Debug, Clone, Copy, Default)]
    pub struct AlwaysRetry;

    impl<E> RetryPolicy<E> for AlwaysRetry {
        fn should_retry(&self, _error: &E, _attempt: u32) -> RetryDecision {
            RetryDecision::Retry
        }
    }

    /// Never retry policy - never retries
    #[derive(Debug, Clone, Copy, Default)]
    pub struct NeverRetry;

    impl<E> RetryPolicy<E> for NeverRetry {
        fn should_retry(&self, _error: &E, _attempt: u32) -> RetryDecision {
            RetryDecision::Stop
        }
    }

    /// Predicate-based retry policy; `true` means retry
    #[derive(Debug, Clone)]
    pub struct PredicateRetry<F> {
        predicate: F,
    }

    impl<F> PredicateRetry<F> {
        pub fn new(predicate: F) -> Self {
            Self { predicate }
        }
    }

    impl<F, E> RetryPolicy<E> for PredicateRetry<F>
    where
        F: Fn(&E) -> bool,
    {
        fn should_retry(&self, error: &E, _attempt: u32) -> RetryDecision {
            if (self.predicate)(error) {
                RetryDecision::Retry
            } else {
                RetryDecision::Stop
            }
        }
    }
}
