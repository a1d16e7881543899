//! Guarded access to external dependencies
//!
//! Every calendar and mail call runs through the retry executor with the
//! breaker of its own dependency, so a mail outage never trips the calendar
//! breaker. Generic retry outcomes are mapped onto the domain taxonomy here.

use std::future::Future;
use std::sync::Arc;

use rendezvous_common::resilience::{
    CircuitBreaker, CircuitBreakerConfig, RetryConfig, RetryDecision, RetryError, RetryExecutor,
    RetryPolicy,
};
use rendezvous_common::time::Clock;
use rendezvous_domain::{RendezvousError, ResilienceConfig, Result};
use tokio_util::sync::CancellationToken;

/// Shared clock handle used by services and breakers
pub type SharedClock = Arc<dyn Clock>;

/// Missing authorization stops immediately; everything else is retried
#[derive(Debug, Clone, Copy, Default)]
pub struct AuthorizationAwarePolicy;

impl RetryPolicy<RendezvousError> for AuthorizationAwarePolicy {
    fn should_retry(&self, error: &RendezvousError, _attempt: u32) -> RetryDecision {
        match error {
            RendezvousError::Unauthorized(_) => RetryDecision::Stop,
            _ => RetryDecision::Retry,
        }
    }
}

/// Retry executor plus one circuit breaker per external dependency
///
/// Cloning shares the breakers.
#[derive(Debug, Clone)]
pub struct ExternalCallGuard {
    executor: RetryExecutor<AuthorizationAwarePolicy>,
    calendar: CircuitBreaker<SharedClock>,
    mail: CircuitBreaker<SharedClock>,
}

impl ExternalCallGuard {
    /// Build the guard from configuration
    pub fn new(config: &ResilienceConfig, clock: SharedClock) -> Result<Self> {
        config.validate()?;

        let retry = RetryConfig {
            max_attempts: config.max_retries,
            initial_backoff: config.initial_backoff(),
            multiplier: config.backoff_multiplier,
            max_backoff: config.max_backoff(),
            attempt_timeout: config.attempt_timeout(),
        };
        retry
            .validate::<RendezvousError>()
            .map_err(|e| RendezvousError::Config(e.to_string()))?;

        let breaker_config = CircuitBreakerConfig::builder()
            .failure_threshold(config.circuit_failure_threshold)
            .open_duration(config.circuit_open_duration())
            .build()
            .map_err(|e| RendezvousError::Config(e.to_string()))?;

        let calendar =
            CircuitBreaker::with_clock("calendar", breaker_config.clone(), Arc::clone(&clock))
                .map_err(|e| RendezvousError::Config(e.to_string()))?;
        let mail = CircuitBreaker::with_clock("mail", breaker_config, clock)
            .map_err(|e| RendezvousError::Config(e.to_string()))?;

        Ok(Self { executor: RetryExecutor::new(retry, AuthorizationAwarePolicy), calendar, mail })
    }

    /// Breaker guarding calendar calls
    pub fn calendar_breaker(&self) -> &CircuitBreaker<SharedClock> {
        &self.calendar
    }

    /// Breaker guarding mail calls
    pub fn mail_breaker(&self) -> &CircuitBreaker<SharedClock> {
        &self.mail
    }

    /// Run a calendar call through the calendar breaker
    pub async fn calendar<F, Fut, T>(
        &self,
        cancel: &CancellationToken,
        label: &str,
        operation: F,
    ) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        self.executor
            .execute(cancel, &self.calendar, label, operation)
            .await
            .map_err(into_domain_error)
    }

    /// Run a mail call through the mail breaker
    pub async fn mail<F, Fut, T>(
        &self,
        cancel: &CancellationToken,
        label: &str,
        operation: F,
    ) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        self.executor.execute(cancel, &self.mail, label, operation).await.map_err(into_domain_error)
    }
}

/// Map a retry outcome onto the domain taxonomy
pub fn into_domain_error(error: RetryError<RendezvousError>) -> RendezvousError {
    match error {
        RetryError::CircuitOpen { label } => {
            RendezvousError::ServiceUnavailable(format!("{label} is temporarily unavailable"))
        }
        RetryError::NonRetryable { label, error: RendezvousError::Unauthorized(detail) } => {
            RendezvousError::ServiceUnavailable(format!(
                "integration requires administrator authorization ({label}): {detail}"
            ))
        }
        RetryError::NonRetryable { error, .. } => error,
        RetryError::Exhausted { label, attempts, last_error } => {
            let cause =
                last_error.map_or_else(|| "attempt timed out".to_string(), |e| e.to_string());
            RendezvousError::BadGateway(format!(
                "failed to execute {label} after {attempts} attempts: {cause}"
            ))
        }
        RetryError::Cancelled { label, attempts } => RendezvousError::GatewayTimeout(format!(
            "{label} cancelled by caller after {attempts} attempts"
        )),
        RetryError::InvalidConfiguration { message } => RendezvousError::Config(message),
    }
}
