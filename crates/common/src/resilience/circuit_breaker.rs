//! Circuit breaker for guarding calls to external dependencies
//!
//! A breaker starts closed and lets every call through. Once
//! `failure_threshold` failures accumulate it opens and rejects calls until
//! `open_duration` has elapsed. The first call after that becomes a half-open
//! probe: success closes the circuit, failure reopens it immediately.
//!
//! Time only advances through the injected [`Clock`], so no timer task is
//! needed and tests can drive transitions with [`MockClock`].
//!
//! [`MockClock`]: crate::time::MockClock

use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::time::{Clock, SystemClock};

/// Simple configuration error for validation
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid configuration: {message}")]
    Invalid { message: String },
}

/// Configuration result type using simple config errors
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Circuit breaker states
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CircuitState {
    /// Circuit is closed, allowing requests
    Closed,
    /// Circuit is open, rejecting requests
    Open,
    /// Circuit is half-open, allowing a probe to test recovery
    HalfOpen,
}

impl fmt::Display for CircuitState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CircuitState::Closed => write!(f, "CLOSED"),
            CircuitState::Open => write!(f, "OPEN"),
            CircuitState::HalfOpen => write!(f, "HALF_OPEN"),
        }
    }
}

/// Configuration for circuit breaker behavior
#[derive(Debug, Clone)]
pub struct CircuitBreakerConfig {
    /// Number of failures before opening the circuit
    pub failure_threshold: u32,
    /// Time to wait before transitioning from open to half-open
    pub open_duration: Duration,
    /// Maximum number of probe calls admitted while half-open
    pub half_open_max_calls: u32,
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: 5,
            open_duration: Duration::from_secs(30),
            half_open_max_calls: 1,
        }
    }
}

impl CircuitBreakerConfig {
    /// Create a configuration builder
    pub fn builder() -> CircuitBreakerConfigBuilder {
        CircuitBreakerConfigBuilder::new()
    }

    /// Validate the configuration
    pub fn validate(&self) -> ConfigResult<()> {
        if self.failure_threshold == 0 {
            return Err(ConfigError::Invalid {
                message: "failure_threshold must be greater than 0".to_string(),
            });
        }

        if self.half_open_max_calls == 0 {
            return Err(ConfigError::Invalid {
                message: "half_open_max_calls must be greater than 0".to_string(),
            });
        }

        Ok(())
    }
}

/// Builder for CircuitBreakerConfig
#[derive(Debug, Default)]
pub struct CircuitBreakerConfigBuilder {
    config: CircuitBreakerConfig,
}

impl CircuitBreakerConfigBuilder {
    pub fn new() -> Self {
        Self { config: CircuitBreakerConfig::default() }
    }

    pub fn failure_threshold(mut self, threshold: u32) -> Self {
        self.config.failure_threshold = threshold;
        self
    }

    pub fn open_duration(mut self, duration: Duration) -> Self {
        self.config.open_duration = duration;
        self
    }

    pub fn half_open_max_calls(mut self, max_calls: u32) -> Self {
        self.config.half_open_max_calls = max_calls;
        self
    }

    pub fn build(self) -> ConfigResult<CircuitBreakerConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}

/// Circuit breaker metrics for monitoring
#[derive(Debug, Clone)]
pub struct CircuitBreakerMetrics {
    pub state: CircuitState,
    pub failure_count: u32,
    pub rejected_calls: u64,
    pub opened_at: Option<Instant>,
}

#[derive(Debug)]
struct BreakerState {
    state: CircuitState,
    failure_count: u32,
    half_open_calls: u32,
    rejected_calls: u64,
    opened_at: Option<Instant>,
}

impl BreakerState {
    fn closed() -> Self {
        Self {
            state: CircuitState::Closed,
            failure_count: 0,
            half_open_calls: 0,
            rejected_calls: 0,
            opened_at: None,
        }
    }
}

/// Per-dependency circuit breaker
///
/// Cloning yields a handle to the same breaker. All transitions are
/// read-modify-write under one mutex, so concurrent callers never observe a
/// torn state.
pub struct CircuitBreaker<C: Clock = SystemClock> {
    name: Arc<str>,
    config: CircuitBreakerConfig,
    inner: Arc<Mutex<BreakerState>>,
    clock: Arc<C>,
}

impl<C: Clock> fmt::Debug for CircuitBreaker<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CircuitBreaker")
            .field("name", &self.name)
            .field("config", &self.config)
            .field("state", &self.state())
            .finish()
    }
}

impl<C: Clock> Clone for CircuitBreaker<C> {
    fn clone(&self) -> Self {
        Self {
            name: Arc::clone(&self.name),
            config: self.config.clone(),
            inner: Arc::clone(&self.inner),
            clock: Arc::clone(&self.clock),
        }
    }
}

impl CircuitBreaker<SystemClock> {
    /// Create a new circuit breaker using the system clock
    pub fn new(name: impl Into<String>, config: CircuitBreakerConfig) -> ConfigResult<Self> {
        Self::with_clock(name, config, SystemClock)
    }
}

impl<C: Clock> CircuitBreaker<C> {
    /// Create a new circuit breaker with a custom clock
    pub fn with_clock(
        name: impl Into<String>,
        config: CircuitBreakerConfig,
        clock: C,
    ) -> ConfigResult<Self> {
        Self::with_shared_clock(name, config, Arc::new(clock))
    }

    /// Create a circuit breaker sharing an existing clock handle
    pub fn with_shared_clock(
        name: impl Into<String>,
        config: CircuitBreakerConfig,
        clock: Arc<C>,
    ) -> ConfigResult<Self> {
        config.validate()?;

        Ok(Self {
            name: Arc::from(name.into()),
            config,
            inner: Arc::new(Mutex::new(BreakerState::closed())),
            clock,
        })
    }

    /// Name of the guarded dependency
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Check whether a call may proceed
    ///
    /// An open circuit whose cool-down has elapsed moves to half-open and the
    /// caller receives the probe slot.
    pub fn allow(&self) -> bool {
        let mut inner = self.inner.lock();

        match inner.state {
            CircuitState::Closed => true,
            CircuitState::Open => {
                let elapsed = inner
                    .opened_at
                    .map_or(self.config.open_duration, |opened| {
                        self.clock.now().saturating_duration_since(opened)
                    });

                if elapsed >= self.config.open_duration {
                    inner.state = CircuitState::HalfOpen;
                    inner.half_open_calls = 1;
                    info!(breaker = %self.name, "circuit half-open, admitting probe");
                    true
                } else {
                    inner.rejected_calls += 1;
                    debug!(breaker = %self.name, ?elapsed, "circuit open, rejecting call");
                    false
                }
            }
            CircuitState::HalfOpen => {
                if inner.half_open_calls < self.config.half_open_max_calls {
                    inner.half_open_calls += 1;
                    true
                } else {
                    inner.rejected_calls += 1;
                    false
                }
            }
        }
    }

    /// Record a successful call, fully closing the circuit
    pub fn record_success(&self) {
        let mut inner = self.inner.lock();
        let previous = inner.state;

        inner.state = CircuitState::Closed;
        inner.failure_count = 0;
        inner.half_open_calls = 0;
        inner.opened_at = None;

        if previous != CircuitState::Closed {
            info!(breaker = %self.name, from = %previous, "circuit closed");
        }
    }

    /// Record a failed call
    pub fn record_failure(&self) {
        let mut inner = self.inner.lock();
        inner.failure_count += 1;

        let reopen = inner.state == CircuitState::HalfOpen
            || inner.failure_count >= self.config.failure_threshold;

        if reopen {
            warn!(
                breaker = %self.name,
                from = %inner.state,
                failures = inner.failure_count,
                "circuit opened"
            );
            inner.state = CircuitState::Open;
            inner.opened_at = Some(self.clock.now());
            inner.failure_count = 0;
            inner.half_open_calls = 0;
        }
    }

    /// Hand back an admitted call that finished without a verdict
    ///
    /// Used when the caller cancels mid-call: a half-open probe slot is freed
    /// so the next caller can probe instead of the circuit stalling.
    pub fn release(&self) {
        let mut inner = self.inner.lock();
        if inner.state == CircuitState::HalfOpen {
            inner.half_open_calls = inner.half_open_calls.saturating_sub(1);
        }
    }

    /// Get the current state of the circuit breaker
    pub fn state(&self) -> CircuitState {
        self.inner.lock().state
    }

    /// Get current metrics snapshot
    pub fn metrics(&self) -> CircuitBreakerMetrics {
        let inner = self.inner.lock();
        CircuitBreakerMetrics {
            state: inner.state,
            failure_count: inner.failure_count,
            rejected_calls: inner.rejected_calls,
            opened_at: inner.opened_at,
        }
    }

    /// Reset the circuit breaker to closed state
    pub fn reset(&self) {
        *self.inner.lock() = BreakerState::closed();
        info!(breaker = %self.name, "circuit manually reset");
    }
}
