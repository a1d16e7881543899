//! Resilience patterns for calls to external dependencies
//!
//! - **Circuit Breaker**: stops calling a dependency after repeated failures
//!   and probes it again once a cool-down has elapsed
//! - **Retry Executor**: bounded retries with per-attempt timeout,
//!   exponential backoff, cancellation and breaker gating
//!
//! Both are generic over the caller's error type. Domain crates map
//! [`RetryError`] onto their own taxonomy.

pub mod circuit_breaker;
pub mod retry;

// Re-export circuit breaker types
pub use circuit_breaker::{
    CircuitBreaker, CircuitBreakerConfig, CircuitBreakerConfigBuilder, CircuitBreakerMetrics,
    CircuitState, ConfigError, ConfigResult,
};
// Re-export retry types
pub use retry::{
    policies, RetryConfig, RetryConfigBuilder, RetryDecision, RetryError, RetryExecutor,
    RetryPolicy, RetryResult,
};
