//! Admission control for side-effecting work.
//!
//! - [`CircuitBreaker`]: stops calling the index after repeated downstream failures
//! - [`RateLimiter`]: bounds how many index operations may start per trailing window
//!
//! Both are process-local, mutex-guarded and shared between workers through `Arc`.

mod circuit_breaker;
mod rate_limiter;

pub use circuit_breaker::{CircuitBreaker, CircuitBreakerConfig, CircuitState};
pub use rate_limiter::{RateLimiter, RateLimiterConfig};
