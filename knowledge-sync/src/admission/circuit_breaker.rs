//! Circuit breaker guarding the document index.
//!
//! The breaker only gates execution. It never retries; a denied event is left
//! unacknowledged and comes back through broker redelivery.

use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use serde::Serialize;
use tokio::time::Instant;
use tracing::{info, warn};

/// Default number of consecutive failures that opens the breaker.
pub const DEFAULT_FAILURE_THRESHOLD: u32 = 5;

/// Default time the breaker stays open before allowing a probe.
pub const DEFAULT_COOL_DOWN: Duration = Duration::from_secs(60);

/// Circuit breaker state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CircuitState {
    /// Normal operation.
    Closed,
    /// Failure threshold reached, executions are refused.
    Open,
    /// Cool-down elapsed, a probing execution is allowed.
    HalfOpen,
}

impl CircuitState {
    pub fn as_str(&self) -> &'static str {
        match self {
            CircuitState::Closed => "closed",
            CircuitState::Open => "open",
            CircuitState::HalfOpen => "half_open",
        }
    }
}

impl std::fmt::Display for CircuitState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Configuration for the circuit breaker.
#[derive(Debug, Clone)]
pub struct CircuitBreakerConfig {
    /// Consecutive failures that move the breaker to `Open`.
    pub failure_threshold: u32,
    /// How long the breaker stays `Open` after the last failure.
    pub cool_down: Duration,
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: DEFAULT_FAILURE_THRESHOLD,
            cool_down: DEFAULT_COOL_DOWN,
        }
    }
}

#[derive(Debug)]
struct BreakerState {
    state: CircuitState,
    consecutive_failures: u32,
    last_failure_time: Option<Instant>,
}

/// Tracks consecutive downstream failures and gates execution.
///
/// State machine:
/// - `Closed` → `Open` when `consecutive_failures` reaches the threshold
/// - `Open` → `HalfOpen` on the first `can_execute` after the cool-down
/// - `HalfOpen` → `Closed` on success, back to `Open` on failure (cool-down restarts)
///
/// The caller of a permitted execution must report its result through
/// [`record_success`](Self::record_success) or [`record_failure`](Self::record_failure).
#[derive(Debug)]
pub struct CircuitBreaker {
    config: CircuitBreakerConfig,
    inner: Mutex<BreakerState>,
}

impl CircuitBreaker {
    /// Create a closed breaker.
    pub fn new(config: CircuitBreakerConfig) -> Self {
        Self {
            config,
            inner: Mutex::new(BreakerState {
                state: CircuitState::Closed,
                consecutive_failures: 0,
                last_failure_time: None,
            }),
        }
    }

    // A panic while holding the lock cannot leave the state half-written, so a
    // poisoned lock is still usable.
    fn lock(&self) -> MutexGuard<'_, BreakerState> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Whether an execution may start now.
    pub fn can_execute(&self) -> bool {
        let mut inner = self.lock();
        match inner.state {
            CircuitState::Closed | CircuitState::HalfOpen => true,
            CircuitState::Open => {
                let cooled_down = inner
                    .last_failure_time
                    .map(|at| at.elapsed() > self.config.cool_down)
                    .unwrap_or(true);
                if cooled_down {
                    inner.state = CircuitState::HalfOpen;
                    info!("Circuit breaker half-open, allowing probe");
                }
                cooled_down
            }
        }
    }

    /// Report a successful execution. Always closes the breaker.
    pub fn record_success(&self) {
        let mut inner = self.lock();
        if inner.state != CircuitState::Closed {
            info!(previous_state = %inner.state, "Circuit breaker closed");
        }
        inner.consecutive_failures = 0;
        inner.state = CircuitState::Closed;
    }

    /// Report a failed execution.
    pub fn record_failure(&self) {
        let mut inner = self.lock();
        inner.consecutive_failures = inner.consecutive_failures.saturating_add(1);
        inner.last_failure_time = Some(Instant::now());

        if inner.consecutive_failures >= self.config.failure_threshold
            && inner.state != CircuitState::Open
        {
            warn!(
                consecutive_failures = inner.consecutive_failures,
                failure_threshold = self.config.failure_threshold,
                cool_down_secs = self.config.cool_down.as_secs(),
                "Circuit breaker opened"
            );
            inner.state = CircuitState::Open;
        }
    }

    /// Current state.
    pub fn state(&self) -> CircuitState {
        self.lock().state
    }

    /// Current consecutive failure count.
    pub fn consecutive_failures(&self) -> u32 {
        self.lock().consecutive_failures
    }

    pub fn config(&self) -> &CircuitBreakerConfig {
        &self.config
    }
}

impl Default for CircuitBreaker {
    fn default() -> Self {
        Self::new(CircuitBreakerConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn breaker(threshold: u32, cool_down_secs: u64) -> CircuitBreaker {
        CircuitBreaker::new(CircuitBreakerConfig {
            failure_threshold: threshold,
            cool_down: Duration::from_secs(cool_down_secs),
        })
    }

    #[test]
    fn test_starts_closed() {
        let breaker = CircuitBreaker::default();
        assert_eq!(breaker.state(), CircuitState::Closed);
        assert_eq!(breaker.consecutive_failures(), 0);
        assert!(breaker.can_execute());
    }

    #[tokio::test(start_paused = true)]
    async fn test_opens_at_threshold() {
        let breaker = breaker(3, 60);

        breaker.record_failure();
        breaker.record_failure();
        assert_eq!(breaker.state(), CircuitState::Closed);
        assert!(breaker.can_execute());

        breaker.record_failure();
        assert_eq!(breaker.state(), CircuitState::Open);
        assert!(!breaker.can_execute());
    }

    #[tokio::test(start_paused = true)]
    async fn test_half_open_after_cool_down_then_closes() {
        let breaker = breaker(3, 60);
        for _ in 0..3 {
            breaker.record_failure();
        }

        tokio::time::advance(Duration::from_secs(30)).await;
        assert!(!breaker.can_execute());
        assert_eq!(breaker.state(), CircuitState::Open);

        tokio::time::advance(Duration::from_secs(31)).await;
        assert!(breaker.can_execute());
        assert_eq!(breaker.state(), CircuitState::HalfOpen);

        breaker.record_success();
        assert_eq!(breaker.state(), CircuitState::Closed);
        assert_eq!(breaker.consecutive_failures(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_half_open_failure_reopens_and_restarts_cool_down() {
        let breaker = breaker(2, 10);
        breaker.record_failure();
        breaker.record_failure();

        tokio::time::advance(Duration::from_secs(11)).await;
        assert!(breaker.can_execute());
        assert_eq!(breaker.state(), CircuitState::HalfOpen);

        breaker.record_failure();
        assert_eq!(breaker.state(), CircuitState::Open);
        assert!(!breaker.can_execute());

        tokio::time::advance(Duration::from_secs(5)).await;
        assert!(!breaker.can_execute());

        tokio::time::advance(Duration::from_secs(6)).await;
        assert!(breaker.can_execute());
    }

    #[tokio::test(start_paused = true)]
    async fn test_exact_cool_down_is_not_enough() {
        let breaker = breaker(1, 10);
        breaker.record_failure();

        tokio::time::advance(Duration::from_secs(10)).await;
        assert!(!breaker.can_execute());

        tokio::time::advance(Duration::from_millis(1)).await;
        assert!(breaker.can_execute());
    }

    #[test]
    fn test_success_resets_failure_count() {
        let breaker = breaker(3, 60);
        breaker.record_failure();
        breaker.record_failure();
        breaker.record_success();
        breaker.record_failure();
        breaker.record_failure();
        assert_eq!(breaker.state(), CircuitState::Closed);
        assert_eq!(breaker.consecutive_failures(), 2);
    }

    #[test]
    fn test_concurrent_failures_are_all_counted() {
        let breaker = Arc::new(breaker(1000, 60));
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let breaker = Arc::clone(&breaker);
                std::thread::spawn(move || {
                    for _ in 0..50 {
                        breaker.record_failure();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(breaker.consecutive_failures(), 400);
        assert_eq!(breaker.state(), CircuitState::Closed);
    }
}
