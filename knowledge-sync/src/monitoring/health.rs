//! Stats and health reporting.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use serde::Serialize;

use crate::admission::{CircuitBreaker, CircuitState, RateLimiter};
use crate::monitoring::statistics::{CounterSnapshot, RunStatistics};

/// Default error count above which the pipeline reports unhealthy.
pub const DEFAULT_MAX_ERRORS: u64 = 100;

/// Counters plus live admission state.
#[derive(Debug, Clone, Serialize)]
pub struct StatsSnapshot {
    #[serde(flatten)]
    pub counters: CounterSnapshot,
    pub circuit_breaker_state: CircuitState,
    pub consecutive_failures: u32,
    pub current_rate: usize,
    pub max_rate: usize,
    pub is_running: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Unhealthy,
}

/// Health verdict with every reason that made it unhealthy.
#[derive(Debug, Clone, Serialize)]
pub struct HealthReport {
    pub status: HealthStatus,
    pub reasons: Vec<String>,
}

impl HealthReport {
    pub fn is_healthy(&self) -> bool {
        self.status == HealthStatus::Healthy
    }
}

/// Read-only view over the pipeline's shared state.
///
/// Cheap to clone; every read goes to the live breaker, limiter and counters, so reports
/// are never stale.
#[derive(Clone)]
pub struct PipelineMonitor {
    circuit_breaker: Arc<CircuitBreaker>,
    rate_limiter: Arc<RateLimiter>,
    statistics: Arc<RunStatistics>,
    running: Arc<AtomicBool>,
    max_errors: u64,
}

impl PipelineMonitor {
    pub fn new(
        circuit_breaker: Arc<CircuitBreaker>,
        rate_limiter: Arc<RateLimiter>,
        statistics: Arc<RunStatistics>,
        running: Arc<AtomicBool>,
        max_errors: u64,
    ) -> Self {
        Self {
            circuit_breaker,
            rate_limiter,
            statistics,
            running,
            max_errors,
        }
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    pub fn stats(&self) -> StatsSnapshot {
        StatsSnapshot {
            counters: self.statistics.snapshot(),
            circuit_breaker_state: self.circuit_breaker.state(),
            consecutive_failures: self.circuit_breaker.consecutive_failures(),
            current_rate: self.rate_limiter.current_rate(),
            max_rate: self.rate_limiter.max_rate(),
            is_running: self.is_running(),
        }
    }

    /// Unhealthy when the breaker is open, the loop is not running, or errors exceed the
    /// configured ceiling.
    pub fn health_check(&self) -> HealthReport {
        let mut reasons = Vec::new();

        if self.circuit_breaker.state() == CircuitState::Open {
            reasons.push("circuit breaker is open".to_string());
        }
        if !self.is_running() {
            reasons.push("consumer loop is not running".to_string());
        }
        let errors = self.statistics.errors();
        if errors > self.max_errors {
            reasons.push(format!(
                "error count {} exceeds limit {}",
                errors, self.max_errors
            ));
        }

        let status = if reasons.is_empty() {
            HealthStatus::Healthy
        } else {
            HealthStatus::Unhealthy
        };
        HealthReport { status, reasons }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::admission::CircuitBreakerConfig;
    use std::time::Duration;

    fn monitor(
        threshold: u32,
        max_errors: u64,
    ) -> (PipelineMonitor, Arc<CircuitBreaker>, Arc<RunStatistics>) {
        let breaker = Arc::new(CircuitBreaker::new(CircuitBreakerConfig {
            failure_threshold: threshold,
            cool_down: Duration::from_secs(60),
        }));
        let statistics = Arc::new(RunStatistics::new());
        let monitor = PipelineMonitor::new(
            breaker.clone(),
            Arc::new(RateLimiter::default()),
            statistics.clone(),
            Arc::new(AtomicBool::new(true)),
            max_errors,
        );
        (monitor, breaker, statistics)
    }

    #[test]
    fn test_healthy_when_running_and_closed() {
        let (monitor, _, _) = monitor(3, 10);
        let report = monitor.health_check();
        assert!(report.is_healthy());
        assert!(report.reasons.is_empty());
    }

    #[test]
    fn test_open_breaker_is_unhealthy() {
        let (monitor, breaker, _) = monitor(1, 10);
        breaker.record_failure();

        let report = monitor.health_check();
        assert_eq!(report.status, HealthStatus::Unhealthy);
        assert_eq!(report.reasons, vec!["circuit breaker is open".to_string()]);
    }

    #[test]
    fn test_error_ceiling_is_exclusive() {
        let (monitor, _, statistics) = monitor(3, 2);
        statistics.record_error();
        statistics.record_error();
        assert!(monitor.health_check().is_healthy());

        statistics.record_error();
        assert!(!monitor.health_check().is_healthy());
    }

    #[test]
    fn test_stopped_loop_is_unhealthy() {
        let breaker = Arc::new(CircuitBreaker::default());
        let monitor = PipelineMonitor::new(
            breaker,
            Arc::new(RateLimiter::default()),
            Arc::new(RunStatistics::new()),
            Arc::new(AtomicBool::new(false)),
            DEFAULT_MAX_ERRORS,
        );
        let report = monitor.health_check();
        assert!(!report.is_healthy());
        assert!(!monitor.stats().is_running);
    }

    #[test]
    fn test_stats_serialize_flat() {
        let (monitor, breaker, statistics) = monitor(5, 10);
        statistics.record_processed(knowledge_sync_shared::EventKind::Created);
        breaker.record_failure();

        let json = serde_json::to_value(monitor.stats()).unwrap();
        assert_eq!(json["processed"], 1);
        assert_eq!(json["created"], 1);
        assert_eq!(json["circuit_breaker_state"], "closed");
        assert_eq!(json["consecutive_failures"], 1);
        assert_eq!(json["max_rate"], 30);
        assert_eq!(json["is_running"], true);
    }
}
