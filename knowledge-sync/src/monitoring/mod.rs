//! Read-only observability surface for the pipeline.
//!
//! - [`RunStatistics`]: lock-free counters updated by the consumer loop
//! - [`PipelineMonitor`]: cloneable handle producing stats snapshots and health reports

mod health;
mod statistics;

pub use health::{HealthReport, HealthStatus, PipelineMonitor, StatsSnapshot, DEFAULT_MAX_ERRORS};
pub use statistics::{CounterSnapshot, RunStatistics};
