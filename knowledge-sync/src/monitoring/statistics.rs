//! Process-local run counters.

use std::sync::atomic::{AtomicU64, Ordering};

use knowledge_sync_shared::EventKind;
use serde::Serialize;

/// Counters describing what happened to every message since start-up.
///
/// Counters only grow and reset on process restart.
#[derive(Debug, Default)]
pub struct RunStatistics {
    processed: AtomicU64,
    created: AtomicU64,
    updated: AtomicU64,
    deleted: AtomicU64,
    toggled: AtomicU64,
    expired: AtomicU64,
    skipped_duplicate: AtomicU64,
    skipped_invalid: AtomicU64,
    skipped_rate_limited: AtomicU64,
    errors: AtomicU64,
    circuit_breaker_trips: AtomicU64,
}

/// Point-in-time copy of [`RunStatistics`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CounterSnapshot {
    pub processed: u64,
    pub created: u64,
    pub updated: u64,
    pub deleted: u64,
    pub toggled: u64,
    pub expired: u64,
    pub skipped_duplicate: u64,
    pub skipped_invalid: u64,
    pub skipped_rate_limited: u64,
    pub errors: u64,
    pub circuit_breaker_trips: u64,
}

impl RunStatistics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count a successfully handled event under its kind and in `processed`.
    pub fn record_processed(&self, kind: EventKind) {
        let per_kind = match kind {
            EventKind::Created => &self.created,
            EventKind::Updated => &self.updated,
            EventKind::Deleted => &self.deleted,
            EventKind::Toggled => &self.toggled,
            EventKind::Expired => &self.expired,
        };
        per_kind.fetch_add(1, Ordering::Relaxed);
        self.processed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_duplicate(&self) {
        self.skipped_duplicate.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_invalid(&self) {
        self.skipped_invalid.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_rate_limited(&self) {
        self.skipped_rate_limited.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_error(&self) {
        self.errors.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_circuit_breaker_trip(&self) {
        self.circuit_breaker_trips.fetch_add(1, Ordering::Relaxed);
    }

    pub fn processed(&self) -> u64 {
        self.processed.load(Ordering::Relaxed)
    }

    pub fn errors(&self) -> u64 {
        self.errors.load(Ordering::Relaxed)
    }

    pub fn snapshot(&self) -> CounterSnapshot {
        CounterSnapshot {
            processed: self.processed.load(Ordering::Relaxed),
            created: self.created.load(Ordering::Relaxed),
            updated: self.updated.load(Ordering::Relaxed),
            deleted: self.deleted.load(Ordering::Relaxed),
            toggled: self.toggled.load(Ordering::Relaxed),
            expired: self.expired.load(Ordering::Relaxed),
            skipped_duplicate: self.skipped_duplicate.load(Ordering::Relaxed),
            skipped_invalid: self.skipped_invalid.load(Ordering::Relaxed),
            skipped_rate_limited: self.skipped_rate_limited.load(Ordering::Relaxed),
            errors: self.errors.load(Ordering::Relaxed),
            circuit_breaker_trips: self.circuit_breaker_trips.load(Ordering::Relaxed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_processed_counts_kind_and_total() {
        let stats = RunStatistics::new();
        stats.record_processed(EventKind::Created);
        stats.record_processed(EventKind::Created);
        stats.record_processed(EventKind::Expired);

        let snapshot = stats.snapshot();
        assert_eq!(snapshot.processed, 3);
        assert_eq!(snapshot.created, 2);
        assert_eq!(snapshot.expired, 1);
        assert_eq!(snapshot.updated, 0);
    }

    #[test]
    fn test_skip_counters_do_not_touch_processed() {
        let stats = RunStatistics::new();
        stats.record_duplicate();
        stats.record_invalid();
        stats.record_rate_limited();
        stats.record_error();
        stats.record_circuit_breaker_trip();

        assert_eq!(
            stats.snapshot(),
            CounterSnapshot {
                skipped_duplicate: 1,
                skipped_invalid: 1,
                skipped_rate_limited: 1,
                errors: 1,
                circuit_breaker_trips: 1,
                ..CounterSnapshot::default()
            }
        );
    }

    #[test]
    fn test_snapshot_serializes_snake_case() {
        let stats = RunStatistics::new();
        stats.record_duplicate();
        let json = serde_json::to_value(stats.snapshot()).unwrap();
        assert_eq!(json["skipped_duplicate"], 1);
        assert_eq!(json["circuit_breaker_trips"], 0);
    }
}
