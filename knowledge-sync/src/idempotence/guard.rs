//! Idempotence guard over the processed-event ledger.

use std::sync::Arc;
use std::time::Duration;

use knowledge_sync_repository::{InsertOutcome, ProcessedLedger};
use knowledge_sync_shared::{EventKind, ProcessedRecord};
use tokio::time::timeout;
use tracing::{debug, instrument};

use crate::errors::IngestError;

/// Checks and records processed fingerprints.
///
/// This is the only writer of the ledger. Every call is bounded by `call_timeout`; a
/// timeout surfaces as [`IngestError::Timeout`] and is handled like any other
/// downstream failure.
#[derive(Clone)]
pub struct IdempotenceGuard {
    ledger: Arc<dyn ProcessedLedger>,
    call_timeout: Duration,
}

impl IdempotenceGuard {
    pub fn new(ledger: Arc<dyn ProcessedLedger>, call_timeout: Duration) -> Self {
        Self {
            ledger,
            call_timeout,
        }
    }

    /// Whether an event with this fingerprint was already handled.
    pub async fn has_been_processed(&self, fingerprint: &str) -> Result<bool, IngestError> {
        let exists = timeout(self.call_timeout, self.ledger.exists(fingerprint))
            .await
            .map_err(|_| {
                IngestError::timeout(format!(
                    "ledger lookup exceeded {}s",
                    self.call_timeout.as_secs()
                ))
            })??;
        Ok(exists)
    }

    /// Record a handled event.
    ///
    /// Must only be called once the event was applied or intentionally skipped. A
    /// fingerprint recorded concurrently by another worker is not an error.
    #[instrument(skip(self), fields(fingerprint = %fingerprint))]
    pub async fn mark_processed(
        &self,
        fingerprint: &str,
        document_id: &str,
        event_kind: EventKind,
        processing_time_ms: u64,
    ) -> Result<(), IngestError> {
        let record = ProcessedRecord::new(fingerprint, document_id, event_kind, processing_time_ms);

        let outcome = timeout(self.call_timeout, self.ledger.insert(&record))
            .await
            .map_err(|_| {
                IngestError::timeout(format!(
                    "ledger insert exceeded {}s",
                    self.call_timeout.as_secs()
                ))
            })??;

        if outcome == InsertOutcome::AlreadyPresent {
            debug!(document_id = %document_id, "Fingerprint already recorded");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use knowledge_sync_repository::{InMemoryProcessedLedger, LedgerError};

    struct StalledLedger;

    #[async_trait]
    impl ProcessedLedger for StalledLedger {
        async fn exists(&self, _fingerprint: &str) -> Result<bool, LedgerError> {
            std::future::pending().await
        }

        async fn insert(&self, _record: &ProcessedRecord) -> Result<InsertOutcome, LedgerError> {
            std::future::pending().await
        }
    }

    struct BrokenLedger;

    #[async_trait]
    impl ProcessedLedger for BrokenLedger {
        async fn exists(&self, _fingerprint: &str) -> Result<bool, LedgerError> {
            Err(LedgerError::unavailable("connection refused"))
        }

        async fn insert(&self, _record: &ProcessedRecord) -> Result<InsertOutcome, LedgerError> {
            Err(LedgerError::unavailable("connection refused"))
        }
    }

    #[tokio::test]
    async fn test_mark_then_check() {
        let ledger = Arc::new(InMemoryProcessedLedger::new());
        let guard = IdempotenceGuard::new(ledger.clone(), Duration::from_secs(5));

        assert!(!guard.has_been_processed("abc").await.unwrap());
        guard
            .mark_processed("abc", "doc-1", EventKind::Created, 12)
            .await
            .unwrap();
        assert!(guard.has_been_processed("abc").await.unwrap());

        let record = ledger.get("abc").await.unwrap();
        assert_eq!(record.document_id, "doc-1");
        assert_eq!(record.event_kind, EventKind::Created);
        assert_eq!(record.processing_time_ms, 12);
    }

    #[tokio::test]
    async fn test_second_mark_is_not_an_error() {
        let ledger = Arc::new(InMemoryProcessedLedger::new());
        let guard = IdempotenceGuard::new(ledger.clone(), Duration::from_secs(5));

        guard
            .mark_processed("abc", "doc-1", EventKind::Created, 1)
            .await
            .unwrap();
        guard
            .mark_processed("abc", "doc-1", EventKind::Created, 2)
            .await
            .unwrap();
        assert_eq!(ledger.len().await, 1);
        assert_eq!(ledger.get("abc").await.unwrap().processing_time_ms, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stalled_ledger_times_out() {
        let guard = IdempotenceGuard::new(Arc::new(StalledLedger), Duration::from_secs(30));

        let result = guard.has_been_processed("abc").await;
        assert!(matches!(result, Err(IngestError::Timeout(_))));

        let result = guard
            .mark_processed("abc", "doc-1", EventKind::Deleted, 0)
            .await;
        assert!(matches!(result, Err(IngestError::Timeout(_))));
    }

    #[tokio::test]
    async fn test_ledger_errors_propagate() {
        let guard = IdempotenceGuard::new(Arc::new(BrokenLedger), Duration::from_secs(5));
        assert!(matches!(
            guard.has_been_processed("abc").await,
            Err(IngestError::LedgerError(_))
        ));
    }
}
