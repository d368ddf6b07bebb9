//! In-memory processed-event ledger.
//!
//! Not durable across restarts. Intended for local runs and tests.

use std::collections::HashMap;

use async_trait::async_trait;
use knowledge_sync_shared::ProcessedRecord;
use tokio::sync::RwLock;

use crate::errors::LedgerError;
use crate::interfaces::ProcessedLedger;
use crate::types::InsertOutcome;

/// Ledger backed by a map guarded by a read-write lock.
#[derive(Default)]
pub struct InMemoryProcessedLedger {
    records: RwLock<HashMap<String, ProcessedRecord>>,
}

impl InMemoryProcessedLedger {
    /// Create an empty ledger.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored records.
    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    /// Whether the ledger is empty.
    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }

    /// Look up a stored record.
    pub async fn get(&self, fingerprint: &str) -> Option<ProcessedRecord> {
        self.records.read().await.get(fingerprint).cloned()
    }
}

#[async_trait]
impl ProcessedLedger for InMemoryProcessedLedger {
    async fn exists(&self, fingerprint: &str) -> Result<bool, LedgerError> {
        Ok(self.records.read().await.contains_key(fingerprint))
    }

    async fn insert(&self, record: &ProcessedRecord) -> Result<InsertOutcome, LedgerError> {
        let mut records = self.records.write().await;
        if records.contains_key(&record.fingerprint) {
            return Ok(InsertOutcome::AlreadyPresent);
        }
        records.insert(record.fingerprint.clone(), record.clone());
        Ok(InsertOutcome::Inserted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use knowledge_sync_shared::EventKind;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_insert_then_exists() {
        let ledger = InMemoryProcessedLedger::new();
        assert!(!ledger.exists("abc").await.unwrap());

        let record = ProcessedRecord::new("abc", "doc-1", EventKind::Created, 12);
        assert_eq!(ledger.insert(&record).await.unwrap(), InsertOutcome::Inserted);

        assert!(ledger.exists("abc").await.unwrap());
        assert_eq!(ledger.get("abc").await.unwrap().document_id, "doc-1");
    }

    #[tokio::test]
    async fn test_duplicate_insert_keeps_first_record() {
        let ledger = InMemoryProcessedLedger::new();
        let first = ProcessedRecord::new("abc", "doc-1", EventKind::Created, 12);
        let second = ProcessedRecord::new("abc", "doc-1", EventKind::Created, 99);

        ledger.insert(&first).await.unwrap();
        assert_eq!(
            ledger.insert(&second).await.unwrap(),
            InsertOutcome::AlreadyPresent
        );
        assert_eq!(ledger.get("abc").await.unwrap().processing_time_ms, 12);
        assert_eq!(ledger.len().await, 1);
    }

    #[tokio::test]
    async fn test_concurrent_inserts_record_once() {
        let ledger = Arc::new(InMemoryProcessedLedger::new());
        let mut handles = Vec::new();
        for _ in 0..8 {
            let ledger = Arc::clone(&ledger);
            handles.push(tokio::spawn(async move {
                let record = ProcessedRecord::new("race", "doc-1", EventKind::Updated, 1);
                ledger.insert(&record).await.unwrap()
            }));
        }

        let mut inserted = 0;
        for handle in handles {
            if handle.await.unwrap() == InsertOutcome::Inserted {
                inserted += 1;
            }
        }
        assert_eq!(inserted, 1);
    }
}
