//! Processed-event ledger trait definition.

use async_trait::async_trait;
use knowledge_sync_shared::ProcessedRecord;

use crate::errors::LedgerError;
use crate::types::InsertOutcome;

/// Durable record of event fingerprints that have already been acted upon.
///
/// Implementations must enforce uniqueness of the fingerprint so that two workers racing
/// on the same duplicate produce exactly one stored record. The losing insert reports
/// `InsertOutcome::AlreadyPresent` rather than an error.
#[async_trait]
pub trait ProcessedLedger: Send + Sync {
    /// Returns whether a record with this fingerprint exists.
    async fn exists(&self, fingerprint: &str) -> Result<bool, LedgerError>;

    /// Store a record, unless one with the same fingerprint already exists.
    async fn insert(&self, record: &ProcessedRecord) -> Result<InsertOutcome, LedgerError>;
}
