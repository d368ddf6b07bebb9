//! Error types for the knowledge sync pipeline.

use knowledge_sync_repository::{IndexProviderError, LedgerError};
use thiserror::Error;

/// Errors that can occur in the sync pipeline.
///
/// Every variant reaching the per-message handler is a downstream problem (index, ledger,
/// timeout) or a Kafka problem. Producer data problems are
/// represented by [`ValidationError`](crate::processor::ValidationError) instead and never
/// become an `IngestError`.
#[derive(Error, Debug)]
pub enum IngestError {
    /// Error from the document index.
    #[error("Loader error: {0}")]
    LoaderError(#[from] IndexProviderError),

    /// Error from the processed-event ledger.
    #[error("Ledger error: {0}")]
    LedgerError(#[from] LedgerError),

    /// A capability call did not finish in time.
    #[error("Timeout: {0}")]
    Timeout(String),

    /// Kafka-related error.
    #[error("Kafka error: {0}")]
    KafkaError(String),
}

impl IngestError {
    /// Create a timeout error.
    pub fn timeout(msg: impl Into<String>) -> Self {
        Self::Timeout(msg.into())
    }

    /// Whether the index refused the request itself, as opposed to failing to apply it.
    ///
    /// Retrying such a request can never succeed.
    pub fn is_rejected_request(&self) -> bool {
        matches!(
            self,
            Self::LoaderError(IndexProviderError::ValidationError(_))
        )
    }
}

impl From<rdkafka::error::KafkaError> for IngestError {
    fn from(err: rdkafka::error::KafkaError) -> Self {
        Self::KafkaError(err.to_string())
    }
}
