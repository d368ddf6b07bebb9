//! Document index error types.

use thiserror::Error;

/// Errors from document index operations.
///
/// Every variant counts as a downstream failure for the sync pipeline's circuit breaker.
#[derive(Debug, Clone, Error)]
pub enum IndexProviderError {
    /// The request was rejected before reaching the backend (e.g. blank document id).
    #[error("Invalid document request: {0}")]
    ValidationError(String),

    /// The backend could not be reached or reported itself unhealthy.
    #[error("Index backend unreachable: {0}")]
    ConnectionError(String),

    #[error("Failed to upsert document: {0}")]
    UpsertError(String),

    #[error("Failed to remove document: {0}")]
    RemoveError(String),

    /// The versioned index or its alias could not be created.
    #[error("Failed to prepare index: {0}")]
    IndexCreationError(String),
}

impl IndexProviderError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::ValidationError(msg.into())
    }

    pub fn connection(msg: impl Into<String>) -> Self {
        Self::ConnectionError(msg.into())
    }

    pub fn upsert(msg: impl Into<String>) -> Self {
        Self::UpsertError(msg.into())
    }

    pub fn remove(msg: impl Into<String>) -> Self {
        Self::RemoveError(msg.into())
    }

    pub fn index_creation(msg: impl Into<String>) -> Self {
        Self::IndexCreationError(msg.into())
    }
}
