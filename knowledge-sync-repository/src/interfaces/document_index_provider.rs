//! Document index provider trait definition.
//!
//! This module defines the abstract interface for the downstream index, allowing for
//! different backend implementations (OpenSearch, Elasticsearch, etc.).

use async_trait::async_trait;

use crate::errors::IndexProviderError;
use crate::types::{RemoveDocumentRequest, UpsertDocumentRequest};

/// Abstracts the index that knowledge documents are synced into.
///
/// Both document operations must be idempotent at the backend level: upserting the same
/// document twice leaves one copy, and removing an absent document succeeds. The pipeline
/// relies on this to tolerate re-delivery and out-of-order events.
///
/// # Index Initialization
///
/// Implementations should call `ensure_index_exists` during application startup to ensure
/// the index and any aliases are properly configured before performing document operations.
#[async_trait]
pub trait DocumentIndexProvider: Send + Sync {
    /// Ensure the index and any required aliases exist, creating them if necessary.
    ///
    /// # Returns
    ///
    /// * `Ok(())` - If the index is ready for use
    /// * `Err(IndexProviderError)` - If initialization fails
    async fn ensure_index_exists(&self) -> Result<(), IndexProviderError>;

    /// Index a document, replacing any previously indexed version.
    ///
    /// # Arguments
    ///
    /// * `request` - The document id, title, url and passthrough metadata
    ///
    /// # Returns
    ///
    /// * `Ok(())` - If the document was written
    /// * `Err(IndexProviderError)` - If the operation fails
    async fn upsert_document(&self, request: &UpsertDocumentRequest)
        -> Result<(), IndexProviderError>;

    /// Remove a document from the index.
    ///
    /// If the document doesn't exist, the operation is considered successful.
    ///
    /// # Arguments
    ///
    /// * `request` - The remove request containing the document id
    ///
    /// # Returns
    ///
    /// * `Ok(())` - If the document was removed (or didn't exist)
    /// * `Err(IndexProviderError)` - If the removal fails
    async fn remove_document(&self, request: &RemoveDocumentRequest)
        -> Result<(), IndexProviderError>;
}
