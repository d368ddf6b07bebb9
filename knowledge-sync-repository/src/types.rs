//! Request and response types for index and ledger operations.

use serde_json::{Map, Value};

/// Request to index (or re-index) a document, overwriting any previous version.
#[derive(Debug, Clone, PartialEq)]
pub struct UpsertDocumentRequest {
    /// The document's stable identifier.
    pub document_id: String,
    /// The document's title.
    pub title: String,
    /// Absolute location of the document.
    pub url: String,
    /// Opaque producer metadata, stored unmodified.
    pub metadata: Map<String, Value>,
}

/// Request to remove a document from the index.
///
/// Removing a document that is not indexed succeeds.
#[derive(Debug, Clone, PartialEq)]
pub struct RemoveDocumentRequest {
    /// The document's stable identifier.
    pub document_id: String,
}

/// Result of writing a record to the processed-event ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    /// The record was written.
    Inserted,
    /// A record with the same fingerprint already existed; nothing was written.
    AlreadyPresent,
}
