//! Utility functions for the knowledge sync repository.

use crate::errors::IndexProviderError;

/// Maximum document id length accepted by the index backend, in bytes.
pub const MAX_DOCUMENT_ID_BYTES: usize = 512;

/// Validate a document id before using it as an index document id.
///
/// The id is used verbatim; it is never trimmed, so the indexed document always carries
/// the same id as the event that produced it.
///
/// # Arguments
///
/// * `document_id` - The document id from the event
///
/// # Returns
///
/// * `Ok(&str)` - The id, unchanged
/// * `Err(IndexProviderError)` - If the id is blank, padded with whitespace or too long
///
/// # Example
///
/// ```
/// use knowledge_sync_repository::validate_document_id;
///
/// assert_eq!(validate_document_id("doc-1").unwrap(), "doc-1");
/// assert!(validate_document_id(" doc-1 ").is_err());
/// assert!(validate_document_id("   ").is_err());
/// ```
pub fn validate_document_id(document_id: &str) -> Result<&str, IndexProviderError> {
    if document_id.trim().is_empty() {
        return Err(IndexProviderError::validation("document_id is required"));
    }
    if document_id.trim() != document_id {
        return Err(IndexProviderError::validation(
            "document_id has surrounding whitespace",
        ));
    }
    if document_id.len() > MAX_DOCUMENT_ID_BYTES {
        return Err(IndexProviderError::validation(format!(
            "document_id is {} bytes, maximum is {}",
            document_id.len(),
            MAX_DOCUMENT_ID_BYTES
        )));
    }
    Ok(document_id)
}
