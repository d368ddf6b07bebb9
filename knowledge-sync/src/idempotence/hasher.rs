//! Content fingerprints for document events.

use knowledge_sync_shared::DocumentEvent;
use sha2::{Digest, Sha256};

/// Derives a stable deduplication key from an event.
///
/// The fingerprint covers exactly the fields that identify one logical change: the
/// document id, the producer timestamp and the version. Re-delivery of the same change
/// yields the same fingerprint; any later change to the document yields a new one.
#[derive(Debug, Clone, Copy, Default)]
pub struct MessageHasher;

impl MessageHasher {
    pub fn new() -> Self {
        Self
    }

    /// Lowercase hex SHA-256 of `"{id}:{timestamp}:{version}"`.
    ///
    /// A missing version hashes as an empty segment.
    pub fn fingerprint(&self, event: &DocumentEvent) -> String {
        let version = event.version.map(|v| v.to_string()).unwrap_or_default();

        let mut hasher = Sha256::new();
        hasher.update(event.id.as_bytes());
        hasher.update(b":");
        hasher.update(event.timestamp.as_bytes());
        hasher.update(b":");
        hasher.update(version.as_bytes());
        hex::encode(hasher.finalize())
    }
}
