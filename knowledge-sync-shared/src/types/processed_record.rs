//! Ledger record types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::document_event::EventKind;

/// Proof that an event was handled.
///
/// Written exactly once per distinct fingerprint, after the event was either applied to
/// the index or intentionally skipped. Records are never mutated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessedRecord {
    /// Content fingerprint of the event (primary key).
    pub fingerprint: String,
    /// The document the event referred to.
    pub document_id: String,
    /// The kind of the handled event.
    pub event_kind: EventKind,
    /// Time spent handling the event, in milliseconds.
    pub processing_time_ms: u64,
    /// When the record was created.
    pub processed_at: DateTime<Utc>,
}

impl ProcessedRecord {
    /// Create a record stamped with the current time.
    pub fn new(
        fingerprint: impl Into<String>,
        document_id: impl Into<String>,
        event_kind: EventKind,
        processing_time_ms: u64,
    ) -> Self {
        Self {
            fingerprint: fingerprint.into(),
            document_id: document_id.into(),
            event_kind,
            processing_time_ms,
            processed_at: Utc::now(),
        }
    }
}
