//! Document change event types.
//!
//! This module defines the envelope published by the document producer for every change
//! to an externally-managed knowledge document.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// The kind of change a [`DocumentEvent`] describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventKind {
    /// A document was created.
    Created,
    /// A document was updated.
    Updated,
    /// A document was deleted.
    Deleted,
    /// A document's indexing flag was toggled.
    Toggled,
    /// A document reached the end of its validity window.
    Expired,
}

impl EventKind {
    /// All event kinds, in wire order.
    pub const ALL: [EventKind; 5] = [
        EventKind::Created,
        EventKind::Updated,
        EventKind::Deleted,
        EventKind::Toggled,
        EventKind::Expired,
    ];

    /// Returns the wire name of the kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::Created => "created",
            EventKind::Updated => "updated",
            EventKind::Deleted => "deleted",
            EventKind::Toggled => "toggled",
            EventKind::Expired => "expired",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Error returned when a string is not a known event kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseEventKindError(pub String);

impl fmt::Display for ParseEventKindError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown event kind: {}", self.0)
    }
}

impl std::error::Error for ParseEventKindError {}

impl FromStr for EventKind {
    type Err = ParseEventKindError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        EventKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| ParseEventKindError(s.to_string()))
    }
}

/// A change event for a single knowledge document.
///
/// Only `kind` is structurally required. The remaining identity fields default to empty
/// values so that an incomplete envelope still deserializes and can be rejected by
/// validation with a reason, instead of being treated as an unreadable payload.
///
/// # Fields
///
/// - `id`: Stable document identifier
/// - `kind`: The change being described
/// - `title`: Document title
/// - `url`: Absolute HTTP(S) location of the document
/// - `should_index`: The producer's decision on whether the document currently qualifies for indexing
/// - `can_expire`: Whether `valid_from`/`valid_until` bound the document's lifetime
/// - `version`: Per-document version, used for fingerprinting only
/// - `timestamp`: Event creation time as sent by the producer
/// - `metadata`: Opaque map passed to the index unmodified
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentEvent {
    #[serde(default)]
    pub id: String,
    pub kind: EventKind,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub should_index: bool,
    #[serde(default)]
    pub can_expire: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub valid_from: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub valid_until: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<u64>,
    #[serde(default)]
    pub timestamp: String,
    #[serde(default)]
    pub metadata: Map<String, Value>,
}

impl DocumentEvent {
    /// Create a new event with `should_index = false`, no expiry and empty metadata.
    ///
    /// # Example
    ///
    /// ```
    /// use knowledge_sync_shared::{DocumentEvent, EventKind};
    ///
    /// let event = DocumentEvent::new(
    ///     "doc-1",
    ///     EventKind::Created,
    ///     "Onboarding guide",
    ///     "https://docs.example.com/onboarding",
    ///     1,
    ///     "2026-01-01T00:00:00Z",
    /// )
    /// .with_should_index(true);
    /// assert!(event.should_index);
    /// ```
    pub fn new(
        id: impl Into<String>,
        kind: EventKind,
        title: impl Into<String>,
        url: impl Into<String>,
        version: u64,
        timestamp: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            kind,
            title: title.into(),
            url: url.into(),
            should_index: false,
            can_expire: false,
            valid_from: None,
            valid_until: None,
            version: Some(version),
            timestamp: timestamp.into(),
            metadata: Map::new(),
        }
    }

    /// Set the producer's indexing decision.
    pub fn with_should_index(mut self, should_index: bool) -> Self {
        self.should_index = should_index;
        self
    }

    /// Mark the event as expiring and set its validity bounds.
    pub fn with_validity(
        mut self,
        valid_from: Option<String>,
        valid_until: Option<String>,
    ) -> Self {
        self.can_expire = true;
        self.valid_from = valid_from;
        self.valid_until = valid_until;
        self
    }

    /// Replace the passthrough metadata.
    pub fn with_metadata(mut self, metadata: Map<String, Value>) -> Self {
        self.metadata = metadata;
        self
    }

    /// Deserialize an event from a raw message payload.
    pub fn from_slice(payload: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(payload)
    }

    /// Serialize the event to its wire representation.
    pub fn to_vec(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_deserialize_full_envelope() {
        let payload = json!({
            "id": "doc-42",
            "kind": "toggled",
            "title": "Pricing FAQ",
            "url": "https://kb.example.com/pricing",
            "shouldIndex": true,
            "canExpire": true,
            "validFrom": "2026-01-01T00:00:00Z",
            "validUntil": "2026-12-31T23:59:59Z",
            "version": 7,
            "timestamp": "2026-03-01T10:00:00Z",
            "metadata": {"source": "cms", "tags": ["billing"]}
        });

        let event = DocumentEvent::from_slice(payload.to_string().as_bytes()).unwrap();
        assert_eq!(event.id, "doc-42");
        assert_eq!(event.kind, EventKind::Toggled);
        assert!(event.should_index);
        assert!(event.can_expire);
        assert_eq!(event.version, Some(7));
        assert_eq!(event.valid_until.as_deref(), Some("2026-12-31T23:59:59Z"));
        assert_eq!(event.metadata["tags"], json!(["billing"]));
    }

    #[test]
    fn test_missing_fields_still_parse() {
        let event = DocumentEvent::from_slice(br#"{"kind":"deleted"}"#).unwrap();
        assert_eq!(event.kind, EventKind::Deleted);
        assert!(event.id.is_empty());
        assert!(event.version.is_none());
        assert!(event.metadata.is_empty());
    }

    #[test]
    fn test_unknown_kind_is_rejected() {
        assert!(DocumentEvent::from_slice(br#"{"id":"a","kind":"archived"}"#).is_err());
        assert!(DocumentEvent::from_slice(b"not json").is_err());
    }

    #[test]
    fn test_event_kind_from_str() {
        for kind in EventKind::ALL {
            assert_eq!(kind.as_str().parse::<EventKind>().unwrap(), kind);
        }
        assert_eq!(
            "archived".parse::<EventKind>(),
            Err(ParseEventKindError("archived".to_string()))
        );
    }
}
