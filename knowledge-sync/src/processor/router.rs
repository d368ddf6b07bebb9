//! Event routing.

use knowledge_sync_shared::{DocumentEvent, EventKind};
use tracing::debug;

use crate::processor::handlers;

/// What the pipeline must do to the index for one event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncAction {
    /// Index (or overwrite) the document.
    Index,
    /// Remove the document. Removing an absent document succeeds.
    Remove,
    /// Leave the index untouched; the event is only recorded as processed.
    Skip,
}

impl SyncAction {
    /// Whether this action must pass the rate limiter.
    ///
    /// Only index work adds load to the index. Removals and skips bypass the limiter.
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, SyncAction::Index)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SyncAction::Index => "index",
            SyncAction::Remove => "remove",
            SyncAction::Skip => "skip",
        }
    }
}

impl std::fmt::Display for SyncAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Dispatches an event to the handler for its kind.
///
/// | kind    | should_index | action |
/// |---------|--------------|--------|
/// | created | true         | index  |
/// | created | false        | skip   |
/// | updated | true         | index  |
/// | updated | false        | remove |
/// | toggled | true         | index  |
/// | toggled | false        | remove |
/// | deleted | any          | remove |
/// | expired | any          | remove |
#[derive(Debug, Clone, Copy, Default)]
pub struct EventRouter;

impl EventRouter {
    pub fn new() -> Self {
        Self
    }

    pub fn route(&self, event: &DocumentEvent) -> SyncAction {
        let action = match event.kind {
            EventKind::Created => handlers::handle_created(event),
            EventKind::Updated => handlers::handle_updated(event),
            EventKind::Toggled => handlers::handle_toggled(event),
            EventKind::Deleted => handlers::handle_deleted(event),
            EventKind::Expired => handlers::handle_expired(event),
        };

        debug!(
            document_id = %event.id,
            kind = %event.kind,
            should_index = event.should_index,
            action = %action,
            "Routed event"
        );
        action
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(kind: EventKind, should_index: bool) -> DocumentEvent {
        DocumentEvent::new(
            "doc-1",
            kind,
            "Title",
            "https://kb.example.com/doc-1",
            1,
            "2026-01-01T00:00:00Z",
        )
        .with_should_index(should_index)
    }

    #[test]
    fn test_routing_table() {
        let router = EventRouter::new();
        let cases = [
            (EventKind::Created, true, SyncAction::Index),
            (EventKind::Created, false, SyncAction::Skip),
            (EventKind::Updated, true, SyncAction::Index),
            (EventKind::Updated, false, SyncAction::Remove),
            (EventKind::Toggled, true, SyncAction::Index),
            (EventKind::Toggled, false, SyncAction::Remove),
            (EventKind::Deleted, true, SyncAction::Remove),
            (EventKind::Deleted, false, SyncAction::Remove),
            (EventKind::Expired, true, SyncAction::Remove),
            (EventKind::Expired, false, SyncAction::Remove),
        ];

        for (kind, should_index, expected) in cases {
            assert_eq!(
                router.route(&event(kind, should_index)),
                expected,
                "{} with should_index={}",
                kind,
                should_index
            );
        }
    }

    #[test]
    fn test_only_index_is_rate_limited() {
        assert!(SyncAction::Index.is_rate_limited());
        assert!(!SyncAction::Remove.is_rate_limited());
        assert!(!SyncAction::Skip.is_rate_limited());
    }
}
