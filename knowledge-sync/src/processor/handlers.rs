//! Per-kind sync handlers.
//!
//! Each handler turns a validated event of its kind into the index operation it requires.
//! The document's indexed state is never stored locally; it is implied by the event.

use knowledge_sync_shared::DocumentEvent;

use crate::processor::SyncAction;

/// A new document: index it if it qualifies, otherwise only record it.
pub(crate) fn handle_created(event: &DocumentEvent) -> SyncAction {
    if event.should_index {
        SyncAction::Index
    } else {
        SyncAction::Skip
    }
}

/// A changed document: re-index it, or take it out if it no longer qualifies.
pub(crate) fn handle_updated(event: &DocumentEvent) -> SyncAction {
    index_or_remove(event)
}

pub(crate) fn handle_toggled(event: &DocumentEvent) -> SyncAction {
    index_or_remove(event)
}

pub(crate) fn handle_deleted(_event: &DocumentEvent) -> SyncAction {
    SyncAction::Remove
}

pub(crate) fn handle_expired(_event: &DocumentEvent) -> SyncAction {
    SyncAction::Remove
}

fn index_or_remove(event: &DocumentEvent) -> SyncAction {
    if event.should_index {
        SyncAction::Index
    } else {
        SyncAction::Remove
    }
}
