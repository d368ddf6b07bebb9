//! This module defines the core data structures used across the knowledge sync pipeline.
//! It re-exports the document event and processed record types.

pub mod document_event;
pub mod processed_record;

pub use document_event::{DocumentEvent, EventKind};
pub use processed_record::ProcessedRecord;
