//! # Knowledge Sync Shared
//!
//! This crate defines the data structures shared across the knowledge sync pipeline.
//! It includes the inbound document change event and the ledger record written once an
//! event has been handled.

pub mod types;

pub use types::document_event::{DocumentEvent, EventKind, ParseEventKindError};
pub use types::processed_record::ProcessedRecord;
