//! # Knowledge Sync Repository
//!
//! This crate provides the capabilities the sync pipeline depends on but does not own:
//! the document index (with an OpenSearch implementation) and the durable idempotence
//! ledger (with PostgreSQL and in-memory implementations).

pub mod errors;
pub mod interfaces;
pub mod memory;
pub mod opensearch;
pub mod postgres;
pub mod types;
pub mod utils;

pub use errors::{IndexProviderError, LedgerError};
pub use interfaces::{DocumentIndexProvider, ProcessedLedger};
pub use memory::InMemoryProcessedLedger;
pub use opensearch::OpenSearchProvider;
pub use postgres::PostgresProcessedLedger;
pub use types::{InsertOutcome, RemoveDocumentRequest, UpsertDocumentRequest};
pub use utils::validate_document_id;
