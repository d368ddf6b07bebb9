//! Interface definitions for the capabilities used by the sync pipeline.
//!
//! The traits in this module allow dependency injection of the index backend and the
//! ledger store, so the pipeline can be exercised against mocks.

mod document_index_provider;
mod processed_ledger;

pub use document_index_provider::DocumentIndexProvider;
pub use processed_ledger::ProcessedLedger;
