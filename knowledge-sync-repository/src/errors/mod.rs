//! Error types for the knowledge sync repository.
//!
//! One error type per capability: the document index and the processed-event ledger.

mod index_provider_error;
mod ledger_error;

pub use index_provider_error::IndexProviderError;
pub use ledger_error::LedgerError;
