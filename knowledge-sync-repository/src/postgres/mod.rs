//! PostgreSQL implementation of the processed-event ledger.

mod ledger;

pub use ledger::PostgresProcessedLedger;
