//! Idempotence for at-least-once delivery.
//!
//! - [`MessageHasher`]: derives the deduplication fingerprint of an event
//! - [`IdempotenceGuard`]: checks and records fingerprints in the external ledger

mod guard;
mod hasher;

pub use guard::IdempotenceGuard;
pub use hasher::MessageHasher;
