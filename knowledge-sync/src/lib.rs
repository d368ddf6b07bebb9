//! # Knowledge Sync
//!
//! Keeps a search index consistent with change events for externally-managed knowledge
//! documents, under duplicate delivery, bursty traffic and transient index failures.
//!
//! ## Architecture
//!
//! The service follows the Consumer-Processor-Loader pattern, with admission control and
//! idempotence around the side effect:
//!
//! 1. **Consumer**: Receives raw events from Kafka, one in flight at a time
//! 2. **Idempotence**: Skips events whose fingerprint is already in the ledger
//! 3. **Admission**: Circuit breaker and rate limiter protect the index
//! 4. **Processor**: Validates events and routes them to an index action
//! 5. **Loader**: Applies the action to OpenSearch
//! 6. **Orchestrator**: Runs the per-message pipeline and acknowledges each message
//!
//! ## Modules
//!
//! - [`admission`]: Circuit breaker and rate limiter
//! - [`config`]: Configuration and dependency initialization
//! - [`consumer`]: Message source abstraction and Kafka consumer
//! - [`errors`]: Error types for the pipeline
//! - [`idempotence`]: Fingerprints and the processed-event guard
//! - [`loader`]: Applies index and remove operations
//! - [`monitoring`]: Run statistics and health
//! - [`orchestrator`]: The consumer loop
//! - [`processor`]: Validation and routing
//! - [`server`]: HTTP status endpoints

pub mod admission;
pub mod config;
pub mod consumer;
pub mod errors;
pub mod idempotence;
pub mod loader;
pub mod monitoring;
pub mod orchestrator;
pub mod processor;
pub mod server;

pub use config::{Dependencies, PipelineConfig, SyncConfig};
pub use errors::IngestError;
pub use orchestrator::{ConsumerLoop, MessageOutcome};

use thiserror::Error;

/// Errors that can occur during service initialization or execution.
#[derive(Error, Debug)]
pub enum SyncError {
    /// Configuration error.
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Status server error.
    #[error("Server error: {0}")]
    ServerError(String),

    /// Ingest error.
    #[error("Ingest error: {0}")]
    IngestError(#[from] IngestError),
}

impl SyncError {
    /// Create a configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::ConfigError(msg.into())
    }

    /// Create a server error.
    pub fn server(msg: impl Into<String>) -> Self {
        Self::ServerError(msg.into())
    }
}
