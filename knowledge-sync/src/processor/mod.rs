//! Processor module for the knowledge sync pipeline.
//!
//! Decides what an event means for the index:
//!
//! - [`EventValidator`]: business-rule checks on a parsed event
//! - [`EventRouter`]: maps `(kind, should_index)` to a [`SyncAction`]

mod handlers;
mod router;
mod validator;

pub use router::{EventRouter, SyncAction};
pub use validator::{EventValidator, ValidationError};
