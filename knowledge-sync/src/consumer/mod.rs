//! Consumer module for the knowledge sync pipeline.
//!
//! Provides the message source abstraction and its Kafka implementation.

mod kafka_consumer;
mod messages;

use async_trait::async_trait;
use tokio::sync::{broadcast, mpsc};

use crate::errors::IngestError;

pub use kafka_consumer::{KafkaConsumer, KafkaConsumerConfig};
pub use messages::{MessageOffset, StreamMessage};

/// A source of raw event payloads with per-message acknowledgment.
///
/// Implementations keep at most one message in flight: after sending a
/// [`StreamMessage::Payload`] they wait for the matching
/// [`StreamMessage::Acknowledgment`] before reading on. A message acknowledged with
/// `commit: false` must be delivered again.
#[async_trait]
pub trait Consumer: Send + Sync {
    /// Subscribe to the configured source.
    fn subscribe(&self) -> Result<(), IngestError>;

    /// Read messages into `sender` until shutdown, end of stream or a closed channel.
    ///
    /// Sends [`StreamMessage::End`] before returning on shutdown or end of stream.
    async fn run(
        &self,
        sender: mpsc::Sender<StreamMessage>,
        ack_receiver: mpsc::Receiver<StreamMessage>,
        shutdown: broadcast::Receiver<()>,
    ) -> Result<(), IngestError>;
}
