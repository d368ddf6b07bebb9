//! Kafka consumer implementation for the knowledge sync pipeline.
//!
//! Reads document events one at a time and only moves past a message once the consumer
//! loop has acknowledged it.

use async_trait::async_trait;
use futures::StreamExt;
use rdkafka::{
    config::ClientConfig,
    consumer::{CommitMode, Consumer as _, StreamConsumer},
    message::Message as KafkaMessage,
    Offset, TopicPartitionList,
};
use std::time::Duration;
use tokio::sync::{broadcast, mpsc};
use tracing::{debug, error, info, instrument, warn};

use crate::consumer::messages::{MessageOffset, StreamMessage};
use crate::consumer::Consumer;
use crate::errors::IngestError;

/// Default pause before re-reading a message that was not committed.
pub const DEFAULT_REDELIVERY_DELAY: Duration = Duration::from_millis(1000);

/// Timeout for seeking back to an uncommitted message.
const SEEK_TIMEOUT: Duration = Duration::from_secs(5);

/// Seek attempts before giving up on a deferred message.
const REWIND_ATTEMPTS: u32 = 3;

/// Run `op` up to `attempts` times, sleeping `delay` between failures.
///
/// Returns the last error if every attempt fails.
async fn retry<F>(attempts: u32, delay: Duration, mut op: F) -> Result<(), IngestError>
where
    F: FnMut() -> Result<(), IngestError>,
{
    let mut attempt = 1;
    loop {
        match op() {
            Ok(()) => return Ok(()),
            Err(e) if attempt >= attempts => return Err(e),
            Err(e) => {
                warn!(attempt = attempt, error = %e, "Kafka operation failed, retrying");
                attempt += 1;
                tokio::time::sleep(delay).await;
            }
        }
    }
}

/// Connection settings for [`KafkaConsumer`].
#[derive(Debug, Clone)]
pub struct KafkaConsumerConfig {
    pub brokers: String,
    pub group_id: String,
    pub topic: String,
    pub username: Option<String>,
    pub password: Option<String>,
    pub ssl_ca_pem: Option<String>,
    pub redelivery_delay: Duration,
}

impl KafkaConsumerConfig {
    pub fn new(
        brokers: impl Into<String>,
        group_id: impl Into<String>,
        topic: impl Into<String>,
    ) -> Self {
        Self {
            brokers: brokers.into(),
            group_id: group_id.into(),
            topic: topic.into(),
            username: None,
            password: None,
            ssl_ca_pem: None,
            redelivery_delay: DEFAULT_REDELIVERY_DELAY,
        }
    }

    /// Set SASL credentials (enables SASL/SSL).
    pub fn with_credentials(mut self, username: String, password: String) -> Self {
        self.username = Some(username);
        self.password = Some(password);
        self
    }

    /// Set custom CA certificate.
    pub fn with_ssl_ca(mut self, ca_pem: String) -> Self {
        self.ssl_ca_pem = Some(ca_pem);
        self
    }

    pub fn with_redelivery_delay(mut self, redelivery_delay: Duration) -> Self {
        self.redelivery_delay = redelivery_delay;
        self
    }
}

/// Kafka consumer for document events.
pub struct KafkaConsumer {
    consumer: StreamConsumer,
    topic: String,
    redelivery_delay: Duration,
}

impl KafkaConsumer {
    /// Create a new Kafka consumer.
    ///
    /// Offsets are committed manually, one message at a time, after the consumer loop
    /// acknowledges the message.
    pub fn new(config: &KafkaConsumerConfig) -> Result<Self, IngestError> {
        let mut client_config = ClientConfig::new();
        client_config
            .set("bootstrap.servers", &config.brokers)
            .set("group.id", &config.group_id)
            .set("enable.auto.commit", "false")
            .set("auto.offset.reset", "earliest")
            .set("session.timeout.ms", "6000");

        // If SASL credentials are provided, enable SASL/SSL (for managed Kafka)
        // Otherwise, use plaintext (for local development)
        if let (Some(username), Some(password)) = (&config.username, &config.password) {
            client_config
                .set("security.protocol", "SASL_SSL")
                .set("sasl.mechanisms", "PLAIN")
                .set("sasl.username", username)
                .set("sasl.password", password);

            if let Some(ca_pem) = &config.ssl_ca_pem {
                client_config.set("ssl.ca.pem", ca_pem);
            }
        }

        let consumer: StreamConsumer = client_config.create()?;

        info!(
            brokers = %config.brokers,
            group_id = %config.group_id,
            topic = %config.topic,
            sasl = config.username.is_some(),
            "Created Kafka consumer"
        );

        Ok(Self {
            consumer,
            topic: config.topic.clone(),
            redelivery_delay: config.redelivery_delay,
        })
    }

    /// Commit the position after `offset`.
    fn commit(&self, offset: &MessageOffset) -> Result<(), IngestError> {
        let mut tpl = TopicPartitionList::new();
        tpl.add_partition_offset(
            &offset.topic,
            offset.partition,
            Offset::Offset(offset.offset + 1),
        )?;
        self.consumer.commit(&tpl, CommitMode::Async)?;
        Ok(())
    }

    /// Rewind the partition so `offset` is read again.
    fn rewind(&self, offset: &MessageOffset) -> Result<(), IngestError> {
        self.consumer.seek(
            &offset.topic,
            offset.partition,
            Offset::Offset(offset.offset),
            SEEK_TIMEOUT,
        )?;
        Ok(())
    }
}

#[async_trait]
impl Consumer for KafkaConsumer {
    /// Subscribe to the configured topic.
    fn subscribe(&self) -> Result<(), IngestError> {
        self.consumer.subscribe(&[self.topic.as_str()])?;
        info!(topic = %self.topic, "Subscribed to Kafka topic");
        Ok(())
    }

    /// Start consuming messages and send them through the channel.
    ///
    /// # Arguments
    ///
    /// * `sender` - Channel to send messages to
    /// * `ack_receiver` - Channel to receive acknowledgments from the consumer loop
    /// * `shutdown` - Shutdown signal receiver
    #[instrument(skip(self, sender, ack_receiver, shutdown), fields(topic = %self.topic))]
    async fn run(
        &self,
        sender: mpsc::Sender<StreamMessage>,
        mut ack_receiver: mpsc::Receiver<StreamMessage>,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), IngestError> {
        let mut message_stream = self.consumer.stream();

        loop {
            let next = tokio::select! {
                biased;
                _ = shutdown.recv() => {
                    info!("Consumer received shutdown signal");
                    let _ = sender.send(StreamMessage::End).await;
                    break;
                }
                message = message_stream.next() => message,
            };

            let (payload, offset) = match next {
                Some(Ok(msg)) => {
                    let offset = MessageOffset::new(msg.topic(), msg.partition(), msg.offset());
                    match msg.payload() {
                        Some(payload) => (payload.to_vec(), offset),
                        None => {
                            // Tombstones carry no event; move past them.
                            debug!(offset = %offset, "Skipping message with empty payload");
                            if let Err(e) = self.commit(&offset) {
                                warn!(offset = %offset, error = %e, "Failed to commit empty message");
                            }
                            continue;
                        }
                    }
                }
                Some(Err(e)) => {
                    error!(error = %e, "Kafka error");
                    let _ = sender.send(StreamMessage::Error(e.to_string())).await;
                    continue;
                }
                None => {
                    info!("Kafka stream ended");
                    let _ = sender.send(StreamMessage::End).await;
                    break;
                }
            };

            debug!(
                topic = %offset.topic,
                partition = offset.partition,
                offset = offset.offset,
                "Received message from Kafka"
            );

            if sender
                .send(StreamMessage::Payload { payload, offset })
                .await
                .is_err()
            {
                info!("Event channel closed");
                break;
            }

            // One message in flight: wait for its outcome before reading on.
            match ack_receiver.recv().await {
                Some(StreamMessage::Acknowledgment { offset, commit: true }) => {
                    if let Err(e) = self.commit(&offset) {
                        error!(offset = %offset, error = %e, "Failed to commit offset");
                    }
                }
                Some(StreamMessage::Acknowledgment {
                    offset,
                    commit: false,
                }) => {
                    debug!(
                        offset = %offset,
                        delay_ms = self.redelivery_delay.as_millis() as u64,
                        "Message deferred, rewinding for redelivery"
                    );
                    let rewound = retry(REWIND_ATTEMPTS, self.redelivery_delay, || {
                        self.rewind(&offset)
                    })
                    .await;
                    if let Err(e) = rewound {
                        // Reading on from here would skip the deferred message.
                        error!(offset = %offset, error = %e, "Failed to rewind deferred message");
                        let _ = sender.send(StreamMessage::End).await;
                        return Err(e);
                    }
                    tokio::select! {
                        biased;
                        _ = shutdown.recv() => {
                            info!("Consumer received shutdown signal");
                            let _ = sender.send(StreamMessage::End).await;
                            break;
                        }
                        _ = tokio::time::sleep(self.redelivery_delay) => {}
                    }
                }
                Some(StreamMessage::End) | None => {
                    info!("Acknowledgment channel closed");
                    break;
                }
                Some(other) => {
                    warn!(message = ?other, "Unexpected message on acknowledgment channel");
                }
            }
        }

        Ok(())
    }
}
