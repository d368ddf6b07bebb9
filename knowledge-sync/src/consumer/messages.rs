//! Message types for the consumer.
//!
//! Defines what flows between the consumer and the consumer loop.

/// Position of a message in the source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageOffset {
    pub topic: String,
    pub partition: i32,
    pub offset: i64,
}

impl MessageOffset {
    pub fn new(topic: impl Into<String>, partition: i32, offset: i64) -> Self {
        Self {
            topic: topic.into(),
            partition,
            offset,
        }
    }
}

impl std::fmt::Display for MessageOffset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}@{}", self.topic, self.partition, self.offset)
    }
}

/// Messages exchanged between the consumer and the consumer loop.
#[derive(Debug)]
pub enum StreamMessage {
    /// A raw event payload awaiting acknowledgment.
    Payload {
        payload: Vec<u8>,
        offset: MessageOffset,
    },
    /// Outcome of a payload. `commit: false` asks for redelivery.
    Acknowledgment { offset: MessageOffset, commit: bool },
    /// Stream has ended.
    End,
    /// An error occurred.
    Error(String),
}
