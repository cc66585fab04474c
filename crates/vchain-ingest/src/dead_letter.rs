use std::sync::Arc;

use bytes::Bytes;
use tracing::info;

use vchain_broker::{Producer, ProducerRecord, RecordMetadata};

use crate::config::DEAD_LETTER_SUFFIX;
use crate::error::{IngestError, IngestResult};

/// Re-publishes unregistrable messages to the dead-letter topic.
#[derive(Clone)]
pub struct DeadLetterRouter {
    producer: Arc<dyn Producer>,
    suffix: String,
}

impl DeadLetterRouter {
    pub fn new(producer: Arc<dyn Producer>) -> Self {
        Self::with_suffix(producer, DEAD_LETTER_SUFFIX)
    }

    pub fn with_suffix(producer: Arc<dyn Producer>, suffix: impl Into<String>) -> Self {
        Self {
            producer,
            suffix: suffix.into(),
        }
    }

    /// Dead-letter topic for `topic`.
    pub fn dead_topic_name(&self, topic: &str) -> String {
        format!("{topic}{}", self.suffix)
    }

    /// Publish `value` unchanged to the dead-letter topic of `topic`.
    pub async fn route(&self, topic: &str, value: Bytes) -> IngestResult<RecordMetadata> {
        let dead_topic = self.dead_topic_name(topic);
        let metadata = self
            .producer
            .send(ProducerRecord::new(dead_topic.clone(), value))
            .await
            .map_err(|source| IngestError::DeadLetter {
                topic: dead_topic.clone(),
                source,
            })?;
        info!(
            topic = %dead_topic,
            partition = metadata.partition,
            offset = metadata.offset,
            "message sent to dead-letter topic"
        );
        Ok(metadata)
    }
}
