use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{IngestError, IngestResult};

/// Suffix appended to a topic name to form its dead-letter topic.
pub const DEAD_LETTER_SUFFIX: &str = ".dead";

/// Configuration for one ingestion consumer.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConsumerConfig {
    /// Topic to consume. In dead-topic mode this is the dead-letter topic.
    pub topic: String,
    pub group_id: String,
    /// Consume `topic` as a dead-letter topic: throttle and never re-route.
    pub topic_is_dead: bool,
    /// Pause after each message in dead-topic mode.
    pub consumption_interval_secs: u64,
    pub dead_letter_suffix: String,
}

impl Default for ConsumerConfig {
    fn default() -> Self {
        Self {
            topic: String::new(),
            group_id: String::new(),
            topic_is_dead: false,
            consumption_interval_secs: 10,
            dead_letter_suffix: DEAD_LETTER_SUFFIX.into(),
        }
    }
}

impl ConsumerConfig {
    pub fn new(topic: impl Into<String>, group_id: impl Into<String>) -> Self {
        Self {
            topic: topic.into(),
            group_id: group_id.into(),
            ..Self::default()
        }
    }

    pub fn consumption_interval(&self) -> Duration {
        Duration::from_secs(self.consumption_interval_secs)
    }

    pub fn validate(&self) -> IngestResult<()> {
        if self.topic.trim().is_empty() {
            return Err(IngestError::Config("topic must not be empty".into()));
        }
        if self.group_id.trim().is_empty() {
            return Err(IngestError::Config("consumer group id must not be empty".into()));
        }
        if self.dead_letter_suffix.is_empty() {
            return Err(IngestError::Config("dead-letter suffix must not be empty".into()));
        }
        Ok(())
    }
}
