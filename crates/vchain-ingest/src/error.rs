use vchain_broker::BrokerError;

/// Errors produced by the ingestion pipeline.
#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    #[error("invalid consumer configuration: {0}")]
    Config(String),

    /// The dead-letter topic refused the message.
    #[error("failed to send message to topic {topic:?}: {source}")]
    DeadLetter {
        topic: String,
        #[source]
        source: BrokerError,
    },

    /// A vote on the dead topic still could not be registered.
    #[error("vote at {topic}/{partition}@{offset} remains unregistered: {cause}")]
    Unresolved {
        topic: String,
        partition: u32,
        offset: u64,
        cause: String,
    },

    #[error("consumer group failed: {0}")]
    Consume(#[source] BrokerError),
}

impl IngestError {
    /// `true` when restarting consumption cannot help and the process
    /// should exit.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, Self::Unresolved { .. })
    }
}

/// Result alias for ingestion operations.
pub type IngestResult<T> = Result<T, IngestError>;
