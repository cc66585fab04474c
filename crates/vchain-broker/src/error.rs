/// Boxed error raised by a [`crate::ClaimHandler`].
pub type HandlerError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors produced by broker operations.
#[derive(Debug, thiserror::Error)]
pub enum BrokerError {
    #[error("unknown topic {0:?}")]
    UnknownTopic(String),

    #[error("topic {0:?} already exists")]
    TopicExists(String),

    #[error("invalid topic name {0:?}")]
    InvalidTopic(String),

    #[error("topic must have at least one partition")]
    NoPartitions,

    #[error("no topics to consume")]
    NoTopics,

    /// The handler failed while processing one claim; the session was ended.
    #[error("claim {topic}/{partition} failed: {source}")]
    Claim {
        topic: String,
        partition: u32,
        #[source]
        source: HandlerError,
    },

    /// The handler failed in `setup` or `cleanup`.
    #[error("session handler failed: {0}")]
    Session(#[source] HandlerError),

    /// A claim worker panicked or was aborted.
    #[error("claim worker failed: {0}")]
    Worker(String),
}

impl BrokerError {
    /// The handler error behind a claim or session failure.
    pub fn handler_error(&self) -> Option<&(dyn std::error::Error + Send + Sync + 'static)> {
        match self {
            Self::Claim { source, .. } | Self::Session(source) => Some(source.as_ref()),
            _ => None,
        }
    }
}

/// Result alias for broker operations.
pub type BrokerResult<T> = Result<T, BrokerError>;
