use std::sync::Arc;

use tracing::{error, info, warn};

use vchain_broker::{BrokerError, ConsumerGroup, Shutdown};

use crate::error::{IngestError, IngestResult};
use crate::handler::{ChainHandler, ConsumeMode};

/// Keeps a consumer group session running until shutdown.
///
/// A session that ends on an unresolved vote is restarted, which redelivers
/// from the last committed offset. Any other failure stops the runner.
pub struct ConsumerRunner<G> {
    group: G,
    topic: String,
    handler: Arc<ChainHandler>,
}

impl<G: ConsumerGroup> ConsumerRunner<G> {
    pub fn new(group: G, topic: impl Into<String>, handler: ChainHandler) -> Self {
        Self {
            group,
            topic: topic.into(),
            handler: Arc::new(handler),
        }
    }

    pub async fn run(&self, shutdown: &Shutdown) -> IngestResult<()> {
        let topics = [self.topic.clone()];
        let dead = matches!(self.handler.mode(), ConsumeMode::DeadTopic { .. });
        info!(topic = %self.topic, group = self.group.group_id(), dead, "consuming");

        let mut restarts = 0u64;
        while !shutdown.is_triggered() {
            match self.group.consume(&topics, Arc::clone(&self.handler), shutdown).await {
                Ok(()) => {}
                Err(err) if is_recoverable(&err) => {
                    restarts += 1;
                    warn!(topic = %self.topic, restarts, error = %err, "restarting consumption");
                }
                Err(err) => {
                    error!(topic = %self.topic, error = %err, "failed to consume");
                    return Err(match err {
                        BrokerError::Claim { source, .. } | BrokerError::Session(source) => {
                            match source.downcast::<IngestError>() {
                                Ok(ingest) => *ingest,
                                Err(other) => IngestError::Consume(BrokerError::Session(other)),
                            }
                        }
                        other => IngestError::Consume(other),
                    });
                }
            }
        }
        info!(topic = %self.topic, "consumer stopped");
        Ok(())
    }
}

fn is_recoverable(err: &BrokerError) -> bool {
    err.handler_error()
        .and_then(|source| source.downcast_ref::<IngestError>())
        .is_some_and(|ingest| !ingest.is_fatal())
}
