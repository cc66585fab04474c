use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, error, info, warn};

use vchain_broker::{Claim, ClaimHandler, Message, Session};
use vchain_codec::VoteCodec;
use vchain_ledger::{LedgerClient, Registration};

use crate::config::ConsumerConfig;
use crate::dead_letter::DeadLetterRouter;
use crate::error::{IngestError, IngestResult};

/// How unresolved registrations are handled.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConsumeMode {
    /// Hand unresolved messages to the dead-letter topic.
    Primary,
    /// Consuming the dead-letter topic itself: pause `interval` after each
    /// message and leave unresolved messages uncommitted.
    DeadTopic { interval: Duration },
}

impl ConsumeMode {
    pub fn from_config(config: &ConsumerConfig) -> Self {
        if config.topic_is_dead {
            Self::DeadTopic {
                interval: config.consumption_interval(),
            }
        } else {
            Self::Primary
        }
    }
}

/// Terminal outcome of one message. Every outcome commits the offset.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MessageOutcome {
    /// Undecodable or incomplete; never retried.
    Dropped,
    Registered,
    /// Refused by the contract as a duplicate; recorded on the ledger.
    Rejected,
    /// Handed to the dead-letter topic.
    DeadLettered,
}

/// Registers each claimed vote on the ledger.
pub struct ChainHandler {
    client: LedgerClient,
    router: DeadLetterRouter,
    mode: ConsumeMode,
}

impl ChainHandler {
    pub fn new(client: LedgerClient, router: DeadLetterRouter, mode: ConsumeMode) -> Self {
        Self {
            client,
            router,
            mode,
        }
    }

    pub fn mode(&self) -> ConsumeMode {
        self.mode
    }

    /// Drive one message to a terminal outcome.
    ///
    /// An error means the outcome is unresolved and the offset must not be
    /// committed.
    pub async fn process(&self, message: &Message) -> IngestResult<MessageOutcome> {
        debug!(
            topic = %message.topic,
            partition = message.partition,
            offset = message.offset,
            "message received"
        );

        let vote = match VoteCodec::decode(&message.value) {
            Ok(vote) => vote,
            Err(e) => {
                error!(
                    topic = %message.topic,
                    partition = message.partition,
                    offset = message.offset,
                    error = %e,
                    "invalid vote, dropping message"
                );
                return Ok(MessageOutcome::Dropped);
            }
        };
        let key = vote.key();

        let registration = match self.client.register_vote(&vote).await {
            Ok(registration) => registration,
            Err(e) => {
                error!(%key, error = %e, "vote cannot be submitted, dropping message");
                return Ok(MessageOutcome::Dropped);
            }
        };

        match registration {
            Registration::Ack => {
                info!(%key, candidate_id = vote.candidate_id, "vote has been registered");
                if let ConsumeMode::DeadTopic { interval } = self.mode {
                    tokio::time::sleep(interval).await;
                }
                Ok(MessageOutcome::Registered)
            }
            Registration::RejectedDuplicate { reason } => {
                warn!(%key, candidate_id = vote.candidate_id, %reason, "vote rejected");
                Ok(MessageOutcome::Rejected)
            }
            Registration::Transient { cause } => {
                error!(%key, %cause, "vote handling error");
                self.unresolved(message, cause).await
            }
            Registration::ProtocolViolation { cause } => {
                error!(%key, %cause, "unrecognized ledger error shape, check contract and client versions");
                self.unresolved(message, cause).await
            }
        }
    }

    async fn unresolved(&self, message: &Message, cause: String) -> IngestResult<MessageOutcome> {
        match self.mode {
            ConsumeMode::DeadTopic { interval } => {
                tokio::time::sleep(interval).await;
                Err(IngestError::Unresolved {
                    topic: message.topic.clone(),
                    partition: message.partition,
                    offset: message.offset,
                    cause,
                })
            }
            ConsumeMode::Primary => {
                self.router.route(&message.topic, message.value.clone()).await?;
                Ok(MessageOutcome::DeadLettered)
            }
        }
    }
}

#[async_trait]
impl ClaimHandler for ChainHandler {
    type Error = IngestError;

    async fn setup(&self, session: &Session) -> IngestResult<()> {
        debug!(group = session.group_id(), generation = session.generation(), "session setup");
        Ok(())
    }

    async fn consume_claim(&self, session: &Session, claim: &mut Claim) -> IngestResult<()> {
        while let Some(message) = claim.next().await {
            self.process(&message).await?;
            session.mark_message(&message);
        }
        Ok(())
    }

    async fn cleanup(&self, session: &Session) -> IngestResult<()> {
        debug!(group = session.group_id(), generation = session.generation(), "session cleanup");
        Ok(())
    }
}
