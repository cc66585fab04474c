use std::sync::Arc;

use async_trait::async_trait;

use crate::error::BrokerResult;
use crate::message::{ProducerRecord, RecordMetadata};
use crate::session::{Claim, Session};
use crate::shutdown::Shutdown;

/// Publishes records. Safe for concurrent use.
#[async_trait]
pub trait Producer: Send + Sync {
    async fn send(&self, record: ProducerRecord) -> BrokerResult<RecordMetadata>;
}

/// Topic administration.
#[async_trait]
pub trait BrokerAdmin: Send + Sync {
    async fn create_topic(&self, name: &str, partitions: u32) -> BrokerResult<()>;
    async fn delete_topic(&self, name: &str) -> BrokerResult<()>;
}

/// Callbacks driven by a [`ConsumerGroup`] session.
///
/// `consume_claim` runs once per claimed partition, each on its own task.
/// Returning an error ends the session for every claim.
#[async_trait]
pub trait ClaimHandler: Send + Sync + 'static {
    type Error: std::error::Error + Send + Sync + 'static;

    async fn setup(&self, _session: &Session) -> Result<(), Self::Error> {
        Ok(())
    }

    async fn consume_claim(&self, session: &Session, claim: &mut Claim) -> Result<(), Self::Error>;

    async fn cleanup(&self, _session: &Session) -> Result<(), Self::Error> {
        Ok(())
    }
}

/// Membership in a named consumer group.
#[async_trait]
pub trait ConsumerGroup: Send + Sync {
    fn group_id(&self) -> &str;

    /// Join the group for `topics` and run one session.
    ///
    /// Returns `Ok` once shutdown is requested and every claim has drained,
    /// or the first handler error.
    async fn consume<H>(&self, topics: &[String], handler: Arc<H>, shutdown: &Shutdown) -> BrokerResult<()>
    where
        H: ClaimHandler;
}
