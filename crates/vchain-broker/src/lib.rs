//! Message broker boundary for VoteChain.
//!
//! The ingestion pipeline talks to the broker only through the traits in
//! this crate:
//!
//! - [`Producer`] publishes records (used for dead-lettering and readiness)
//! - [`BrokerAdmin`] creates and deletes topics
//! - [`ConsumerGroup`] runs sessions that hand each claimed partition to a
//!   [`ClaimHandler`], one task per [`Claim`]
//!
//! [`InMemoryBroker`] implements all three over per-partition append-only
//! logs with per-group committed offsets. Claims observe a [`Shutdown`]
//! before yielding each message, and a handler error ends the session so
//! that uncommitted messages are redelivered to the next one.

pub mod config;
pub mod error;
pub mod memory;
pub mod message;
pub mod session;
pub mod shutdown;
pub mod traits;

pub use config::{BrokerConfig, OffsetReset};
pub use error::{BrokerError, BrokerResult, HandlerError};
pub use memory::{InMemoryBroker, InMemoryConsumerGroup};
pub use message::{Message, ProducerRecord, RecordMetadata};
pub use session::{Claim, Session};
pub use shutdown::{Shutdown, ShutdownSignal};
pub use traits::{BrokerAdmin, ClaimHandler, ConsumerGroup, Producer};
