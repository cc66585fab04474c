//! Vote ingestion for VoteChain.
//!
//! [`ChainHandler`] processes each claimed partition in order. Every message
//! ends in one [`MessageOutcome`] before its offset is committed:
//!
//! - undecodable or incomplete votes are dropped
//! - accepted votes are registered
//! - duplicates are rejected by the contract, which records the rejection
//! - votes the ledger could not resolve go to the dead-letter topic through
//!   [`DeadLetterRouter`]
//!
//! When the consumer reads the dead-letter topic itself, unresolved votes are
//! left uncommitted after a pause and the session ends; [`ConsumerRunner`]
//! then restarts consumption so the broker redelivers them.

pub mod config;
pub mod dead_letter;
pub mod error;
pub mod handler;
pub mod runner;

pub use config::{ConsumerConfig, DEAD_LETTER_SUFFIX};
pub use dead_letter::DeadLetterRouter;
pub use error::{IngestError, IngestResult};
pub use handler::{ChainHandler, ConsumeMode, MessageOutcome};
pub use runner::ConsumerRunner;
