//! Ledger access for VoteChain.
//!
//! - [`LedgerGateway`]: the invocation boundary for submitting state-changing
//!   transactions and evaluating queries against a named contract entry point
//! - [`InProcessNetwork`]: a single-process ledger network that executes the
//!   vote contract atomically and records every transaction in a hash-linked
//!   log
//! - [`LedgerClient`]: registers and finds votes, classifying
//!   transaction-layer errors into [`Registration`] outcomes so callers never
//!   inspect raw error shapes

pub mod client;
pub mod config;
pub mod error;
pub mod gateway;
pub mod identity;
pub mod network;
pub mod txlog;

pub use client::{LedgerClient, Registration};
pub use config::LedgerConfig;
pub use error::{LedgerError, LedgerResult};
pub use gateway::{InvocationError, LedgerGateway, PeerError};
pub use identity::Identity;
pub use network::{connect, InProcessNetwork};
pub use txlog::{ChainError, NewTransaction, TransactionLog, TransactionRecord};
