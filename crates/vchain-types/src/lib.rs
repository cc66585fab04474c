//! Foundation types for VoteChain.
//!
//! Every other VoteChain crate depends on `vchain-types`.
//!
//! # Key Types
//!
//! - [`Vote`]: one voter's choice of candidate, plus its registration outcome
//! - [`Voter`]: the identity fields of the person casting the vote
//! - [`VoteStatus`]: `PENDING | SUCCESS | FAIL`, implicitly successful when unset
//! - [`LedgerKey`]: deterministic address of a vote in ledger state

pub mod error;
pub mod key;
pub mod vote;

pub use error::TypeError;
pub use key::{format_candidate_id, parse_candidate_id, LedgerKey};
pub use vote::{Vote, VoteStatus, Voter};
