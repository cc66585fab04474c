//! Vote registration contract for VoteChain.
//!
//! The contract runs once per ledger transaction, against a
//! [`vchain_state::TxContext`]. It exposes two entry points:
//!
//! - [`FN_REGISTER_VOTE`]: store a vote under its [`vchain_types::LedgerKey`],
//!   detecting an existing entry for the same candidate and voter
//! - [`FN_FIND_VOTE`]: return the raw bytes stored for a candidate/passport
//!   pair, or an empty payload when nothing is stored
//!
//! Each key holds at most one entry. What happens to that entry when a second
//! registration arrives is governed by [`DuplicatePolicy`].

pub mod contract;
pub mod error;
pub mod response;

pub use contract::{
    DuplicatePolicy, VoteContract, DUPLICATE_REASON, FN_FIND_VOTE, FN_REGISTER_VOTE,
};
pub use error::{ContractError, ContractResult};
pub use response::{status, Response};
