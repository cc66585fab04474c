//! Key-value world state for VoteChain.
//!
//! The ledger contract reads and writes votes through the [`StateStore`]
//! trait. A [`TxContext`] wraps a store for the duration of one transaction:
//! reads see the transaction's own pending writes, and nothing reaches the
//! store until the transaction is committed.
//!
//! # Design Rules
//!
//! 1. The store never interprets values; it is a pure key-value store.
//! 2. A transaction's writes become visible all at once or not at all.
//! 3. All I/O errors are propagated, never silently ignored.

pub mod context;
pub mod error;
pub mod memory;
pub mod traits;

pub use context::{TxContext, WriteSet};
pub use error::{StoreError, StoreResult};
pub use memory::InMemoryStateStore;
pub use traits::StateStore;
