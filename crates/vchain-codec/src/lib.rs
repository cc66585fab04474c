//! Vote wire codec for VoteChain.
//!
//! Votes travel through the broker and sit in ledger state in the same binary
//! form: a one-byte format version followed by a `bincode` payload. Decoding
//! always validates, so a successfully decoded [`vchain_types::Vote`] is
//! structurally complete.

pub mod codec;
pub mod error;
pub mod validation;
pub mod wire;

pub use codec::{VoteCodec, MAX_FAIL_REASON_LEN, MAX_VOTE_SIZE, WIRE_VERSION};
pub use error::{CodecError, CodecResult, ValidationError};
pub use validation::validate;
pub use wire::{WireVote, WireVoter};
