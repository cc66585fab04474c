use std::path::PathBuf;

use vchain_codec::CodecError;

use crate::gateway::InvocationError;

/// Errors produced by ledger client operations.
#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    #[error("vote is not found")]
    VoteNotFound,

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("failed to invoke {function:?}: {source}")]
    Invocation {
        function: &'static str,
        source: InvocationError,
    },

    /// The ledger returned bytes that do not decode as a vote.
    #[error("ledger returned an undecodable vote: {0}")]
    Inconsistent(#[source] CodecError),

    #[error("failed to encode vote: {0}")]
    Encode(#[source] CodecError),

    #[error("failed to read identity file {path}: {source}")]
    Identity {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("configuration error: {0}")]
    Config(String),
}

pub type LedgerResult<T> = Result<T, LedgerError>;
