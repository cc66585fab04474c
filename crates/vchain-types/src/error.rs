use thiserror::Error;

/// Errors produced by type operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("invalid candidate id {0:?}: expected a positive decimal integer")]
    InvalidCandidateId(String),

    #[error("unknown vote status tag: {0}")]
    UnknownStatus(u8),
}
