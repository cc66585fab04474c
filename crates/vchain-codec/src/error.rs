use thiserror::Error;

/// Reasons a vote fails structural validation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("vote has no candidate ID")]
    MissingCandidate,

    #[error("vote has no voter")]
    MissingVoter,

    #[error("voter has no passport")]
    MissingPassport,

    #[error("voter has no full name")]
    MissingFullName,

    #[error("voter has no birth date")]
    MissingBirthDate,

    #[error("unknown vote status tag {0}")]
    UnknownStatus(u8),

    #[error("fail reason present on a vote with status {0}")]
    UnexpectedFailReason(&'static str),

    #[error("failed vote has no fail reason")]
    MissingFailReason,
}

#[derive(Debug, Error)]
pub enum CodecError {
    #[error("empty message")]
    Empty,

    #[error("unsupported wire format version {0}")]
    UnsupportedVersion(u8),

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("deserialization error: {0}")]
    Deserialization(String),

    #[error("encoded vote exceeds {limit} bytes")]
    TooLarge { limit: u64 },

    #[error("fail reason is {0} bytes long")]
    FailReasonTooLong(usize),

    #[error("invalid vote: {0}")]
    Invalid(#[from] ValidationError),
}

pub type CodecResult<T> = Result<T, CodecError>;
