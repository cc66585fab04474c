use vchain_codec::CodecError;
use vchain_state::StoreError;

/// Errors that abort a contract invocation.
///
/// Business outcomes (duplicates, bad arguments) are not errors; they are
/// reported through the [`crate::Response`] status. An error here means the
/// transaction must be rolled back.
#[derive(Debug, thiserror::Error)]
pub enum ContractError {
    #[error("state error: {0}")]
    Store(#[from] StoreError),

    #[error("codec error: {0}")]
    Codec(#[from] CodecError),
}

pub type ContractResult<T> = Result<T, ContractError>;
