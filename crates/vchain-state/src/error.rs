/// Errors from world-state operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    /// The storage backend could not be reached or failed mid-operation.
    #[error("storage unavailable: {0}")]
    Unavailable(String),

    /// Empty keys are not addressable.
    #[error("empty state key")]
    EmptyKey,

    /// Storage backend is read-only (e.g. during a query transaction).
    #[error("state is read-only")]
    ReadOnly,
}

/// Result alias for world-state operations.
pub type StoreResult<T> = Result<T, StoreError>;
