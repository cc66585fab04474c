use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use serde::Serialize;
use tracing::error;

use vchain_ledger::LedgerError;

/// Errors from running the server.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type ServerResult<T> = Result<T, ServerError>;

/// Error code for malformed request parameters.
pub const CODE_INVALID_INPUT: u32 = 1;
/// Error code for a lookup that matched no vote.
pub const CODE_VOTE_NOT_FOUND: u32 = 2;

/// Body of a 400 response.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ClientError {
    pub code: u32,
    pub error: String,
}

/// Error returned by API handlers.
#[derive(Debug)]
pub enum ApiError {
    /// A recognized domain error: 400 with a [`ClientError`] body.
    Client(ClientError),
    /// Anything else: logged, 500 without a body.
    Internal(String),
}

impl ApiError {
    pub fn invalid_input(error: impl Into<String>) -> Self {
        Self::Client(ClientError {
            code: CODE_INVALID_INPUT,
            error: error.into(),
        })
    }
}

impl From<LedgerError> for ApiError {
    fn from(err: LedgerError) -> Self {
        match err {
            LedgerError::InvalidInput(_) => Self::invalid_input(err.to_string()),
            LedgerError::VoteNotFound => Self::Client(ClientError {
                code: CODE_VOTE_NOT_FOUND,
                error: err.to_string(),
            }),
            other => Self::Internal(other.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            Self::Client(body) => (StatusCode::BAD_REQUEST, Json(body)).into_response(),
            Self::Internal(message) => {
                error!(error = %message, "internal server error");
                StatusCode::INTERNAL_SERVER_ERROR.into_response()
            }
        }
    }
}
