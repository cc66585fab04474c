/// Status codes carried by a contract [`Response`].
pub mod status {
    /// The invocation succeeded.
    pub const OK: i32 = 200;
    /// The arguments could not be understood.
    pub const BAD_REQUEST: i32 = 400;
    /// The contract rejected the request on business grounds.
    pub const ERROR: i32 = 500;
}

/// Result of a contract entry point.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Response {
    pub status: i32,
    pub message: String,
    pub payload: Vec<u8>,
}

impl Response {
    pub fn ok(payload: Vec<u8>) -> Self {
        Self {
            status: status::OK,
            message: String::new(),
            payload,
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: status::BAD_REQUEST,
            message: message.into(),
            payload: Vec::new(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            status: status::ERROR,
            message: message.into(),
            payload: Vec::new(),
        }
    }

    pub fn is_ok(&self) -> bool {
        self.status == status::OK
    }
}
