//! HTTP server for VoteChain.
//!
//! Serves vote lookups by candidate and passport through the ledger client,
//! and a readiness probe that round-trips a scratch topic through the broker.

pub mod config;
pub mod error;
pub mod handler;
pub mod router;
pub mod server;

pub use config::ServerConfig;
pub use error::{ApiError, ClientError, ServerError, ServerResult};
pub use handler::HealthStatus;
pub use router::{build_router, AppState};
pub use server::VoteServer;
