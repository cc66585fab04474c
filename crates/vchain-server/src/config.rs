use std::net::{Ipv4Addr, SocketAddr};

use serde::{Deserialize, Serialize};

/// HTTP server settings.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind_addr: SocketAddr,
    /// Scratch topic created and deleted by the readiness probe.
    pub readiness_topic: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from((Ipv4Addr::LOCALHOST, 8080)),
            readiness_topic: "health".into(),
        }
    }
}
