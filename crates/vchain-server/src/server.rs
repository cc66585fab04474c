use tokio::net::TcpListener;

use vchain_broker::ShutdownSignal;

use crate::config::ServerConfig;
use crate::error::ServerResult;
use crate::router::{build_router, AppState};

/// VoteChain HTTP server.
pub struct VoteServer {
    config: ServerConfig,
    state: AppState,
}

impl VoteServer {
    pub fn new(config: ServerConfig, state: AppState) -> Self {
        Self { config, state }
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Build the router (useful for testing).
    pub fn router(&self) -> axum::Router {
        build_router(self.state.clone())
    }

    /// Serve requests until `shutdown` fires.
    pub async fn serve(self, mut shutdown: ShutdownSignal) -> ServerResult<()> {
        let app = self.router();
        let listener = TcpListener::bind(self.config.bind_addr).await?;
        tracing::info!(addr = %self.config.bind_addr, "HTTP server listening");
        axum::serve(listener, app)
            .with_graceful_shutdown(async move { shutdown.triggered().await })
            .await?;
        tracing::info!("HTTP server stopped");
        Ok(())
    }
}
