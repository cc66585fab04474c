use std::sync::Arc;

use axum::routing::get;
use axum::Router;
use tower_http::trace::TraceLayer;

use vchain_broker::{BrokerAdmin, Producer};
use vchain_ledger::LedgerClient;

use crate::handler;

/// Shared handler state.
#[derive(Clone)]
pub struct AppState {
    pub ledger: LedgerClient,
    pub admin: Arc<dyn BrokerAdmin>,
    pub producer: Arc<dyn Producer>,
    pub readiness_topic: String,
}

/// Build the axum router with all endpoints.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/api/vote/:candidate_id/:passport", get(handler::find_vote))
        .route("/health/readiness", get(handler::readiness))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
