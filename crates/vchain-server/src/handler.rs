use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::Json;
use serde::Serialize;
use tracing::{debug, warn};

use vchain_broker::ProducerRecord;
use vchain_types::{parse_candidate_id, Vote};

use crate::error::ApiError;
use crate::router::AppState;

/// Body of the readiness response.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct HealthStatus {
    pub status: String,
}

/// `GET /api/vote/:candidate_id/:passport`
pub async fn find_vote(
    State(state): State<AppState>,
    Path((candidate_id, passport)): Path<(String, String)>,
) -> Result<Json<Vote>, ApiError> {
    let candidate_id =
        parse_candidate_id(&candidate_id).map_err(|e| ApiError::invalid_input(e.to_string()))?;
    let vote = state.ledger.find_vote(candidate_id, &passport).await?;
    debug!(candidate_id, %passport, status = %vote.status, "vote found");
    Ok(Json(vote))
}

/// `GET /health/readiness`: create, publish to, and delete a scratch topic.
pub async fn readiness(State(state): State<AppState>) -> (StatusCode, Json<HealthStatus>) {
    let topic = state.readiness_topic.as_str();

    if let Err(e) = state.admin.create_topic(topic, 1).await {
        return unhealthy("broker admin", e);
    }
    if let Err(e) = state.producer.send(ProducerRecord::new(topic, Vec::new())).await {
        if let Err(cleanup) = state.admin.delete_topic(topic).await {
            warn!(%topic, error = %cleanup, "failed to delete readiness topic");
        }
        return unhealthy("broker", e);
    }
    if let Err(e) = state.admin.delete_topic(topic).await {
        return unhealthy("broker admin", e);
    }

    (
        StatusCode::OK,
        Json(HealthStatus {
            status: "ok".into(),
        }),
    )
}

fn unhealthy(component: &str, err: impl std::fmt::Display) -> (StatusCode, Json<HealthStatus>) {
    warn!(component, error = %err, "readiness check failed");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(HealthStatus {
            status: format!("{component}: {err}"),
        }),
    )
}
