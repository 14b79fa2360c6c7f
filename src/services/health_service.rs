use crate::{dto::health::HealthResponse, state::SharedState};

/// Summarize the in-memory state for the health endpoint.
pub async fn health_status(state: &SharedState) -> HealthResponse {
    HealthResponse::ok(
        state.sessions().len(),
        state.records().len().await,
        state.gate().is_closed(),
    )
}
