use serde::Serialize;
use utoipa::ToSchema;

/// Simple health response returned by the `/healthcheck` route.
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    /// Health status, always "ok" while the process serves requests.
    pub status: String,
    /// Number of live sessions.
    pub live_sessions: usize,
    /// Number of known players.
    pub players: usize,
    /// Whether new sessions are refused.
    pub closed: bool,
}

impl HealthResponse {
    /// Create a health response indicating the system is operational.
    pub fn ok(live_sessions: usize, players: usize, closed: bool) -> Self {
        Self {
            status: "ok".to_string(),
            live_sessions,
            players,
            closed,
        }
    }
}
