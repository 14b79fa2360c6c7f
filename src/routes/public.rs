use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::get,
};

use crate::{
    dto::{
        public::{
            LeaderboardQuery, LeaderboardResponse, PlayerStatsResponse, ResultsResponse,
            RulesResponse, StatsQuery,
        },
        validation::validate_display_name,
    },
    error::AppError,
    services::{leaderboard_service, public_service},
    state::{SharedState, game::PlayerId},
};

/// Public read-only endpoints.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/rules", get(get_rules))
        .route("/leaderboard", get(get_leaderboard))
        .route("/results", get(get_results))
        .route("/players/{id}/stats", get(get_player_stats))
}

#[utoipa::path(
    get,
    path = "/rules",
    tag = "public",
    responses((status = 200, description = "Rules, scoring table and commands", body = RulesResponse))
)]
/// Return the rules of the game.
pub async fn get_rules(State(state): State<SharedState>) -> Json<RulesResponse> {
    Json(public_service::rules(&state))
}

#[utoipa::path(
    get,
    path = "/leaderboard",
    tag = "public",
    params(LeaderboardQuery),
    responses((status = 200, description = "Players ranked by best score", body = LeaderboardResponse))
)]
/// Return the top players.
pub async fn get_leaderboard(
    State(state): State<SharedState>,
    Query(query): Query<LeaderboardQuery>,
) -> Json<LeaderboardResponse> {
    Json(leaderboard_service::top_n(&state, query.limit).await)
}

#[utoipa::path(
    get,
    path = "/results",
    tag = "public",
    responses((status = 200, description = "Podium or flat ranking", body = ResultsResponse))
)]
/// Return the final results.
pub async fn get_results(State(state): State<SharedState>) -> Json<ResultsResponse> {
    Json(leaderboard_service::results(&state).await)
}

#[utoipa::path(
    get,
    path = "/players/{id}/stats",
    tag = "public",
    params(("id" = i64, Path, description = "Player identifier"), StatsQuery),
    responses(
        (status = 200, description = "Personal statistics", body = PlayerStatsResponse),
        (status = 400, description = "Invalid display name")
    )
)]
/// Return a player's personal statistics.
pub async fn get_player_stats(
    State(state): State<SharedState>,
    Path(player_id): Path<PlayerId>,
    Query(query): Query<StatsQuery>,
) -> Result<Json<PlayerStatsResponse>, AppError> {
    let display_name = query
        .display_name
        .as_deref()
        .map(str::trim)
        .filter(|name| !name.is_empty());
    if let Some(name) = display_name {
        validate_display_name(name)
            .map_err(|err| AppError::BadRequest(format!("invalid display name: {err}")))?;
    }
    Ok(Json(
        leaderboard_service::player_stats(&state, player_id, display_name).await,
    ))
}
