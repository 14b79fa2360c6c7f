use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{get, post},
};
use axum_valid::Valid;

use crate::{
    dto::game::{ChoiceRequest, ChoiceResponse, PlayRequest, PlayResponse, SessionView},
    error::AppError,
    services::session_service,
    state::{SharedState, game::PlayerId},
};

/// Per-player gameplay endpoints.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/players/{id}/play", post(play))
        .route("/players/{id}/choice", post(choose))
        .route("/players/{id}/session", get(current_session))
}

/// Start a new session for the player.
#[utoipa::path(
    post,
    path = "/players/{id}/play",
    tag = "game",
    params(("id" = i64, Path, description = "Player identifier")),
    request_body = PlayRequest,
    responses(
        (status = 200, description = "Session started; the sequence is on display", body = PlayResponse),
        (status = 403, description = "The game is closed"),
        (status = 409, description = "A session is already in progress"),
        (status = 429, description = "No attempts left")
    )
)]
pub async fn play(
    State(state): State<SharedState>,
    Path(player_id): Path<PlayerId>,
    Valid(Json(payload)): Valid<Json<PlayRequest>>,
) -> Result<Json<PlayResponse>, AppError> {
    let response =
        session_service::start_session(&state, player_id, payload.display_name.trim()).await?;
    Ok(Json(response))
}

/// Submit the next symbol of the sequence.
#[utoipa::path(
    post,
    path = "/players/{id}/choice",
    tag = "game",
    params(("id" = i64, Path, description = "Player identifier")),
    request_body = ChoiceRequest,
    responses(
        (status = 200, description = "Choice processed", body = ChoiceResponse),
        (status = 400, description = "Symbol is not one of the choices"),
        (status = 404, description = "No active session"),
        (status = 409, description = "The sequence is still on display")
    )
)]
pub async fn choose(
    State(state): State<SharedState>,
    Path(player_id): Path<PlayerId>,
    Valid(Json(payload)): Valid<Json<ChoiceRequest>>,
) -> Result<Json<ChoiceResponse>, AppError> {
    let response = session_service::submit_choice(&state, player_id, &payload.symbol).await?;
    Ok(Json(response))
}

/// Inspect the player's live session.
#[utoipa::path(
    get,
    path = "/players/{id}/session",
    tag = "game",
    params(("id" = i64, Path, description = "Player identifier")),
    responses(
        (status = 200, description = "Live session", body = SessionView),
        (status = 404, description = "No active session")
    )
)]
pub async fn current_session(
    State(state): State<SharedState>,
    Path(player_id): Path<PlayerId>,
) -> Result<Json<SessionView>, AppError> {
    Ok(Json(session_service::current_session(&state, player_id)?))
}
