use std::convert::Infallible;

use axum::{
    Router,
    extract::{Path, State},
    response::sse::{Event, Sse},
    routing::get,
};
use futures::Stream;
use tracing::info;

use crate::{
    services::sse_service::{self, StreamKind},
    state::{SharedState, game::PlayerId},
};

#[utoipa::path(
    get,
    path = "/sse/public",
    tag = "sse",
    responses((status = 200, description = "Public SSE stream", content_type = "text/event-stream", body = String))
)]
/// Stream leaderboard changes and closure notices.
pub async fn public_stream(
    State(state): State<SharedState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let receiver = sse_service::subscribe(&state);
    info!("new public SSE connection");
    let greeting = sse_service::handshake(&state, StreamKind::Public);
    sse_service::to_sse_stream(receiver, StreamKind::Public, greeting)
}

#[utoipa::path(
    get,
    path = "/sse/players/{id}",
    tag = "sse",
    params(("id" = i64, Path, description = "Player identifier")),
    responses((status = 200, description = "Player SSE stream", content_type = "text/event-stream", body = String))
)]
/// Stream the gameplay effects of one player alongside the public events.
pub async fn player_stream(
    State(state): State<SharedState>,
    Path(player_id): Path<PlayerId>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let receiver = sse_service::subscribe(&state);
    info!(player_id, "new player SSE connection");
    let kind = StreamKind::Player(player_id);
    let greeting = sse_service::handshake(&state, kind);
    sse_service::to_sse_stream(receiver, kind, greeting)
}

/// Configure the SSE endpoints.
pub fn router() -> Router<SharedState> {
    Router::<SharedState>::new()
        .route("/sse/public", get(public_stream))
        .route("/sse/players/{id}", get(player_stream))
}
