use utoipa::OpenApi;

#[derive(OpenApi)]
/// Aggregated OpenAPI specification for Emoji Recall Back.
#[openapi(
    paths(
        crate::routes::health::healthcheck,
        crate::routes::public::get_rules,
        crate::routes::public::get_leaderboard,
        crate::routes::public::get_results,
        crate::routes::public::get_player_stats,
        crate::routes::game::play,
        crate::routes::game::choose,
        crate::routes::game::current_session,
        crate::routes::admin::close_game,
        crate::routes::sse::public_stream,
        crate::routes::sse::player_stream,
        crate::routes::websocket::ws_handler,
    ),
    components(
        schemas(
            crate::dto::health::HealthResponse,
            crate::dto::game::PlayRequest,
            crate::dto::game::ChoiceRequest,
            crate::dto::game::GameEffect,
            crate::dto::game::OutcomeReport,
            crate::dto::game::SessionView,
            crate::dto::public::RulesResponse,
            crate::dto::public::LeaderboardResponse,
            crate::dto::public::ResultsResponse,
            crate::dto::public::PlayerStatsResponse,
            crate::dto::admin::CloseGameResponse,
            crate::dto::sse::Handshake,
            crate::dto::sse::LeaderboardChangedEvent,
            crate::dto::sse::GameClosedEvent,
            crate::dto::ws::ChatInboundMessage,
            crate::dto::ws::ChatOutboundMessage,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "public", description = "Rules, leaderboard and statistics"),
        (name = "game", description = "Per-player gameplay"),
        (name = "admin", description = "Administrator operations"),
        (name = "sse", description = "Server-sent events streams"),
        (name = "chat", description = "WebSocket chat transport"),
    )
)]
pub struct ApiDoc;
