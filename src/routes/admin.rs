use axum::{
    Json, Router,
    body::Body,
    extract::State,
    http::Request,
    middleware::{self, Next},
    response::Response,
    routing::post,
};

use crate::{
    dto::admin::CloseGameResponse, error::AppError, services::admin_service, state::SharedState,
};

const ADMIN_TOKEN_HEADER: &str = "x-admin-token";

/// Admin-only endpoints, guarded by the configured admin token.
pub fn router(state: SharedState) -> Router<SharedState> {
    Router::new()
        .route("/admin/close", post(close_game))
        .route_layer(middleware::from_fn_with_state(state, require_admin_token))
}

/// Stop accepting new sessions. Running sessions are left to finish.
#[utoipa::path(
    post,
    path = "/admin/close",
    tag = "admin",
    params(("X-Admin-Token" = String, Header, description = "Configured admin token")),
    responses(
        (status = 200, description = "Game closed", body = CloseGameResponse),
        (status = 401, description = "Missing or invalid admin token")
    )
)]
pub async fn close_game(State(state): State<SharedState>) -> Json<CloseGameResponse> {
    Json(admin_service::close_game(&state))
}

async fn require_admin_token(
    State(state): State<SharedState>,
    req: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    let provided = req
        .headers()
        .get(ADMIN_TOKEN_HEADER)
        .and_then(|value| value.to_str().ok());

    admin_service::authorize(&state, provided)?;
    Ok(next.run(req).await)
}
