//! Administrator operations: authorizing admin callers and closing the game.

use tracing::{info, warn};

use crate::{
    dto::admin::CloseGameResponse, error::ServiceError, services::sse_events, state::SharedState,
};

/// Check a caller-supplied token against the configured admin token.
///
/// Without a configured token nobody is an administrator.
pub fn authorize(state: &SharedState, provided: Option<&str>) -> Result<(), ServiceError> {
    let Some(expected) = state.config().admin_token() else {
        return Err(ServiceError::Unauthorized(
            "no admin token configured".into(),
        ));
    };

    match provided {
        Some(token) if token == expected => Ok(()),
        Some(_) => {
            warn!("admin token mismatch");
            Err(ServiceError::Unauthorized("invalid admin token".into()))
        }
        None => Err(ServiceError::Unauthorized(
            "missing admin token".into(),
        )),
    }
}

/// Refuse every future play request. Sessions already running are left to finish.
///
/// Idempotent: only the first call broadcasts the closure.
pub fn close_game(state: &SharedState) -> CloseGameResponse {
    let newly_closed = state.gate().close();
    let sessions_in_flight = state.sessions().len();

    if newly_closed {
        info!(sessions_in_flight, "game closed by administrator");
        sse_events::broadcast_game_closed(state);
    } else {
        info!("close requested but game was already closed");
    }

    CloseGameResponse {
        closed: true,
        already_closed: !newly_closed,
        sessions_in_flight,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{config::AppConfig, state::AppState};

    #[test]
    fn authorize_requires_matching_token() {
        let state = AppState::new(AppConfig::default().with_admin_token(Some("s3cret".into())));
        assert!(authorize(&state, Some("s3cret")).is_ok());
        assert!(matches!(
            authorize(&state, Some("guess")),
            Err(ServiceError::Unauthorized(_))
        ));
        assert!(matches!(
            authorize(&state, None),
            Err(ServiceError::Unauthorized(_))
        ));
    }

    #[test]
    fn authorize_fails_without_configured_token() {
        let state = AppState::new(AppConfig::default());
        assert!(authorize(&state, Some("anything")).is_err());
    }

    #[tokio::test]
    async fn close_is_idempotent_and_broadcast_once() {
        let state = AppState::new(AppConfig::default());
        let mut events = state.events().subscribe();

        let first = close_game(&state);
        assert!(first.closed);
        assert!(!first.already_closed);

        let second = close_game(&state);
        assert!(second.already_closed);
        assert!(state.gate().is_closed());

        let event = events.recv().await.unwrap();
        assert_eq!(event.event.as_deref(), Some("game_closed"));
        assert!(events.try_recv().is_err());
    }
}
