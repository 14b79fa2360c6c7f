use serde::Serialize;
use tracing::warn;

use crate::{
    dto::{
        game::GameEffect,
        sse::{GameClosedEvent, LeaderboardChangedEvent, ServerEvent},
    },
    services::leaderboard_service,
    state::{SharedState, game::PlayerId},
};

const EVENT_LEADERBOARD_CHANGED: &str = "leaderboard_changed";
const EVENT_GAME_CLOSED: &str = "game_closed";

/// Push a gameplay effect that no request is waiting for, such as the prompt after a reveal.
pub fn send_player_effect(state: &SharedState, player_id: PlayerId, effect: &GameEffect) {
    send_event(state, Some(player_id), effect.event_name(), effect, false);
}

/// Mirror effects already returned to the caller onto the streams following `player_id`.
pub fn echo_player_effects(state: &SharedState, player_id: PlayerId, effects: &[GameEffect]) {
    for effect in effects {
        send_event(state, Some(player_id), effect.event_name(), effect, true);
    }
}

/// Broadcast the refreshed leaderboard after a session was committed.
pub async fn broadcast_leaderboard_changed(state: &SharedState) {
    let leaderboard = leaderboard_service::top_n(state, None).await;
    let payload = LeaderboardChangedEvent {
        entries: leaderboard.entries,
    };
    send_event(state, None, EVENT_LEADERBOARD_CHANGED, &payload, false);
}

/// Broadcast that the game no longer accepts new sessions.
pub fn broadcast_game_closed(state: &SharedState) {
    send_event(
        state,
        None,
        EVENT_GAME_CLOSED,
        &GameClosedEvent { closed: true },
        false,
    );
}

fn send_event(
    state: &SharedState,
    player: Option<PlayerId>,
    event: &str,
    payload: &impl Serialize,
    replied: bool,
) {
    match ServerEvent::json(player, Some(event.to_string()), payload) {
        Ok(event) if replied => state.events().broadcast(event.replied()),
        Ok(event) => state.events().broadcast(event),
        Err(err) => warn!(event, error = %err, "failed to serialize event payload"),
    }
}
