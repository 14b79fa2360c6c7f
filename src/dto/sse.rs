use serde::Serialize;
use utoipa::ToSchema;

use crate::{dto::public::LeaderboardEntry, state::game::PlayerId};

#[derive(Clone, Debug)]
/// Dispatched payload carried across the event hub.
pub struct ServerEvent {
    /// Player the event is addressed to; `None` reaches every subscriber.
    pub player: Option<PlayerId>,
    pub event: Option<String>,
    pub data: String,
    /// Also handed back to the request that produced it; chat sockets skip it.
    pub replied: bool,
}

impl ServerEvent {
    /// Convenience wrapper that serialises `payload` into the SSE data field.
    pub fn json<E, T>(player: Option<PlayerId>, event: E, payload: &T) -> serde_json::Result<Self>
    where
        E: Into<Option<String>>,
        T: Serialize,
    {
        Ok(Self {
            player,
            event: event.into(),
            data: serde_json::to_string(payload)?,
            replied: false,
        })
    }

    /// Mark the event as already delivered in a request response.
    pub fn replied(mut self) -> Self {
        self.replied = true;
        self
    }

    /// Whether a subscriber following `player` should receive this event.
    pub fn is_visible_to(&self, player: Option<PlayerId>) -> bool {
        match self.player {
            None => true,
            Some(target) => player == Some(target),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
/// Initial metadata sent to an SSE client when it connects.
pub struct Handshake {
    /// Identifier of the SSE stream (`public` or `player`).
    pub stream: String,
    /// Human-readable message confirming the subscription.
    pub message: String,
    /// Whether new sessions are currently refused.
    pub closed: bool,
}

#[derive(Debug, Serialize, ToSchema)]
/// Broadcast after a session finishes and the standings may have moved.
pub struct LeaderboardChangedEvent {
    pub entries: Vec<LeaderboardEntry>,
}

#[derive(Debug, Serialize, ToSchema)]
/// Broadcast once when an administrator closes the game.
pub struct GameClosedEvent {
    pub closed: bool,
}
