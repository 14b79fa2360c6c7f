use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

use crate::dto::{
    admin::CloseGameResponse,
    game::GameEffect,
    public::{LeaderboardResponse, PlayerStatsResponse, ResultsResponse, RulesResponse},
    validation::validate_display_name,
};

/// Prefix of choice callbacks sent as plain text (`pick_🔴`).
const PICK_PREFIX: &str = "pick_";

#[derive(Debug, Deserialize, Serialize, ToSchema)]
/// Messages accepted from chat WebSocket clients.
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ChatInboundMessage {
    /// First message of every connection.
    Identification {
        player_id: i64,
        display_name: String,
        #[serde(default)]
        admin_token: Option<String>,
    },
    /// Slash command such as `/play`, or a `pick_<symbol>` callback.
    Command { text: String },
    /// Choice button press.
    Pick { symbol: String },
    #[serde(other)]
    Unknown,
}

/// Failure to decode an inbound chat message.
#[derive(Debug, Error)]
pub enum ChatMessageError {
    #[error("malformed message: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error("invalid display name: {0}")]
    InvalidDisplayName(String),
}

impl ChatInboundMessage {
    /// Parse a text frame and validate its fields.
    pub fn from_json_str(raw: &str) -> Result<Self, ChatMessageError> {
        let message: Self = serde_json::from_str(raw)?;
        if let Self::Identification { display_name, .. } = &message {
            validate_display_name(display_name)
                .map_err(|err| ChatMessageError::InvalidDisplayName(err.to_string()))?;
        }
        Ok(message)
    }
}

/// Chat commands understood by the socket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatCommand {
    /// Show the rules.
    Start,
    /// Start a session.
    Play,
    /// Show the leaderboard.
    Leaderboard,
    /// Show personal statistics.
    MyStats,
    /// Close the game (admin only).
    Close,
    /// Show the final results.
    Results,
    /// Submit a choice.
    Pick(String),
}

/// Text that is neither a known command nor a choice callback.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown command `{0}`")]
pub struct UnknownCommand(pub String);

impl FromStr for ChatCommand {
    type Err = UnknownCommand;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        let text = text.trim();
        if let Some(symbol) = text.strip_prefix(PICK_PREFIX) {
            return Ok(ChatCommand::Pick(symbol.to_string()));
        }

        // `/play@some_bot extra` addresses the same command as `/play`.
        let name = text
            .split_whitespace()
            .next()
            .unwrap_or_default()
            .split('@')
            .next()
            .unwrap_or_default()
            .to_ascii_lowercase();

        match name.as_str() {
            "/start" | "/help" => Ok(ChatCommand::Start),
            "/play" => Ok(ChatCommand::Play),
            "/leaderboard" => Ok(ChatCommand::Leaderboard),
            "/mystats" => Ok(ChatCommand::MyStats),
            "/close" => Ok(ChatCommand::Close),
            "/results" => Ok(ChatCommand::Results),
            _ => Err(UnknownCommand(text.to_string())),
        }
    }
}

/// Command names listed with the rules.
pub const COMMANDS: [&str; 6] = [
    "/start",
    "/play",
    "/leaderboard",
    "/mystats",
    "/results",
    "/close",
];

#[derive(Debug, Serialize, ToSchema)]
/// Messages pushed to chat WebSocket clients.
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ChatOutboundMessage {
    /// Identification accepted.
    Welcome { player_id: i64, admin: bool },
    /// Effects answering the player's own `/play` or pick.
    Effects { effects: Vec<GameEffect> },
    /// Event from the hub: a delayed gameplay effect for this player or a public notice.
    Event {
        event: String,
        #[schema(value_type = Object)]
        data: serde_json::Value,
    },
    Rules { rules: RulesResponse },
    Leaderboard { leaderboard: LeaderboardResponse },
    Stats { stats: PlayerStatsResponse },
    Results { results: ResultsResponse },
    Closed { close: CloseGameResponse },
    /// Request could not be served.
    Error { kind: String, message: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_commands() {
        assert_eq!("/play".parse(), Ok(ChatCommand::Play));
        assert_eq!(" /PLAY@recall_bot now ".parse(), Ok(ChatCommand::Play));
        assert_eq!("/mystats".parse(), Ok(ChatCommand::MyStats));
        assert_eq!("pick_🔴".parse(), Ok(ChatCommand::Pick("🔴".into())));
        assert_eq!(
            "/dance".parse::<ChatCommand>(),
            Err(UnknownCommand("/dance".into()))
        );
    }

    #[test]
    fn parses_inbound_messages() {
        let message = ChatInboundMessage::from_json_str(
            r#"{"type":"identification","player_id":42,"display_name":"Anna"}"#,
        )
        .unwrap();
        assert!(matches!(
            message,
            ChatInboundMessage::Identification {
                player_id: 42,
                admin_token: None,
                ..
            }
        ));

        let message = ChatInboundMessage::from_json_str(r#"{"type":"wave"}"#).unwrap();
        assert!(matches!(message, ChatInboundMessage::Unknown));
    }

    #[test]
    fn rejects_blank_display_name() {
        let err = ChatInboundMessage::from_json_str(
            r#"{"type":"identification","player_id":1,"display_name":"  "}"#,
        )
        .unwrap_err();
        assert!(matches!(err, ChatMessageError::InvalidDisplayName(_)));
    }
}
