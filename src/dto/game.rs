use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::{
    dto::{
        format_system_time,
        validation::{validate_display_name, validate_symbol},
    },
    state::{
        game::Symbol,
        session::{FinishReason, GameSession, SessionResult, SessionStatus},
    },
};

/// Payload of a `play` request.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct PlayRequest {
    /// Name shown on the leaderboard; only used when the player is first seen.
    #[validate(custom(function = "validate_display_name"))]
    pub display_name: String,
}

/// Payload carrying one choice.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct ChoiceRequest {
    #[validate(custom(function = "validate_symbol"))]
    pub symbol: String,
}

/// Structured outbound effect; the transport decides how to render it.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(tag = "effect", rename_all = "snake_case")]
pub enum GameEffect {
    /// Show the sequence to memorise.
    RenderSequence {
        symbols: Vec<String>,
        /// Seconds the sequence stays visible.
        deadline_seconds: u64,
        level: u32,
        attempt: u32,
        max_attempts: u32,
        score: u32,
    },
    /// Ask for the choice at `position` (1-based) out of `total`.
    RenderPrompt {
        position: usize,
        total: usize,
        choices: Vec<String>,
    },
    /// Report the result of an action.
    RenderOutcome { outcome: OutcomeReport },
}

impl GameEffect {
    /// Event name used when the effect travels over SSE.
    pub fn event_name(&self) -> &'static str {
        match self {
            GameEffect::RenderSequence { .. } => "render_sequence",
            GameEffect::RenderPrompt { .. } => "render_prompt",
            GameEffect::RenderOutcome { .. } => "render_outcome",
        }
    }

    /// Prompt for the next choice of a sequence of `total` symbols.
    pub fn prompt(position: usize, total: usize, choices: &[Symbol]) -> Self {
        GameEffect::RenderPrompt {
            position,
            total,
            choices: symbols_to_strings(choices),
        }
    }

    /// Wrap an outcome.
    pub fn outcome(outcome: OutcomeReport) -> Self {
        GameEffect::RenderOutcome { outcome }
    }
}

/// Outcome kinds reported to the player.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum OutcomeReport {
    /// The choice matched; more are expected.
    Correct { position: usize, total: usize },
    /// The sequence was completed.
    LevelUp { points: u32, score: u32, level: u32 },
    /// A choice was out of order; the session is over.
    WrongOrder {
        score: u32,
        expected: Vec<String>,
        submitted: Vec<String>,
    },
    /// The session ran out of time.
    TimedOut { score: u32 },
    /// No attempts left.
    QuotaExceeded { best_score: u32 },
    /// New sessions are refused.
    GameClosed,
}

impl From<&SessionResult> for OutcomeReport {
    fn from(result: &SessionResult) -> Self {
        match result.reason {
            FinishReason::WrongOrder => OutcomeReport::WrongOrder {
                score: result.score,
                expected: symbols_to_strings(&result.expected),
                submitted: symbols_to_strings(&result.submitted),
            },
            FinishReason::TimedOut => OutcomeReport::TimedOut {
                score: result.score,
            },
        }
    }
}

/// Response to a successful `play` request.
#[derive(Debug, Serialize, ToSchema)]
pub struct PlayResponse {
    pub session_id: Uuid,
    pub attempt: u32,
    pub max_attempts: u32,
    /// Effects produced right away; the prompt follows over the event streams.
    pub effects: Vec<GameEffect>,
}

/// Effects produced by one choice.
#[derive(Debug, Serialize, ToSchema)]
pub struct ChoiceResponse {
    pub effects: Vec<GameEffect>,
}

/// Visible status of a live session.
#[derive(Debug, Clone, Copy, Serialize, ToSchema, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum VisibleStatus {
    AwaitingReveal,
    AwaitingInput,
    Finished,
}

impl From<SessionStatus> for VisibleStatus {
    fn from(value: SessionStatus) -> Self {
        match value {
            SessionStatus::AwaitingReveal => VisibleStatus::AwaitingReveal,
            SessionStatus::AwaitingInput => VisibleStatus::AwaitingInput,
            SessionStatus::Finished => VisibleStatus::Finished,
        }
    }
}

/// Read-only view of a player's live session.
#[derive(Debug, Serialize, ToSchema)]
pub struct SessionView {
    pub session_id: Uuid,
    pub status: VisibleStatus,
    pub attempt: u32,
    pub level: u32,
    pub score: u32,
    /// 1-based position of the next expected choice.
    pub position: usize,
    pub total: usize,
    pub remaining_seconds: u64,
    pub started_at: String,
    /// Present only while the sequence is on display.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sequence: Option<Vec<String>>,
}

impl SessionView {
    /// Project a session, hiding the target once input is open.
    pub fn from_session(session: &GameSession, remaining_seconds: u64) -> Self {
        let sequence = (session.status() == SessionStatus::AwaitingReveal)
            .then(|| symbols_to_strings(session.target()));
        Self {
            session_id: session.id(),
            status: session.status().into(),
            attempt: session.attempt(),
            level: session.level(),
            score: session.score(),
            position: session.cursor() + 1,
            total: session.target().len(),
            remaining_seconds,
            started_at: format_system_time(session.started_wall()),
            sequence,
        }
    }
}

pub(crate) fn symbols_to_strings(symbols: &[Symbol]) -> Vec<String> {
    symbols.iter().map(Symbol::to_string).collect()
}
