use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

/// One level of the scoring table shown with the rules.
#[derive(Debug, Serialize, ToSchema)]
pub struct ScoringTier {
    pub level: u32,
    pub sequence_length: usize,
    pub points: u32,
    /// True for the last tier, which applies to every later level as well.
    pub and_beyond: bool,
}

/// Rules and commands shown when a player starts talking to the game.
#[derive(Debug, Serialize, ToSchema)]
pub struct RulesResponse {
    pub reveal_seconds: u64,
    pub time_budget_seconds: u64,
    pub max_attempts: u32,
    pub symbols: Vec<String>,
    pub scoring: Vec<ScoringTier>,
    pub commands: Vec<String>,
    /// Whether new sessions are currently refused.
    pub closed: bool,
}

/// Optional limit on the number of leaderboard entries.
#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct LeaderboardQuery {
    /// Defaults to the configured top-N.
    pub limit: Option<usize>,
}

/// Display name supplied alongside a stats request.
#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct StatsQuery {
    /// Used only when the player is seen for the first time.
    pub display_name: Option<String>,
}

/// Ranked player as shown on the leaderboard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct LeaderboardEntry {
    pub rank: usize,
    pub display_name: String,
    pub best_score: u32,
    pub attempts_used: u32,
    pub max_attempts: u32,
}

/// Leaderboard ordered by best score.
#[derive(Debug, Serialize, ToSchema)]
pub struct LeaderboardResponse {
    pub entries: Vec<LeaderboardEntry>,
}

/// Final results: a podium when at least three players took part, a flat ranking otherwise.
#[derive(Debug, PartialEq, Eq, Serialize, ToSchema)]
#[serde(tag = "layout", rename_all = "snake_case")]
pub enum ResultsResponse {
    Podium {
        first: LeaderboardEntry,
        second: LeaderboardEntry,
        third: LeaderboardEntry,
        total_players: usize,
    },
    Ranked {
        entries: Vec<LeaderboardEntry>,
        total_players: usize,
    },
}

/// Personal statistics of a player.
#[derive(Debug, Serialize, ToSchema)]
pub struct PlayerStatsResponse {
    pub player_id: i64,
    pub display_name: String,
    pub attempts_used: u32,
    pub max_attempts: u32,
    pub attempts_remaining: u32,
    pub best_score: u32,
    /// Mean final score rounded to one decimal.
    pub average_score: f64,
    pub score_history: Vec<u32>,
    pub first_seen_at: String,
}
