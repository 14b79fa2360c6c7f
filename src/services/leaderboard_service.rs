//! Read-side projections of the player records: leaderboard, final results and personal stats.

use crate::{
    dto::{
        format_system_time,
        public::{LeaderboardEntry, LeaderboardResponse, PlayerStatsResponse, ResultsResponse},
    },
    state::{SharedState, game::PlayerId, records::PlayerRecord},
};

/// Number of slots on the podium.
const PODIUM_SIZE: usize = 3;

/// Rank `records` by best score, highest first.
///
/// The sort is stable, so players with equal scores keep the order in which they were first seen.
pub fn rank(records: &[PlayerRecord], max_attempts: u32) -> Vec<LeaderboardEntry> {
    let mut ordered: Vec<&PlayerRecord> = records.iter().collect();
    ordered.sort_by(|a, b| b.best_score.cmp(&a.best_score));

    ordered
        .into_iter()
        .enumerate()
        .map(|(index, record)| LeaderboardEntry {
            rank: index + 1,
            display_name: record.display_name.clone(),
            best_score: record.best_score,
            attempts_used: record.attempts_used,
            max_attempts,
        })
        .collect()
}

/// Shape a full ranking into the results layout.
pub fn podium(ranked: Vec<LeaderboardEntry>) -> ResultsResponse {
    let total_players = ranked.len();
    if total_players < PODIUM_SIZE {
        return ResultsResponse::Ranked {
            entries: ranked,
            total_players,
        };
    }

    let mut top = ranked.into_iter();
    match (top.next(), top.next(), top.next()) {
        (Some(first), Some(second), Some(third)) => ResultsResponse::Podium {
            first,
            second,
            third,
            total_players,
        },
        _ => ResultsResponse::Ranked {
            entries: Vec::new(),
            total_players,
        },
    }
}

/// Top `limit` players, defaulting to the configured leaderboard size.
pub async fn top_n(state: &SharedState, limit: Option<usize>) -> LeaderboardResponse {
    let limit = limit.unwrap_or(state.rules().leaderboard_top_n);
    let records = state.records().snapshot().await;
    let mut entries = rank(&records, state.records().max_attempts());
    entries.truncate(limit);
    LeaderboardResponse { entries }
}

/// Final results across every player seen so far.
pub async fn results(state: &SharedState) -> ResultsResponse {
    let records = state.records().snapshot().await;
    podium(rank(&records, state.records().max_attempts()))
}

/// Personal statistics, creating the record when the player is new.
pub async fn player_stats(
    state: &SharedState,
    player_id: PlayerId,
    display_name: Option<&str>,
) -> PlayerStatsResponse {
    let fallback = format!("Player {player_id}");
    let record = state
        .records()
        .get_or_create(player_id, display_name.unwrap_or(&fallback))
        .await;
    let max_attempts = state.records().max_attempts();

    PlayerStatsResponse {
        player_id: record.player_id,
        display_name: record.display_name.clone(),
        attempts_used: record.attempts_used,
        max_attempts,
        attempts_remaining: state.records().quota_remaining(player_id).await,
        best_score: record.best_score,
        average_score: (record.average_score() * 10.0).round() / 10.0,
        score_history: record.score_history.clone(),
        first_seen_at: format_system_time(record.first_seen_at),
    }
}
