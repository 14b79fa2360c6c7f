//! Session manager: creates sessions, routes choices into them, schedules the reveal delay and
//! commits finished sessions to the player records.

use dashmap::mapref::entry::Entry;
use tokio::time::{Instant, sleep};
use tracing::{debug, info, warn};

use crate::{
    dto::game::{
        ChoiceResponse, GameEffect, OutcomeReport, PlayResponse, SessionView, symbols_to_strings,
    },
    error::ServiceError,
    services::sse_events,
    state::{
        SharedState,
        game::{PlayerId, SessionId, Symbol},
        records::QuotaExhausted,
        session::{ChoiceOutcome, FinishReason, GameSession, SessionError, SessionResult},
    },
};

/// Start a new session for `player_id`.
///
/// Refused when the game is closed, when the player has a live session that is still within its
/// time budget, or when the attempt quota is used up. An overdue live session is finalized as
/// timed out first.
pub async fn start_session(
    state: &SharedState,
    player_id: PlayerId,
    display_name: &str,
) -> Result<PlayResponse, ServiceError> {
    if state.gate().is_closed() {
        info!(player_id, "play refused: game closed");
        sse_events::echo_player_effects(
            state,
            player_id,
            &[GameEffect::outcome(OutcomeReport::GameClosed)],
        );
        return Err(SessionError::GameClosed.into());
    }

    settle_existing_session(state, player_id).await?;

    let rules = state.rules();
    let target = state
        .sequences()
        .generate(&rules.alphabet, rules.initial_sequence_length)?;

    let attempt = match state.records().reserve_attempt(player_id, display_name).await {
        Ok(attempt) => attempt,
        Err(QuotaExhausted { best_score }) => {
            info!(player_id, best_score, "play refused: attempt quota exhausted");
            sse_events::echo_player_effects(
                state,
                player_id,
                &[GameEffect::outcome(OutcomeReport::QuotaExceeded { best_score })],
            );
            return Err(SessionError::QuotaExceeded { best_score }.into());
        }
    };

    let session = GameSession::start(player_id, attempt, target.clone(), Instant::now());
    let session_id = session.id();
    let inserted = match state.sessions().entry(player_id) {
        Entry::Occupied(_) => false,
        Entry::Vacant(slot) => {
            slot.insert(session);
            true
        }
    };
    if !inserted {
        warn!(player_id, "concurrent play request lost the race for the session slot");
        state.records().release_attempt(player_id).await;
        return Err(SessionError::SessionInProgress.into());
    }

    info!(player_id, session_id = %session_id, attempt, "session started");

    let effects = vec![reveal_effect(state, &target, 1, attempt, 0)];
    sse_events::echo_player_effects(state, player_id, &effects);
    schedule_reveal(state, player_id, session_id, 1);

    Ok(PlayResponse {
        session_id,
        attempt,
        max_attempts: rules.max_attempts,
        effects,
    })
}

/// Feed one choice into the player's live session.
pub async fn submit_choice(
    state: &SharedState,
    player_id: PlayerId,
    raw_symbol: &str,
) -> Result<ChoiceResponse, ServiceError> {
    let symbol = Symbol::new(raw_symbol.trim());

    let (session_id, attempt, outcome) = {
        let Some(mut session) = state.sessions().get_mut(&player_id) else {
            warn!(player_id, "choice ignored: no active session");
            return Err(SessionError::NoActiveSession.into());
        };
        let outcome = session
            .submit(symbol, Instant::now(), state.rules(), state.sequences())
            .inspect_err(|err| warn!(player_id, error = %err, "choice rejected"))?;
        (session.id(), session.attempt(), outcome)
    };

    let effects = match outcome {
        ChoiceOutcome::Correct { position, total } => {
            debug!(player_id, session_id = %session_id, position, total, "choice accepted");
            vec![
                GameEffect::outcome(OutcomeReport::Correct { position, total }),
                GameEffect::prompt(position + 1, total, state.rules().alphabet.symbols()),
            ]
        }
        ChoiceOutcome::LevelUp {
            points,
            score,
            level,
            sequence,
        } => {
            info!(player_id, session_id = %session_id, level, score, "level cleared");
            schedule_reveal(state, player_id, session_id, level);
            vec![
                GameEffect::outcome(OutcomeReport::LevelUp {
                    points,
                    score,
                    level,
                }),
                reveal_effect(state, &sequence, level, attempt, score),
            ]
        }
        ChoiceOutcome::Finished(result) => {
            finalize(state, &result).await;
            vec![GameEffect::outcome(OutcomeReport::from(&result))]
        }
    };

    sse_events::echo_player_effects(state, player_id, &effects);
    Ok(ChoiceResponse { effects })
}

/// Read-only view of the player's live session.
pub fn current_session(
    state: &SharedState,
    player_id: PlayerId,
) -> Result<SessionView, ServiceError> {
    let session = state
        .sessions()
        .get(&player_id)
        .ok_or(ServiceError::NoActiveSession)?;
    let remaining = session.remaining(Instant::now(), state.rules().time_budget);
    Ok(SessionView::from_session(&session, remaining.as_secs()))
}

/// Open input for `level` of the given session, unless it moved on or disappeared meanwhile.
///
/// Returns whether the prompt was issued.
pub fn complete_reveal(
    state: &SharedState,
    player_id: PlayerId,
    session_id: SessionId,
    level: u32,
) -> bool {
    let prompt = {
        let Some(mut session) = state.sessions().get_mut(&player_id) else {
            debug!(player_id, session_id = %session_id, "reveal elapsed after session ended");
            return false;
        };
        if session.id() != session_id || !session.reveal_elapsed(level) {
            debug!(player_id, session_id = %session_id, level, "stale reveal ignored");
            return false;
        }
        GameEffect::prompt(1, session.target().len(), state.rules().alphabet.symbols())
    };

    sse_events::send_player_effect(state, player_id, &prompt);
    true
}

/// Finalize every live session past its time budget. Returns how many were expired.
pub async fn expire_overdue_sessions(state: &SharedState) -> usize {
    let now = Instant::now();
    let budget = state.rules().time_budget;
    let overdue: Vec<(PlayerId, SessionId)> = state
        .sessions()
        .iter()
        .filter(|entry| entry.is_expired(now, budget))
        .map(|entry| (*entry.key(), entry.id()))
        .collect();

    let mut expired = 0;
    for (player_id, session_id) in overdue {
        let result = match state.sessions().get_mut(&player_id) {
            Some(mut session) if session.id() == session_id => session.expire(),
            _ => None,
        };
        if let Some(result) = result
            && finalize(state, &result).await
        {
            sse_events::send_player_effect(
                state,
                player_id,
                &GameEffect::outcome(OutcomeReport::from(&result)),
            );
            expired += 1;
        }
    }
    expired
}

/// Make room for a new session: finalize an overdue one, refuse if one is still running.
async fn settle_existing_session(
    state: &SharedState,
    player_id: PlayerId,
) -> Result<(), ServiceError> {
    let result = {
        let Some(mut session) = state.sessions().get_mut(&player_id) else {
            return Ok(());
        };
        if !session.is_expired(Instant::now(), state.rules().time_budget) {
            info!(player_id, session_id = %session.id(), "play refused: session in progress");
            return Err(SessionError::SessionInProgress.into());
        }
        session.expire()
    };

    if let Some(result) = result
        && finalize(state, &result).await
    {
        sse_events::send_player_effect(
            state,
            player_id,
            &GameEffect::outcome(OutcomeReport::from(&result)),
        );
    }
    Ok(())
}

/// Remove a finished session and commit its score.
///
/// Only the caller that actually removes the session records it, so each session is committed
/// exactly once.
async fn finalize(state: &SharedState, result: &SessionResult) -> bool {
    let removed = state
        .sessions()
        .remove_if(&result.player_id, |_, session| {
            session.id() == result.session_id
        })
        .is_some();
    if !removed {
        debug!(player_id = result.player_id, session_id = %result.session_id, "session already finalized");
        return false;
    }

    state
        .records()
        .record_finish(result.player_id, result.score)
        .await;

    let reason = match result.reason {
        FinishReason::WrongOrder => "wrong_order",
        FinishReason::TimedOut => "timed_out",
    };
    info!(
        player_id = result.player_id,
        session_id = %result.session_id,
        reason,
        level = result.level,
        score = result.score,
        "session finished"
    );

    sse_events::broadcast_leaderboard_changed(state).await;
    true
}

fn reveal_effect(
    state: &SharedState,
    sequence: &[Symbol],
    level: u32,
    attempt: u32,
    score: u32,
) -> GameEffect {
    let rules = state.rules();
    GameEffect::RenderSequence {
        symbols: symbols_to_strings(sequence),
        deadline_seconds: rules.reveal_duration.as_secs(),
        level,
        attempt,
        max_attempts: rules.max_attempts,
        score,
    }
}

/// Flip the session to input once the reveal delay has passed, without blocking the caller.
fn schedule_reveal(state: &SharedState, player_id: PlayerId, session_id: SessionId, level: u32) {
    let state = state.clone();
    let delay = state.rules().reveal_duration;
    tokio::spawn(async move {
        sleep(delay).await;
        complete_reveal(&state, player_id, session_id, level);
    });
}

#[cfg(test)]
mod tests {
    use std::{sync::Arc, time::Duration};

    use super::*;
    use crate::{
        config::{AppConfig, GameRules},
        dto::game::VisibleStatus,
        state::{
            AppState,
            game::Alphabet,
            sequence::{SequenceError, SequenceSource, check_length},
        },
    };

    /// Always the first `length` symbols of the alphabet, in order.
    struct Prefix;

    impl SequenceSource for Prefix {
        fn generate(
            &self,
            alphabet: &Alphabet,
            length: usize,
        ) -> Result<Vec<Symbol>, SequenceError> {
            check_length(alphabet, length)?;
            Ok(alphabet.symbols()[..length].to_vec())
        }
    }

    fn state_with(rules: GameRules) -> SharedState {
        AppState::with_sequence_source(AppConfig::default().with_rules(rules), Arc::new(Prefix))
    }

    fn state() -> SharedState {
        state_with(GameRules::default())
    }

    fn symbol(state: &SharedState, index: usize) -> String {
        state.rules().alphabet.symbols()[index].to_string()
    }

    async fn wait_for_reveal(state: &SharedState) {
        sleep(state.rules().reveal_duration + Duration::from_millis(10)).await;
    }

    #[tokio::test(start_paused = true)]
    async fn input_opens_after_reveal_delay() {
        let state = state();
        let mut events = state.events().subscribe();

        let play = start_session(&state, 1, "Ada").await.unwrap();
        assert_eq!(play.attempt, 1);
        assert_eq!(play.max_attempts, 10);
        assert!(matches!(
            &play.effects[..],
            [GameEffect::RenderSequence { symbols, level: 1, .. }] if symbols.len() == 3
        ));

        let err = submit_choice(&state, 1, &symbol(&state, 0)).await.unwrap_err();
        assert!(matches!(err, ServiceError::RevealInProgress));
        let view = current_session(&state, 1).unwrap();
        assert_eq!(view.status, VisibleStatus::AwaitingReveal);
        assert!(view.sequence.is_some());

        wait_for_reveal(&state).await;

        let view = current_session(&state, 1).unwrap();
        assert_eq!(view.status, VisibleStatus::AwaitingInput);
        assert!(view.sequence.is_none());

        let sequence = events.recv().await.unwrap();
        assert_eq!(sequence.event.as_deref(), Some("render_sequence"));
        let prompt = events.recv().await.unwrap();
        assert_eq!(prompt.event.as_deref(), Some("render_prompt"));
        assert_eq!(prompt.player, Some(1));
    }

    #[tokio::test(start_paused = true)]
    async fn completing_a_sequence_levels_up() {
        let state = state();
        start_session(&state, 1, "Ada").await.unwrap();
        wait_for_reveal(&state).await;

        let first = submit_choice(&state, 1, &symbol(&state, 0)).await.unwrap();
        assert_eq!(
            first.effects[0],
            GameEffect::outcome(OutcomeReport::Correct {
                position: 1,
                total: 3
            })
        );
        assert!(matches!(
            first.effects[1],
            GameEffect::RenderPrompt { position: 2, total: 3, .. }
        ));

        submit_choice(&state, 1, &symbol(&state, 1)).await.unwrap();
        let last = submit_choice(&state, 1, &symbol(&state, 2)).await.unwrap();
        assert_eq!(
            last.effects[0],
            GameEffect::outcome(OutcomeReport::LevelUp {
                points: 10,
                score: 10,
                level: 2
            })
        );
        assert!(matches!(
            &last.effects[1],
            GameEffect::RenderSequence { symbols, level: 2, score: 10, .. } if symbols.len() == 5
        ));

        let err = submit_choice(&state, 1, &symbol(&state, 0)).await.unwrap_err();
        assert!(matches!(err, ServiceError::RevealInProgress));
        wait_for_reveal(&state).await;
        assert_eq!(
            current_session(&state, 1).unwrap().status,
            VisibleStatus::AwaitingInput
        );
    }

    #[tokio::test(start_paused = true)]
    async fn wrong_choice_finishes_and_records_once() {
        let state = state();
        let mut events = state.events().subscribe();
        start_session(&state, 1, "Ada").await.unwrap();
        wait_for_reveal(&state).await;

        let response = submit_choice(&state, 1, &symbol(&state, 4)).await.unwrap();
        assert!(matches!(
            &response.effects[..],
            [GameEffect::RenderOutcome {
                outcome: OutcomeReport::WrongOrder { score: 0, .. }
            }]
        ));

        assert!(state.sessions().is_empty());
        let record = state.records().get(1).await.unwrap();
        assert_eq!(record.score_history, vec![0]);
        assert_eq!(record.attempts_used, 1);

        let err = submit_choice(&state, 1, &symbol(&state, 0)).await.unwrap_err();
        assert!(matches!(err, ServiceError::NoActiveSession));

        let names: Vec<_> = std::iter::from_fn(|| events.try_recv().ok())
            .filter_map(|event| event.event)
            .collect();
        assert_eq!(
            names.iter().filter(|name| *name == "leaderboard_changed").count(),
            1
        );
    }

    #[tokio::test(start_paused = true)]
    async fn unknown_symbol_is_rejected_without_consuming() {
        let state = state();
        start_session(&state, 1, "Ada").await.unwrap();
        wait_for_reveal(&state).await;

        let err = submit_choice(&state, 1, "🦄").await.unwrap_err();
        assert!(matches!(err, ServiceError::InvalidInput(_)));
        assert_eq!(current_session(&state, 1).unwrap().position, 1);

        submit_choice(&state, 1, &format!("  {}  ", symbol(&state, 0)))
            .await
            .unwrap();
        assert_eq!(current_session(&state, 1).unwrap().position, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn late_choice_times_out() {
        let state = state();
        start_session(&state, 1, "Ada").await.unwrap();
        wait_for_reveal(&state).await;
        submit_choice(&state, 1, &symbol(&state, 0)).await.unwrap();

        sleep(Duration::from_secs(60)).await;
        let response = submit_choice(&state, 1, &symbol(&state, 1)).await.unwrap();
        assert_eq!(
            response.effects,
            vec![GameEffect::outcome(OutcomeReport::TimedOut { score: 0 })]
        );
        assert!(state.sessions().is_empty());
        assert_eq!(state.records().get(1).await.unwrap().score_history, vec![0]);
    }

    #[tokio::test(start_paused = true)]
    async fn sweep_expires_abandoned_sessions_once() {
        let state = state();
        start_session(&state, 1, "Ada").await.unwrap();
        start_session(&state, 2, "Bob").await.unwrap();

        assert_eq!(expire_overdue_sessions(&state).await, 0);
        sleep(Duration::from_secs(61)).await;

        assert_eq!(expire_overdue_sessions(&state).await, 2);
        assert_eq!(expire_overdue_sessions(&state).await, 0);
        assert!(state.sessions().is_empty());
        assert_eq!(state.records().get(1).await.unwrap().score_history, vec![0]);
        assert_eq!(state.records().get(2).await.unwrap().score_history, vec![0]);
    }

    #[tokio::test(start_paused = true)]
    async fn second_play_is_refused_while_session_runs() {
        let state = state();
        let first = start_session(&state, 1, "Ada").await.unwrap();

        let err = start_session(&state, 1, "Ada").await.unwrap_err();
        assert!(matches!(err, ServiceError::SessionInProgress));
        assert_eq!(state.records().get(1).await.unwrap().attempts_used, 1);

        sleep(Duration::from_secs(61)).await;
        let second = start_session(&state, 1, "Ada").await.unwrap();
        assert_ne!(first.session_id, second.session_id);
        assert_eq!(second.attempt, 2);

        let record = state.records().get(1).await.unwrap();
        assert_eq!(record.score_history, vec![0]);
    }

    #[tokio::test(start_paused = true)]
    async fn quota_is_enforced_and_best_score_kept() {
        let state = state_with(GameRules {
            max_attempts: 2,
            ..GameRules::default()
        });

        for _ in 0..2 {
            start_session(&state, 1, "Ada").await.unwrap();
            wait_for_reveal(&state).await;
            for index in 0..3 {
                submit_choice(&state, 1, &symbol(&state, index)).await.unwrap();
            }
            wait_for_reveal(&state).await;
            submit_choice(&state, 1, &symbol(&state, 7)).await.unwrap();
        }

        let mut events = state.events().subscribe();
        let err = start_session(&state, 1, "Ada").await.unwrap_err();
        assert!(matches!(err, ServiceError::QuotaExceeded { best_score: 10 }));

        let record = state.records().get(1).await.unwrap();
        assert_eq!(record.attempts_used, 2);
        assert_eq!(record.best_score, 10);
        assert_eq!(record.score_history, vec![10, 10]);

        let event = events.recv().await.unwrap();
        assert!(event.data.contains("quota_exceeded"));
    }

    #[tokio::test(start_paused = true)]
    async fn closing_keeps_running_sessions_alive() {
        let state = state();
        start_session(&state, 1, "Ada").await.unwrap();
        wait_for_reveal(&state).await;

        assert!(state.gate().close());

        let err = start_session(&state, 2, "Bob").await.unwrap_err();
        assert!(matches!(err, ServiceError::GameClosed));
        assert!(state.records().get(2).await.is_none());

        for index in 0..3 {
            submit_choice(&state, 1, &symbol(&state, index)).await.unwrap();
        }
        assert_eq!(current_session(&state, 1).unwrap().score, 10);

        wait_for_reveal(&state).await;
        let response = submit_choice(&state, 1, &symbol(&state, 7)).await.unwrap();
        assert!(matches!(
            &response.effects[..],
            [GameEffect::RenderOutcome {
                outcome: OutcomeReport::WrongOrder { score: 10, .. }
            }]
        ));
        assert!(state.sessions().get(&1).is_none());
        assert_eq!(state.records().get(1).await.unwrap().score_history, vec![10]);
    }

    #[tokio::test(start_paused = true)]
    async fn closing_during_reveal_still_opens_input() {
        let state = state();
        let mut events = state.events().subscribe();
        start_session(&state, 1, "Ada").await.unwrap();
        assert!(state.gate().close());

        wait_for_reveal(&state).await;
        assert_eq!(
            current_session(&state, 1).unwrap().status,
            VisibleStatus::AwaitingInput
        );
        let names: Vec<_> = std::iter::from_fn(|| events.try_recv().ok())
            .filter_map(|event| event.event)
            .collect();
        assert!(names.iter().any(|name| name == "render_prompt"));

        let response = submit_choice(&state, 1, &symbol(&state, 0)).await.unwrap();
        assert!(matches!(
            response.effects[0],
            GameEffect::RenderOutcome {
                outcome: OutcomeReport::Correct { position: 1, .. }
            }
        ));
    }

    #[tokio::test]
    async fn racing_plays_consume_a_single_attempt() {
        let state = state();
        let held = state.records().lock().await;

        let spawn_play = |state: SharedState| {
            tokio::spawn(async move { start_session(&state, 1, "Ada").await })
        };
        let first = spawn_play(state.clone());
        let second = spawn_play(state.clone());
        for _ in 0..3 {
            tokio::task::yield_now().await;
        }
        drop(held);

        let outcomes = [first.await.unwrap(), second.await.unwrap()];
        assert_eq!(outcomes.iter().filter(|outcome| outcome.is_ok()).count(), 1);
        assert!(
            outcomes
                .iter()
                .any(|outcome| matches!(outcome, Err(ServiceError::SessionInProgress)))
        );

        let record = state.records().get(1).await.unwrap();
        assert_eq!(record.attempts_used, 1);
        assert_eq!(
            record.attempts_used as usize,
            state.sessions().len() + record.score_history.len()
        );
    }

    #[tokio::test(start_paused = true)]
    async fn stale_reveal_is_ignored() {
        let state = state();
        let play = start_session(&state, 1, "Ada").await.unwrap();

        assert!(!complete_reveal(&state, 1, SessionId::new_v4(), 1));
        assert!(!complete_reveal(&state, 1, play.session_id, 2));
        assert!(complete_reveal(&state, 1, play.session_id, 1));
        assert!(!complete_reveal(&state, 1, play.session_id, 1));
    }
}
