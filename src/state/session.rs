use std::time::{Duration, SystemTime};

use thiserror::Error;
use tokio::time::Instant;
use uuid::Uuid;

use crate::{
    config::GameRules,
    state::{
        game::{PlayerId, SessionId, Symbol},
        scoring::{points_for_level, sequence_length_for_level},
        sequence::{SequenceError, SequenceSource},
    },
};

/// Lifecycle of a live session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStatus {
    /// The target sequence is on display; input is not accepted yet.
    AwaitingReveal,
    /// Waiting for the next choice.
    AwaitingInput,
    /// Terminal: the outcome has been decided and the session must be removed.
    Finished,
}

/// Why a session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FinishReason {
    /// A choice did not match the target at the cursor.
    WrongOrder,
    /// The overall time budget ran out.
    TimedOut,
}

/// Final state of a session, ready to be committed to the player's record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionResult {
    /// Session that produced the result.
    pub session_id: SessionId,
    /// Owner of the session.
    pub player_id: PlayerId,
    /// How the session ended.
    pub reason: FinishReason,
    /// Accumulated score at the end.
    pub score: u32,
    /// Level being played when the session ended.
    pub level: u32,
    /// Target sequence of that level.
    pub expected: Vec<Symbol>,
    /// Choices entered for that level, including a wrong final one.
    pub submitted: Vec<Symbol>,
}

/// Effect of a single accepted choice.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChoiceOutcome {
    /// The choice matched and more are expected for this level.
    Correct {
        /// 1-based position just confirmed.
        position: usize,
        /// Length of the target sequence.
        total: usize,
    },
    /// The whole sequence matched; a longer one is now on display.
    LevelUp {
        /// Points earned for the cleared level.
        points: u32,
        /// Accumulated score after the award.
        score: u32,
        /// Level now being played.
        level: u32,
        /// New target sequence.
        sequence: Vec<Symbol>,
    },
    /// The session ended.
    Finished(SessionResult),
}

/// Reasons a session operation is refused.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    /// An administrator closed the game to new sessions.
    #[error("the game is closed")]
    GameClosed,
    /// The player used every attempt.
    #[error("attempt quota exhausted (best score {best_score})")]
    QuotaExceeded {
        /// Best score of the player.
        best_score: u32,
    },
    /// No live session exists for the player.
    #[error("no active session")]
    NoActiveSession,
    /// The player already has a live session.
    #[error("a session is already in progress")]
    SessionInProgress,
    /// Input arrived while the sequence is still on display.
    #[error("sequence is still being revealed")]
    RevealInProgress,
    /// Input is not part of the alphabet.
    #[error("unknown symbol `{0}`")]
    UnknownSymbol(String),
    /// A sequence of an impossible length was requested.
    #[error(transparent)]
    Sequence(#[from] SequenceError),
}

/// One in-progress attempt of a single player.
#[derive(Debug, Clone)]
pub struct GameSession {
    id: SessionId,
    player_id: PlayerId,
    attempt: u32,
    target: Vec<Symbol>,
    submitted: Vec<Symbol>,
    level: u32,
    score: u32,
    started_at: Instant,
    started_wall: SystemTime,
    status: SessionStatus,
}

impl GameSession {
    /// Open a session at level 1 with `target` on display.
    pub fn start(player_id: PlayerId, attempt: u32, target: Vec<Symbol>, now: Instant) -> Self {
        Self {
            id: Uuid::new_v4(),
            player_id,
            attempt,
            target,
            submitted: Vec::new(),
            level: 1,
            score: 0,
            started_at: now,
            started_wall: SystemTime::now(),
            status: SessionStatus::AwaitingReveal,
        }
    }

    /// Unique identifier of this session.
    pub fn id(&self) -> SessionId {
        self.id
    }

    /// Owner of the session.
    pub fn player_id(&self) -> PlayerId {
        self.player_id
    }

    /// 1-based attempt number this session consumed.
    pub fn attempt(&self) -> u32 {
        self.attempt
    }

    /// Current level (starts at 1).
    pub fn level(&self) -> u32 {
        self.level
    }

    /// Accumulated score.
    pub fn score(&self) -> u32 {
        self.score
    }

    /// Current lifecycle state.
    pub fn status(&self) -> SessionStatus {
        self.status
    }

    /// Secret sequence of the current level.
    pub fn target(&self) -> &[Symbol] {
        &self.target
    }

    /// Choices confirmed so far for the current level.
    pub fn submitted(&self) -> &[Symbol] {
        &self.submitted
    }

    /// Index of the next expected symbol.
    pub fn cursor(&self) -> usize {
        self.submitted.len()
    }

    /// Wall-clock creation time, for display.
    pub fn started_wall(&self) -> SystemTime {
        self.started_wall
    }

    /// Whether more than `budget` has passed since the session started.
    pub fn is_expired(&self, now: Instant, budget: Duration) -> bool {
        now.saturating_duration_since(self.started_at) > budget
    }

    /// Time left before the budget runs out.
    pub fn remaining(&self, now: Instant, budget: Duration) -> Duration {
        budget.saturating_sub(now.saturating_duration_since(self.started_at))
    }

    /// Leave the reveal phase for `level`, opening input with an empty cursor.
    ///
    /// Returns `false` when the session moved on since the reveal was scheduled.
    pub fn reveal_elapsed(&mut self, level: u32) -> bool {
        if self.status != SessionStatus::AwaitingReveal || self.level != level {
            return false;
        }
        self.submitted.clear();
        self.status = SessionStatus::AwaitingInput;
        true
    }

    /// End the session because its time ran out, unless it already ended.
    pub fn expire(&mut self) -> Option<SessionResult> {
        if self.status == SessionStatus::Finished {
            return None;
        }
        Some(self.finish(FinishReason::TimedOut))
    }

    /// Validate one choice against the target at the cursor.
    ///
    /// The time budget is checked before the choice is looked at, so a late choice ends the
    /// session as timed out whatever its value.
    pub fn submit(
        &mut self,
        symbol: Symbol,
        now: Instant,
        rules: &GameRules,
        sequences: &dyn SequenceSource,
    ) -> Result<ChoiceOutcome, SessionError> {
        match self.status {
            SessionStatus::AwaitingInput => {}
            SessionStatus::AwaitingReveal => return Err(SessionError::RevealInProgress),
            SessionStatus::Finished => return Err(SessionError::NoActiveSession),
        }

        if self.is_expired(now, rules.time_budget) {
            return Ok(ChoiceOutcome::Finished(self.finish(FinishReason::TimedOut)));
        }

        if !rules.alphabet.contains(&symbol) {
            return Err(SessionError::UnknownSymbol(symbol.to_string()));
        }

        let position = self.submitted.len();
        if self.target.get(position) != Some(&symbol) {
            self.submitted.push(symbol);
            return Ok(ChoiceOutcome::Finished(self.finish(FinishReason::WrongOrder)));
        }

        if position + 1 < self.target.len() {
            self.submitted.push(symbol);
            return Ok(ChoiceOutcome::Correct {
                position: position + 1,
                total: self.target.len(),
            });
        }

        // Generate first so a failure leaves the session untouched.
        let next_level = self.level + 1;
        let length = sequence_length_for_level(
            next_level,
            rules.initial_sequence_length,
            rules.alphabet.len(),
        );
        let sequence = sequences.generate(&rules.alphabet, length)?;

        let points = points_for_level(self.level);
        self.score += points;
        self.level = next_level;
        self.target = sequence.clone();
        self.submitted.clear();
        self.status = SessionStatus::AwaitingReveal;

        Ok(ChoiceOutcome::LevelUp {
            points,
            score: self.score,
            level: self.level,
            sequence,
        })
    }

    fn finish(&mut self, reason: FinishReason) -> SessionResult {
        self.status = SessionStatus::Finished;
        SessionResult {
            session_id: self.id,
            player_id: self.player_id,
            reason,
            score: self.score,
            level: self.level,
            expected: self.target.clone(),
            submitted: self.submitted.clone(),
        }
    }
}
