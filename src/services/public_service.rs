//! Service helpers that expose read-only public projections of the game.

use crate::{
    dto::{
        game::symbols_to_strings,
        public::{RulesResponse, ScoringTier},
        ws::COMMANDS,
    },
    state::{
        SharedState,
        scoring::{points_for_level, sequence_length_for_level},
    },
};

/// Levels listed in the scoring table; the last one stands for every later level.
const LISTED_LEVELS: u32 = 4;

/// Rules, scoring table and available commands.
pub fn rules(state: &SharedState) -> RulesResponse {
    let rules = state.rules();
    let alphabet_len = rules.alphabet.len();

    let scoring = (1..=LISTED_LEVELS)
        .map(|level| ScoringTier {
            level,
            sequence_length: if level == 1 {
                rules.initial_sequence_length
            } else {
                sequence_length_for_level(level, rules.initial_sequence_length, alphabet_len)
            },
            points: points_for_level(level),
            and_beyond: level == LISTED_LEVELS,
        })
        .collect();

    RulesResponse {
        reveal_seconds: rules.reveal_duration.as_secs(),
        time_budget_seconds: rules.time_budget.as_secs(),
        max_attempts: rules.max_attempts,
        symbols: symbols_to_strings(rules.alphabet.symbols()),
        scoring,
        commands: COMMANDS.iter().map(|command| command.to_string()).collect(),
        closed: state.gate().is_closed(),
    }
}
