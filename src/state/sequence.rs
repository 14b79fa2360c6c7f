//! Random sequence generation over the configured alphabet.

use rand::{rng, seq::SliceRandom};
use thiserror::Error;

use crate::state::game::{Alphabet, Symbol};

/// Raised when a sequence of an impossible length is requested.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SequenceError {
    /// Requested length is zero or larger than the alphabet.
    #[error("invalid sequence length {requested} (alphabet holds {available} symbols)")]
    InvalidLength {
        /// Length that was asked for.
        requested: usize,
        /// Number of symbols in the alphabet.
        available: usize,
    },
}

/// Source of target sequences for sessions.
///
/// Implementations must return `length` distinct symbols of `alphabet`.
pub trait SequenceSource: Send + Sync {
    /// Produce an ordered sequence of `length` distinct symbols drawn from `alphabet`.
    fn generate(&self, alphabet: &Alphabet, length: usize) -> Result<Vec<Symbol>, SequenceError>;
}

/// Check the `1 <= length <= |alphabet|` precondition shared by every source.
pub fn check_length(alphabet: &Alphabet, length: usize) -> Result<(), SequenceError> {
    if length == 0 || length > alphabet.len() {
        return Err(SequenceError::InvalidLength {
            requested: length,
            available: alphabet.len(),
        });
    }
    Ok(())
}

/// Uniformly random sampling without replacement, backed by the thread-local RNG.
#[derive(Debug, Default, Clone, Copy)]
pub struct RandomSequence;

impl SequenceSource for RandomSequence {
    fn generate(&self, alphabet: &Alphabet, length: usize) -> Result<Vec<Symbol>, SequenceError> {
        check_length(alphabet, length)?;

        let mut pool = alphabet.symbols().to_vec();
        let mut rng = rng();
        let (picked, _rest) = pool.partial_shuffle(&mut rng, length);
        Ok(picked.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn generated_symbols_are_distinct_and_from_alphabet() {
        let alphabet = Alphabet::default();
        for length in 1..=alphabet.len() {
            for _ in 0..50 {
                let sequence = RandomSequence.generate(&alphabet, length).unwrap();
                assert_eq!(sequence.len(), length);
                let unique: HashSet<_> = sequence.iter().collect();
                assert_eq!(unique.len(), length);
                assert!(sequence.iter().all(|symbol| alphabet.contains(symbol)));
            }
        }
    }

    #[test]
    fn rejects_out_of_bounds_lengths() {
        let alphabet = Alphabet::default();
        assert_eq!(
            RandomSequence.generate(&alphabet, 0),
            Err(SequenceError::InvalidLength {
                requested: 0,
                available: 8
            })
        );
        assert!(RandomSequence.generate(&alphabet, 9).is_err());
    }

    #[test]
    fn full_length_is_a_permutation() {
        let alphabet = Alphabet::default();
        let sequence = RandomSequence.generate(&alphabet, 8).unwrap();
        let unique: HashSet<_> = sequence.iter().collect();
        let expected: HashSet<_> = alphabet.symbols().iter().collect();
        assert_eq!(unique, expected);
    }
}
