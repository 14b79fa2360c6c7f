//! Points per cleared level and sequence growth.

/// Highest level paid on the linear scale; later levels earn [`FLAT_LEVEL_POINTS`].
const LINEAR_LEVEL_CAP: u32 = 3;
/// Points per level on the linear part of the scale.
const POINTS_PER_LEVEL: u32 = 10;
/// Flat reward once the linear scale is exhausted.
const FLAT_LEVEL_POINTS: u32 = 50;

/// Points awarded for clearing `level`: 10, 20, 30, then 50 for every later level.
pub fn points_for_level(level: u32) -> u32 {
    if level <= LINEAR_LEVEL_CAP {
        POINTS_PER_LEVEL * level
    } else {
        FLAT_LEVEL_POINTS
    }
}

/// Length of the sequence shown when entering `level`, capped by the alphabet size.
///
/// Only used for sequences generated after a level is cleared; the opening sequence of a session
/// is always `initial_length` long.
pub fn sequence_length_for_level(level: u32, initial_length: usize, alphabet_len: usize) -> usize {
    initial_length
        .saturating_add(level as usize)
        .min(alphabet_len)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn points_follow_linear_then_flat_scale() {
        assert_eq!(points_for_level(1), 10);
        assert_eq!(points_for_level(2), 20);
        assert_eq!(points_for_level(3), 30);
        assert_eq!(points_for_level(4), 50);
        assert_eq!(points_for_level(12), 50);
    }

    #[test]
    fn length_grows_with_level_until_alphabet_cap() {
        assert_eq!(sequence_length_for_level(2, 3, 8), 5);
        assert_eq!(sequence_length_for_level(5, 3, 8), 8);
        assert_eq!(sequence_length_for_level(9, 3, 8), 8);
    }
}
