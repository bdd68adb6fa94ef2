/// Spacing policy for topic reviews.
///
/// A poor recall (score below 60) resets the interval to one day, a
/// middling one (60..=79) holds it steady, and a strong one (80 and up)
/// doubles it. A missing or malformed prior interval never produces a
/// non-positive result.
pub fn next_interval(previous_interval_days: i64, score: i64) -> i64 {
    if previous_interval_days <= 0 {
        return 1;
    }
    if score < 60 {
        return 1;
    }
    if score < 80 {
        return previous_interval_days.max(1);
    }
    previous_interval_days * 2
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reset_on_poor_recall() {
        assert_eq!(next_interval(1, 30), 1);
        assert_eq!(next_interval(16, 59), 1);
    }

    #[test]
    fn test_plateau_on_middling_recall() {
        assert_eq!(next_interval(1, 60), 1);
        assert_eq!(next_interval(2, 70), 2);
        assert_eq!(next_interval(8, 79), 8);
    }

    #[test]
    fn test_double_on_strong_recall() {
        assert_eq!(next_interval(1, 80), 2);
        assert_eq!(next_interval(1, 90), 2);
        assert_eq!(next_interval(7, 100), 14);
    }

    #[test]
    fn test_non_positive_previous_interval_floors_to_one() {
        assert_eq!(next_interval(0, 50), 1);
        assert_eq!(next_interval(0, 95), 1);
        assert_eq!(next_interval(-3, 70), 1);
    }

    #[test]
    fn test_out_of_range_scores_follow_nearest_bracket() {
        assert_eq!(next_interval(4, -10), 1);
        assert_eq!(next_interval(4, 150), 8);
    }

    proptest::proptest! {
        #[test]
        fn test_interval_always_positive(prev in -1000i64..1000, score in -200i64..300) {
            proptest::prop_assert!(next_interval(prev, score) >= 1);
        }

        #[test]
        fn test_strong_recall_doubles(prev in 1i64..100_000) {
            proptest::prop_assert_eq!(next_interval(prev, 90), prev * 2);
        }
    }
}
