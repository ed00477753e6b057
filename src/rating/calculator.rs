//! Rating calculator trait
//!
//! This module defines the interface the matchmaker and the result ledger use
//! for rating math, so either can be exercised against a stub calculator.

use crate::types::RatingChangePreview;

/// Trait for computing rating adjustments between two rated sides
#[cfg_attr(test, mockall::automock)]
pub trait RatingCalculator: Send + Sync {
    /// Probability-like chance in (0, 1) that `rating` beats `opponent_rating`
    fn expected_score(&self, rating: i32, opponent_rating: i32) -> f64;

    /// Signed change for the side rated `rating` after the battle.
    ///
    /// The winner's magnitude is bounded and the loser receives exactly its
    /// negation, so `rating_delta(a, b, true) == -rating_delta(b, a, false)`.
    fn rating_delta(&self, rating: i32, opponent_rating: i32, did_win: bool) -> i32;

    /// Get the initial rating for new participants
    fn initial_rating(&self) -> i32;

    /// Get current configuration as JSON
    fn config(&self) -> serde_json::Value;

    /// Both hypothetical outcomes for a pairing, used for previews
    fn preview(&self, rating: i32, opponent_rating: i32) -> RatingChangePreview {
        RatingChangePreview {
            win: self.rating_delta(rating, opponent_rating, true),
            loss: self.rating_delta(rating, opponent_rating, false),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Winner always gains 12, loser always drops 12
    struct FixedDelta;

    impl RatingCalculator for FixedDelta {
        fn expected_score(&self, _rating: i32, _opponent_rating: i32) -> f64 {
            0.5
        }

        fn rating_delta(&self, _rating: i32, _opponent_rating: i32, did_win: bool) -> i32 {
            if did_win {
                12
            } else {
                -12
            }
        }

        fn initial_rating(&self) -> i32 {
            1500
        }

        fn config(&self) -> serde_json::Value {
            serde_json::json!({"type": "fixed"})
        }
    }

    #[test]
    fn test_default_preview_uses_both_outcomes() {
        let preview = FixedDelta.preview(1500, 1600);
        assert_eq!(preview, RatingChangePreview { win: 12, loss: -12 });
    }
}
