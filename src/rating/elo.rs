//! Elo rating model for ranked battles
//!
//! Expected scores come from the skillratings Elo implementation; the update
//! itself is a bounded, integer, zero-sum variant: the winner gains
//! `trunc(k * (1 - expected))` clamped to `[min_delta, max_delta]` and the
//! loser drops exactly that amount.

use crate::config::RatingConfig;
use crate::rating::calculator::RatingCalculator;
use skillratings::elo::EloRating;

/// K-factor used when none is configured
pub const DEFAULT_K_FACTOR: f64 = 32.0;

/// Smallest gain a win can produce
pub const MIN_RATING_DELTA: i32 = 5;

/// Largest gain a win can produce
pub const MAX_RATING_DELTA: i32 = 50;

/// Chance in (0, 1) that a side rated `rating_a` beats one rated `rating_b`.
///
/// `expected_score(a, b) + expected_score(b, a)` is 1 up to float rounding.
pub fn expected_score(rating_a: i32, rating_b: i32) -> f64 {
    let (expected_a, _) = skillratings::elo::expected_score(
        &EloRating {
            rating: f64::from(rating_a),
        },
        &EloRating {
            rating: f64::from(rating_b),
        },
    );
    expected_a
}

/// Bounded gain of `winner_rating` after beating `loser_rating`
pub fn winner_gain(
    winner_rating: i32,
    loser_rating: i32,
    k_factor: f64,
    min_delta: i32,
    max_delta: i32,
) -> i32 {
    debug_assert!(k_factor > 0.0, "k_factor must be positive");

    let raw = k_factor * (1.0 - expected_score(winner_rating, loser_rating));
    // `as` truncates toward zero, matching integer rating arithmetic
    (raw as i32).clamp(min_delta, max_delta)
}

/// Signed change for side A with the default bounds.
///
/// A win yields the bounded gain of A over B; a loss yields the negated gain
/// of B over A, so both sides of one battle always see the same magnitude.
pub fn rating_delta(rating_a: i32, rating_b: i32, did_a_win: bool, k_factor: f64) -> i32 {
    bounded_rating_delta(
        rating_a,
        rating_b,
        did_a_win,
        k_factor,
        MIN_RATING_DELTA,
        MAX_RATING_DELTA,
    )
}

fn bounded_rating_delta(
    rating_a: i32,
    rating_b: i32,
    did_a_win: bool,
    k_factor: f64,
    min_delta: i32,
    max_delta: i32,
) -> i32 {
    if did_a_win {
        winner_gain(rating_a, rating_b, k_factor, min_delta, max_delta)
    } else {
        -winner_gain(rating_b, rating_a, k_factor, min_delta, max_delta)
    }
}

/// Elo rating calculator implementation
#[derive(Debug, Clone)]
pub struct EloRatingCalculator {
    config: RatingConfig,
}

impl EloRatingCalculator {
    /// Create a new Elo calculator, rejecting non-positive K-factors
    pub fn new(config: RatingConfig) -> crate::error::Result<Self> {
        config.validate()?;

        Ok(Self { config })
    }
}

impl Default for EloRatingCalculator {
    fn default() -> Self {
        Self {
            config: RatingConfig::default(),
        }
    }
}

impl RatingCalculator for EloRatingCalculator {
    fn expected_score(&self, rating: i32, opponent_rating: i32) -> f64 {
        expected_score(rating, opponent_rating)
    }

    fn rating_delta(&self, rating: i32, opponent_rating: i32, did_win: bool) -> i32 {
        bounded_rating_delta(
            rating,
            opponent_rating,
            did_win,
            self.config.k_factor,
            self.config.min_delta,
            self.config.max_delta,
        )
    }

    fn initial_rating(&self) -> i32 {
        self.config.initial_rating
    }

    fn config(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "elo",
            "initial_rating": self.config.initial_rating,
            "k_factor": self.config.k_factor,
            "min_delta": self.config.min_delta,
            "max_delta": self.config.max_delta
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_even_match() {
        assert!((expected_score(1500, 1500) - 0.5).abs() < 1e-12);
        assert_eq!(rating_delta(1500, 1500, true, DEFAULT_K_FACTOR), 16);
        assert_eq!(rating_delta(1500, 1500, false, DEFAULT_K_FACTOR), -16);
    }

    #[test]
    fn test_heavy_favourite_hits_floor() {
        // raw gain is well under one point, so the floor applies
        let raw = DEFAULT_K_FACTOR * (1.0 - expected_score(1900, 1100));
        assert!(raw < 1.0);
        assert_eq!(rating_delta(1900, 1100, true, DEFAULT_K_FACTOR), 5);
        assert_eq!(rating_delta(1100, 1900, false, DEFAULT_K_FACTOR), -5);
    }

    #[test]
    fn test_upset_is_worth_more() {
        let favourite = rating_delta(1800, 1200, true, DEFAULT_K_FACTOR);
        let underdog = rating_delta(1200, 1800, true, DEFAULT_K_FACTOR);
        assert!(favourite < underdog);
        assert_eq!(underdog, 31);
    }

    #[test]
    fn test_ceiling_with_large_k() {
        assert_eq!(rating_delta(1000, 2000, true, 400.0), MAX_RATING_DELTA);
    }

    #[test]
    fn test_calculator_uses_configured_bounds() {
        let calculator = EloRatingCalculator::new(RatingConfig {
            k_factor: 64.0,
            min_delta: 1,
            max_delta: 40,
            ..Default::default()
        })
        .unwrap();

        assert_eq!(calculator.rating_delta(1500, 1500, true), 32);
        assert_eq!(calculator.rating_delta(1200, 1800, true), 40);
        assert_eq!(calculator.rating_delta(2000, 1000, true), 1);
        assert_eq!(calculator.config()["type"], "elo");
    }

    #[test]
    fn test_rejects_non_positive_k() {
        let result = EloRatingCalculator::new(RatingConfig {
            k_factor: 0.0,
            ..Default::default()
        });
        assert!(result.is_err());
    }

    proptest! {
        #[test]
        fn prop_expected_score_symmetric(a in 0i32..4000, b in 0i32..4000) {
            let sum = expected_score(a, b) + expected_score(b, a);
            prop_assert!((sum - 1.0).abs() < 1e-9);
            prop_assert!(expected_score(a, b) > 0.0 && expected_score(a, b) < 1.0);
        }

        #[test]
        fn prop_zero_sum(a in 0i32..4000, b in 0i32..4000, a_won: bool) {
            let a_delta = rating_delta(a, b, a_won, DEFAULT_K_FACTOR);
            let b_delta = rating_delta(b, a, !a_won, DEFAULT_K_FACTOR);
            prop_assert_eq!(a_delta, -b_delta);
        }

        #[test]
        fn prop_magnitude_bounded(a in 0i32..4000, b in 0i32..4000, a_won: bool, k in 1.0f64..200.0) {
            let magnitude = rating_delta(a, b, a_won, k).abs();
            prop_assert!((MIN_RATING_DELTA..=MAX_RATING_DELTA).contains(&magnitude));
        }

        #[test]
        fn prop_sign_follows_outcome(a in 0i32..4000, b in 0i32..4000) {
            prop_assert!(rating_delta(a, b, true, DEFAULT_K_FACTOR) > 0);
            prop_assert!(rating_delta(a, b, false, DEFAULT_K_FACTOR) < 0);
        }
    }
}
