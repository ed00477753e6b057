//! Practice opponent provider
//!
//! Quick battles never pair two real participants; the requester plays
//! against a synthetic opponent whose rating sits near their own.

use crate::types::Opponent;
use rand::{Rng, RngCore};

/// Trait for producing practice opponents
pub trait PracticeOpponentProvider: Send + Sync {
    /// Build a practice opponent for a requester rated `requester_rating`.
    ///
    /// The generator is owned by the matchmaker so seeded runs stay
    /// reproducible.
    fn practice_opponent(&self, requester_rating: i32, rng: &mut dyn RngCore) -> Opponent;
}

/// Practice opponent rated uniformly within `requester ± jitter`
#[derive(Debug, Clone)]
pub struct JitteredPracticeProvider {
    jitter: i32,
}

impl JitteredPracticeProvider {
    pub fn new(jitter: i32) -> Self {
        Self {
            jitter: jitter.max(0),
        }
    }

    pub fn jitter(&self) -> i32 {
        self.jitter
    }
}

impl PracticeOpponentProvider for JitteredPracticeProvider {
    fn practice_opponent(&self, requester_rating: i32, rng: &mut dyn RngCore) -> Opponent {
        let offset = rng.gen_range(-self.jitter..=self.jitter);

        Opponent::SyntheticPractice {
            rating: requester_rating.saturating_add(offset),
        }
    }
}
