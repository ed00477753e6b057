//! Rating model for ranked battles
//!
//! Elo expected scores and bounded zero-sum updates, plus the storage
//! interface the battle core uses to read and write participant ratings.

pub mod calculator;
pub mod elo;
pub mod storage;

// Re-export commonly used types
pub use calculator::RatingCalculator;
pub use elo::{expected_score, rating_delta, EloRatingCalculator};
pub use storage::{InMemoryParticipantStorage, ParticipantStorage};
