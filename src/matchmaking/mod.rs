//! Matchmaking for quick and ranked battles

pub mod matcher;
pub mod practice;

pub use matcher::Matchmaker;
pub use practice::{JitteredPracticeProvider, PracticeOpponentProvider};
