//! Battle Room - quiz battle matchmaking and rating ledger
//!
//! This crate pairs participants for quick practice battles or ranked
//! battles inside a rating band, applies Elo rating changes as results come
//! in, and builds leaderboards over the recorded results.

pub mod api;
pub mod config;
pub mod error;
pub mod ledger;
pub mod matchmaking;
pub mod metrics;
pub mod rating;
pub mod service;
pub mod types;
pub mod utils;

// Re-export commonly used types and traits
pub use error::{BattleError, Result};
pub use types::*;

// Re-export key components
pub use ledger::{BattleResultLedger, SubmissionOutcome};
pub use matchmaking::Matchmaker;
pub use rating::{expected_score, rating_delta, EloRatingCalculator, RatingCalculator};
pub use service::{AppState, BattleService};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
