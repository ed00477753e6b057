//! Utility functions for the battle service

use crate::types::{BattleId, BattleMode};
use chrono::{DateTime, Utc};
use rand::Rng;

/// Generate a battle id token such as `ranked_3f9c0a17d2b4e681`
pub fn generate_battle_id<R: Rng + ?Sized>(mode: BattleMode, rng: &mut R) -> BattleId {
    format!("{}_{:016x}", mode.battle_id_prefix(), rng.gen::<u64>())
}

/// Get the current UTC timestamp
pub fn current_timestamp() -> DateTime<Utc> {
    Utc::now()
}

/// Calculate the absolute difference between two ratings
pub fn rating_difference(rating1: i32, rating2: i32) -> u32 {
    rating1.abs_diff(rating2)
}

/// Check if two ratings are within the given tolerance (inclusive)
pub fn ratings_within_tolerance(rating1: i32, rating2: i32, tolerance: i32) -> bool {
    tolerance >= 0 && rating_difference(rating1, rating2) <= tolerance as u32
}

/// Win percentage rounded to one decimal, 0.0 when nothing was played
pub fn win_rate(wins: u32, losses: u32) -> f64 {
    let played = (wins + losses).max(1) as f64;
    (wins as f64 / played * 1000.0).round() / 10.0
}
