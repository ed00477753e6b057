//! Test fixtures for integration testing

#![allow(dead_code)]

use battle_room::config::{AppConfig, MatchmakingConfig};
use battle_room::error::Result;
use battle_room::ledger::{BattleResultStorage, InsertOutcome};
use battle_room::service::AppState;
use battle_room::types::{BattleMode, BattleResult, Participant, ParticipantId, ResultSubmission};
use chrono::{DateTime, Utc};

/// Seed used by every fixture state so matchmaking picks are reproducible
pub const TEST_SEED: u64 = 2024;

pub fn seeded_config() -> AppConfig {
    AppConfig {
        matchmaking: MatchmakingConfig {
            rng_seed: Some(TEST_SEED),
            ..Default::default()
        },
        ..Default::default()
    }
}

/// Participants with ids `1..=ratings.len()` at the given ratings
pub fn create_test_participants(ratings: &[i32]) -> Vec<Participant> {
    ratings
        .iter()
        .enumerate()
        .map(|(index, &rating)| {
            let id = index as ParticipantId + 1;
            Participant::new(id, format!("player{}", id)).with_rating(rating)
        })
        .collect()
}

/// Seeded in-memory state holding one participant per rating
pub fn create_test_state(ratings: &[i32]) -> AppState {
    let state = AppState::new(seeded_config()).expect("Failed to build app state");
    for participant in create_test_participants(ratings) {
        state
            .register_participant(participant)
            .expect("Failed to register participant");
    }
    state
}

pub fn ranked_submission(
    battle_id: &str,
    user_id: ParticipantId,
    opponent_id: ParticipantId,
    is_winner: bool,
) -> ResultSubmission {
    ResultSubmission {
        battle_id: battle_id.to_string(),
        user_id,
        opponent_id: Some(opponent_id),
        mode: BattleMode::Ranked,
        score: if is_winner { 800 } else { 400 },
        questions_correct: if is_winner { 8 } else { 4 },
        total_questions: 10,
        is_winner,
        opponent_rating_hint: 1500,
    }
}

pub fn quick_submission(battle_id: &str, user_id: ParticipantId, is_winner: bool) -> ResultSubmission {
    ResultSubmission {
        battle_id: battle_id.to_string(),
        user_id,
        opponent_id: None,
        mode: BattleMode::Quick,
        score: 300,
        questions_correct: 3,
        total_questions: 5,
        is_winner,
        opponent_rating_hint: 1500,
    }
}

/// Result storage whose backend is always down
#[derive(Debug, Default)]
pub struct UnavailableResultStorage;

impl UnavailableResultStorage {
    fn down<T>() -> Result<T> {
        Err(anyhow::anyhow!("result database unavailable"))
    }
}

impl BattleResultStorage for UnavailableResultStorage {
    fn insert_result(&self, _result: BattleResult) -> Result<InsertOutcome> {
        Self::down()
    }

    fn get_result(&self, _battle_id: &str, _user_id: ParticipantId) -> Result<Option<BattleResult>> {
        Self::down()
    }

    fn results_for_participant(
        &self,
        _user_id: ParticipantId,
        _limit: Option<usize>,
    ) -> Result<Vec<BattleResult>> {
        Self::down()
    }

    fn results_since(&self, _since: DateTime<Utc>) -> Result<Vec<BattleResult>> {
        Self::down()
    }

    fn all_results(&self) -> Result<Vec<BattleResult>> {
        Self::down()
    }

    fn result_count(&self) -> Result<usize> {
        Self::down()
    }
}
