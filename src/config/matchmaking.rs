//! Matchmaking configuration

use crate::types::{BattleMode, MatchRequest, ParticipantId};
use serde::{Deserialize, Serialize};

/// Matchmaking policy knobs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchmakingConfig {
    /// Ranked opponents must be within this many rating points
    pub rating_band: i32,
    /// Practice opponents are rated requester ± this many points
    pub practice_rating_jitter: i32,
    /// Eligible ranked candidates considered before the random pick (0 = all)
    pub candidate_limit: usize,
    /// Seed for the matchmaking generator; entropy when unset
    pub rng_seed: Option<u64>,
    pub quick_question_count: u32,
    pub quick_time_limit_seconds: u32,
    pub ranked_question_count: u32,
    pub ranked_time_limit_seconds: u32,
}

impl Default for MatchmakingConfig {
    fn default() -> Self {
        Self {
            rating_band: 200,
            practice_rating_jitter: 100,
            candidate_limit: 0,
            rng_seed: None,
            quick_question_count: BattleMode::Quick.default_question_count(),
            quick_time_limit_seconds: BattleMode::Quick.default_time_limit_seconds(),
            ranked_question_count: BattleMode::Ranked.default_question_count(),
            ranked_time_limit_seconds: BattleMode::Ranked.default_time_limit_seconds(),
        }
    }
}

impl MatchmakingConfig {
    /// Build the request for a mode, applying any configured overrides
    pub fn match_request(&self, requester_id: ParticipantId, mode: BattleMode) -> MatchRequest {
        let (questions, time_limit) = match mode {
            BattleMode::Quick => (self.quick_question_count, self.quick_time_limit_seconds),
            BattleMode::Ranked => (self.ranked_question_count, self.ranked_time_limit_seconds),
        };

        MatchRequest::new(requester_id, mode)
            .with_question_count(questions)
            .with_time_limit(time_limit)
    }

    pub fn validate(&self) -> crate::error::Result<()> {
        let fail = |message: &str| -> crate::error::Result<()> {
            Err(crate::error::BattleError::ConfigurationError {
                message: message.to_string(),
            }
            .into())
        };

        if self.rating_band <= 0 {
            return fail("Rating band must be positive");
        }
        if self.practice_rating_jitter < 0 {
            return fail("Practice rating jitter must be non-negative");
        }
        if self.quick_question_count == 0 || self.ranked_question_count == 0 {
            return fail("Question counts must be greater than 0");
        }
        if self.quick_time_limit_seconds == 0 || self.ranked_time_limit_seconds == 0 {
            return fail("Time limits must be greater than 0");
        }

        Ok(())
    }
}
