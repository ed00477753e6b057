//! Rating system configuration

use crate::types::DEFAULT_RATING;
use serde::{Deserialize, Serialize};

/// Elo parameters for ranked battles
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RatingConfig {
    /// Rating assigned to new participants
    pub initial_rating: i32,
    /// Maximum swing of a single unclamped update
    pub k_factor: f64,
    /// Smallest magnitude a winner can gain
    pub min_delta: i32,
    /// Largest magnitude a winner can gain
    pub max_delta: i32,
}

impl Default for RatingConfig {
    fn default() -> Self {
        Self {
            initial_rating: DEFAULT_RATING,
            k_factor: 32.0,
            min_delta: 5,
            max_delta: 50,
        }
    }
}

impl RatingConfig {
    pub fn validate(&self) -> crate::error::Result<()> {
        if self.k_factor.is_nan() || self.k_factor <= 0.0 {
            return Err(crate::error::BattleError::ConfigurationError {
                message: "K-factor must be positive".to_string(),
            }
            .into());
        }

        if self.min_delta < 0 {
            return Err(crate::error::BattleError::ConfigurationError {
                message: "Minimum rating delta must be non-negative".to_string(),
            }
            .into());
        }

        if self.min_delta > self.max_delta {
            return Err(crate::error::BattleError::ConfigurationError {
                message: format!(
                    "Minimum rating delta {} exceeds maximum {}",
                    self.min_delta, self.max_delta
                ),
            }
            .into());
        }

        Ok(())
    }
}
