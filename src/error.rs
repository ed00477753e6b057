//! Error types for the battle service
//!
//! Library operations return `anyhow::Result`; domain failures are raised as
//! [`BattleError`] so the request layer can recover them with `downcast_ref`.

use crate::types::ParticipantId;

/// Result type alias for convenience
pub type Result<T> = anyhow::Result<T>;

/// Custom error types for specific battle scenarios
#[derive(Debug, thiserror::Error)]
pub enum BattleError {
    #[error("Participant not found: {participant_id}")]
    ParticipantNotFound { participant_id: ParticipantId },

    #[error("No opponents found in your rating range")]
    NoOpponentAvailable { rating: i32, band: i32 },

    #[error("Invalid result payload: {reason}")]
    InvalidResultPayload { reason: String },

    #[error("Configuration error: {message}")]
    ConfigurationError { message: String },

    #[error("Internal service error: {message}")]
    InternalError { message: String },
}

impl BattleError {
    /// HTTP status code the request layer should answer with
    pub fn status_code(&self) -> u16 {
        match self {
            BattleError::ParticipantNotFound { .. } => 404,
            BattleError::NoOpponentAvailable { .. } => 404,
            BattleError::InvalidResultPayload { .. } => 400,
            BattleError::ConfigurationError { .. } | BattleError::InternalError { .. } => 500,
        }
    }

    /// Shorthand for a poisoned-lock failure in one of the in-memory stores
    pub(crate) fn lock_poisoned(what: &str) -> Self {
        BattleError::InternalError {
            message: format!("Failed to acquire {} lock", what),
        }
    }
}

/// Find the [`BattleError`] behind an `anyhow::Error`, if there is one
pub fn as_battle_error(error: &anyhow::Error) -> Option<&BattleError> {
    error.downcast_ref::<BattleError>()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(
            BattleError::ParticipantNotFound { participant_id: 7 }.status_code(),
            404
        );
        assert_eq!(
            BattleError::NoOpponentAvailable {
                rating: 1500,
                band: 200
            }
            .status_code(),
            404
        );
        assert_eq!(
            BattleError::InvalidResultPayload {
                reason: "x".to_string()
            }
            .status_code(),
            400
        );
    }

    #[test]
    fn test_downcast_through_anyhow() {
        let err: anyhow::Error = BattleError::ParticipantNotFound { participant_id: 3 }.into();
        assert!(matches!(
            as_battle_error(&err),
            Some(BattleError::ParticipantNotFound { participant_id: 3 })
        ));
        assert_eq!(err.to_string(), "Participant not found: 3");
    }

    #[test]
    fn test_no_opponent_message_is_client_facing() {
        let err = BattleError::NoOpponentAvailable {
            rating: 1500,
            band: 200,
        };
        assert_eq!(err.to_string(), "No opponents found in your rating range");
    }
}
