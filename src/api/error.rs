//! JSON error responses for the battle API

use crate::error::{as_battle_error, BattleError};
use axum::{
    extract::rejection::{JsonRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use tracing::{error, warn};

/// An error answered as `{"error": message}`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn unauthorized() -> Self {
        Self::new(StatusCode::UNAUTHORIZED, "Missing or invalid X-User-Id header")
    }

    pub fn internal() -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(json!({ "error": self.message }))).into_response()
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        match as_battle_error(&err) {
            Some(
                battle_error @ (BattleError::ConfigurationError { .. }
                | BattleError::InternalError { .. }),
            ) => {
                error!("Battle request failed: {}", battle_error);
                Self::internal()
            }
            Some(battle_error) => {
                let status = StatusCode::from_u16(battle_error.status_code())
                    .unwrap_or(StatusCode::BAD_REQUEST);
                Self::new(status, battle_error.to_string())
            }
            None => {
                error!("Unexpected battle request failure: {:#}", err);
                Self::internal()
            }
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        warn!("Rejected request body: {}", rejection.body_text());
        match rejection {
            JsonRejection::JsonDataError(_) => {
                Self::new(StatusCode::BAD_REQUEST, "Missing required fields")
            }
            other => Self::new(other.status(), other.body_text()),
        }
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        Self::new(StatusCode::BAD_REQUEST, rejection.body_text())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_battle_errors_keep_their_status() {
        let err: ApiError = anyhow::Error::from(BattleError::NoOpponentAvailable {
            rating: 1500,
            band: 200,
        })
        .into();
        assert_eq!(err.status, StatusCode::NOT_FOUND);
        assert_eq!(err.message, "No opponents found in your rating range");

        let err: ApiError = anyhow::Error::from(BattleError::InvalidResultPayload {
            reason: "total_questions must be positive".to_string(),
        })
        .into();
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_internal_details_are_hidden() {
        let err: ApiError = anyhow::Error::from(BattleError::lock_poisoned("participant")).into();
        assert_eq!(err, ApiError::internal());

        let err: ApiError = anyhow::anyhow!("disk on fire").into();
        assert_eq!(err.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.message, "Internal server error");
    }
}
