//! Request extractors

use crate::api::error::ApiError;
use crate::types::ParticipantId;
use axum::{extract::FromRequestParts, http::request::Parts};

/// Header the upstream auth layer sets to the caller's participant id
pub const USER_ID_HEADER: &str = "x-user-id";

/// The authenticated caller
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CurrentUser(pub ParticipantId);

impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .headers
            .get(USER_ID_HEADER)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.trim().parse::<ParticipantId>().ok())
            .map(CurrentUser)
            .ok_or_else(ApiError::unauthorized)
    }
}
