//! Battle endpoint handlers

use crate::api::error::ApiError;
use crate::api::extract::CurrentUser;
use crate::service::AppState;
use crate::types::{
    BattleMode, BattleResult, BattleStats, Leaderboard, LeaderboardPeriod, MatchAssignment,
    OpponentRef, ParticipantId, ResultSubmission, DEFAULT_RATING,
};
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::info;

/// Results returned by `/history` when no limit is given
pub const DEFAULT_HISTORY_LIMIT: usize = 20;

fn default_mode() -> BattleMode {
    BattleMode::Quick
}

fn default_total_questions() -> i32 {
    BattleMode::Quick.default_question_count() as i32
}

fn default_opponent_rating() -> i32 {
    DEFAULT_RATING
}

/// Body of `POST /submit-result`
#[derive(Debug, Clone, Deserialize)]
pub struct SubmitResultRequest {
    pub battle_id: String,
    pub score: i64,
    pub questions_correct: i32,
    pub is_winner: bool,
    #[serde(default = "default_mode")]
    pub mode: BattleMode,
    #[serde(default)]
    pub opponent_id: Option<OpponentRef>,
    #[serde(default = "default_total_questions")]
    pub total_questions: i32,
    #[serde(default = "default_opponent_rating")]
    pub opponent_rating: i32,
}

impl SubmitResultRequest {
    pub fn into_submission(self, user_id: ParticipantId) -> ResultSubmission {
        let opponent_id = match self.opponent_id {
            Some(OpponentRef::Participant(id)) => Some(id),
            // Clients sometimes send numeric ids as strings; anything else is the practice marker
            Some(OpponentRef::Practice(raw)) => raw.trim().parse().ok(),
            None => None,
        };

        ResultSubmission {
            battle_id: self.battle_id,
            user_id,
            opponent_id,
            mode: self.mode,
            score: self.score,
            questions_correct: self.questions_correct,
            total_questions: self.total_questions,
            is_winner: self.is_winner,
            opponent_rating_hint: self.opponent_rating,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmitResultResponse {
    pub message: String,
    pub rating_change: i32,
    pub new_rating: i32,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LeaderboardQuery {
    pub period: Option<String>,
    pub limit: Option<usize>,
}

impl LeaderboardQuery {
    /// Unrecognised periods fall back to all-time
    pub fn period(&self) -> LeaderboardPeriod {
        self.period
            .as_deref()
            .and_then(|raw| raw.trim().to_ascii_lowercase().parse().ok())
            .unwrap_or_default()
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct HistoryQuery {
    pub limit: Option<usize>,
}

#[derive(Debug, Clone, Serialize)]
pub struct HistoryResponse {
    pub battles: Vec<BattleResult>,
    /// All results recorded for the caller, not just this page
    pub total: usize,
}

pub async fn quick_match(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
) -> Result<Json<MatchAssignment>, ApiError> {
    Ok(Json(state.quick_match(user_id)?))
}

pub async fn ranked_match(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
) -> Result<Json<MatchAssignment>, ApiError> {
    Ok(Json(state.ranked_match(user_id)?))
}

pub async fn submit_result(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    body: Result<Json<SubmitResultRequest>, JsonRejection>,
) -> Result<Json<SubmitResultResponse>, ApiError> {
    let Json(request) = body?;
    let outcome = state.submit_result(request.into_submission(user_id))?;

    if outcome.duplicate {
        info!(
            "Participant {} resubmitted battle {}",
            user_id, outcome.result.battle_id
        );
    }

    Ok(Json(SubmitResultResponse {
        message: "Battle result saved".to_string(),
        rating_change: outcome.result.rating_change,
        new_rating: outcome.new_rating,
    }))
}

pub async fn leaderboard(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    query: Result<Query<LeaderboardQuery>, QueryRejection>,
) -> Result<Json<Leaderboard>, ApiError> {
    let Query(query) = query?;
    Ok(Json(state.leaderboard(
        query.period(),
        query.limit,
        Some(user_id),
    )?))
}

pub async fn history(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    query: Result<Query<HistoryQuery>, QueryRejection>,
) -> Result<Json<HistoryResponse>, ApiError> {
    let Query(query) = query?;
    let battles = state.history(user_id, Some(query.limit.unwrap_or(DEFAULT_HISTORY_LIMIT)))?;
    let total = state.ledger().participant_battle_count(user_id)?;
    Ok(Json(HistoryResponse { battles, total }))
}

pub async fn stats(
    State(state): State<AppState>,
    CurrentUser(_): CurrentUser,
) -> Result<Json<BattleStats>, ApiError> {
    Ok(Json(state.stats()?))
}
