//! Battle result ledger
//!
//! Records each participant's side of a finished battle and applies the
//! ranked rating and win/loss changes for that participant. A submission
//! either fully applies or leaves participant state untouched.

use crate::config::LedgerConfig;
use crate::error::{as_battle_error, BattleError, Result};
use crate::ledger::leaderboard::{build_leaderboard, order_all_time, order_windowed};
use crate::ledger::reconcile::{reconcile, ReconciliationReport};
use crate::ledger::storage::{BattleResultStorage, InsertOutcome};
use crate::metrics::MetricsCollector;
use crate::rating::{ParticipantStorage, RatingCalculator};
use crate::types::{
    BattleMode, BattleResult, BattleStats, Leaderboard, LeaderboardPeriod, ModeCounts,
    Participant, ParticipantId, ResultSubmission,
};
use crate::utils::current_timestamp;
use chrono::{DateTime, Utc};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Instant;
use tracing::{debug, info, warn};

/// What a submission produced
#[derive(Debug, Clone, PartialEq)]
pub struct SubmissionOutcome {
    /// The stored row for `(battle_id, user_id)`
    pub result: BattleResult,
    /// The submitter's rating after the submission
    pub new_rating: i32,
    /// True when the row already existed and nothing was applied
    pub duplicate: bool,
}

/// Records battle results and keeps participant ratings in step with them
pub struct BattleResultLedger {
    config: LedgerConfig,
    participants: Arc<dyn ParticipantStorage>,
    results: Arc<dyn BattleResultStorage>,
    rating_calculator: Arc<dyn RatingCalculator>,
    metrics: Option<Arc<MetricsCollector>>,
    // Serializes the read-modify-write of a participant record
    submit_lock: Mutex<()>,
}

impl BattleResultLedger {
    pub fn new(
        config: LedgerConfig,
        participants: Arc<dyn ParticipantStorage>,
        results: Arc<dyn BattleResultStorage>,
        rating_calculator: Arc<dyn RatingCalculator>,
    ) -> Self {
        Self {
            config,
            participants,
            results,
            rating_calculator,
            metrics: None,
            submit_lock: Mutex::new(()),
        }
    }

    pub fn with_metrics(mut self, metrics: Arc<MetricsCollector>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub fn config(&self) -> &LedgerConfig {
        &self.config
    }

    /// Record one side of a battle.
    ///
    /// Ranked submissions move the submitter's rating by the bounded Elo delta
    /// and bump `wins` or `losses`; quick submissions only store the row. A
    /// repeated `(battle_id, user_id)` returns the stored row unchanged.
    pub fn submit_result(&self, submission: ResultSubmission) -> Result<SubmissionOutcome> {
        let started = Instant::now();
        let outcome = self.apply_submission(&submission);

        if let Some(metrics) = &self.metrics {
            metrics.record_submission_duration(started.elapsed());
            match &outcome {
                Ok(outcome) if outcome.duplicate => metrics.record_duplicate_submission(),
                Ok(outcome) => metrics.record_result(
                    outcome.result.mode,
                    outcome.result.is_winner,
                    outcome.result.rating_change,
                ),
                Err(err) => metrics.record_rejected_submission(rejection_reason(err)),
            }
        }

        outcome
    }

    fn apply_submission(&self, submission: &ResultSubmission) -> Result<SubmissionOutcome> {
        validate_submission(submission)?;

        let _guard = self.submit_lock.lock().unwrap_or_else(PoisonError::into_inner);

        if let Some(existing) = self
            .results
            .get_result(&submission.battle_id, submission.user_id)?
        {
            return self.duplicate_outcome(existing);
        }

        let participant = self.require_participant(submission.user_id)?;

        let (updated, rating_change) = match submission.mode {
            BattleMode::Ranked => {
                let opponent_rating = self.resolve_opponent_rating(submission)?;
                self.apply_ranked_outcome(participant, opponent_rating, submission.is_winner)
            }
            BattleMode::Quick => (participant, 0),
        };

        let result = BattleResult {
            battle_id: submission.battle_id.clone(),
            user_id: submission.user_id,
            opponent_id: submission.opponent_id,
            mode: submission.mode,
            score: submission.score,
            questions_correct: submission.questions_correct,
            total_questions: submission.total_questions,
            is_winner: submission.is_winner,
            rating_change,
            recorded_at: current_timestamp(),
        };

        if let InsertOutcome::AlreadyRecorded(existing) = self.results.insert_result(result.clone())? {
            return self.duplicate_outcome(existing);
        }

        if submission.mode == BattleMode::Ranked {
            self.participants.store_participant(updated.clone())?;
        }

        info!(
            "Recorded {} result {} for participant {}: winner={}, rating_change={}, new_rating={}",
            result.mode,
            result.battle_id,
            result.user_id,
            result.is_winner,
            result.rating_change,
            updated.rating
        );

        Ok(SubmissionOutcome {
            result,
            new_rating: updated.rating,
            duplicate: false,
        })
    }

    fn duplicate_outcome(&self, existing: BattleResult) -> Result<SubmissionOutcome> {
        let participant = self.require_participant(existing.user_id)?;

        debug!(
            "Result {} for participant {} already recorded",
            existing.battle_id, existing.user_id
        );

        Ok(SubmissionOutcome {
            result: existing,
            new_rating: participant.rating,
            duplicate: true,
        })
    }

    fn require_participant(&self, participant_id: ParticipantId) -> Result<Participant> {
        self.participants
            .get_participant(participant_id)?
            .ok_or_else(|| BattleError::ParticipantNotFound { participant_id }.into())
    }

    /// Opponent's rating before this battle.
    ///
    /// If the opponent already recorded their side, their current rating minus
    /// that recorded change is used; otherwise their stored rating; otherwise
    /// the caller's hint.
    fn resolve_opponent_rating(&self, submission: &ResultSubmission) -> Result<i32> {
        let Some(opponent_id) = submission.opponent_id else {
            return Ok(submission.opponent_rating_hint);
        };

        let Some(opponent) = self.participants.get_participant(opponent_id)? else {
            debug!(
                "Opponent {} of battle {} unknown, using rating hint {}",
                opponent_id, submission.battle_id, submission.opponent_rating_hint
            );
            return Ok(submission.opponent_rating_hint);
        };

        let already_applied = self
            .results
            .get_result(&submission.battle_id, opponent_id)?
            .map(|r| r.rating_change)
            .unwrap_or(0);

        Ok(opponent.rating - already_applied)
    }

    fn apply_ranked_outcome(
        &self,
        mut participant: Participant,
        opponent_rating: i32,
        is_winner: bool,
    ) -> (Participant, i32) {
        let delta = self
            .rating_calculator
            .rating_delta(participant.rating, opponent_rating, is_winner);

        let previous = participant.rating;
        // Ratings never go below zero; the row records what was actually applied
        participant.rating = previous.saturating_add(delta).max(0);

        if is_winner {
            participant.wins += 1;
        } else {
            participant.losses += 1;
        }

        let applied = participant.rating - previous;
        (participant, applied)
    }

    /// Leaderboard page for `period`, with the requester's rank in the full
    /// ordering
    pub fn leaderboard(
        &self,
        period: LeaderboardPeriod,
        limit: Option<usize>,
        requester: Option<ParticipantId>,
    ) -> Result<Leaderboard> {
        self.leaderboard_at(period, limit, requester, current_timestamp())
    }

    /// Same as [`leaderboard`](Self::leaderboard) with an explicit clock
    pub fn leaderboard_at(
        &self,
        period: LeaderboardPeriod,
        limit: Option<usize>,
        requester: Option<ParticipantId>,
        now: DateTime<Utc>,
    ) -> Result<Leaderboard> {
        let started = Instant::now();
        let limit = limit.unwrap_or(self.config.default_leaderboard_limit);
        let participants = self.participants.get_all_participants()?;
        let min_rating = self.config.leaderboard_min_rating;

        let board = match period.window() {
            None => build_leaderboard(&order_all_time(&participants, min_rating), limit, requester),
            Some(window) => {
                let window_results = self.results.results_since(now - window)?;
                let ordered = order_windowed(&participants, &window_results, min_rating);
                build_leaderboard(&ordered, limit, requester)
            }
        };

        if let Some(metrics) = &self.metrics {
            metrics.record_leaderboard_query(period, started.elapsed());
        }

        debug!(
            "Leaderboard {} limit {}: {} of {} players",
            period.as_str(),
            limit,
            board.leaderboard.len(),
            board.total_players
        );

        Ok(board)
    }

    /// A participant's most recent results, newest first
    pub fn history(
        &self,
        participant_id: ParticipantId,
        limit: Option<usize>,
    ) -> Result<Vec<BattleResult>> {
        self.require_participant(participant_id)?;
        self.results.results_for_participant(participant_id, limit)
    }

    /// Number of results recorded for a participant
    pub fn participant_battle_count(&self, participant_id: ParticipantId) -> Result<usize> {
        Ok(self
            .results
            .results_for_participant(participant_id, None)?
            .len())
    }

    /// Totals across all recorded results
    pub fn stats(&self) -> Result<BattleStats> {
        self.stats_at(current_timestamp())
    }

    /// Same as [`stats`](Self::stats) with an explicit clock; "today" is the
    /// current UTC calendar day
    pub fn stats_at(&self, now: DateTime<Utc>) -> Result<BattleStats> {
        let all = self.results.all_results()?;

        let start_of_day = now
            .date_naive()
            .and_hms_opt(0, 0, 0)
            .map(|midnight| midnight.and_utc())
            .unwrap_or(now);

        let mut by_mode = ModeCounts::default();
        for result in &all {
            match result.mode {
                BattleMode::Quick => by_mode.quick += 1,
                BattleMode::Ranked => by_mode.ranked += 1,
            }
        }

        Ok(BattleStats {
            total: all.len(),
            today: all.iter().filter(|r| r.recorded_at >= start_of_day).count(),
            by_mode,
        })
    }

    /// Check every ranked battle whose sides are both recorded
    pub fn reconcile_battles(&self) -> Result<ReconciliationReport> {
        let report = reconcile(&self.results.all_results()?);

        if let Some(metrics) = &self.metrics {
            metrics.record_reconciliation(report.mismatches.len());
        }

        if report.is_clean() {
            debug!(
                "Reconciled {} ranked battles ({} awaiting the other side)",
                report.battles_checked, report.incomplete
            );
        } else {
            for mismatch in &report.mismatches {
                warn!("Ranked battle {} does not reconcile: {:?}", mismatch.battle_id, mismatch.kind);
            }
        }

        Ok(report)
    }
}

impl std::fmt::Debug for BattleResultLedger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BattleResultLedger")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

/// Reject payloads that cannot describe a real battle
pub fn validate_submission(submission: &ResultSubmission) -> Result<()> {
    let reason = if submission.battle_id.trim().is_empty() {
        Some("battle_id must not be empty".to_string())
    } else if submission.total_questions <= 0 {
        Some(format!(
            "total_questions must be positive, got {}",
            submission.total_questions
        ))
    } else if submission.questions_correct < 0 {
        Some(format!(
            "questions_correct must not be negative, got {}",
            submission.questions_correct
        ))
    } else if submission.questions_correct > submission.total_questions {
        Some(format!(
            "questions_correct ({}) exceeds total_questions ({})",
            submission.questions_correct, submission.total_questions
        ))
    } else if submission.opponent_id == Some(submission.user_id) {
        Some("a participant cannot battle themselves".to_string())
    } else {
        None
    };

    match reason {
        Some(reason) => Err(BattleError::InvalidResultPayload { reason }.into()),
        None => Ok(()),
    }
}

fn rejection_reason(err: &anyhow::Error) -> &'static str {
    match as_battle_error(err) {
        Some(BattleError::InvalidResultPayload { .. }) => "invalid_payload",
        Some(BattleError::ParticipantNotFound { .. }) => "participant_not_found",
        _ => "internal",
    }
}
