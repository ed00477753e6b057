//! Battle lifecycle integration tests
//!
//! Repeated play, resubmission, concurrent reporting and storage failure,
//! all through the shared application state.

use battle_room::error::as_battle_error;
use battle_room::rating::InMemoryParticipantStorage;
use battle_room::service::{AppState, HealthCheck, HealthStatus};
use battle_room::types::LeaderboardPeriod;
use battle_room::BattleError;
use futures::future::join_all;
use std::collections::HashSet;
use std::sync::Arc;

use crate::fixtures::{
    create_test_participants, create_test_state, quick_submission, ranked_submission,
    seeded_config, UnavailableResultStorage,
};

#[tokio::test]
async fn test_series_bookkeeping() {
    let state = create_test_state(&[1500, 1500]);

    // Participant 1 wins five and loses three against participant 2
    for round in 0..8 {
        let battle_id = format!("ranked_series_{}", round);
        let p1_wins = round < 5;
        state
            .submit_result(ranked_submission(&battle_id, 1, 2, p1_wins))
            .unwrap();
        state
            .submit_result(ranked_submission(&battle_id, 2, 1, !p1_wins))
            .unwrap();
    }

    let participants = state.participants();
    let p1 = participants.get_participant(1).unwrap().unwrap();
    let p2 = participants.get_participant(2).unwrap().unwrap();

    assert_eq!((p1.wins, p1.losses), (5, 3));
    assert_eq!((p2.wins, p2.losses), (3, 5));
    assert_eq!(p1.rating + p2.rating, 3000);
    assert!(p1.rating > 1500);

    assert_eq!(state.history(1, Some(3)).unwrap().len(), 3);
    assert_eq!(
        state.history(1, None).unwrap()[0].battle_id,
        "ranked_series_7"
    );

    let weekly = state.leaderboard(LeaderboardPeriod::Week, None, Some(2)).unwrap();
    assert_eq!(weekly.leaderboard[0].username, "player1");
    assert_eq!(weekly.leaderboard[0].wins, 5);
    assert_eq!(weekly.current_user_rank, Some(2));

    assert!(state.reconcile().unwrap().is_clean());
}

#[tokio::test]
async fn test_ranked_pick_reaches_whole_band() {
    // Requester at 1500, ten candidates rated 1515..=1650, all in band
    let mut ratings = vec![1500];
    ratings.extend((1..=10).map(|i| 1500 + 15 * i));
    let state = create_test_state(&ratings);

    let picked: HashSet<_> = (0..2000)
        .map(|_| state.ranked_match(1).unwrap().opponent.participant_id().unwrap())
        .collect();

    assert_eq!(picked, (2..=11).collect::<HashSet<_>>());
}

#[tokio::test]
async fn test_resubmission_is_idempotent() {
    let state = create_test_state(&[1600, 1550]);

    let first = state
        .submit_result(ranked_submission("ranked_dup", 1, 2, false))
        .unwrap();
    assert!(!first.duplicate);

    let again = state
        .submit_result(ranked_submission("ranked_dup", 1, 2, true))
        .unwrap();
    assert!(again.duplicate);
    assert_eq!(again.result, first.result);
    assert_eq!(again.new_rating, first.new_rating);

    let p1 = state.participants().get_participant(1).unwrap().unwrap();
    assert_eq!((p1.wins, p1.losses), (0, 1));
    assert_eq!(state.stats().unwrap().total, 1);
}

#[tokio::test]
async fn test_rejected_payload_changes_nothing() {
    let state = create_test_state(&[1500, 1500]);

    let mut bad = ranked_submission("ranked_bad", 1, 2, true);
    bad.questions_correct = 11;

    let err = state.submit_result(bad).unwrap_err();
    assert!(matches!(
        as_battle_error(&err),
        Some(BattleError::InvalidResultPayload { .. })
    ));

    let p1 = state.participants().get_participant(1).unwrap().unwrap();
    assert_eq!(p1.rating, 1500);
    assert_eq!(p1.wins, 0);
    assert_eq!(state.stats().unwrap().total, 0);

    let err = state
        .submit_result(quick_submission("battle_ghost", 99, true))
        .unwrap_err();
    assert!(matches!(
        as_battle_error(&err),
        Some(BattleError::ParticipantNotFound { participant_id: 99 })
    ));
}

#[tokio::test]
async fn test_concurrent_submissions_stay_zero_sum() {
    let ratings: Vec<i32> = (0..40).map(|i| 1300 + i * 10).collect();
    let state = create_test_state(&ratings);
    let total_before: i32 = ratings.iter().sum();

    // Disjoint pairs (1,2), (3,4), ... each play one battle; both sides race
    let tasks = (0..20u64).flat_map(|pair| {
        let a = pair * 2 + 1;
        let b = a + 1;
        let battle_id = format!("ranked_concurrent_{}", pair);
        let a_wins = pair % 3 != 0;

        [
            ranked_submission(&battle_id, a, b, a_wins),
            ranked_submission(&battle_id, b, a, !a_wins),
        ]
        .into_iter()
        .map(|submission| {
            let state = state.clone();
            tokio::spawn(async move { state.submit_result(submission) })
        })
        .collect::<Vec<_>>()
    });

    let outcomes = join_all(tasks).await;
    for outcome in outcomes {
        outcome.unwrap().unwrap();
    }

    let participants = state.participants().get_all_participants().unwrap();
    let total_after: i32 = participants.iter().map(|p| p.rating).sum();
    let wins: u32 = participants.iter().map(|p| p.wins).sum();
    let losses: u32 = participants.iter().map(|p| p.losses).sum();

    assert_eq!(total_after, total_before);
    assert_eq!(wins, 20);
    assert_eq!(losses, 20);

    let report = state.reconcile().unwrap();
    assert_eq!(report.battles_checked, 20);
    assert_eq!(report.incomplete, 0);
    assert!(report.is_clean());
}

#[tokio::test]
async fn test_result_storage_outage() {
    let participants = Arc::new(InMemoryParticipantStorage::with_participants(
        create_test_participants(&[1500, 1500]),
    ));
    let state = AppState::with_storage(
        seeded_config(),
        participants.clone(),
        Arc::new(UnavailableResultStorage),
    )
    .unwrap();
    state.set_running(true).await;

    let err = state
        .submit_result(ranked_submission("ranked_down", 1, 2, true))
        .unwrap_err();
    assert!(as_battle_error(&err).is_none());
    assert_eq!(state.participants().get_participant(1).unwrap().unwrap().rating, 1500);

    // Matchmaking does not touch result storage
    assert!(state.ranked_match(1).is_ok());

    let health = HealthCheck::check(&state).await.unwrap();
    assert_eq!(health.status, HealthStatus::Unhealthy);
    assert!(health
        .checks
        .iter()
        .any(|c| c.name == "result_storage" && c.status == HealthStatus::Unhealthy));
}
