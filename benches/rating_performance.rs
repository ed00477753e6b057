//! Performance benchmarks for rating math, matchmaking and leaderboards

use battle_room::config::{MatchmakingConfig, RatingConfig};
use battle_room::ledger::leaderboard::{build_leaderboard, order_all_time};
use battle_room::matchmaking::Matchmaker;
use battle_room::rating::{expected_score, rating_delta, EloRatingCalculator, RatingCalculator};
use battle_room::types::{BattleMode, Participant, ResultSubmission};
use battle_room::AppState;
use criterion::{black_box, criterion_group, criterion_main, Criterion};
use std::sync::Arc;

fn population(size: u64) -> Vec<Participant> {
    (1..=size)
        .map(|id| {
            let mut participant = Participant::new(id, format!("player{}", id))
                .with_rating(1000 + ((id * 37) % 1000) as i32);
            participant.wins = (id % 13) as u32;
            participant.losses = (id % 7) as u32;
            participant
        })
        .collect()
}

fn bench_rating_calculations(c: &mut Criterion) {
    c.bench_function("expected_score", |b| {
        b.iter(|| black_box(expected_score(black_box(1800), black_box(1200))))
    });

    c.bench_function("rating_delta_both_sides", |b| {
        b.iter(|| {
            let win = rating_delta(black_box(1520), black_box(1480), true, 32.0);
            let loss = rating_delta(black_box(1480), black_box(1520), false, 32.0);
            black_box((win, loss))
        })
    });
}

fn bench_ranked_matchmaking(c: &mut Criterion) {
    let calculator: Arc<dyn RatingCalculator> =
        Arc::new(EloRatingCalculator::new(RatingConfig::default()).unwrap());
    let matchmaker = Matchmaker::new(MatchmakingConfig::default(), calculator).with_seed(42);
    let requester = Participant::new(0, "requester");

    for size in [100u64, 10_000] {
        let pool = population(size);
        c.bench_function(&format!("ranked_match_pool_{}", size), |b| {
            b.iter(|| black_box(matchmaker.ranked_match(&requester, &pool)))
        });
    }

    c.bench_function("quick_match", |b| {
        b.iter(|| black_box(matchmaker.quick_match(&requester)))
    });
}

fn bench_leaderboard(c: &mut Criterion) {
    let participants = population(10_000);

    c.bench_function("leaderboard_all_time_10k", |b| {
        b.iter(|| {
            let ordered = order_all_time(&participants, 1000);
            black_box(build_leaderboard(&ordered, 50, Some(5_000)))
        })
    });
}

fn bench_submission(c: &mut Criterion) {
    let state = AppState::new(Default::default()).unwrap();
    for participant in population(2) {
        state.register_participant(participant).unwrap();
    }

    let mut battle = 0u64;
    c.bench_function("submit_ranked_result", |b| {
        b.iter(|| {
            battle += 1;
            black_box(state.submit_result(ResultSubmission {
                battle_id: format!("ranked_{:016x}", battle),
                user_id: 1,
                opponent_id: Some(2),
                mode: BattleMode::Ranked,
                score: 700,
                questions_correct: 7,
                total_questions: 10,
                is_winner: battle % 2 == 0,
                opponent_rating_hint: 1500,
            }))
        })
    });
}

criterion_group!(
    benches,
    bench_rating_calculations,
    bench_ranked_matchmaking,
    bench_leaderboard,
    bench_submission
);
criterion_main!(benches);
