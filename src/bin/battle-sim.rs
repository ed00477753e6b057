//! Battle Simulator CLI Tool
//!
//! Drives the battle core in-process with a seeded population, without
//! starting any servers.
//!
//! Usage:
//!   cargo run --bin battle-sim -- --help
//!   cargo run --bin battle-sim simulate --participants 40 --battles 500 --seed 7
//!   cargo run --bin battle-sim rating --a 1800 --b 1200

use anyhow::Result;
use battle_room::config::{AppConfig, MatchmakingConfig};
use battle_room::error::as_battle_error;
use battle_room::rating::elo::{expected_score, rating_delta, DEFAULT_K_FACTOR};
use battle_room::types::{
    LeaderboardPeriod, MatchAssignment, Participant, ParticipantId, ResultSubmission,
};
use battle_room::{AppState, BattleError};
use clap::{Parser, Subcommand};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::HashMap;

#[derive(Parser)]
#[command(name = "battle-sim")]
#[command(about = "Run seeded battle simulations against the battle-room core")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Simulate a population playing quick and ranked battles
    Simulate {
        /// Population size
        #[arg(short, long, default_value = "40")]
        participants: u64,
        /// Battles to play
        #[arg(short, long, default_value = "500")]
        battles: usize,
        /// Seed for both the population and the matchmaker
        #[arg(short, long, default_value = "7")]
        seed: u64,
        /// Share of battles played as ranked (0.0 - 1.0)
        #[arg(long, default_value = "0.8")]
        ranked_share: f64,
        /// Leaderboard rows to print
        #[arg(long, default_value = "10")]
        top: usize,
    },
    /// Show expected score and rating changes for one pairing
    Rating {
        #[arg(short, long)]
        a: i32,
        #[arg(short, long)]
        b: i32,
        #[arg(short, long, default_value_t = DEFAULT_K_FACTOR)]
        k_factor: f64,
    },
}

fn submission(
    assignment: &MatchAssignment,
    user_id: ParticipantId,
    opponent_id: Option<ParticipantId>,
    is_winner: bool,
    correct: i32,
) -> ResultSubmission {
    ResultSubmission {
        battle_id: assignment.battle_id.clone(),
        user_id,
        opponent_id,
        mode: assignment.mode,
        score: i64::from(correct) * 100,
        questions_correct: correct,
        total_questions: assignment.questions as i32,
        is_winner,
        opponent_rating_hint: assignment.opponent.rating(),
    }
}

fn simulate(
    population: u64,
    battles: usize,
    seed: u64,
    ranked_share: f64,
    top: usize,
) -> Result<()> {
    let config = AppConfig {
        matchmaking: MatchmakingConfig {
            rng_seed: Some(seed),
            ..Default::default()
        },
        ..Default::default()
    };
    let state = AppState::new(config)?;
    let mut rng = StdRng::seed_from_u64(seed);

    // Hidden skill decides who actually wins; the visible rating starts flat
    let mut skill: HashMap<ParticipantId, i32> = HashMap::new();
    for id in 1..=population {
        let rating = rng.gen_range(1300..=1700);
        state.register_participant(
            Participant::new(id, format!("player{:03}", id)).with_rating(rating),
        )?;
        skill.insert(id, rng.gen_range(1000..=2000));
    }

    let mut unmatched = 0usize;
    let ranked_share = ranked_share.clamp(0.0, 1.0);

    for _ in 0..battles {
        let user_id = rng.gen_range(1..=population);

        if rng.gen_bool(ranked_share) {
            let assignment = match state.ranked_match(user_id) {
                Ok(assignment) => assignment,
                Err(e) if matches!(
                    as_battle_error(&e),
                    Some(BattleError::NoOpponentAvailable { .. })
                ) =>
                {
                    unmatched += 1;
                    continue;
                }
                Err(e) => return Err(e),
            };

            let Some(opponent_id) = assignment.opponent.participant_id() else {
                continue;
            };
            let p_win = expected_score(skill[&user_id], skill[&opponent_id]);
            let user_wins = rng.gen_bool(p_win);
            let questions = assignment.questions as i32;

            // Either side may report first
            let user_correct = rng.gen_range(0..=questions);
            let opponent_correct = rng.gen_range(0..=questions);
            let sides = [
                submission(&assignment, user_id, Some(opponent_id), user_wins, user_correct),
                submission(&assignment, opponent_id, Some(user_id), !user_wins, opponent_correct),
            ];
            if rng.gen_bool(0.5) {
                for side in sides {
                    state.submit_result(side)?;
                }
            } else {
                for side in sides.into_iter().rev() {
                    state.submit_result(side)?;
                }
            }
        } else {
            let assignment = state.quick_match(user_id)?;
            let questions = assignment.questions as i32;
            let correct = rng.gen_range(0..=questions);
            state.submit_result(submission(
                &assignment,
                user_id,
                None,
                correct * 2 > questions,
                correct,
            ))?;
        }
    }

    println!(
        "🎲 Simulated {} battles over {} participants (seed {})",
        battles, population, seed
    );
    println!("   Ranked requests without an opponent: {}", unmatched);

    let stats = state.stats()?;
    println!(
        "   Results recorded: {} (ranked {}, quick {})",
        stats.total, stats.by_mode.ranked, stats.by_mode.quick
    );

    for period in [LeaderboardPeriod::All, LeaderboardPeriod::Week] {
        let board = state.leaderboard(period, Some(top), None)?;
        println!();
        println!(
            "🏆 Leaderboard ({}) - {} ranked players",
            period.as_str(),
            board.total_players
        );
        for entry in &board.leaderboard {
            println!(
                "   {:>3}. {:<12} {:>5}  {:>3}W {:>3}L  {:>5.1}%",
                entry.rank, entry.username, entry.rating, entry.wins, entry.losses, entry.win_rate
            );
        }
    }

    let report = state.reconcile()?;
    println!();
    println!(
        "🔍 Reconciliation: {} ranked battles, {} incomplete, {} mismatched",
        report.battles_checked,
        report.incomplete,
        report.mismatches.len()
    );
    for mismatch in &report.mismatches {
        println!("   {}", serde_json::to_string(mismatch)?);
    }

    Ok(())
}

fn show_rating(a: i32, b: i32, k_factor: f64) {
    println!("Expected score A vs B: {:.4}", expected_score(a, b));
    println!("Expected score B vs A: {:.4}", expected_score(b, a));
    println!(
        "A wins: A {:+}, B {:+}",
        rating_delta(a, b, true, k_factor),
        rating_delta(b, a, false, k_factor)
    );
    println!(
        "B wins: A {:+}, B {:+}",
        rating_delta(a, b, false, k_factor),
        rating_delta(b, a, true, k_factor)
    );
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn".into()),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Simulate {
            participants,
            battles,
            seed,
            ranked_share,
            top,
        } => {
            if participants < 2 {
                anyhow::bail!("Need at least two participants to simulate battles");
            }
            simulate(participants, battles, seed, ranked_share, top)
        }
        Commands::Rating { a, b, k_factor } => {
            show_rating(a, b, k_factor);
            Ok(())
        }
    }
}
