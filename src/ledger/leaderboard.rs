//! Leaderboard ordering
//!
//! All-time standings order by current rating; windowed standings order by
//! ranked wins inside the window. Ties always fall back to ascending id so
//! the same data yields the same ranking.

use crate::types::{
    BattleMode, BattleResult, Leaderboard, LeaderboardEntry, Participant, ParticipantId,
};
use crate::utils::win_rate;
use std::collections::HashMap;

/// A participant's position input: who they are and the record shown
#[derive(Debug, Clone, PartialEq)]
pub struct Standing<'a> {
    pub participant: &'a Participant,
    pub wins: u32,
    pub losses: u32,
}

/// Participants rated above `min_rating`, by rating descending then id
pub fn order_all_time(participants: &[Participant], min_rating: i32) -> Vec<Standing<'_>> {
    let mut standings: Vec<Standing<'_>> = participants
        .iter()
        .filter(|p| p.rating > min_rating)
        .map(|p| Standing {
            participant: p,
            wins: p.wins,
            losses: p.losses,
        })
        .collect();

    standings.sort_by(|a, b| {
        b.participant
            .rating
            .cmp(&a.participant.rating)
            .then(a.participant.id.cmp(&b.participant.id))
    });

    standings
}

/// Participants rated above `min_rating` with at least one ranked result in
/// `window_results`, by window wins descending then id
pub fn order_windowed<'a>(
    participants: &'a [Participant],
    window_results: &[BattleResult],
    min_rating: i32,
) -> Vec<Standing<'a>> {
    let mut records: HashMap<ParticipantId, (u32, u32)> = HashMap::new();

    for result in window_results
        .iter()
        .filter(|r| r.mode == BattleMode::Ranked)
    {
        let record = records.entry(result.user_id).or_default();
        if result.is_winner {
            record.0 += 1;
        } else {
            record.1 += 1;
        }
    }

    let mut standings: Vec<Standing<'a>> = participants
        .iter()
        .filter(|p| p.rating > min_rating)
        .filter_map(|p| {
            records.get(&p.id).map(|&(wins, losses)| Standing {
                participant: p,
                wins,
                losses,
            })
        })
        .collect();

    standings.sort_by(|a, b| {
        b.wins
            .cmp(&a.wins)
            .then(a.participant.id.cmp(&b.participant.id))
    });

    standings
}

/// Truncate ordered standings to a page and locate the requester in the
/// full ordering
pub fn build_leaderboard(
    ordered: &[Standing<'_>],
    limit: usize,
    requester: Option<ParticipantId>,
) -> Leaderboard {
    let leaderboard = ordered
        .iter()
        .take(limit)
        .enumerate()
        .map(|(index, standing)| LeaderboardEntry {
            rank: index as u32 + 1,
            participant_id: standing.participant.id,
            username: standing.participant.username.clone(),
            avatar: standing.participant.avatar.clone(),
            rating: standing.participant.rating,
            wins: standing.wins,
            losses: standing.losses,
            win_rate: win_rate(standing.wins, standing.losses),
        })
        .collect();

    let current_user_rank = requester.and_then(|id| {
        ordered
            .iter()
            .position(|s| s.participant.id == id)
            .map(|index| index as u32 + 1)
    });

    Leaderboard {
        leaderboard,
        current_user_rank,
        total_players: ordered.len(),
    }
}
