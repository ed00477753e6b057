//! Pairing checks for ranked battles
//!
//! The two sides of a ranked battle are submitted independently, so nothing
//! forces their rows to agree. The sweep here reads the stored rows and
//! reports disagreements; it never rewrites anything.

use crate::types::{BattleId, BattleMode, BattleResult};
use serde::Serialize;
use std::collections::BTreeMap;

/// What is wrong with one ranked battle
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MismatchKind {
    /// Both sides recorded, but the applied changes do not cancel out
    RatingNotZeroSum { sum: i32 },
    /// Both sides claim the win, or neither does
    WinnerConflict { winners: usize },
    /// More than two participants recorded the same battle id
    TooManySides { sides: usize },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PairMismatch {
    pub battle_id: BattleId,
    #[serde(flatten)]
    pub kind: MismatchKind,
}

/// Summary of one sweep over the ranked rows
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReconciliationReport {
    /// Ranked battles seen
    pub battles_checked: usize,
    /// Ranked battles with only one side recorded so far
    pub incomplete: usize,
    pub mismatches: Vec<PairMismatch>,
}

impl ReconciliationReport {
    pub fn is_clean(&self) -> bool {
        self.mismatches.is_empty()
    }
}

/// Check every ranked battle in `results`
pub fn reconcile(results: &[BattleResult]) -> ReconciliationReport {
    let mut battles: BTreeMap<&str, Vec<&BattleResult>> = BTreeMap::new();
    for result in results.iter().filter(|r| r.mode == BattleMode::Ranked) {
        battles.entry(result.battle_id.as_str()).or_default().push(result);
    }

    let mut report = ReconciliationReport {
        battles_checked: battles.len(),
        ..Default::default()
    };

    for (battle_id, sides) in battles {
        if let Some(kind) = check_pair(&sides) {
            report.mismatches.push(PairMismatch {
                battle_id: battle_id.to_string(),
                kind,
            });
        } else if sides.len() < 2 {
            report.incomplete += 1;
        }
    }

    report
}

fn check_pair(sides: &[&BattleResult]) -> Option<MismatchKind> {
    match sides {
        [_] => None,
        [a, b] => {
            let winners = usize::from(a.is_winner) + usize::from(b.is_winner);
            if winners != 1 {
                return Some(MismatchKind::WinnerConflict { winners });
            }

            let sum = a.rating_change + b.rating_change;
            (sum != 0).then_some(MismatchKind::RatingNotZeroSum { sum })
        }
        _ => Some(MismatchKind::TooManySides { sides: sides.len() }),
    }
}
