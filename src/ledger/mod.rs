//! Battle result ledger
//!
//! Result storage, rating application on submission, leaderboards, battle
//! statistics and the ranked pairing sweep.

pub mod leaderboard;
#[allow(clippy::module_inception)]
pub mod ledger;
pub mod reconcile;
pub mod storage;

pub use ledger::{validate_submission, BattleResultLedger, SubmissionOutcome};
pub use reconcile::{MismatchKind, PairMismatch, ReconciliationReport};
pub use storage::{BattleResultStorage, InMemoryBattleResultStorage, InsertOutcome};
