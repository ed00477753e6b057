//! Result ledger and leaderboard configuration

use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LedgerConfig {
    /// Leaderboard page size when the caller does not ask for one
    pub default_leaderboard_limit: usize,
    /// Only participants rated strictly above this are ranked
    pub leaderboard_min_rating: i32,
    /// Seconds between reconciliation sweeps (0 disables the sweep)
    pub reconcile_interval_seconds: u64,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            default_leaderboard_limit: 50,
            leaderboard_min_rating: 1000,
            reconcile_interval_seconds: 300,
        }
    }
}

impl LedgerConfig {
    /// Reconciliation interval, `None` when disabled
    pub fn reconcile_interval(&self) -> Option<Duration> {
        match self.reconcile_interval_seconds {
            0 => None,
            secs => Some(Duration::from_secs(secs)),
        }
    }
}
