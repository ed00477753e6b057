//! Battle result storage interface and implementations
//!
//! Rows are append-only and keyed by `(battle_id, user_id)`: each side of a
//! battle owns exactly one row, and a second insert for the same key is
//! reported instead of applied.

use crate::error::BattleError;
use crate::types::{BattleId, BattleResult, ParticipantId};
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::RwLock;

/// Outcome of inserting a result row
#[derive(Debug, Clone, PartialEq)]
pub enum InsertOutcome {
    /// The row was stored
    Inserted,
    /// A row for the same `(battle_id, user_id)` already exists
    AlreadyRecorded(BattleResult),
}

/// Trait for battle result storage operations
#[cfg_attr(test, mockall::automock)]
pub trait BattleResultStorage: Send + Sync {
    /// Append a result unless its key is already taken
    fn insert_result(&self, result: BattleResult) -> crate::error::Result<InsertOutcome>;

    /// Get one participant's row for a battle
    fn get_result(
        &self,
        battle_id: &str,
        user_id: ParticipantId,
    ) -> crate::error::Result<Option<BattleResult>>;

    /// A participant's rows, newest first
    fn results_for_participant(
        &self,
        user_id: ParticipantId,
        limit: Option<usize>,
    ) -> crate::error::Result<Vec<BattleResult>>;

    /// Rows recorded at or after `since`, in insertion order
    fn results_since(&self, since: DateTime<Utc>) -> crate::error::Result<Vec<BattleResult>>;

    /// Every row, in insertion order
    fn all_results(&self) -> crate::error::Result<Vec<BattleResult>>;

    /// Get total number of rows
    fn result_count(&self) -> crate::error::Result<usize>;
}

#[derive(Debug, Default)]
struct ResultTable {
    rows: Vec<BattleResult>,
    by_key: HashMap<(BattleId, ParticipantId), usize>,
}

/// In-memory battle result storage implementation
#[derive(Debug, Default)]
pub struct InMemoryBattleResultStorage {
    table: RwLock<ResultTable>,
}

impl InMemoryBattleResultStorage {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> crate::error::Result<std::sync::RwLockReadGuard<'_, ResultTable>> {
        self.table
            .read()
            .map_err(|_| BattleError::lock_poisoned("results read").into())
    }

    fn write(&self) -> crate::error::Result<std::sync::RwLockWriteGuard<'_, ResultTable>> {
        self.table
            .write()
            .map_err(|_| BattleError::lock_poisoned("results write").into())
    }
}

impl BattleResultStorage for InMemoryBattleResultStorage {
    fn insert_result(&self, result: BattleResult) -> crate::error::Result<InsertOutcome> {
        let mut table = self.write()?;
        let key = (result.battle_id.clone(), result.user_id);

        if let Some(&index) = table.by_key.get(&key) {
            return Ok(InsertOutcome::AlreadyRecorded(table.rows[index].clone()));
        }

        let index = table.rows.len();
        table.rows.push(result);
        table.by_key.insert(key, index);

        Ok(InsertOutcome::Inserted)
    }

    fn get_result(
        &self,
        battle_id: &str,
        user_id: ParticipantId,
    ) -> crate::error::Result<Option<BattleResult>> {
        let table = self.read()?;

        Ok(table
            .by_key
            .get(&(battle_id.to_string(), user_id))
            .map(|&index| table.rows[index].clone()))
    }

    fn results_for_participant(
        &self,
        user_id: ParticipantId,
        limit: Option<usize>,
    ) -> crate::error::Result<Vec<BattleResult>> {
        let table = self.read()?;

        // Rows are appended in recording order, so reverse order is newest first
        let newest_first = table.rows.iter().rev().filter(|r| r.user_id == user_id);

        Ok(match limit {
            Some(limit) => newest_first.take(limit).cloned().collect(),
            None => newest_first.cloned().collect(),
        })
    }

    fn results_since(&self, since: DateTime<Utc>) -> crate::error::Result<Vec<BattleResult>> {
        Ok(self
            .read()?
            .rows
            .iter()
            .filter(|r| r.recorded_at >= since)
            .cloned()
            .collect())
    }

    fn all_results(&self) -> crate::error::Result<Vec<BattleResult>> {
        Ok(self.read()?.rows.clone())
    }

    fn result_count(&self) -> crate::error::Result<usize> {
        Ok(self.read()?.rows.len())
    }
}
