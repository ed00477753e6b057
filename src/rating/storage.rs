//! Participant storage interface and implementations
//!
//! The identity subsystem owns participant records; the battle core reads
//! them for matchmaking and writes back rating and win/loss changes.

use crate::error::BattleError;
use crate::types::{Participant, ParticipantId};
use std::collections::HashMap;
use std::sync::RwLock;

/// Trait for participant storage operations
#[cfg_attr(test, mockall::automock)]
pub trait ParticipantStorage: Send + Sync {
    /// Get a participant by id
    fn get_participant(&self, participant_id: ParticipantId)
        -> crate::error::Result<Option<Participant>>;

    /// Store or replace a participant record
    fn store_participant(&self, participant: Participant) -> crate::error::Result<()>;

    /// Get every participant, ordered by id
    fn get_all_participants(&self) -> crate::error::Result<Vec<Participant>>;

    /// Get participants whose rating lies in `[min_rating, max_rating]`,
    /// ordered by rating descending then id
    fn get_participants_by_rating_range(
        &self,
        min_rating: i32,
        max_rating: i32,
        limit: Option<usize>,
    ) -> crate::error::Result<Vec<Participant>>;

    /// Get total number of participants
    fn get_participant_count(&self) -> crate::error::Result<usize>;
}

/// In-memory participant storage implementation
#[derive(Debug, Default)]
pub struct InMemoryParticipantStorage {
    participants: RwLock<HashMap<ParticipantId, Participant>>,
}

impl InMemoryParticipantStorage {
    /// Create an empty storage
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a storage pre-populated with participants
    pub fn with_participants(participants: impl IntoIterator<Item = Participant>) -> Self {
        let map = participants.into_iter().map(|p| (p.id, p)).collect();
        Self {
            participants: RwLock::new(map),
        }
    }

    fn read(
        &self,
    ) -> crate::error::Result<std::sync::RwLockReadGuard<'_, HashMap<ParticipantId, Participant>>>
    {
        self.participants
            .read()
            .map_err(|_| BattleError::lock_poisoned("participants read").into())
    }

    fn write(
        &self,
    ) -> crate::error::Result<std::sync::RwLockWriteGuard<'_, HashMap<ParticipantId, Participant>>>
    {
        self.participants
            .write()
            .map_err(|_| BattleError::lock_poisoned("participants write").into())
    }
}

impl ParticipantStorage for InMemoryParticipantStorage {
    fn get_participant(
        &self,
        participant_id: ParticipantId,
    ) -> crate::error::Result<Option<Participant>> {
        Ok(self.read()?.get(&participant_id).cloned())
    }

    fn store_participant(&self, participant: Participant) -> crate::error::Result<()> {
        self.write()?.insert(participant.id, participant);
        Ok(())
    }

    fn get_all_participants(&self) -> crate::error::Result<Vec<Participant>> {
        let mut all: Vec<Participant> = self.read()?.values().cloned().collect();
        all.sort_by_key(|p| p.id);
        Ok(all)
    }

    fn get_participants_by_rating_range(
        &self,
        min_rating: i32,
        max_rating: i32,
        limit: Option<usize>,
    ) -> crate::error::Result<Vec<Participant>> {
        let mut matching: Vec<Participant> = self
            .read()?
            .values()
            .filter(|p| p.rating >= min_rating && p.rating <= max_rating)
            .cloned()
            .collect();

        matching.sort_by(|a, b| b.rating.cmp(&a.rating).then(a.id.cmp(&b.id)));

        if let Some(limit) = limit {
            matching.truncate(limit);
        }

        Ok(matching)
    }

    fn get_participant_count(&self) -> crate::error::Result<usize> {
        Ok(self.read()?.len())
    }
}
