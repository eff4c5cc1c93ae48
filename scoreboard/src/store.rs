//! Participant records with name uniqueness and per-participant locking.
//!
//! Every participant lives in its own slot behind a mutex. Score mutation is
//! only possible through a [`LockedParticipant`], which the claim path holds
//! while it appends the matching ledger entry.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError, RwLock};

use chrono::{DateTime, Utc};
use tracing::debug;

use crate::core::clock::strictly_after;
use crate::core::types::{AwardAmount, Participant, ParticipantId, ParticipantRecord};
use crate::error::{Error, Result};
use crate::ids;
use crate::io::journal::Journal;

type Slot = Arc<Mutex<Participant>>;

/// Keyed storage of participants.
///
/// Registrations are serialized by `registration` and journaled without
/// holding `index`, so claims and snapshots keep running during an fsync.
pub struct ParticipantStore {
    index: RwLock<Index>,
    registration: Mutex<()>,
    journal: Arc<dyn Journal>,
}

#[derive(Default)]
struct Index {
    slots: HashMap<ParticipantId, Slot>,
    names: HashMap<String, ParticipantId>,
    last_created_at: Option<DateTime<Utc>>,
}

impl Index {
    fn insert(&mut self, participant: Participant) {
        self.last_created_at = self.last_created_at.max(Some(participant.created_at));
        self.names
            .insert(participant.name.clone(), participant.id.clone());
        self.slots
            .insert(participant.id.clone(), Arc::new(Mutex::new(participant)));
    }
}

/// Exclusive access to one participant record.
pub struct LockedParticipant<'a> {
    participant: &'a mut Participant,
}

impl LockedParticipant<'_> {
    pub fn id(&self) -> &ParticipantId {
        &self.participant.id
    }

    pub fn participant(&self) -> &Participant {
        &*self.participant
    }

    /// Add `amount` to the score. Callers must have recorded the matching
    /// ledger entry under the same lock.
    pub(crate) fn apply_award(&mut self, amount: AwardAmount) -> Participant {
        self.participant.score += u64::from(amount.get());
        self.participant.clone()
    }
}

impl ParticipantStore {
    pub fn new(journal: Arc<dyn Journal>) -> Self {
        Self {
            index: RwLock::new(Index::default()),
            registration: Mutex::new(()),
            journal,
        }
    }

    /// Register a participant under the trimmed `name` with score 0.
    pub fn create(&self, name: &str) -> Result<Participant> {
        let name = name.trim();
        if name.is_empty() {
            return Err(Error::InvalidName);
        }

        // Names, ids and `last_created_at` only change under this guard, so
        // the checks below still hold when the record is inserted.
        let _registering = self
            .registration
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        let record = {
            let index = self.index.read().unwrap_or_else(PoisonError::into_inner);
            if index.names.contains_key(name) {
                return Err(Error::DuplicateName(name.to_string()));
            }
            let id = loop {
                let candidate = ids::participant_id();
                if !index.slots.contains_key(&candidate) {
                    break candidate;
                }
            };
            ParticipantRecord {
                id,
                name: name.to_string(),
                created_at: strictly_after(index.last_created_at, Utc::now()),
            }
        };
        self.journal
            .record_participant(&record)
            .map_err(Error::storage)?;

        let participant = Participant::from_record(record);
        self.index
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(participant.clone());
        debug!(participant_id = %participant.id, name = %participant.name, "participant created");
        Ok(participant)
    }

    /// Re-insert a journaled registration without writing it again.
    pub(crate) fn restore(&self, record: ParticipantRecord) -> Result<()> {
        let _registering = self
            .registration
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        let mut index = self.index.write().unwrap_or_else(PoisonError::into_inner);
        if index.slots.contains_key(&record.id) {
            return Err(Error::Storage(format!(
                "journal registers participant id '{}' twice",
                record.id
            )));
        }
        if index.names.contains_key(&record.name) {
            return Err(Error::Storage(format!(
                "journal registers name '{}' twice",
                record.name
            )));
        }
        index.insert(Participant::from_record(record));
        Ok(())
    }

    pub fn get(&self, id: &ParticipantId) -> Result<Participant> {
        self.with_participant(id, |locked| Ok(locked.participant().clone()))
    }

    /// Snapshot of every participant, in no particular order.
    ///
    /// Each record is read under its slot lock, so no half-applied claim is
    /// ever visible.
    pub fn list_all(&self) -> Vec<Participant> {
        self.slots()
            .iter()
            .map(|slot| slot.lock().unwrap_or_else(PoisonError::into_inner).clone())
            .collect()
    }

    pub fn ids(&self) -> Vec<ParticipantId> {
        let index = self.index.read().unwrap_or_else(PoisonError::into_inner);
        index.slots.keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        let index = self.index.read().unwrap_or_else(PoisonError::into_inner);
        index.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Run `f` while holding the participant's slot lock.
    ///
    /// Other participants stay unlocked; concurrent callers for the same id
    /// are serialized.
    pub(crate) fn with_participant<T>(
        &self,
        id: &ParticipantId,
        f: impl FnOnce(&mut LockedParticipant<'_>) -> Result<T>,
    ) -> Result<T> {
        let slot = self.slot(id)?;
        let mut guard = slot.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut LockedParticipant {
            participant: &mut *guard,
        })
    }

    fn slot(&self, id: &ParticipantId) -> Result<Slot> {
        let index = self.index.read().unwrap_or_else(PoisonError::into_inner);
        index
            .slots
            .get(id)
            .cloned()
            .ok_or_else(|| Error::NotFound(id.clone()))
    }

    fn slots(&self) -> Vec<Slot> {
        let index = self.index.read().unwrap_or_else(PoisonError::into_inner);
        index.slots.values().cloned().collect()
    }
}
