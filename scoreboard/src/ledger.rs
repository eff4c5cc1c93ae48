//! Append-only award history.
//!
//! Appends and reads both require a [`LockedParticipant`]: the caller proves
//! the participant exists and holds its lock, which keeps every history read
//! consistent with the score it explains.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError, RwLock};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::debug;

use crate::core::clock::strictly_after;
use crate::core::invariants::ledger_total;
use crate::core::types::{AwardAmount, AwardEvent, Participant, ParticipantId};
use crate::error::{Error, Result};
use crate::ids;
use crate::io::journal::Journal;
use crate::store::LockedParticipant;

type Stream = Arc<Mutex<Vec<AwardEvent>>>;

/// Per-participant award streams, oldest first.
///
/// Only the claim path can append, so outside callers cannot record an award
/// without the matching score change:
///
/// ```compile_fail
/// use scoreboard::Scoreboard;
///
/// let board = Scoreboard::in_memory();
/// let _ = board.ledger();
/// ```
///
/// ```compile_fail
/// use std::sync::Arc;
/// use scoreboard::io::journal::MemoryJournal;
/// use scoreboard::store::ParticipantStore;
///
/// let store = ParticipantStore::new(Arc::new(MemoryJournal));
/// let ada = store.create("Ada").expect("ada");
/// let _ = store.with_participant(&ada.id, |locked| Ok(locked.id().clone()));
/// ```
pub struct AwardLedger {
    streams: RwLock<HashMap<ParticipantId, Stream>>,
    journal: Arc<dyn Journal>,
}

impl AwardLedger {
    pub fn new(journal: Arc<dyn Journal>) -> Self {
        Self {
            streams: RwLock::new(HashMap::new()),
            journal,
        }
    }

    /// Durably append one award for the locked participant.
    ///
    /// `awarded_at` is nudged forward if it would not sort after the
    /// participant's latest award. Nothing is appended if the journal write
    /// fails.
    pub(crate) fn append(
        &self,
        holder: &LockedParticipant<'_>,
        amount: AwardAmount,
        awarded_at: DateTime<Utc>,
    ) -> Result<AwardEvent> {
        let stream = self.stream(holder.id());
        let mut events = stream.lock().unwrap_or_else(PoisonError::into_inner);
        let event = AwardEvent {
            id: ids::award_id(),
            participant_id: holder.id().clone(),
            amount,
            awarded_at: strictly_after(events.last().map(|e| e.awarded_at), awarded_at),
        };
        self.journal.record_award(&event).map_err(Error::storage)?;
        events.push(event.clone());
        debug!(participant_id = %event.participant_id, award_id = %event.id, amount = %event.amount, "award appended");
        Ok(event)
    }

    /// Re-insert a journaled award without writing it again.
    pub(crate) fn restore(&self, holder: &LockedParticipant<'_>, event: AwardEvent) -> Result<()> {
        if &event.participant_id != holder.id() {
            return Err(Error::Storage(format!(
                "award '{}' filed under participant '{}'",
                event.id,
                holder.id()
            )));
        }
        let stream = self.stream(holder.id());
        let mut events = stream.lock().unwrap_or_else(PoisonError::into_inner);
        events.push(event);
        Ok(())
    }

    /// Snapshot of the locked participant's awards, readable most recent first.
    pub(crate) fn history_for(&self, holder: &LockedParticipant<'_>) -> AwardHistory {
        let streams = self.streams.read().unwrap_or_else(PoisonError::into_inner);
        let events = streams
            .get(holder.id())
            .map(|stream| stream.lock().unwrap_or_else(PoisonError::into_inner).clone())
            .unwrap_or_default();
        AwardHistory {
            participant: holder.participant().clone(),
            events,
        }
    }

    fn stream(&self, id: &ParticipantId) -> Stream {
        {
            let streams = self.streams.read().unwrap_or_else(PoisonError::into_inner);
            if let Some(stream) = streams.get(id) {
                return Arc::clone(stream);
            }
        }
        let mut streams = self.streams.write().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(streams.entry(id.clone()).or_default())
    }
}

/// Award history for one participant, captured together with its score.
///
/// Iteration yields the most recent award first and can be restarted; call
/// [`crate::Scoreboard::history`] again for a fresh read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AwardHistory {
    participant: Participant,
    /// Oldest first.
    events: Vec<AwardEvent>,
}

impl AwardHistory {
    /// The participant as of this read; its score equals [`Self::total`].
    pub fn participant(&self) -> &Participant {
        &self.participant
    }

    pub fn iter(&self) -> std::iter::Rev<std::slice::Iter<'_, AwardEvent>> {
        self.events.iter().rev()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn total(&self) -> u64 {
        ledger_total(&self.events)
    }

    /// Events in commit order, oldest first.
    pub fn chronological(&self) -> &[AwardEvent] {
        &self.events
    }

    /// Most-recent-first events annotated with the participant's name.
    pub fn entries(&self) -> Vec<HistoryEntry> {
        self.iter()
            .map(|event| HistoryEntry {
                event: event.clone(),
                participant_name: self.participant.name.clone(),
            })
            .collect()
    }
}

/// Award event annotated with the recipient's name, for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HistoryEntry {
    #[serde(flatten)]
    pub event: AwardEvent,
    pub participant_name: String,
}

impl IntoIterator for AwardHistory {
    type Item = AwardEvent;
    type IntoIter = std::iter::Rev<std::vec::IntoIter<AwardEvent>>;

    fn into_iter(self) -> Self::IntoIter {
        self.events.into_iter().rev()
    }
}

impl<'a> IntoIterator for &'a AwardHistory {
    type Item = &'a AwardEvent;
    type IntoIter = std::iter::Rev<std::slice::Iter<'a, AwardEvent>>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::journal::MemoryJournal;
    use crate::store::ParticipantStore;
    use crate::test_support::amount;

    fn fixture() -> (ParticipantStore, AwardLedger) {
        let journal: Arc<dyn Journal> = Arc::new(MemoryJournal);
        (
            ParticipantStore::new(Arc::clone(&journal)),
            AwardLedger::new(journal),
        )
    }

    #[test]
    fn history_is_most_recent_first() {
        let (store, ledger) = fixture();
        let ada = store.create("Ada").expect("ada");
        let now = Utc::now();
        let history = store
            .with_participant(&ada.id, |locked| {
                for value in [2, 5, 9] {
                    ledger.append(locked, amount(value), now)?;
                }
                Ok(ledger.history_for(locked))
            })
            .expect("append");

        let amounts: Vec<u32> = history.iter().map(|event| event.amount.get()).collect();
        assert_eq!(amounts, vec![9, 5, 2]);
        assert!(
            history
                .chronological()
                .windows(2)
                .all(|pair| pair[0].awarded_at < pair[1].awarded_at)
        );
        assert_eq!(history.total(), 16);
        // Iterating twice gives the same sequence.
        assert_eq!(history.iter().count(), history.len());
        assert_eq!(history.clone().into_iter().next().map(|e| e.amount.get()), Some(9));
    }

    #[test]
    fn fresh_participant_has_empty_history() {
        let (store, ledger) = fixture();
        let bob = store.create("Bob").expect("bob");
        let history = store
            .with_participant(&bob.id, |locked| Ok(ledger.history_for(locked)))
            .expect("history");
        assert!(history.is_empty());
        assert_eq!(history.participant().name, "Bob");
    }

    #[test]
    fn restore_rejects_foreign_events() {
        let (store, ledger) = fixture();
        let ada = store.create("Ada").expect("ada");
        let bob = store.create("Bob").expect("bob");
        let event = AwardEvent {
            id: ids::award_id(),
            participant_id: bob.id.clone(),
            amount: amount(3),
            awarded_at: Utc::now(),
        };
        let err = store
            .with_participant(&ada.id, |locked| ledger.restore(locked, event))
            .unwrap_err();
        assert!(matches!(err, Error::Storage(_)));
    }
}
