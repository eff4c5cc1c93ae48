//! The scoreboard service: participants, ledger and claims behind one handle.

use std::collections::HashSet;
use std::sync::Arc;

use tracing::{info, instrument};

use crate::award::{AwardSource, RandomAwards};
use crate::claim::{ClaimCoordinator, ClaimOutcome};
use crate::core::invariants::VerifyReport;
use crate::core::ranking::rank;
use crate::core::types::{Participant, ParticipantId, RankedView};
use crate::error::{Error, Result};
use crate::io::config::StorageConfig;
use crate::io::journal::{FileJournal, Journal, JournalContents, MemoryJournal};
use crate::ledger::{AwardHistory, AwardLedger};
use crate::store::ParticipantStore;

/// Shared handle for all scoreboard operations. Safe to use from many
/// threads at once.
pub struct Scoreboard {
    participants: Arc<ParticipantStore>,
    ledger: Arc<AwardLedger>,
    claims: ClaimCoordinator,
}

impl Scoreboard {
    /// Empty scoreboard that persists nothing.
    pub fn in_memory() -> Self {
        Self::assemble(Arc::new(MemoryJournal), Arc::new(RandomAwards))
    }

    /// Open the durable scoreboard under `config.data_dir`, replaying its
    /// journal.
    pub fn open(config: &StorageConfig) -> Result<Self> {
        let journal = FileJournal::open(&config.data_dir, config.sync_writes)
            .map_err(Error::storage)?;
        Self::with_journal(Arc::new(journal), Arc::new(RandomAwards))
    }

    /// Build a scoreboard over `journal`, restoring everything it holds.
    #[instrument(skip_all)]
    pub fn with_journal(journal: Arc<dyn Journal>, awards: Arc<dyn AwardSource>) -> Result<Self> {
        let contents = journal.load().map_err(Error::storage)?;
        let scoreboard = Self::assemble(journal, awards);
        scoreboard.replay(contents)?;
        Ok(scoreboard)
    }

    fn assemble(journal: Arc<dyn Journal>, awards: Arc<dyn AwardSource>) -> Self {
        let participants = Arc::new(ParticipantStore::new(Arc::clone(&journal)));
        let ledger = Arc::new(AwardLedger::new(journal));
        let claims = ClaimCoordinator::new(Arc::clone(&participants), Arc::clone(&ledger), awards);
        Self {
            participants,
            ledger,
            claims,
        }
    }

    /// Rebuild scores by running every journaled award through the same
    /// apply path a live claim uses.
    fn replay(&self, contents: JournalContents) -> Result<()> {
        let participant_count = contents.participants.len();
        let award_count = contents.awards.len();
        for record in contents.participants {
            self.participants.restore(record)?;
        }

        let mut seen = HashSet::with_capacity(award_count);
        for event in contents.awards {
            if !seen.insert(event.id.clone()) {
                return Err(Error::Storage(format!(
                    "journal records award '{}' twice",
                    event.id
                )));
            }
            let participant_id = event.participant_id.clone();
            self.participants
                .with_participant(&participant_id, |locked| {
                    let amount = event.amount;
                    self.ledger.restore(locked, event)?;
                    locked.apply_award(amount);
                    Ok(())
                })
                .map_err(|err| match err {
                    Error::NotFound(id) => Error::Storage(format!(
                        "journal award references unknown participant '{id}'"
                    )),
                    other => other,
                })?;
        }
        if participant_count > 0 {
            info!(
                participants = participant_count,
                awards = award_count,
                "scoreboard restored from journal"
            );
        }
        Ok(())
    }

    /// Register a new participant.
    pub fn register(&self, name: &str) -> Result<Participant> {
        let participant = self.participants.create(name)?;
        info!(participant_id = %participant.id, name = %participant.name, "participant registered");
        Ok(participant)
    }

    pub fn participant(&self, id: &ParticipantId) -> Result<Participant> {
        self.participants.get(id)
    }

    /// Rank a fresh snapshot of every participant.
    pub fn leaderboard(&self) -> RankedView {
        rank(self.participants.list_all())
    }

    /// Award points to `id`; see [`ClaimCoordinator::claim`].
    pub fn claim(&self, id: &ParticipantId) -> Result<ClaimOutcome> {
        self.claims.claim(id)
    }

    /// Award history for `id`, most recent first.
    pub fn history(&self, id: &ParticipantId) -> Result<AwardHistory> {
        self.participants
            .with_participant(id, |locked| Ok(self.ledger.history_for(locked)))
    }

    /// Check every participant's score against its award history.
    pub fn verify(&self) -> VerifyReport {
        let mut report = VerifyReport::default();
        let mut ids = self.participants.ids();
        ids.sort();
        for id in ids {
            // Ids are never removed, so every lookup succeeds.
            if let Ok(history) = self.history(&id) {
                report.record(history.participant(), history.chronological());
            }
        }
        report
    }
}
