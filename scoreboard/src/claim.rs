//! Orchestration for a single claim.

use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use tracing::{info, instrument};

use crate::award::AwardSource;
use crate::core::ranking::rank;
use crate::core::types::{AwardAmount, ParticipantId, RankedParticipant, RankedView};
use crate::error::{Error, Result};
use crate::ledger::AwardLedger;
use crate::store::ParticipantStore;

/// Result of a successful claim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClaimOutcome {
    /// The claiming participant right after its award, with its rank in
    /// `leaderboard`.
    pub participant: RankedParticipant,
    pub amount: AwardAmount,
    /// Full leaderboard taken after the award was committed.
    pub leaderboard: RankedView,
}

/// Applies claims: one award, one score change, one ledger entry.
pub struct ClaimCoordinator {
    participants: Arc<ParticipantStore>,
    ledger: Arc<AwardLedger>,
    awards: Arc<dyn AwardSource>,
}

impl ClaimCoordinator {
    pub fn new(
        participants: Arc<ParticipantStore>,
        ledger: Arc<AwardLedger>,
        awards: Arc<dyn AwardSource>,
    ) -> Self {
        Self {
            participants,
            ledger,
            awards,
        }
    }

    /// Award a random amount to `id` and return the refreshed leaderboard.
    ///
    /// The ledger append and the score change happen under the participant's
    /// lock; if the append fails the score is untouched. Fails with
    /// [`Error::NotFound`] for unknown ids.
    #[instrument(skip_all, fields(participant_id = %id))]
    pub fn claim(&self, id: &ParticipantId) -> Result<ClaimOutcome> {
        let (participant, amount) = self.participants.with_participant(id, |locked| {
            let amount = self.awards.draw();
            let event = self.ledger.append(locked, amount, Utc::now())?;
            Ok((locked.apply_award(event.amount), event.amount))
        })?;
        info!(
            participant_id = %participant.id,
            amount = %amount,
            score = participant.score,
            "points claimed"
        );

        let leaderboard = rank(self.participants.list_all());
        let rank = leaderboard
            .rank_of(&participant.id)
            .ok_or_else(|| Error::NotFound(participant.id.clone()))?;
        Ok(ClaimOutcome {
            participant: RankedParticipant { participant, rank },
            amount,
            leaderboard,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::journal::{Journal, MemoryJournal};
    use crate::test_support::{FailingJournal, ScriptedAwards};

    struct Fixture {
        participants: Arc<ParticipantStore>,
        ledger: Arc<AwardLedger>,
        claims: ClaimCoordinator,
    }

    fn fixture(journal: Arc<dyn Journal>, amounts: &[u32]) -> Fixture {
        let participants = Arc::new(ParticipantStore::new(Arc::clone(&journal)));
        let ledger = Arc::new(AwardLedger::new(journal));
        let claims = ClaimCoordinator::new(
            Arc::clone(&participants),
            Arc::clone(&ledger),
            Arc::new(ScriptedAwards::new(amounts)),
        );
        Fixture {
            participants,
            ledger,
            claims,
        }
    }

    #[test]
    fn claim_moves_claimant_above_tied_rival() {
        let fx = fixture(Arc::new(MemoryJournal), &[7]);
        let a = fx.participants.create("A").expect("a");
        let b = fx.participants.create("B").expect("b");

        let outcome = fx.claims.claim(&b.id).expect("claim");
        assert_eq!(outcome.amount.get(), 7);
        assert_eq!(outcome.participant.participant.score, 7);
        assert_eq!(outcome.participant.rank, 1);
        let order: Vec<_> = outcome
            .leaderboard
            .iter()
            .map(|entry| (entry.participant.id.clone(), entry.rank))
            .collect();
        assert_eq!(order, vec![(b.id.clone(), 1), (a.id.clone(), 2)]);
    }

    #[test]
    fn unknown_participant_changes_nothing() {
        let fx = fixture(Arc::new(MemoryJournal), &[5]);
        let a = fx.participants.create("A").expect("a");

        let missing = ParticipantId::new("ffffffffffffffffffffffff");
        let err = fx.claims.claim(&missing).unwrap_err();
        assert!(matches!(err, Error::NotFound(ref id) if id == &missing));

        let history = fx
            .participants
            .with_participant(&a.id, |locked| Ok(fx.ledger.history_for(locked)))
            .expect("history");
        assert!(history.is_empty());
        assert!(fx.participants.list_all().iter().all(|p| p.score == 0));
    }

    /// A failed journal write must leave neither a score change nor an event.
    #[test]
    fn journal_failure_is_all_or_nothing() {
        let fx = fixture(Arc::new(FailingJournal::awards()), &[4]);
        let a = fx.participants.create("A").expect("a");

        let err = fx.claims.claim(&a.id).unwrap_err();
        assert!(matches!(err, Error::Storage(_)));

        let history = fx
            .participants
            .with_participant(&a.id, |locked| Ok(fx.ledger.history_for(locked)))
            .expect("history");
        assert!(history.is_empty());
        assert_eq!(history.participant().score, 0);
    }

    #[test]
    fn boundary_amounts_are_applied_exactly() {
        let fx = fixture(Arc::new(MemoryJournal), &[1, 10]);
        let a = fx.participants.create("A").expect("a");

        assert_eq!(fx.claims.claim(&a.id).expect("first").amount.get(), 1);
        let second = fx.claims.claim(&a.id).expect("second");
        assert_eq!(second.amount.get(), 10);
        assert_eq!(second.participant.participant.score, 11);
    }
}
