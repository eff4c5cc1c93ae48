//! Score/ledger reconciliation.

use serde::Serialize;

use crate::core::types::{AwardEvent, Participant, ParticipantId};

/// A participant whose score disagrees with its award history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScoreMismatch {
    pub participant_id: ParticipantId,
    pub name: String,
    pub score: u64,
    pub ledger_total: u64,
    /// Events that were filed under this participant but name another id.
    pub foreign_events: usize,
}

/// Outcome of checking every participant against the award ledger.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct VerifyReport {
    pub participants_checked: usize,
    pub awards_checked: usize,
    pub mismatches: Vec<ScoreMismatch>,
}

impl VerifyReport {
    pub fn is_consistent(&self) -> bool {
        self.mismatches.is_empty()
    }

    pub fn record(&mut self, participant: &Participant, events: &[AwardEvent]) {
        self.participants_checked += 1;
        self.awards_checked += events.len();
        if let Some(mismatch) = reconcile(participant, events) {
            self.mismatches.push(mismatch);
        }
    }
}

/// Compare `participant.score` with the sum of `events`.
///
/// Returns `None` when the score equals the ledger total and every event
/// belongs to the participant.
pub fn reconcile(participant: &Participant, events: &[AwardEvent]) -> Option<ScoreMismatch> {
    let ledger_total = ledger_total(events);
    let foreign_events = events
        .iter()
        .filter(|event| event.participant_id != participant.id)
        .count();
    if ledger_total == participant.score && foreign_events == 0 {
        return None;
    }
    Some(ScoreMismatch {
        participant_id: participant.id.clone(),
        name: participant.name.clone(),
        score: participant.score,
        ledger_total,
        foreign_events,
    })
}

pub fn ledger_total(events: &[AwardEvent]) -> u64 {
    events
        .iter()
        .map(|event| u64::from(event.amount.get()))
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{award, participant};

    #[test]
    fn matching_totals_reconcile() {
        let p = participant("ada", 12, 0);
        let events = vec![award(&p, 5, 1), award(&p, 7, 2)];
        assert_eq!(reconcile(&p, &events), None);

        let mut report = VerifyReport::default();
        report.record(&p, &events);
        assert!(report.is_consistent());
        assert_eq!(report.awards_checked, 2);
    }

    #[test]
    fn reports_score_drift_and_foreign_events() {
        let p = participant("ada", 4, 0);
        let other = participant("bob", 0, 1);
        let events = vec![award(&p, 3, 1), award(&other, 2, 2)];

        let mismatch = reconcile(&p, &events).expect("mismatch");
        assert_eq!(mismatch.score, 4);
        assert_eq!(mismatch.ledger_total, 5);
        assert_eq!(mismatch.foreign_events, 1);
    }
}
