//! Deterministic leaderboard ordering.

use std::cmp::Ordering;

use crate::core::types::{Participant, RankedParticipant, RankedView};

/// Order participants into a leaderboard with strict ordinal ranks.
///
/// Higher score first; equal scores are broken by earlier `created_at`, then
/// by id. Ranks run 1..=N with no gaps and no shared positions, and the
/// output does not depend on input order.
pub fn rank(mut participants: Vec<Participant>) -> RankedView {
    participants.sort_by(compare_standing);
    let entries = participants
        .into_iter()
        .enumerate()
        .map(|(index, participant)| RankedParticipant {
            participant,
            rank: index + 1,
        })
        .collect();
    RankedView::from_entries(entries)
}

/// Total order used by [`rank`]: `Less` means `a` stands ahead of `b`.
pub fn compare_standing(a: &Participant, b: &Participant) -> Ordering {
    b.score
        .cmp(&a.score)
        .then_with(|| a.created_at.cmp(&b.created_at))
        .then_with(|| a.id.cmp(&b.id))
}
