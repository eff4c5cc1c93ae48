//! Random identifier generation.

use rand::RngCore;

use crate::core::types::{AwardId, ID_BYTES, ParticipantId};

fn random_bytes() -> [u8; ID_BYTES] {
    let mut bytes = [0u8; ID_BYTES];
    rand::thread_rng().fill_bytes(&mut bytes);
    bytes
}

pub fn participant_id() -> ParticipantId {
    ParticipantId::from_bytes(random_bytes())
}

pub fn award_id() -> AwardId {
    AwardId::from_bytes(random_bytes())
}
