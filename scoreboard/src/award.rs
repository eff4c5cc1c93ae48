//! Sources of award amounts.
//!
//! The [`AwardSource`] trait decouples claim orchestration from the random
//! number generator. Tests use scripted sources that return predetermined
//! amounts.

use rand::Rng;

use crate::core::types::AwardAmount;

/// Supplies the amount granted by each claim.
pub trait AwardSource: Send + Sync {
    fn draw(&self) -> AwardAmount;
}

/// Uniform draw over `[AwardAmount::MIN, AwardAmount::MAX]` from the thread RNG.
///
/// Not cryptographically secure.
#[derive(Debug, Default, Clone, Copy)]
pub struct RandomAwards;

impl AwardSource for RandomAwards {
    fn draw(&self) -> AwardAmount {
        let value = rand::thread_rng().gen_range(AwardAmount::MIN..=AwardAmount::MAX);
        AwardAmount::saturating(value)
    }
}
