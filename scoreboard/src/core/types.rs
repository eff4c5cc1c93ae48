//! Shared deterministic types for the scoring core.
//!
//! These types define stable contracts between the store, the ledger and the
//! ranking logic. They carry no I/O and serialize to a stable JSON shape.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Number of random bytes behind every generated identifier.
pub const ID_BYTES: usize = 12;

/// Opaque participant identifier.
///
/// Generated ids are 24 lowercase hex characters. Lookups accept any string;
/// [`ParticipantId::parse`] is the syntactic check for outer layers.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ParticipantId(String);

impl ParticipantId {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn from_bytes(bytes: [u8; ID_BYTES]) -> Self {
        Self(hex::encode(bytes))
    }

    /// Accept `raw` only if it has the shape of a generated id.
    pub fn parse(raw: &str) -> Option<Self> {
        is_id_shaped(raw).then(|| Self(raw.to_ascii_lowercase()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ParticipantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Opaque award event identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AwardId(String);

impl AwardId {
    pub fn from_bytes(bytes: [u8; ID_BYTES]) -> Self {
        Self(hex::encode(bytes))
    }
}

impl fmt::Display for AwardId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

fn is_id_shaped(raw: &str) -> bool {
    raw.len() == ID_BYTES * 2 && raw.chars().all(|ch| ch.is_ascii_hexdigit())
}

/// Points granted by a single claim, always within `[MIN, MAX]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct AwardAmount(u32);

impl AwardAmount {
    pub const MIN: u32 = 1;
    pub const MAX: u32 = 10;

    pub fn new(value: u32) -> Option<Self> {
        (Self::MIN..=Self::MAX).contains(&value).then_some(Self(value))
    }

    /// Clamp `value` into the award range.
    pub fn saturating(value: u32) -> Self {
        Self(value.clamp(Self::MIN, Self::MAX))
    }

    pub fn get(self) -> u32 {
        self.0
    }
}

impl TryFrom<u32> for AwardAmount {
    type Error = String;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        Self::new(value).ok_or_else(|| {
            format!(
                "award amount {} outside [{}, {}]",
                value,
                Self::MIN,
                Self::MAX
            )
        })
    }
}

impl From<AwardAmount> for u32 {
    fn from(amount: AwardAmount) -> Self {
        amount.0
    }
}

impl fmt::Display for AwardAmount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A scored participant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Participant {
    pub id: ParticipantId,
    /// Trimmed, non-empty, unique across participants.
    pub name: String,
    /// Sum of all award amounts recorded for this participant.
    pub score: u64,
    /// Registration instant; earlier registration wins score ties.
    pub created_at: DateTime<Utc>,
}

impl Participant {
    /// Fresh participant with no awards.
    pub fn from_record(record: ParticipantRecord) -> Self {
        Self {
            id: record.id,
            name: record.name,
            score: 0,
            created_at: record.created_at,
        }
    }

    pub fn record(&self) -> ParticipantRecord {
        ParticipantRecord {
            id: self.id.clone(),
            name: self.name.clone(),
            created_at: self.created_at,
        }
    }
}

/// Immutable registration facts persisted in the journal.
///
/// Scores are never persisted; they are rebuilt from the award log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParticipantRecord {
    pub id: ParticipantId,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

/// One immutable award granted to a participant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AwardEvent {
    pub id: AwardId,
    pub participant_id: ParticipantId,
    pub amount: AwardAmount,
    pub awarded_at: DateTime<Utc>,
}

/// A participant paired with its ordinal position (1 = best).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RankedParticipant {
    #[serde(flatten)]
    pub participant: Participant,
    pub rank: usize,
}

/// Participants in ranking order with strictly consecutive ranks.
///
/// Derived from a point-in-time snapshot and never stored.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(transparent)]
pub struct RankedView {
    entries: Vec<RankedParticipant>,
}

impl RankedView {
    pub(crate) fn from_entries(entries: Vec<RankedParticipant>) -> Self {
        Self { entries }
    }

    pub fn entries(&self) -> &[RankedParticipant] {
        &self.entries
    }

    pub fn iter(&self) -> std::slice::Iter<'_, RankedParticipant> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn find(&self, id: &ParticipantId) -> Option<&RankedParticipant> {
        self.entries.iter().find(|entry| &entry.participant.id == id)
    }

    pub fn rank_of(&self, id: &ParticipantId) -> Option<usize> {
        self.find(id).map(|entry| entry.rank)
    }
}

impl<'a> IntoIterator for &'a RankedView {
    type Item = &'a RankedParticipant;
    type IntoIter = std::slice::Iter<'a, RankedParticipant>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}
