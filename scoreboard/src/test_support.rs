//! Test-only helpers: scripted award sources, failing journals and
//! deterministic participant builders.

use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};

use anyhow::{Result, anyhow};
use chrono::{DateTime, Utc};

use crate::award::AwardSource;
use crate::core::types::{
    AwardAmount, AwardEvent, AwardId, ID_BYTES, Participant, ParticipantId, ParticipantRecord,
};
use crate::io::config::StorageConfig;
use crate::io::journal::{Journal, JournalContents};

/// Award source that cycles through a fixed list of amounts.
pub struct ScriptedAwards {
    amounts: Vec<AwardAmount>,
    next: AtomicUsize,
}

impl ScriptedAwards {
    /// Panics on an empty list or an amount outside `[1, 10]`.
    pub fn new(amounts: &[u32]) -> Self {
        assert!(!amounts.is_empty(), "scripted awards need at least one amount");
        Self {
            amounts: amounts.iter().map(|value| amount(*value)).collect(),
            next: AtomicUsize::new(0),
        }
    }

    /// Number of draws served so far.
    pub fn draws(&self) -> usize {
        self.next.load(Ordering::SeqCst)
    }
}

impl AwardSource for ScriptedAwards {
    fn draw(&self) -> AwardAmount {
        let index = self.next.fetch_add(1, Ordering::SeqCst);
        self.amounts[index % self.amounts.len()]
    }
}

/// Journal whose writes fail for the selected kind of entry.
pub struct FailingJournal {
    fail_registrations: bool,
    fail_awards: bool,
}

impl FailingJournal {
    pub fn registrations() -> Self {
        Self {
            fail_registrations: true,
            fail_awards: false,
        }
    }

    pub fn awards() -> Self {
        Self {
            fail_registrations: false,
            fail_awards: true,
        }
    }
}

impl Journal for FailingJournal {
    fn record_participant(&self, _record: &ParticipantRecord) -> Result<()> {
        if self.fail_registrations {
            return Err(anyhow!("disk full"));
        }
        Ok(())
    }

    fn record_award(&self, _event: &AwardEvent) -> Result<()> {
        if self.fail_awards {
            return Err(anyhow!("disk full"));
        }
        Ok(())
    }

    fn load(&self) -> Result<JournalContents> {
        Ok(JournalContents::default())
    }
}

/// Panics if `value` is outside `[1, 10]`.
pub fn amount(value: u32) -> AwardAmount {
    AwardAmount::new(value).expect("award amount in range")
}

/// Fixed reference instant plus `offset_secs`.
pub fn at(offset_secs: i64) -> DateTime<Utc> {
    DateTime::from_timestamp(1_700_000_000 + offset_secs, 0).expect("timestamp in range")
}

/// Participant with a deterministic id derived from `name`.
pub fn participant(name: &str, score: u64, created_offset_secs: i64) -> Participant {
    Participant {
        id: ParticipantId::new(format!("id-{name}")),
        name: name.to_string(),
        score,
        created_at: at(created_offset_secs),
    }
}

/// Award for `participant` with a deterministic id.
pub fn award(participant: &Participant, value: u32, offset_secs: i64) -> AwardEvent {
    let mut bytes = [0u8; ID_BYTES];
    bytes[..8].copy_from_slice(&offset_secs.to_be_bytes());
    bytes[8] = value as u8;
    AwardEvent {
        id: AwardId::from_bytes(bytes),
        participant_id: participant.id.clone(),
        amount: amount(value),
        awarded_at: at(offset_secs),
    }
}

/// Temporary data directory with a matching storage config.
pub struct TestDataDir {
    temp: tempfile::TempDir,
}

impl TestDataDir {
    pub fn new() -> Result<Self> {
        Ok(Self {
            temp: tempfile::tempdir()?,
        })
    }

    pub fn path(&self) -> &Path {
        self.temp.path()
    }

    pub fn storage_config(&self) -> StorageConfig {
        storage_config(self.path())
    }
}

/// Storage config rooted at `root/data` with fsync disabled.
pub fn storage_config(root: &Path) -> StorageConfig {
    StorageConfig {
        data_dir: root.join("data"),
        sync_writes: false,
    }
}
