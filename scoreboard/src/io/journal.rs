//! Append-only journal that makes registrations and awards durable.
//!
//! The [`Journal`] trait decouples the store and ledger from the storage
//! engine. [`FileJournal`] keeps two JSON Lines files under the data
//! directory; [`MemoryJournal`] persists nothing and backs in-memory use.
//!
//! A journal write is the commit point: callers only mutate in-memory state
//! after the entry has been written.

use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use anyhow::{Context, Result};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::core::types::{AwardEvent, ParticipantRecord};
use crate::io::store_lock::StoreLock;

/// Storage backend for registrations and award events.
pub trait Journal: Send + Sync {
    /// Durably record a new participant.
    fn record_participant(&self, record: &ParticipantRecord) -> Result<()>;
    /// Durably record a committed award.
    fn record_award(&self, event: &AwardEvent) -> Result<()>;
    /// Read back everything recorded so far, in write order.
    fn load(&self) -> Result<JournalContents>;
}

/// Everything read back from a journal.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JournalContents {
    pub participants: Vec<ParticipantRecord>,
    pub awards: Vec<AwardEvent>,
}

/// Journal that keeps nothing.
#[derive(Debug, Default, Clone, Copy)]
pub struct MemoryJournal;

impl Journal for MemoryJournal {
    fn record_participant(&self, _record: &ParticipantRecord) -> Result<()> {
        Ok(())
    }

    fn record_award(&self, _event: &AwardEvent) -> Result<()> {
        Ok(())
    }

    fn load(&self) -> Result<JournalContents> {
        Ok(JournalContents::default())
    }
}

/// Canonical journal file locations for a data directory.
#[derive(Debug, Clone)]
pub struct JournalPaths {
    pub data_dir: PathBuf,
    pub participants_path: PathBuf,
    pub awards_path: PathBuf,
    pub lock_path: PathBuf,
}

impl JournalPaths {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        let data_dir = data_dir.into();
        Self {
            participants_path: data_dir.join("participants.jsonl"),
            awards_path: data_dir.join("awards.jsonl"),
            lock_path: data_dir.join("store.lock"),
            data_dir,
        }
    }
}

/// JSON Lines journal under a data directory.
///
/// Each log has its own writer lock, so registrations never wait on award
/// appends. The data directory's [`StoreLock`] is held for the journal's
/// lifetime.
#[derive(Debug)]
pub struct FileJournal {
    paths: JournalPaths,
    sync_writes: bool,
    participants: Mutex<File>,
    awards: Mutex<File>,
    _lock: StoreLock,
}

impl FileJournal {
    /// Open (or create) the journal files under `data_dir`.
    ///
    /// Fails if another handle already owns the directory. A trailing partial
    /// line left by an interrupted write is discarded.
    pub fn open(data_dir: &Path, sync_writes: bool) -> Result<Self> {
        let paths = JournalPaths::new(data_dir);
        fs::create_dir_all(&paths.data_dir)
            .with_context(|| format!("create data dir {}", paths.data_dir.display()))?;
        let lock = StoreLock::acquire(&paths.lock_path)?;
        let participants = open_log(&paths.participants_path)?;
        let awards = open_log(&paths.awards_path)?;
        debug!(data_dir = %paths.data_dir.display(), sync_writes, "journal opened");
        Ok(Self {
            paths,
            sync_writes,
            participants: Mutex::new(participants),
            awards: Mutex::new(awards),
            _lock: lock,
        })
    }
}

impl Journal for FileJournal {
    fn record_participant(&self, record: &ParticipantRecord) -> Result<()> {
        append_line(
            &self.participants,
            &self.paths.participants_path,
            record,
            self.sync_writes,
        )
    }

    fn record_award(&self, event: &AwardEvent) -> Result<()> {
        append_line(
            &self.awards,
            &self.paths.awards_path,
            event,
            self.sync_writes,
        )
    }

    fn load(&self) -> Result<JournalContents> {
        let participants = read_log(&self.paths.participants_path)?;
        let awards = read_log(&self.paths.awards_path)?;
        debug!(
            participants = participants.len(),
            awards = awards.len(),
            "journal loaded"
        );
        Ok(JournalContents {
            participants,
            awards,
        })
    }
}

fn open_log(path: &Path) -> Result<File> {
    let file = OpenOptions::new()
        .create(true)
        .read(true)
        .append(true)
        .open(path)
        .with_context(|| format!("open journal {}", path.display()))?;
    repair_torn_tail(&file, path)?;
    Ok(file)
}

fn repair_torn_tail(file: &File, path: &Path) -> Result<()> {
    let contents = fs::read(path).with_context(|| format!("read journal {}", path.display()))?;
    if contents.is_empty() || contents.ends_with(b"\n") {
        return Ok(());
    }
    let keep = contents
        .iter()
        .rposition(|byte| *byte == b'\n')
        .map_or(0, |index| index + 1);
    warn!(
        path = %path.display(),
        discarded_bytes = contents.len() - keep,
        "discarding torn journal tail"
    );
    file.set_len(keep as u64)
        .with_context(|| format!("truncate journal {}", path.display()))
}

fn append_line<T: Serialize>(file: &Mutex<File>, path: &Path, value: &T, sync: bool) -> Result<()> {
    let mut line = serde_json::to_string(value).context("serialize journal entry")?;
    line.push('\n');

    let mut file = file.lock().unwrap_or_else(PoisonError::into_inner);
    let len_before = file
        .metadata()
        .with_context(|| format!("stat journal {}", path.display()))?
        .len();
    if let Err(err) = write_line(&mut file, line.as_bytes(), sync) {
        // Roll back a partial line so later appends stay parseable.
        if let Err(truncate_err) = file.set_len(len_before) {
            warn!(path = %path.display(), error = %truncate_err, "journal rollback failed");
        }
        return Err(err).with_context(|| format!("append journal {}", path.display()));
    }
    Ok(())
}

fn write_line(file: &mut File, bytes: &[u8], sync: bool) -> std::io::Result<()> {
    file.write_all(bytes)?;
    file.flush()?;
    if sync {
        file.sync_data()?;
    }
    Ok(())
}

fn read_log<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>> {
    let contents =
        fs::read_to_string(path).with_context(|| format!("read journal {}", path.display()))?;
    contents
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(index, line)| {
            serde_json::from_str(line)
                .with_context(|| format!("parse {} line {}", path.display(), index + 1))
        })
        .collect()
}
