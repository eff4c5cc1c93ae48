//! Exclusive ownership of a data directory.
//!
//! Every open journal holds an OS lock on `store.lock`, so a CLI command and a
//! running server never append to the same logs with diverging in-memory
//! indexes. The lock dies with its file handle, including on a crash; the file
//! itself stays behind and only records who held it last.

use std::fs::{self, File, OpenOptions, TryLockError};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Who holds (or last held) a store lock.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreLockMeta {
    pub pid: u32,
    pub acquired_at: DateTime<Utc>,
}

impl StoreLockMeta {
    fn current() -> Self {
        Self {
            pid: std::process::id(),
            acquired_at: Utc::now(),
        }
    }
}

#[derive(Debug)]
pub struct StoreLock {
    // Holding the handle keeps the lock.
    _file: File,
}

impl StoreLock {
    /// Lock `path`, creating it if needed. Fails with [`StoreLockError::Held`]
    /// when another handle owns it.
    pub fn acquire(path: &Path) -> Result<Self, StoreLockError> {
        let mut file = OpenOptions::new()
            .create(true)
            .read(true)
            .write(true)
            .truncate(false)
            .open(path)?;

        match file.try_lock() {
            Ok(()) => {}
            Err(TryLockError::WouldBlock) => {
                return Err(StoreLockError::Held {
                    path: path.to_path_buf(),
                    holder: read_metadata(path).map(Box::new),
                });
            }
            Err(TryLockError::Error(err)) => return Err(StoreLockError::Io(err)),
        }

        write_metadata(&mut file, &StoreLockMeta::current())?;
        Ok(Self { _file: file })
    }
}

#[derive(Debug, Error)]
pub enum StoreLockError {
    #[error(
        "data dir is in use by another scoreboard process{} (lock {path:?})",
        held_by(.holder)
    )]
    Held {
        path: PathBuf,
        holder: Option<Box<StoreLockMeta>>,
    },
    #[error("io error: {0}")]
    Io(#[from] io::Error),
}

fn held_by(holder: &Option<Box<StoreLockMeta>>) -> String {
    holder
        .as_ref()
        .map(|meta| format!(" (pid {})", meta.pid))
        .unwrap_or_default()
}

/// Best effort: the holder may be mid-write or predate the metadata.
fn read_metadata(path: &Path) -> Option<StoreLockMeta> {
    let bytes = fs::read(path).ok()?;
    serde_json::from_slice(&bytes).ok()
}

fn write_metadata(file: &mut File, meta: &StoreLockMeta) -> Result<(), StoreLockError> {
    let bytes = serde_json::to_vec(meta).map_err(io::Error::other)?;
    file.set_len(0)?;
    file.write_all(&bytes)?;
    file.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_acquire_reports_holder() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("store.lock");

        let _held = StoreLock::acquire(&path).expect("first");
        let meta = read_metadata(&path).expect("metadata written");
        assert_eq!(meta.pid, std::process::id());

        let err = StoreLock::acquire(&path).unwrap_err();
        match &err {
            StoreLockError::Held { holder, .. } => {
                assert_eq!(holder.as_ref().map(|meta| meta.pid), Some(std::process::id()));
            }
            other => panic!("expected Held, got {other:?}"),
        }
        assert!(err.to_string().contains("in use by another scoreboard process"));
    }

    #[test]
    fn lock_is_released_on_drop() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("store.lock");

        drop(StoreLock::acquire(&path).expect("first"));
        let again = StoreLock::acquire(&path).expect("reacquire");
        assert!(path.exists());
        drop(again);
    }
}
