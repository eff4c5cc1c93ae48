//! Error types for scoreboard operations.

use thiserror::Error;

use crate::core::types::ParticipantId;

/// Result type for scoreboard operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors surfaced by the scoreboard core.
///
/// Every failed operation leaves state unchanged.
#[derive(Debug, Error)]
pub enum Error {
    /// Name was empty after trimming.
    #[error("participant name must not be empty")]
    InvalidName,

    /// Another participant already uses this trimmed name.
    #[error("participant named '{0}' already exists")]
    DuplicateName(String),

    /// No participant with this id.
    #[error("participant '{0}' not found")]
    NotFound(ParticipantId),

    /// Journal write or replay failure.
    #[error("storage error: {0}")]
    Storage(String),
}

impl Error {
    pub(crate) fn storage(err: anyhow::Error) -> Self {
        Error::Storage(format!("{err:#}"))
    }
}
