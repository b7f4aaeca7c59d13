//! Session engine error types.
//!
//! Refusals from the state machine and failures of the persistence backend.
//! None of these are fatal: a refused transition leaves the session where it
//! was, and storage failures fall back to in-memory state.

use thiserror::Error;

/// A transition the session refused to make.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SessionError {
    /// Countdown target must be positive.
    #[error("countdown target must be greater than zero (got {0}s)")]
    InvalidTarget(u64),

    /// A session is already in progress.
    #[error("session is already in progress")]
    AlreadyRunning,

    /// The session is not running.
    #[error("session is not running")]
    NotRunning,

    /// The session is not paused.
    #[error("session is not paused")]
    NotPaused,

    /// A completed countdown must be acknowledged or reset first.
    #[error("session has completed and must be acknowledged first")]
    AwaitingAcknowledge,
}

impl SessionError {
    /// Returns true if the error came from invalid user configuration.
    #[must_use]
    pub fn is_invalid_config(&self) -> bool {
        matches!(self, Self::InvalidTarget(_))
    }
}

/// Errors from the key-value persistence backend.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Reading or writing the backing file failed.
    #[error("storage I/O failed: {0}")]
    Io(#[from] std::io::Error),

    /// The backing file is not valid JSON.
    #[error("storage file is corrupt: {0}")]
    Corrupt(#[from] serde_json::Error),
}
