//! Error types for the core library.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur in core operations.
///
/// Every variant is fatal for the sync run that hits it. A run is meant to
/// be repeated from scratch, so no per-message recovery is attempted.
#[derive(Debug, Error)]
pub enum Error {
    /// The index backing store is unavailable or corrupt.
    #[error("Index storage error: {0}")]
    Storage(#[from] sqlx::Error),

    /// An index record for this message already exists.
    #[error("Duplicate index key: message {message_id} is already indexed")]
    DuplicateKey {
        /// Identifier of the message that was inserted twice.
        message_id: String,
    },

    /// No free body filename was found for a timestamp.
    #[error("No free filename for {tag} in {} after {attempts} attempts", directory.display())]
    ResourceExhausted {
        /// Directory the body file was to be created in.
        directory: PathBuf,
        /// Timestamp tag shared by every candidate name.
        tag: String,
        /// Number of counters tried.
        attempts: u32,
    },

    /// Creating a directory or writing a file failed.
    #[error("Filesystem error at {}: {source}", path.display())]
    Filesystem {
        /// Path being created or written.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The message source failed to deliver messages.
    #[error("Message source error: {0}")]
    Source(String),

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl Error {
    /// Wraps an I/O error with the path it occurred on.
    pub(crate) fn filesystem(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Filesystem {
            path: path.into(),
            source,
        }
    }

    /// Returns true if the error signals a broken internal invariant rather
    /// than an environmental fault.
    #[must_use]
    pub const fn is_fatal_invariant(&self) -> bool {
        matches!(self, Self::DuplicateKey { .. })
    }
}

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;
