//! Error types for chainfeed ingestion.

use chainfeed_codec::{CodecError, FileHash};
use chainfeed_storage::StorageError;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Result type for ingestion operations.
pub type IngestResult<T> = Result<T, IngestError>;

/// Errors that can occur while ingesting record stream files.
#[derive(Debug, Error)]
pub enum IngestError {
    /// The record stream could not be decoded.
    #[error("decode error: {0}")]
    Codec(#[from] CodecError),

    /// The declared previous hash does not continue the chain.
    #[error("hash mismatch for file {file}: expected = {expected}, actual = {actual}")]
    ChainMismatch {
        /// Name of the file being ingested.
        file: String,
        /// Hash held by the checkpoint.
        expected: FileHash,
        /// Hash declared by the file.
        actual: FileHash,
    },

    /// The file's chain position was already ingested.
    #[error("duplicate file: {file}")]
    DuplicateFile {
        /// Name of the duplicate file.
        file: String,
    },

    /// The completed file could not be re-read for hashing.
    #[error("failed to hash file {file}: {source}")]
    HashComputation {
        /// Name of the file.
        file: String,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// The file disappeared before it could be opened.
    #[error("file does not exist: {file}")]
    MissingFile {
        /// Name of the missing file.
        file: String,
    },

    /// Checkpoint or stream storage failed.
    #[error("storage error: {0}")]
    Storage(StorageError),

    /// The checkpoint holds a value that cannot be interpreted.
    #[error("invalid checkpoint: {message}")]
    Checkpoint {
        /// Description of the problem.
        message: String,
    },

    /// A record or stream listener rejected an event.
    #[error("listener failed: {message}")]
    Listener {
        /// Description of the failure.
        message: String,
    },

    /// The transaction model decoder could not interpret a payload.
    #[error("transaction decode failed: {message}")]
    TransactionDecode {
        /// Description of the failure.
        message: String,
    },

    /// The configured source path is not a directory.
    #[error("input parameter is not a folder: {}", .path.display())]
    InvalidSource {
        /// The configured path.
        path: PathBuf,
    },
}

impl IngestError {
    /// Creates a duplicate file error.
    pub fn duplicate(file: impl Into<String>) -> Self {
        Self::DuplicateFile { file: file.into() }
    }

    /// Creates a listener error.
    pub fn listener(message: impl Into<String>) -> Self {
        Self::Listener {
            message: message.into(),
        }
    }

    /// Creates a checkpoint error.
    pub fn checkpoint(message: impl Into<String>) -> Self {
        Self::Checkpoint {
            message: message.into(),
        }
    }

    /// Creates a transaction decode error.
    pub fn transaction_decode(message: impl Into<String>) -> Self {
        Self::TransactionDecode {
            message: message.into(),
        }
    }

    /// Returns true if a batch should skip this file and continue.
    #[must_use]
    pub fn is_duplicate(&self) -> bool {
        matches!(self, Self::DuplicateFile { .. })
    }
}

impl From<StorageError> for IngestError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::NotADirectory(path) => Self::InvalidSource { path },
            other => Self::Storage(other),
        }
    }
}
