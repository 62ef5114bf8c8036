//! Error types for storage operations.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Errors that can occur during storage operations.
#[derive(Debug, Error)]
pub enum StorageError {
    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// A checkpoint key is not usable as a storage name.
    #[error("invalid checkpoint key: {0:?}")]
    InvalidKey(String),

    /// The staging path exists but is not a directory.
    #[error("not a directory: {}", .0.display())]
    NotADirectory(PathBuf),

    /// Another process holds the checkpoint directory.
    #[error("checkpoint store locked: another process has exclusive access")]
    Locked,
}
