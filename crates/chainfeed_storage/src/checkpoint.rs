//! Checkpoint store trait definition.

use crate::error::{StorageError, StorageResult};

/// Maximum length of a checkpoint key.
const MAX_KEY_LEN: usize = 128;

/// A small persistent key/value store for chain checkpoint state.
///
/// Values are opaque bytes. The ingestion pipeline decides what they mean
/// (hex hashes, file name tokens); the store only keeps them.
///
/// # Invariants
///
/// - `read` returns exactly the bytes of the last successful `write`
/// - `write` replaces the previous value as a whole, never partially
/// - A key that was never written (or was removed) reads as `None`
///
/// # Implementors
///
/// - [`super::InMemoryCheckpointStore`] - For testing
/// - [`super::FileCheckpointStore`] - For persistent storage
pub trait CheckpointStore: Send + Sync {
    /// Reads the value stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is invalid or an I/O error occurs.
    fn read(&self, key: &str) -> StorageResult<Option<Vec<u8>>>;

    /// Stores `value` under `key`, overwriting any previous value.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is invalid or the value cannot be
    /// made durable.
    fn write(&self, key: &str, value: &[u8]) -> StorageResult<()>;

    /// Removes the value stored under `key`. Removing a missing key is a no-op.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is invalid or an I/O error occurs.
    fn remove(&self, key: &str) -> StorageResult<()>;
}

/// Checks that `key` is non-empty lowercase ASCII, digits or `_`.
///
/// Keys double as file names in [`super::FileCheckpointStore`], so every
/// implementation applies the same rule.
///
/// # Errors
///
/// Returns [`StorageError::InvalidKey`] for anything else.
pub fn validate_key(key: &str) -> StorageResult<()> {
    let valid = !key.is_empty()
        && key.len() <= MAX_KEY_LEN
        && key
            .bytes()
            .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'_');
    if valid {
        Ok(())
    } else {
        Err(StorageError::InvalidKey(key.to_string()))
    }
}
