//! In-memory collaborators for testing.

use crate::checkpoint::{validate_key, CheckpointStore};
use crate::error::StorageResult;
use crate::lifecycle::FileLifecycle;
use crate::source::{StreamReader, StreamSource};
use parking_lot::RwLock;
use std::collections::{BTreeMap, HashMap};
use std::io::Cursor;

/// An in-memory checkpoint store.
///
/// This store keeps all values in memory and is suitable for:
/// - Unit tests
/// - Integration tests
/// - Dry runs that must not touch the persisted checkpoint
///
/// # Example
///
/// ```rust
/// use chainfeed_storage::{CheckpointStore, InMemoryCheckpointStore};
///
/// let store = InMemoryCheckpointStore::new();
/// assert_eq!(store.read("missing").unwrap(), None);
/// ```
#[derive(Debug, Default)]
pub struct InMemoryCheckpointStore {
    values: RwLock<HashMap<String, Vec<u8>>>,
}

impl InMemoryCheckpointStore {
    /// Creates a new empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of keys currently stored.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.read().len()
    }

    /// Returns `true` if nothing is stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.read().is_empty()
    }
}

impl CheckpointStore for InMemoryCheckpointStore {
    fn read(&self, key: &str) -> StorageResult<Option<Vec<u8>>> {
        validate_key(key)?;
        Ok(self.values.read().get(key).cloned())
    }

    fn write(&self, key: &str, value: &[u8]) -> StorageResult<()> {
        validate_key(key)?;
        self.values.write().insert(key.to_string(), value.to_vec());
        Ok(())
    }

    fn remove(&self, key: &str) -> StorageResult<()> {
        validate_key(key)?;
        self.values.write().remove(key);
        Ok(())
    }
}

/// An in-memory staging area of named streams.
///
/// Implements both [`StreamSource`] and [`FileLifecycle`]: finishing a
/// stream removes it, the same way a processed file leaves a staging
/// directory.
#[derive(Debug, Default)]
pub struct InMemorySource {
    streams: RwLock<BTreeMap<String, Vec<u8>>>,
}

impl InMemorySource {
    /// Creates a new empty source.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Stages `data` under `name`, replacing any stream of that name.
    pub fn insert(&self, name: impl Into<String>, data: Vec<u8>) {
        self.streams.write().insert(name.into(), data);
    }

    /// Returns `true` if a stream named `name` is staged.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.streams.read().contains_key(name)
    }

    /// Returns the staged names in sorted order.
    #[must_use]
    pub fn names(&self) -> Vec<String> {
        self.streams.read().keys().cloned().collect()
    }
}

impl StreamSource for InMemorySource {
    fn list(&self) -> StorageResult<Vec<String>> {
        Ok(self.names())
    }

    fn open(&self, name: &str) -> StorageResult<Option<StreamReader>> {
        Ok(self
            .streams
            .read()
            .get(name)
            .map(|data| Box::new(Cursor::new(data.clone())) as StreamReader))
    }
}

impl FileLifecycle for InMemorySource {
    fn finish(&self, name: &str) -> StorageResult<()> {
        self.streams.write().remove(name);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StorageError;
    use std::io::Read;

    #[test]
    fn store_new_is_empty() {
        let store = InMemoryCheckpointStore::new();
        assert!(store.is_empty());
        assert_eq!(store.read("key").unwrap(), None);
    }

    #[test]
    fn store_write_then_read() {
        let store = InMemoryCheckpointStore::new();
        store.write("key", b"value").unwrap();
        assert_eq!(store.read("key").unwrap(), Some(b"value".to_vec()));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn store_write_overwrites() {
        let store = InMemoryCheckpointStore::new();
        store.write("key", b"first").unwrap();
        store.write("key", b"second").unwrap();
        assert_eq!(store.read("key").unwrap(), Some(b"second".to_vec()));
    }

    #[test]
    fn store_remove() {
        let store = InMemoryCheckpointStore::new();
        store.write("key", b"value").unwrap();
        store.remove("key").unwrap();
        store.remove("key").unwrap();
        assert_eq!(store.read("key").unwrap(), None);
    }

    #[test]
    fn store_rejects_invalid_key() {
        let store = InMemoryCheckpointStore::new();
        let result = store.write("../escape", b"x");
        assert!(matches!(result, Err(StorageError::InvalidKey(_))));
    }

    #[test]
    fn source_lists_sorted_names() {
        let source = InMemorySource::new();
        source.insert("b", vec![2]);
        source.insert("a", vec![1]);
        assert_eq!(source.list().unwrap(), vec!["a".to_string(), "b".to_string()]);
    }

    #[test]
    fn source_open_reads_bytes() {
        let source = InMemorySource::new();
        source.insert("file", vec![1, 2, 3]);

        let mut reader = source.open("file").unwrap().unwrap();
        let mut data = Vec::new();
        reader.read_to_end(&mut data).unwrap();
        assert_eq!(data, vec![1, 2, 3]);
    }

    #[test]
    fn source_open_missing_is_none() {
        let source = InMemorySource::new();
        assert!(source.open("nope").unwrap().is_none());
    }

    #[test]
    fn finish_removes_stream() {
        let source = InMemorySource::new();
        source.insert("file", vec![1]);
        source.finish("file").unwrap();
        assert!(!source.contains("file"));
        assert!(source.open("file").unwrap().is_none());
    }
}
