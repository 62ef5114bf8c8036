//! File-based checkpoint store for persistent storage.

use crate::checkpoint::{validate_key, CheckpointStore};
use crate::error::{StorageError, StorageResult};
use fs2::FileExt;
use parking_lot::Mutex;
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

/// Lock file name inside the checkpoint directory.
const LOCK_FILE: &str = "LOCK";
/// Suffix for in-flight writes.
const TEMP_SUFFIX: &str = ".tmp";

/// A checkpoint store keeping one file per key in a directory.
///
/// ```text
/// <checkpoint_dir>/
/// ├─ LOCK                                       # advisory lock, single writer
/// ├─ last_processed_record_hash                 # value bytes
/// └─ record_hash_mismatch_bypass_until_after    # value bytes
/// ```
///
/// # Durability
///
/// Writes use the write-then-rename pattern:
/// 1. Write to `<key>.tmp`
/// 2. Sync the temporary file
/// 3. Rename over `<key>`
/// 4. Fsync the directory so the rename itself is durable
///
/// A crash at any point leaves either the old or the new value, never a
/// torn one.
///
/// # Exclusivity
///
/// The store holds an exclusive advisory lock on `LOCK` for as long as it
/// lives. A second process opening the same directory gets
/// [`StorageError::Locked`], which keeps the checkpoint read-then-write
/// sequence single-writer across processes.
#[derive(Debug)]
pub struct FileCheckpointStore {
    path: PathBuf,
    /// Serializes writers inside this process.
    write_lock: Mutex<()>,
    /// Held for exclusive access.
    _lock_file: File,
}

impl FileCheckpointStore {
    /// Opens or creates a checkpoint directory.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The path exists and is not a directory
    /// - Another process holds the lock (returns [`StorageError::Locked`])
    /// - I/O errors occur
    pub fn open(path: &Path) -> StorageResult<Self> {
        if !path.exists() {
            fs::create_dir_all(path)?;
        }
        if !path.is_dir() {
            return Err(StorageError::NotADirectory(path.to_path_buf()));
        }

        let lock_file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(path.join(LOCK_FILE))?;

        if lock_file.try_lock_exclusive().is_err() {
            return Err(StorageError::Locked);
        }

        Ok(Self {
            path: path.to_path_buf(),
            write_lock: Mutex::new(()),
            _lock_file: lock_file,
        })
    }

    /// Returns the checkpoint directory.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn key_path(&self, key: &str) -> StorageResult<PathBuf> {
        validate_key(key)?;
        Ok(self.path.join(key))
    }

    /// Syncs the directory so renames and removals survive a crash.
    #[cfg(unix)]
    fn sync_directory(&self) -> StorageResult<()> {
        File::open(&self.path)?.sync_all()?;
        Ok(())
    }

    #[cfg(not(unix))]
    fn sync_directory(&self) -> StorageResult<()> {
        // NTFS journals metadata; directory handles cannot be fsynced
        Ok(())
    }
}

impl CheckpointStore for FileCheckpointStore {
    fn read(&self, key: &str) -> StorageResult<Option<Vec<u8>>> {
        let path = self.key_path(key)?;
        match fs::read(&path) {
            Ok(data) => Ok(Some(data)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn write(&self, key: &str, value: &[u8]) -> StorageResult<()> {
        let path = self.key_path(key)?;
        let temp_path = self.path.join(format!("{key}{TEMP_SUFFIX}"));
        let _guard = self.write_lock.lock();

        let mut file = File::create(&temp_path)?;
        file.write_all(value)?;
        file.sync_all()?;
        drop(file);

        fs::rename(&temp_path, &path)?;
        self.sync_directory()
    }

    fn remove(&self, key: &str) -> StorageResult<()> {
        let path = self.key_path(key)?;
        let _guard = self.write_lock.lock();
        match fs::remove_file(&path) {
            Ok(()) => self.sync_directory(),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn file_create_new_directory() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("checkpoint");
        let store = FileCheckpointStore::open(&path).unwrap();
        assert!(path.join(LOCK_FILE).exists());
        assert_eq!(store.path(), path.as_path());
    }

    #[test]
    fn file_write_and_read() {
        let dir = TempDir::new().unwrap();
        let store = FileCheckpointStore::open(dir.path()).unwrap();

        store.write("last_hash", b"abc123").unwrap();
        assert_eq!(store.read("last_hash").unwrap(), Some(b"abc123".to_vec()));
        assert!(!dir.path().join("last_hash.tmp").exists());
    }

    #[test]
    fn file_read_missing_is_none() {
        let dir = TempDir::new().unwrap();
        let store = FileCheckpointStore::open(dir.path()).unwrap();
        assert_eq!(store.read("nothing").unwrap(), None);
    }

    #[test]
    fn file_persistence() {
        let dir = TempDir::new().unwrap();
        {
            let store = FileCheckpointStore::open(dir.path()).unwrap();
            store.write("key", b"persistent").unwrap();
        }
        let store = FileCheckpointStore::open(dir.path()).unwrap();
        assert_eq!(store.read("key").unwrap(), Some(b"persistent".to_vec()));
    }

    #[test]
    fn file_remove() {
        let dir = TempDir::new().unwrap();
        let store = FileCheckpointStore::open(dir.path()).unwrap();
        store.write("key", b"v").unwrap();
        store.remove("key").unwrap();
        store.remove("key").unwrap();
        assert_eq!(store.read("key").unwrap(), None);
    }

    #[test]
    fn file_second_open_is_locked() {
        let dir = TempDir::new().unwrap();
        let _first = FileCheckpointStore::open(dir.path()).unwrap();
        let second = FileCheckpointStore::open(dir.path());
        assert!(matches!(second, Err(StorageError::Locked)));
    }

    #[test]
    fn file_open_on_plain_file_fails() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("plain");
        fs::write(&file, b"x").unwrap();
        assert!(matches!(
            FileCheckpointStore::open(&file),
            Err(StorageError::NotADirectory(_))
        ));
    }

    #[test]
    fn file_rejects_invalid_key() {
        let dir = TempDir::new().unwrap();
        let store = FileCheckpointStore::open(dir.path()).unwrap();
        assert!(matches!(
            store.write("../outside", b"x"),
            Err(StorageError::InvalidKey(_))
        ));
    }
}
