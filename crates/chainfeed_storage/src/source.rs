//! Stream source trait and the staging-directory implementation.

use crate::error::{StorageError, StorageResult};
use std::fs::{self, File};
use std::io::{self, BufReader, Read};
use std::path::{Path, PathBuf};

/// A readable byte stream handed out by a [`StreamSource`].
pub type StreamReader = Box<dyn Read + Send>;

/// Resolves a staging area into a set of named byte streams.
///
/// Names are opaque to the source; the ingestion side decides how they
/// order. A stream can disappear between [`list`](Self::list) and
/// [`open`](Self::open) (another process moved it), which is reported as
/// `Ok(None)` rather than an error.
pub trait StreamSource: Send + Sync {
    /// Lists the names of all staged streams, in no particular order.
    ///
    /// # Errors
    ///
    /// Returns an error if the staging area cannot be listed.
    fn list(&self) -> StorageResult<Vec<String>>;

    /// Opens the stream called `name` for reading from the start.
    ///
    /// Returns `Ok(None)` if the stream no longer exists.
    ///
    /// # Errors
    ///
    /// Returns an error for any I/O failure other than "not found".
    fn open(&self, name: &str) -> StorageResult<Option<StreamReader>>;
}

/// Read buffer size for staged files.
const READ_BUFFER_SIZE: usize = 64 * 1024;

/// A staging directory of record files.
///
/// Lists regular files directly inside the directory. Hidden files
/// (leading `.`), subdirectories and names that are not valid UTF-8 are
/// ignored.
///
/// # Example
///
/// ```no_run
/// use chainfeed_storage::{DirectorySource, StreamSource};
///
/// let source = DirectorySource::new("/var/lib/chainfeed/staging");
/// for name in source.list().unwrap() {
///     println!("staged: {name}");
/// }
/// ```
#[derive(Debug, Clone)]
pub struct DirectorySource {
    path: PathBuf,
}

impl DirectorySource {
    /// Creates a source over the directory at `path`.
    ///
    /// The directory is not touched until [`StreamSource::list`] is called.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Returns the staging directory.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns the full path of the staged file called `name`.
    #[must_use]
    pub fn file_path(&self, name: &str) -> PathBuf {
        self.path.join(name)
    }
}

impl StreamSource for DirectorySource {
    fn list(&self) -> StorageResult<Vec<String>> {
        if !self.path.is_dir() {
            return Err(StorageError::NotADirectory(self.path.clone()));
        }

        let mut names = Vec::new();
        for entry in fs::read_dir(&self.path)? {
            let entry = entry?;
            if !entry.file_type()?.is_file() {
                continue;
            }
            let Ok(name) = entry.file_name().into_string() else {
                continue;
            };
            if name.starts_with('.') {
                continue;
            }
            names.push(name);
        }
        Ok(names)
    }

    fn open(&self, name: &str) -> StorageResult<Option<StreamReader>> {
        match File::open(self.file_path(name)) {
            Ok(file) => Ok(Some(Box::new(BufReader::with_capacity(
                READ_BUFFER_SIZE,
                file,
            )))),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}
