//! Disposal of streams that were ingested successfully.

use crate::error::StorageResult;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Disposes of a stream after its ingestion completed.
///
/// Called only after a successful pipeline run, so that a stream still
/// present in the staging area always means "not ingested yet".
pub trait FileLifecycle: Send + Sync {
    /// Moves or deletes the stream called `name`.
    ///
    /// A stream that is already gone counts as finished.
    ///
    /// # Errors
    ///
    /// Returns an error if the stream exists but cannot be moved or removed.
    fn finish(&self, name: &str) -> StorageResult<()>;
}

/// What happens to a processed file in a staging directory.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Disposal {
    Delete,
    Move(PathBuf),
}

/// Moves processed files out of a staging directory, or deletes them.
#[derive(Debug, Clone)]
pub struct DirectoryLifecycle {
    staging: PathBuf,
    disposal: Disposal,
}

impl DirectoryLifecycle {
    /// Deletes processed files from `staging`.
    pub fn delete(staging: impl Into<PathBuf>) -> Self {
        Self {
            staging: staging.into(),
            disposal: Disposal::Delete,
        }
    }

    /// Moves processed files from `staging` into `destination`.
    ///
    /// The destination directory is created on first use.
    pub fn move_to(staging: impl Into<PathBuf>, destination: impl Into<PathBuf>) -> Self {
        Self {
            staging: staging.into(),
            disposal: Disposal::Move(destination.into()),
        }
    }

    /// Returns the destination directory, if processed files are kept.
    #[must_use]
    pub fn destination(&self) -> Option<&Path> {
        match &self.disposal {
            Disposal::Delete => None,
            Disposal::Move(dest) => Some(dest),
        }
    }
}

impl FileLifecycle for DirectoryLifecycle {
    fn finish(&self, name: &str) -> StorageResult<()> {
        let source = self.staging.join(name);
        if !source.exists() {
            return Ok(());
        }

        match &self.disposal {
            Disposal::Delete => match fs::remove_file(&source) {
                Err(e) if e.kind() != io::ErrorKind::NotFound => Err(e.into()),
                _ => Ok(()),
            },
            Disposal::Move(destination) => {
                fs::create_dir_all(destination)?;
                let target = destination.join(name);
                if fs::rename(&source, &target).is_err() {
                    // rename cannot cross file systems
                    fs::copy(&source, &target)?;
                    fs::remove_file(&source)?;
                }
                Ok(())
            }
        }
    }
}
