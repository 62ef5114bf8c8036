//! Hash-chain checkpoint and continuity verification.
//!
//! The checkpoint is two entries in a [`CheckpointStore`]:
//!
//! - `last_processed_record_hash`: lowercase hex of the last accepted file hash
//! - `record_hash_mismatch_bypass_until_after`: a file name token; while it
//!   sorts strictly after the current file's token, a previous-hash mismatch
//!   is tolerated
//!
//! A missing or all-zero last hash means the chain has no anchor yet. The
//! first file seen is then trusted as declared.

use crate::error::{IngestError, IngestResult};
use chainfeed_codec::FileHash;
use chainfeed_storage::CheckpointStore;
use std::path::Path;
use std::sync::Arc;
use tracing::{error, trace, warn};

/// Checkpoint key of the last accepted file hash.
pub const LAST_PROCESSED_HASH_KEY: &str = "last_processed_record_hash";

/// Checkpoint key of the bypass-until file name token.
pub const BYPASS_UNTIL_KEY: &str = "record_hash_mismatch_bypass_until_after";

/// Typed access to the chain checkpoint.
#[derive(Clone)]
pub struct ChainCheckpoint {
    store: Arc<dyn CheckpointStore>,
}

impl ChainCheckpoint {
    /// Wraps a checkpoint store.
    pub fn new(store: Arc<dyn CheckpointStore>) -> Self {
        Self { store }
    }

    /// Returns the last accepted file hash.
    ///
    /// `None` when the key is missing, empty, or holds the all-zero hash.
    pub fn last_hash(&self) -> IngestResult<Option<FileHash>> {
        let Some(raw) = self.store.read(LAST_PROCESSED_HASH_KEY)? else {
            return Ok(None);
        };
        let text = std::str::from_utf8(&raw).map_err(|_| {
            IngestError::checkpoint(format!("{LAST_PROCESSED_HASH_KEY} is not UTF-8"))
        })?;
        if text.trim().is_empty() {
            return Ok(None);
        }
        let hash = FileHash::from_hex(text)
            .map_err(|e| IngestError::checkpoint(format!("{LAST_PROCESSED_HASH_KEY}: {e}")))?;
        Ok((!hash.is_zero()).then_some(hash))
    }

    /// Persists `hash` as the last accepted file hash.
    pub fn set_last_hash(&self, hash: &FileHash) -> IngestResult<()> {
        self.store
            .write(LAST_PROCESSED_HASH_KEY, hash.to_hex().as_bytes())?;
        Ok(())
    }

    /// Forgets the last accepted file hash.
    pub fn clear_last_hash(&self) -> IngestResult<()> {
        self.store.remove(LAST_PROCESSED_HASH_KEY)?;
        Ok(())
    }

    /// Returns the bypass-until token, or the empty string when unset.
    pub fn bypass_until(&self) -> IngestResult<String> {
        match self.store.read(BYPASS_UNTIL_KEY)? {
            None => Ok(String::new()),
            Some(raw) => String::from_utf8(raw)
                .map(|s| s.trim().to_string())
                .map_err(|_| IngestError::checkpoint(format!("{BYPASS_UNTIL_KEY} is not UTF-8"))),
        }
    }

    /// Sets the bypass-until token.
    pub fn set_bypass_until(&self, token: &str) -> IngestResult<()> {
        self.store.write(BYPASS_UNTIL_KEY, token.as_bytes())?;
        Ok(())
    }

    /// Removes the bypass-until token.
    pub fn clear_bypass_until(&self) -> IngestResult<()> {
        self.store.remove(BYPASS_UNTIL_KEY)?;
        Ok(())
    }
}

/// How a declared previous hash was accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChainVerdict {
    /// No anchor existed, so the declared hash was trusted as is.
    Unanchored,
    /// The declared hash matches the checkpoint.
    Matched,
    /// The hashes differ but the bypass window is still open.
    Bypassed,
}

/// Returns the name token used for bypass comparisons: the final path component.
#[must_use]
pub fn file_token(name: &str) -> &str {
    Path::new(name)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or(name)
}

/// Decides whether a file declaring `actual` may follow `expected`.
///
/// A mismatch passes only while `bypass_until` sorts strictly after the
/// file's name token.
pub fn check_continuity(
    file: &str,
    actual: &FileHash,
    expected: Option<&FileHash>,
    bypass_until: &str,
) -> IngestResult<ChainVerdict> {
    let Some(expected) = expected else {
        return Ok(ChainVerdict::Unanchored);
    };
    if actual == expected {
        return Ok(ChainVerdict::Matched);
    }
    if bypass_until > file_token(file) {
        return Ok(ChainVerdict::Bypassed);
    }
    Err(IngestError::ChainMismatch {
        file: file.to_string(),
        expected: *expected,
        actual: *actual,
    })
}

/// Verifies declared previous hashes against the checkpoint.
#[derive(Clone)]
pub struct ChainVerifier {
    checkpoint: ChainCheckpoint,
}

impl ChainVerifier {
    /// Creates a verifier reading from `checkpoint`.
    pub fn new(checkpoint: ChainCheckpoint) -> Self {
        Self { checkpoint }
    }

    /// Returns the checkpoint this verifier reads.
    pub fn checkpoint(&self) -> &ChainCheckpoint {
        &self.checkpoint
    }

    /// Checks that `file`, declaring `actual` as its predecessor, continues the chain.
    pub fn verify(&self, file: &str, actual: &FileHash) -> IngestResult<ChainVerdict> {
        let expected = self.checkpoint.last_hash()?;
        trace!(
            file,
            actual = %actual,
            expected = ?expected.as_ref().map(FileHash::to_hex),
            "verifying previous file hash"
        );

        let bypass_until = if expected.is_some_and(|e| e != *actual) {
            self.checkpoint.bypass_until()?
        } else {
            String::new()
        };

        let verdict = check_continuity(file, actual, expected.as_ref(), &bypass_until)?;
        match verdict {
            ChainVerdict::Unanchored => {
                error!(file, "previous file hash not available, trusting declared hash");
            }
            ChainVerdict::Bypassed => {
                warn!(
                    file,
                    bypass_until = %bypass_until,
                    "previous file hash mismatch tolerated by bypass window"
                );
            }
            ChainVerdict::Matched => {}
        }
        Ok(verdict)
    }
}
