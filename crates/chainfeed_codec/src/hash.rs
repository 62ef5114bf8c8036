//! Fixed-size file hash value.

use crate::error::{CodecError, CodecResult};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Size of a record file hash in bytes (SHA-384).
pub const HASH_SIZE: usize = 48;

/// A 48-byte record file hash.
///
/// Rendered as lowercase hex everywhere it leaves the process: logs,
/// checkpoints and serialized output.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct FileHash([u8; HASH_SIZE]);

impl FileHash {
    /// The all-zero hash. Chains start from it and it counts as "no hash".
    pub const ZERO: Self = Self([0u8; HASH_SIZE]);

    /// Wraps raw hash bytes.
    #[must_use]
    pub const fn from_bytes(bytes: [u8; HASH_SIZE]) -> Self {
        Self(bytes)
    }

    /// Builds a hash from a slice, which must be exactly [`HASH_SIZE`] bytes.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::InvalidHash`] for any other length.
    pub fn from_slice(bytes: &[u8]) -> CodecResult<Self> {
        let array: [u8; HASH_SIZE] = bytes.try_into().map_err(|_| {
            CodecError::invalid_hash(format!(
                "expected {HASH_SIZE} bytes, got {}",
                bytes.len()
            ))
        })?;
        Ok(Self(array))
    }

    /// Parses a hex string (either case, surrounding whitespace ignored).
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::InvalidHash`] if the string is not hex or
    /// does not decode to [`HASH_SIZE`] bytes.
    pub fn from_hex(hex_str: &str) -> CodecResult<Self> {
        let bytes = hex::decode(hex_str.trim())
            .map_err(|e| CodecError::invalid_hash(e.to_string()))?;
        Self::from_slice(&bytes)
    }

    /// Returns the raw bytes.
    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; HASH_SIZE] {
        &self.0
    }

    /// Returns the lowercase hex rendering.
    #[must_use]
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Returns `true` for the all-zero hash.
    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.0.iter().all(|&b| b == 0)
    }
}

impl fmt::Display for FileHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for FileHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FileHash({})", self.to_hex())
    }
}

impl Serialize for FileHash {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for FileHash {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::from_hex(&s).map_err(serde::de::Error::custom)
    }
}
