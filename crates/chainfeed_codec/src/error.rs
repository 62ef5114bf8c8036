//! Error types for the codec crate.

use std::io;
use thiserror::Error;

/// Result type for codec operations.
pub type CodecResult<T> = Result<T, CodecError>;

/// Errors that can occur while reading or writing a record stream.
#[derive(Error, Debug)]
pub enum CodecError {
    /// The stream ended before a declared field was complete.
    #[error("truncated stream {file}: needed {expected} bytes, only {available} available")]
    TruncatedStream {
        /// Name of the stream being decoded.
        file: String,
        /// Number of bytes the field declared.
        expected: u64,
        /// Number of bytes that were actually left.
        available: u64,
    },

    /// A frame started with a tag byte outside the known set.
    #[error("unknown record file delimiter {tag} for file {file}")]
    UnknownFrameTag {
        /// The offending tag byte.
        tag: u8,
        /// Name of the stream being decoded.
        file: String,
    },

    /// The underlying reader or writer failed.
    #[error("I/O error on {file}: {source}")]
    Io {
        /// Name of the stream.
        file: String,
        /// The I/O error.
        #[source]
        source: io::Error,
    },

    /// A payload is too long for its 4-byte length prefix.
    #[error("payload too large: {len} bytes exceeds maximum of {max} bytes")]
    PayloadTooLarge {
        /// Actual payload length.
        len: usize,
        /// Largest encodable length.
        max: usize,
    },

    /// A hex string is not a valid file hash.
    #[error("invalid file hash: {message}")]
    InvalidHash {
        /// Description of the problem.
        message: String,
    },
}

impl CodecError {
    /// Creates a truncated stream error.
    pub fn truncated(file: impl Into<String>, expected: u64, available: u64) -> Self {
        Self::TruncatedStream {
            file: file.into(),
            expected,
            available,
        }
    }

    /// Creates an I/O error bound to a stream name.
    pub fn io(file: impl Into<String>, source: io::Error) -> Self {
        Self::Io {
            file: file.into(),
            source,
        }
    }

    /// Creates an invalid hash error.
    pub fn invalid_hash(message: impl Into<String>) -> Self {
        Self::InvalidHash {
            message: message.into(),
        }
    }
}
