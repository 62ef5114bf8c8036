//! # chainfeed storage
//!
//! External collaborators of the chainfeed ingestion pipeline.
//!
//! Everything in this crate treats its data as **opaque bytes**. Nothing
//! here knows the record stream format, hash chains or frames:
//!
//! - [`CheckpointStore`] - small key/value store holding the chain checkpoint
//! - [`StreamSource`] - resolves a staging area into named byte streams
//! - [`FileLifecycle`] - disposes of a stream once it has been ingested
//!
//! ## Available Implementations
//!
//! - [`InMemoryCheckpointStore`], [`InMemorySource`] - for tests and dry runs
//! - [`FileCheckpointStore`] - one file per key, atomic writes, exclusive lock
//! - [`DirectorySource`], [`DirectoryLifecycle`] - a staging directory on disk
//!
//! ## Example
//!
//! ```rust
//! use chainfeed_storage::{CheckpointStore, InMemoryCheckpointStore};
//!
//! let store = InMemoryCheckpointStore::new();
//! store.write("last_processed_record_hash", b"abcd").unwrap();
//! assert_eq!(
//!     store.read("last_processed_record_hash").unwrap(),
//!     Some(b"abcd".to_vec())
//! );
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod checkpoint;
mod error;
mod file;
mod lifecycle;
mod memory;
mod source;

pub use checkpoint::{validate_key, CheckpointStore};
pub use error::{StorageError, StorageResult};
pub use file::FileCheckpointStore;
pub use lifecycle::{DirectoryLifecycle, FileLifecycle};
pub use memory::{InMemoryCheckpointStore, InMemorySource};
pub use source::{DirectorySource, StreamReader, StreamSource};
