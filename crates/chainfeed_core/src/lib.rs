//! # chainfeed core
//!
//! Sequential ingestion of hash-chained record stream files.
//!
//! This crate provides:
//! - [`ChainVerifier`]: checks each file's declared previous hash against
//!   the [`ChainCheckpoint`], with a bounded bypass window
//! - [`hash_stream`]: SHA-384 over a file's complete contents
//! - [`RecordFileParser`]: the single-file pipeline driving decoder,
//!   verifier, hasher, listeners and metrics
//! - [`BatchIngestor`] and [`Scheduler`]: ordered batch processing with
//!   skip-on-duplicate and halt-on-error semantics
//!
//! ## Example
//!
//! ```rust
//! use chainfeed_codec::{FileHash, FrameWriter, StreamHeader};
//! use chainfeed_core::{BatchIngestor, RecordFileParser, ShutdownSignal};
//! use chainfeed_storage::{InMemoryCheckpointStore, InMemorySource};
//! use std::sync::Arc;
//!
//! let mut writer = FrameWriter::new(Vec::new(), StreamHeader::new(1, 1)).unwrap();
//! writer.write_prev_hash(&FileHash::ZERO).unwrap();
//! writer.write_record(&[0xDE, 0xAD, 0xBE, 0xEF], &[0xCA, 0xFE]).unwrap();
//!
//! let source = Arc::new(InMemorySource::new());
//! source.insert("2024-01-01T00_00_00Z.rcd", writer.into_inner());
//!
//! let parser = RecordFileParser::new(Arc::new(InMemoryCheckpointStore::new()));
//! let batch = BatchIngestor::new(source.clone(), source.clone(), parser, ShutdownSignal::new());
//!
//! let outcome = batch.ingest(source.names());
//! assert_eq!(outcome.processed.len(), 1);
//! assert!(batch.parser().checkpoint().last_hash().unwrap().is_some());
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod batch;
mod chain;
mod config;
mod error;
mod hasher;
mod listener;
mod metrics;
mod pipeline;
mod record;
mod scheduler;
mod shutdown;

pub use batch::{BatchIngestor, BatchOutcome, HaltedFile};
pub use chain::{
    check_continuity, file_token, ChainCheckpoint, ChainVerdict, ChainVerifier, BYPASS_UNTIL_KEY,
    LAST_PROCESSED_HASH_KEY,
};
pub use config::{ParserConfig, ProcessedFileAction};
pub use error::{IngestError, IngestResult};
pub use hasher::{hash_stream, HASH_ALGORITHM};
pub use listener::{
    ChannelListener, IngestEvent, NoopListener, RecordItemListener, RecordStreamFileListener,
};
pub use metrics::{
    InMemoryMetrics, MetricSample, MetricValue, MetricsSink, NoopMetrics, Tags, TracingMetrics,
    PARSE_DURATION, TRANSACTION_LATENCY, TRANSACTION_SIZE,
};
pub use pipeline::RecordFileParser;
pub use record::{OpaqueTransactionDecoder, RecordItem, RecordStreamFile, TransactionDecoder};
pub use scheduler::Scheduler;
pub use shutdown::ShutdownSignal;
