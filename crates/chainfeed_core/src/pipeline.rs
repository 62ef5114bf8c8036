//! Single-file record ingestion.
//!
//! [`RecordFileParser::load_record_file`] runs one file through
//!
//! ```text
//! on_start -> header -> frames -> hash -> on_end -> checkpoint
//! ```
//!
//! Any failure along the way calls `on_error` and is returned to the
//! caller. The parse-duration metric is recorded either way.

use crate::chain::{ChainCheckpoint, ChainVerifier};
use crate::error::{IngestError, IngestResult};
use crate::hasher::hash_stream;
use crate::listener::{NoopListener, RecordItemListener, RecordStreamFileListener};
use crate::metrics::{
    MetricsSink, NoopMetrics, PARSE_DURATION, TRANSACTION_LATENCY, TRANSACTION_SIZE,
};
use crate::record::{
    epoch_seconds, OpaqueTransactionDecoder, RecordItem, RecordStreamFile, TransactionDecoder,
};
use chainfeed_codec::{FileHash, Frame, FrameReader};
use chainfeed_storage::{CheckpointStore, StorageError, StreamSource};
use std::io::{self, Read};
use std::sync::Arc;
use std::time::{Instant, SystemTime};
use tracing::{debug, error, info, trace};

/// Progress of one file, kept for the final log line and metric.
#[derive(Debug, Default)]
struct ParseProgress {
    record_format_version: u32,
    transactions: u64,
}

/// Ingests record stream files one at a time.
#[derive(Clone)]
pub struct RecordFileParser {
    verifier: ChainVerifier,
    item_listener: Arc<dyn RecordItemListener>,
    file_listener: Arc<dyn RecordStreamFileListener>,
    metrics: Arc<dyn MetricsSink>,
    decoder: Arc<dyn TransactionDecoder>,
    stream_type: String,
}

impl RecordFileParser {
    /// Creates a parser over `checkpoint` with no-op listeners and metrics.
    pub fn new(checkpoint: Arc<dyn CheckpointStore>) -> Self {
        Self {
            verifier: ChainVerifier::new(ChainCheckpoint::new(checkpoint)),
            item_listener: Arc::new(NoopListener),
            file_listener: Arc::new(NoopListener),
            metrics: Arc::new(NoopMetrics),
            decoder: Arc::new(OpaqueTransactionDecoder),
            stream_type: "RECORD".to_string(),
        }
    }

    /// Sets the record item listener.
    #[must_use]
    pub fn with_item_listener(mut self, listener: Arc<dyn RecordItemListener>) -> Self {
        self.item_listener = listener;
        self
    }

    /// Sets the stream file listener.
    #[must_use]
    pub fn with_file_listener(mut self, listener: Arc<dyn RecordStreamFileListener>) -> Self {
        self.file_listener = listener;
        self
    }

    /// Sets the metrics sink.
    #[must_use]
    pub fn with_metrics(mut self, metrics: Arc<dyn MetricsSink>) -> Self {
        self.metrics = metrics;
        self
    }

    /// Sets the transaction model decoder.
    #[must_use]
    pub fn with_decoder(mut self, decoder: Arc<dyn TransactionDecoder>) -> Self {
        self.decoder = decoder;
        self
    }

    /// Sets the stream type label used on the parse-duration metric.
    #[must_use]
    pub fn with_stream_type(mut self, label: impl Into<String>) -> Self {
        self.stream_type = label.into();
        self
    }

    /// Returns the chain checkpoint this parser advances.
    pub fn checkpoint(&self) -> &ChainCheckpoint {
        self.verifier.checkpoint()
    }

    /// Ingests one record file.
    ///
    /// `reader` supplies the stream for decoding. Once decoding finished,
    /// `source` is asked to open `name` again for the content hash.
    ///
    /// # Errors
    ///
    /// Returns the first decode, verification, listener, hashing or
    /// checkpoint error. `on_error` has been called on the stream listener
    /// by the time it is returned.
    pub fn load_record_file<R: Read>(
        &self,
        source: &dyn StreamSource,
        name: &str,
        reader: R,
    ) -> IngestResult<RecordStreamFile> {
        let started = Instant::now();
        let mut progress = ParseProgress::default();

        let result = self.parse(source, name, reader, &mut progress);

        let elapsed = started.elapsed();
        let millis = elapsed.as_millis();
        let rate = if millis > 0 {
            u64::try_from(1000 * u128::from(progress.transactions) / millis).unwrap_or(u64::MAX)
        } else {
            0
        };
        info!(
            file = name,
            transactions = progress.transactions,
            elapsed = ?elapsed,
            rate_per_sec = rate,
            "Finished parsing record file"
        );

        let success = if result.is_ok() { "true" } else { "false" };
        let version = progress.record_format_version.to_string();
        self.metrics.record_duration(
            PARSE_DURATION,
            elapsed,
            &[
                ("type", self.stream_type.as_str()),
                ("success", success),
                ("version", version.as_str()),
            ],
        );

        if let Err(e) = &result {
            error!(file = name, error = %e, "Error parsing file");
            self.file_listener.on_error();
        }
        result
    }

    fn parse<R: Read>(
        &self,
        source: &dyn StreamSource,
        name: &str,
        reader: R,
        progress: &mut ParseProgress,
    ) -> IngestResult<RecordStreamFile> {
        self.file_listener.on_start(name)?;
        let load_start = epoch_seconds(SystemTime::now());

        let mut frames = FrameReader::new(name, reader)?;
        let header = frames.header();
        progress.record_format_version = header.record_format_version;
        info!(
            file = name,
            version = header.record_format_version,
            protocol = header.protocol_version,
            "Loading record file"
        );

        let mut previous_hash = None;
        while let Some(frame) = frames.read_frame()? {
            match frame {
                Frame::PrevHash(actual) => {
                    self.verifier.verify(name, &actual)?;
                    previous_hash = Some(actual);
                }
                Frame::Record {
                    transaction,
                    record,
                } => {
                    progress.transactions += 1;
                    self.dispatch(transaction, record)?;
                }
                Frame::Signature(signature) => {
                    trace!(file = name, signature_len = signature.len(), "skipping signature");
                }
            }
        }

        let file_hash = self.hash_file(source, name)?;
        trace!(file = name, hash = %file_hash, "calculated file hash");

        let file = RecordStreamFile {
            name: name.to_string(),
            load_start,
            load_end: epoch_seconds(SystemTime::now()),
            file_hash,
            previous_hash,
            record_format_version: header.record_format_version,
            protocol_version: header.protocol_version,
            transaction_count: progress.transactions,
        };
        self.file_listener.on_end(&file)?;

        if !file_hash.is_zero() {
            self.verifier.checkpoint().set_last_hash(&file_hash)?;
        }
        Ok(file)
    }

    fn dispatch(&self, transaction: Vec<u8>, record: Vec<u8>) -> IngestResult<()> {
        let size = transaction.len() as u64;
        let item = RecordItem::new(transaction, record, self.decoder.as_ref())?;
        debug!(
            transaction_type = item.transaction_type(),
            consensus_timestamp = ?item.consensus_timestamp(),
            "Storing transaction"
        );
        self.item_listener.on_item(&item)?;

        let tags = [("type", item.transaction_type())];
        self.metrics.record_size(TRANSACTION_SIZE, size, &tags);
        if let Some(consensus) = item.consensus_timestamp() {
            let latency = SystemTime::now()
                .duration_since(consensus)
                .unwrap_or_default();
            self.metrics
                .record_duration(TRANSACTION_LATENCY, latency, &tags);
        }
        Ok(())
    }

    fn hash_file(&self, source: &dyn StreamSource, name: &str) -> IngestResult<FileHash> {
        let hash_failure = |source: io::Error| IngestError::HashComputation {
            file: name.to_string(),
            source,
        };
        let reopened = source.open(name).map_err(|e| match e {
            StorageError::Io(io_err) => hash_failure(io_err),
            other => hash_failure(io::Error::other(other)),
        })?;
        match reopened {
            Some(reader) => hash_stream(name, reader),
            None => Err(hash_failure(io::Error::new(
                io::ErrorKind::NotFound,
                "file vanished before hashing",
            ))),
        }
    }
}
