//! Cross-crate integration test helpers.

use crate::fixtures::{content_hash, RecordFileBuilder, RecordingListener};
use chainfeed_codec::FileHash;
use chainfeed_core::{
    BatchIngestor, BatchOutcome, ChainCheckpoint, InMemoryMetrics, RecordFileParser,
    ShutdownSignal,
};
use chainfeed_storage::{InMemoryCheckpointStore, InMemorySource};
use std::sync::Arc;

/// Builds files that form a valid chain.
///
/// The first file declares the zero hash; every later one declares the
/// content hash of its predecessor. Each file carries `records` records.
pub fn chained_files(names: &[&str], records: usize) -> Vec<(String, Vec<u8>)> {
    chained_files_from(FileHash::ZERO, names, records)
}

/// Like [`chained_files`], but the first file declares `first_prev`.
pub fn chained_files_from(
    first_prev: FileHash,
    names: &[&str],
    records: usize,
) -> Vec<(String, Vec<u8>)> {
    let mut prev = first_prev;
    let mut files = Vec::with_capacity(names.len());
    for name in names {
        let mut builder = RecordFileBuilder::new().prev_hash(prev);
        for i in 0..records {
            let tx = format!("{name}-tx-{i}");
            let rec = format!("{name}-rec-{i}");
            builder = builder.record(tx.as_bytes(), rec.as_bytes());
        }
        let bytes = builder.build();
        prev = content_hash(&bytes);
        files.push(((*name).to_string(), bytes));
    }
    files
}

/// An in-memory ingestion stack with recording listeners.
pub struct IngestHarness {
    /// Staged streams. Also the lifecycle collaborator.
    pub source: Arc<InMemorySource>,
    /// Checkpoint backing store.
    pub store: Arc<InMemoryCheckpointStore>,
    /// Listener receiving items and file events.
    pub listener: Arc<RecordingListener>,
    /// Metrics recorded by the parser.
    pub metrics: Arc<InMemoryMetrics>,
    /// Shutdown flag shared with the batch.
    pub shutdown: ShutdownSignal,
    batch: BatchIngestor,
}

impl IngestHarness {
    /// Creates an empty harness.
    pub fn new() -> Self {
        let source = Arc::new(InMemorySource::new());
        let store = Arc::new(InMemoryCheckpointStore::new());
        let listener = Arc::new(RecordingListener::new());
        let metrics = Arc::new(InMemoryMetrics::new());
        let shutdown = ShutdownSignal::new();

        let parser = RecordFileParser::new(store.clone())
            .with_item_listener(listener.clone())
            .with_file_listener(listener.clone())
            .with_metrics(metrics.clone());
        let batch = BatchIngestor::new(source.clone(), source.clone(), parser, shutdown.clone());

        Self {
            source,
            store,
            listener,
            metrics,
            shutdown,
            batch,
        }
    }

    /// Stages a stream.
    pub fn stage(&self, name: &str, bytes: Vec<u8>) {
        self.source.insert(name, bytes);
    }

    /// Returns the chain checkpoint.
    pub fn checkpoint(&self) -> ChainCheckpoint {
        ChainCheckpoint::new(self.store.clone())
    }

    /// Ingests every staged stream.
    pub fn run(&self) -> BatchOutcome {
        self.batch.ingest(self.source.names())
    }

    /// Returns the batch ingestor.
    pub fn batch(&self) -> &BatchIngestor {
        &self.batch
    }
}

impl Default for IngestHarness {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chainfeed_codec::read_prev_hash;

    #[test]
    fn chained_files_link_hashes() {
        let files = chained_files(&["T1", "T2", "T3"], 2);
        assert_eq!(read_prev_hash("T1", files[0].1.as_slice()).unwrap(), Some(FileHash::ZERO));
        for pair in files.windows(2) {
            let declared = read_prev_hash(&pair[1].0, pair[1].1.as_slice()).unwrap();
            assert_eq!(declared, Some(content_hash(&pair[0].1)));
        }
    }

    #[test]
    fn harness_ingests_chain() {
        let harness = IngestHarness::new();
        for (name, bytes) in chained_files(&["T1", "T2"], 1) {
            harness.stage(&name, bytes);
        }
        let outcome = harness.run();
        assert_eq!(outcome.processed, vec!["T1", "T2"]);
        assert_eq!(harness.listener.completed().len(), 2);
    }
}
