//! Periodic ingestion entry point.

use crate::batch::{BatchIngestor, BatchOutcome};
use crate::config::ParserConfig;
use crate::error::IngestResult;
use tracing::{debug, error, info, trace, warn};

/// One scheduler tick: list the staging area and ingest what is there.
///
/// The host calls [`Scheduler::parse`] at the configured frequency and
/// must not call it concurrently.
pub struct Scheduler {
    config: ParserConfig,
    batch: BatchIngestor,
}

impl Scheduler {
    /// Creates a scheduler.
    pub fn new(config: ParserConfig, batch: BatchIngestor) -> Self {
        Self { config, batch }
    }

    /// Returns the configuration.
    pub fn config(&self) -> &ParserConfig {
        &self.config
    }

    /// Returns the batch ingestor.
    pub fn batch(&self) -> &BatchIngestor {
        &self.batch
    }

    /// Runs one tick. Never fails: errors are logged and the next tick
    /// retries.
    pub fn parse(&self) {
        match self.run_once() {
            Ok(Some(outcome)) => log_outcome(&outcome),
            Ok(None) => {}
            Err(e) => error!(error = %e, "Error parsing files"),
        }
    }

    /// Runs one tick and reports what happened.
    ///
    /// Returns `Ok(None)` when nothing was attempted: the parser is
    /// disabled, shutdown was requested, or the staging area is empty.
    ///
    /// # Errors
    ///
    /// Returns an error if the staging area cannot be listed.
    pub fn run_once(&self) -> IngestResult<Option<BatchOutcome>> {
        if !self.config.enabled || self.batch.shutdown().is_stopping() {
            return Ok(None);
        }

        debug!(path = %self.config.source_dir.display(), "Parsing record files");
        let names = self.batch.source().list()?;
        if names.is_empty() {
            debug!("No files to parse");
            return Ok(None);
        }

        trace!(files = ?names, "Processing record files");
        Ok(Some(self.batch.ingest(names)))
    }
}

fn log_outcome(outcome: &BatchOutcome) {
    if let Some(halted) = &outcome.halted {
        warn!(
            file = %halted.name,
            error = %halted.error,
            processed = outcome.processed.len(),
            skipped = outcome.skipped.len(),
            "Batch halted, file left for retry"
        );
    } else if outcome.interrupted {
        info!(
            processed = outcome.processed.len(),
            "Batch interrupted by shutdown"
        );
    } else if !outcome.processed.is_empty() || !outcome.skipped.is_empty() {
        info!(
            processed = outcome.processed.len(),
            skipped = outcome.skipped.len(),
            "Batch finished"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::RecordFileParser;
    use crate::shutdown::ShutdownSignal;
    use chainfeed_codec::{FileHash, FrameWriter, StreamHeader};
    use chainfeed_storage::{InMemoryCheckpointStore, InMemorySource};
    use std::sync::Arc;

    fn scheduler(config: ParserConfig) -> (Arc<InMemorySource>, Scheduler) {
        let source = Arc::new(InMemorySource::new());
        let parser = RecordFileParser::new(Arc::new(InMemoryCheckpointStore::new()));
        let batch = BatchIngestor::new(source.clone(), source.clone(), parser, ShutdownSignal::new());
        (source, Scheduler::new(config, batch))
    }

    fn file_bytes() -> Vec<u8> {
        let mut w = FrameWriter::new(Vec::new(), StreamHeader::new(2, 3)).unwrap();
        w.write_prev_hash(&FileHash::ZERO).unwrap();
        w.into_inner()
    }

    #[test]
    fn empty_source_does_nothing() {
        let (_, scheduler) = scheduler(ParserConfig::default());
        assert!(scheduler.run_once().unwrap().is_none());
        scheduler.parse();
    }

    #[test]
    fn ingests_listed_files() {
        let (source, scheduler) = scheduler(ParserConfig::default());
        source.insert("T1", file_bytes());
        let outcome = scheduler.run_once().unwrap().unwrap();
        assert_eq!(outcome.processed, vec!["T1"]);
        assert!(source.names().is_empty());
    }

    #[test]
    fn disabled_parser_is_inert() {
        let (source, scheduler) = scheduler(ParserConfig::default().enabled(false));
        source.insert("T1", file_bytes());
        assert!(scheduler.run_once().unwrap().is_none());
        assert!(source.contains("T1"));
    }

    #[test]
    fn shutdown_skips_tick() {
        let (source, scheduler) = scheduler(ParserConfig::default());
        source.insert("T1", file_bytes());
        scheduler.batch().shutdown().trigger();
        assert!(scheduler.run_once().unwrap().is_none());
        assert!(source.contains("T1"));
    }

    #[test]
    fn failing_tick_does_not_panic() {
        let (source, scheduler) = scheduler(ParserConfig::default());
        source.insert("T1", vec![1, 2, 3]);
        scheduler.parse();
        assert!(source.contains("T1"));
    }
}
