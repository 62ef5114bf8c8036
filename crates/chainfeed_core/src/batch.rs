//! Ordered batch ingestion.
//!
//! Files are ingested strictly in name order, one at a time. A failed file
//! halts the batch and stays staged for the next run, except for
//! duplicates, which are skipped.

use crate::error::{IngestError, IngestResult};
use crate::pipeline::RecordFileParser;
use crate::shutdown::ShutdownSignal;
use chainfeed_storage::{FileLifecycle, StreamReader, StreamSource};
use std::sync::Arc;
use tracing::{error, info, warn};

/// The file that stopped a batch and why.
#[derive(Debug)]
pub struct HaltedFile {
    /// Name of the file left in place.
    pub name: String,
    /// The error that stopped the batch.
    pub error: IngestError,
}

/// Result of one batch run.
#[derive(Debug, Default)]
pub struct BatchOutcome {
    /// Files ingested and handed to the lifecycle collaborator.
    pub processed: Vec<String>,
    /// Files skipped as duplicates.
    pub skipped: Vec<String>,
    /// The file that halted the batch, if any.
    pub halted: Option<HaltedFile>,
    /// A file that vanished before it could be opened.
    pub missing: Option<String>,
    /// True if the batch stopped because shutdown was requested.
    pub interrupted: bool,
}

impl BatchOutcome {
    /// Returns true if every candidate was processed or skipped.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.halted.is_none() && self.missing.is_none() && !self.interrupted
    }
}

/// Runs the pipeline over a batch of staged files.
pub struct BatchIngestor {
    source: Arc<dyn StreamSource>,
    lifecycle: Arc<dyn FileLifecycle>,
    parser: RecordFileParser,
    shutdown: ShutdownSignal,
}

impl BatchIngestor {
    /// Creates an ingestor.
    pub fn new(
        source: Arc<dyn StreamSource>,
        lifecycle: Arc<dyn FileLifecycle>,
        parser: RecordFileParser,
        shutdown: ShutdownSignal,
    ) -> Self {
        Self {
            source,
            lifecycle,
            parser,
            shutdown,
        }
    }

    /// Returns the stream source.
    pub fn source(&self) -> &Arc<dyn StreamSource> {
        &self.source
    }

    /// Returns the parser.
    pub fn parser(&self) -> &RecordFileParser {
        &self.parser
    }

    /// Returns the shutdown signal.
    pub fn shutdown(&self) -> &ShutdownSignal {
        &self.shutdown
    }

    fn open(&self, name: &str) -> IngestResult<StreamReader> {
        self.source
            .open(name)?
            .ok_or_else(|| IngestError::MissingFile {
                file: name.to_string(),
            })
    }

    /// Ingests `names` in sorted order.
    pub fn ingest(&self, mut names: Vec<String>) -> BatchOutcome {
        names.sort();
        let mut outcome = BatchOutcome::default();

        for name in names {
            if self.shutdown.is_stopping() {
                outcome.interrupted = true;
                return outcome;
            }

            let reader = match self.open(&name) {
                Ok(reader) => reader,
                Err(IngestError::MissingFile { file }) => {
                    warn!(file = %file, "File does not exist");
                    outcome.missing = Some(file);
                    return outcome;
                }
                Err(e) => {
                    error!(file = %name, error = %e, "Error opening file");
                    outcome.halted = Some(HaltedFile { name, error: e });
                    return outcome;
                }
            };

            match self
                .parser
                .load_record_file(self.source.as_ref(), &name, reader)
            {
                Ok(_) => {}
                Err(e) if e.is_duplicate() => {
                    info!(file = %name, "Skipping duplicate file");
                    outcome.skipped.push(name);
                    continue;
                }
                Err(e) => {
                    outcome.halted = Some(HaltedFile { name, error: e });
                    return outcome;
                }
            }

            if let Err(e) = self.lifecycle.finish(&name) {
                error!(file = %name, error = %e, "Error disposing of parsed file");
                outcome.halted = Some(HaltedFile {
                    name,
                    error: e.into(),
                });
                return outcome;
            }
            outcome.processed.push(name);
        }

        outcome
    }
}
