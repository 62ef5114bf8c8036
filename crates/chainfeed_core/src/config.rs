//! Parser configuration.

use chainfeed_storage::{DirectoryLifecycle, DirectorySource};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// What happens to a record file once it has been ingested.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum ProcessedFileAction {
    /// Remove the file from the staging directory.
    #[default]
    Delete,
    /// Move the file into `destination`.
    Move {
        /// Directory receiving processed files.
        destination: PathBuf,
    },
}

/// Configuration for the record file parser.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParserConfig {
    /// Staging directory holding record files awaiting ingestion.
    pub source_dir: PathBuf,

    /// Directory of the chain checkpoint store.
    pub checkpoint_dir: PathBuf,

    /// How often the scheduler runs, in milliseconds.
    pub frequency_ms: u64,

    /// What to do with a file after it is ingested.
    pub processed_file_action: ProcessedFileAction,

    /// Stream type label attached to parse metrics.
    pub stream_type: String,

    /// Whether the scheduler does anything at all.
    pub enabled: bool,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            source_dir: PathBuf::from("data/recordstreams/valid"),
            checkpoint_dir: PathBuf::from("data/checkpoint"),
            frequency_ms: 500,
            processed_file_action: ProcessedFileAction::Delete,
            stream_type: "RECORD".to_string(),
            enabled: true,
        }
    }
}

impl ParserConfig {
    /// Creates a new configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the staging directory.
    #[must_use]
    pub fn source_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.source_dir = path.into();
        self
    }

    /// Sets the checkpoint directory.
    #[must_use]
    pub fn checkpoint_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.checkpoint_dir = path.into();
        self
    }

    /// Sets the scheduler frequency in milliseconds.
    #[must_use]
    pub const fn frequency_ms(mut self, millis: u64) -> Self {
        self.frequency_ms = millis;
        self
    }

    /// Moves processed files into `destination` instead of deleting them.
    #[must_use]
    pub fn move_processed_to(mut self, destination: impl Into<PathBuf>) -> Self {
        self.processed_file_action = ProcessedFileAction::Move {
            destination: destination.into(),
        };
        self
    }

    /// Deletes processed files.
    #[must_use]
    pub fn delete_processed(mut self) -> Self {
        self.processed_file_action = ProcessedFileAction::Delete;
        self
    }

    /// Sets the stream type label.
    #[must_use]
    pub fn stream_type(mut self, label: impl Into<String>) -> Self {
        self.stream_type = label.into();
        self
    }

    /// Enables or disables the scheduler.
    #[must_use]
    pub const fn enabled(mut self, value: bool) -> Self {
        self.enabled = value;
        self
    }

    /// Returns the scheduler period.
    #[must_use]
    pub fn frequency(&self) -> Duration {
        Duration::from_millis(self.frequency_ms.max(1))
    }

    /// Returns a source over the staging directory.
    #[must_use]
    pub fn source(&self) -> DirectorySource {
        DirectorySource::new(&self.source_dir)
    }

    /// Returns the lifecycle collaborator for processed files.
    #[must_use]
    pub fn lifecycle(&self) -> DirectoryLifecycle {
        match &self.processed_file_action {
            ProcessedFileAction::Delete => DirectoryLifecycle::delete(&self.source_dir),
            ProcessedFileAction::Move { destination } => {
                DirectoryLifecycle::move_to(&self.source_dir, destination)
            }
        }
    }

    /// Returns the staging directory.
    #[must_use]
    pub fn source_path(&self) -> &Path {
        &self.source_dir
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = ParserConfig::default();
        assert_eq!(config.frequency_ms, 500);
        assert_eq!(config.processed_file_action, ProcessedFileAction::Delete);
        assert_eq!(config.stream_type, "RECORD");
        assert!(config.enabled);
    }

    #[test]
    fn builder_pattern() {
        let config = ParserConfig::new()
            .source_dir("/staging")
            .frequency_ms(1000)
            .move_processed_to("/archive")
            .enabled(false);

        assert_eq!(config.source_dir, PathBuf::from("/staging"));
        assert_eq!(config.frequency(), Duration::from_secs(1));
        assert!(!config.enabled);
        assert_eq!(
            config.lifecycle().destination(),
            Some(Path::new("/archive"))
        );
        assert_eq!(config.delete_processed().lifecycle().destination(), None);
    }

    #[test]
    fn zero_frequency_is_clamped() {
        assert_eq!(
            ParserConfig::new().frequency_ms(0).frequency(),
            Duration::from_millis(1)
        );
    }

    #[test]
    fn partial_json_uses_defaults() {
        let json = r#"{
            "source_dir": "/in",
            "processed_file_action": { "action": "move", "destination": "/out" }
        }"#;
        let config: ParserConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.source_dir, PathBuf::from("/in"));
        assert_eq!(config.frequency_ms, 500);
        assert_eq!(
            config.processed_file_action,
            ProcessedFileAction::Move {
                destination: PathBuf::from("/out")
            }
        );
    }

    #[test]
    fn json_roundtrip() {
        let config = ParserConfig::new().stream_type("BALANCE").frequency_ms(250);
        let json = serde_json::to_string(&config).unwrap();
        let back: ParserConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back, config);
    }
}
