//! Parser configuration from a JSON file plus command-line overrides.

use chainfeed_core::ParserConfig;
use std::error::Error;
use std::path::{Path, PathBuf};

/// Command-line values that take precedence over the config file.
#[derive(Debug, Default, Clone)]
pub struct Overrides {
    pub source: Option<PathBuf>,
    pub checkpoint: Option<PathBuf>,
    pub frequency_ms: Option<u64>,
    pub move_to: Option<PathBuf>,
    pub stream_type: Option<String>,
}

/// Loads the configuration. Missing file fields fall back to defaults.
pub fn load(path: Option<&Path>, overrides: Overrides) -> Result<ParserConfig, Box<dyn Error>> {
    let mut config = match path {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .map_err(|e| format!("cannot read config {}: {e}", path.display()))?;
            serde_json::from_str::<ParserConfig>(&text)
                .map_err(|e| format!("invalid config {}: {e}", path.display()))?
        }
        None => ParserConfig::default(),
    };

    if let Some(source) = overrides.source {
        config = config.source_dir(source);
    }
    if let Some(checkpoint) = overrides.checkpoint {
        config = config.checkpoint_dir(checkpoint);
    }
    if let Some(millis) = overrides.frequency_ms {
        config = config.frequency_ms(millis);
    }
    if let Some(destination) = overrides.move_to {
        config = config.move_processed_to(destination);
    }
    if let Some(label) = overrides.stream_type {
        config = config.stream_type(label);
    }
    Ok(config)
}
