//! Checkpoint inspection and repair.

use chainfeed_codec::FileHash;
use chainfeed_core::ChainCheckpoint;
use chainfeed_storage::FileCheckpointStore;
use clap::Subcommand;
use serde::Serialize;
use std::error::Error;
use std::path::Path;
use std::sync::Arc;

/// Checkpoint operations.
#[derive(Subcommand)]
pub enum CheckpointCommand {
    /// Show the last processed hash and the bypass window
    Show {
        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Tolerate hash mismatches for files named before TOKEN
    SetBypass {
        /// File name token; mismatches pass while it sorts after the file name
        token: String,
    },

    /// Close the bypass window
    ClearBypass,

    /// Overwrite the last processed hash
    SetHash {
        /// 96 hex characters
        hash: String,
    },

    /// Forget the last processed hash; the next file is trusted as declared
    ClearHash,
}

#[derive(Serialize)]
struct CheckpointView {
    last_processed_hash: Option<FileHash>,
    bypass_until: String,
}

/// Runs a checkpoint command against the store at `dir`.
pub fn run(dir: &Path, command: CheckpointCommand) -> Result<(), Box<dyn Error>> {
    let checkpoint = ChainCheckpoint::new(Arc::new(FileCheckpointStore::open(dir)?));

    match command {
        CheckpointCommand::Show { format } => {
            let view = CheckpointView {
                last_processed_hash: checkpoint.last_hash()?,
                bypass_until: checkpoint.bypass_until()?,
            };
            match format.as_str() {
                "json" => println!("{}", serde_json::to_string_pretty(&view)?),
                _ => {
                    match &view.last_processed_hash {
                        Some(hash) => println!("last processed hash: {hash}"),
                        None => println!("last processed hash: (none)"),
                    }
                    if view.bypass_until.is_empty() {
                        println!("bypass until:        (closed)");
                    } else {
                        println!("bypass until:        {}", view.bypass_until);
                    }
                }
            }
        }
        CheckpointCommand::SetBypass { token } => {
            checkpoint.set_bypass_until(&token)?;
            println!("bypass window open until {token}");
        }
        CheckpointCommand::ClearBypass => {
            checkpoint.clear_bypass_until()?;
            println!("bypass window closed");
        }
        CheckpointCommand::SetHash { hash } => {
            let hash = FileHash::from_hex(&hash)?;
            checkpoint.set_last_hash(&hash)?;
            println!("last processed hash set to {hash}");
        }
        CheckpointCommand::ClearHash => {
            checkpoint.clear_last_hash()?;
            println!("last processed hash cleared");
        }
    }
    Ok(())
}
