//! chainfeed CLI
//!
//! Ingests hash-chained record stream files from a staging directory.
//!
//! # Commands
//!
//! - `run` - Ingest at the configured frequency until Ctrl-C
//! - `parse` - Ingest whatever is staged, once
//! - `dump` - Print the frames of a record file
//! - `hash` - Print a record file's content hash
//! - `prev-hash` - Print the previous-file hash a record file declares
//! - `checkpoint` - Inspect or repair the chain checkpoint

mod commands;
mod settings;
mod sink;

use clap::{Args, Parser, Subcommand};
use commands::checkpoint::CheckpointCommand;
use settings::Overrides;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Record stream ingestion with hash-chain verification.
#[derive(Parser)]
#[command(name = "chainfeed")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Parser configuration file (JSON)
    #[arg(global = true, short, long)]
    config: Option<PathBuf>,

    /// Staging directory holding record files
    #[arg(global = true, short, long)]
    source: Option<PathBuf>,

    /// Checkpoint directory
    #[arg(global = true, long)]
    checkpoint: Option<PathBuf>,

    /// Enable verbose output
    #[arg(global = true, short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct IngestArgs {
    /// JSON-lines file receiving ingested files and items
    #[arg(short, long, default_value = "chainfeed-output.jsonl")]
    output: PathBuf,

    /// Move processed files here instead of deleting them
    #[arg(long)]
    move_to: Option<PathBuf>,

    /// Stream type label for parse metrics
    #[arg(long)]
    stream_type: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Ingest staged files periodically until Ctrl-C
    Run {
        /// Milliseconds between scheduler ticks
        #[arg(long)]
        frequency_ms: Option<u64>,

        #[command(flatten)]
        ingest: IngestArgs,
    },

    /// Ingest staged files once
    Parse {
        #[command(flatten)]
        ingest: IngestArgs,
    },

    /// Print the header and frames of a record file
    Dump {
        /// Record file
        file: PathBuf,

        /// Maximum number of frames to print
        #[arg(short, long)]
        limit: Option<usize>,

        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Print the content hash of a record file
    Hash {
        /// Record file
        file: PathBuf,
    },

    /// Print the previous-file hash a record file declares
    PrevHash {
        /// Record file
        file: PathBuf,
    },

    /// Inspect or repair the chain checkpoint
    Checkpoint {
        #[command(subcommand)]
        action: CheckpointCommand,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let mut overrides = Overrides {
        source: cli.source,
        checkpoint: cli.checkpoint,
        ..Overrides::default()
    };

    match cli.command {
        Commands::Run {
            frequency_ms,
            ingest,
        } => {
            overrides.frequency_ms = frequency_ms;
            overrides.move_to = ingest.move_to;
            overrides.stream_type = ingest.stream_type;
            let config = settings::load(cli.config.as_deref(), overrides)?;
            commands::ingest::run(&config, &ingest.output)?;
        }
        Commands::Parse { ingest } => {
            overrides.move_to = ingest.move_to;
            overrides.stream_type = ingest.stream_type;
            let config = settings::load(cli.config.as_deref(), overrides)?;
            commands::ingest::parse_once(&config, &ingest.output)?;
        }
        Commands::Dump {
            file,
            limit,
            format,
        } => {
            commands::dump::run(&file, limit, &format)?;
        }
        Commands::Hash { file } => {
            commands::hash::run(&file)?;
        }
        Commands::PrevHash { file } => {
            commands::hash::run_prev(&file)?;
        }
        Commands::Checkpoint { action } => {
            let config = settings::load(cli.config.as_deref(), overrides)?;
            commands::checkpoint::run(&config.checkpoint_dir, action)?;
        }
    }

    Ok(())
}
