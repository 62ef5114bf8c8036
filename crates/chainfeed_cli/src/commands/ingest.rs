//! `run` and `parse` commands.

use crate::sink::JsonLinesSink;
use chainfeed_core::{
    BatchIngestor, ParserConfig, RecordFileParser, Scheduler, ShutdownSignal, TracingMetrics,
};
use chainfeed_storage::FileCheckpointStore;
use std::error::Error;
use std::path::Path;
use std::sync::Arc;
use tokio::time::MissedTickBehavior;
use tracing::{error, info};

/// Wires the file-system collaborators into a scheduler.
pub fn build_scheduler(
    config: &ParserConfig,
    output: &Path,
    shutdown: ShutdownSignal,
) -> Result<Scheduler, Box<dyn Error>> {
    let store = FileCheckpointStore::open(&config.checkpoint_dir)?;
    let sink = Arc::new(JsonLinesSink::open(output)?);
    info!(
        output = %sink.path().display(),
        completed = sink.completed_count(),
        "Opened output sink"
    );

    let parser = RecordFileParser::new(Arc::new(store))
        .with_item_listener(sink.clone())
        .with_file_listener(sink)
        .with_metrics(Arc::new(TracingMetrics))
        .with_stream_type(config.stream_type.clone());
    let batch = BatchIngestor::new(
        Arc::new(config.source()),
        Arc::new(config.lifecycle()),
        parser,
        shutdown,
    );
    Ok(Scheduler::new(config.clone(), batch))
}

/// Runs a single scheduler tick.
pub fn parse_once(config: &ParserConfig, output: &Path) -> Result<(), Box<dyn Error>> {
    let scheduler = build_scheduler(config, output, ShutdownSignal::new())?;
    match scheduler.run_once()? {
        Some(outcome) => {
            println!(
                "processed {} file(s), skipped {} duplicate(s)",
                outcome.processed.len(),
                outcome.skipped.len()
            );
            if let Some(halted) = outcome.halted {
                return Err(format!("halted on {}: {}", halted.name, halted.error).into());
            }
        }
        None => println!("nothing to parse"),
    }
    Ok(())
}

/// Runs the scheduler at the configured frequency until Ctrl-C.
pub fn run(config: &ParserConfig, output: &Path) -> Result<(), Box<dyn Error>> {
    let shutdown = ShutdownSignal::new();
    let scheduler = Arc::new(build_scheduler(config, output, shutdown.clone())?);
    let period = config.frequency();

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;

    runtime.block_on(async move {
        let signal = shutdown.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                info!("Shutdown requested, finishing current file");
                signal.trigger();
            }
        });

        info!(period = ?period, "Record parser started");
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;
            if shutdown.is_stopping() {
                break;
            }
            let tick = Arc::clone(&scheduler);
            if let Err(e) = tokio::task::spawn_blocking(move || tick.parse()).await {
                error!(error = %e, "Parser tick panicked");
            }
        }
        info!("Record parser stopped");
    });

    Ok(())
}
