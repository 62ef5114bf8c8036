//! Cross-crate ingestion scenarios.

use chainfeed_codec::{CodecError, FileHash};
use chainfeed_core::{
    BatchIngestor, IngestError, ParserConfig, RecordFileParser, Scheduler, ShutdownSignal,
    PARSE_DURATION,
};
use chainfeed_storage::{CheckpointStore, FileCheckpointStore};
use chainfeed_testkit::prelude::*;
use std::sync::Arc;

#[test]
fn e2e_single_file() {
    let harness = IngestHarness::new();
    let bytes = e2e_file();
    harness.stage("T1", bytes.clone());

    let outcome = harness.run();
    assert_eq!(outcome.processed, vec!["T1"]);

    assert_eq!(
        harness.listener.items(),
        vec![(vec![0xDE, 0xAD, 0xBE, 0xEF], vec![0xCA, 0xFE])]
    );
    let completed = harness.listener.completed();
    assert_eq!(completed.len(), 1);
    assert_eq!(completed[0].transaction_count, 1);
    assert_eq!(completed[0].file_hash, content_hash(&bytes));
    assert_eq!(
        harness.checkpoint().last_hash().unwrap(),
        Some(content_hash(&bytes))
    );
    assert!(!harness.source.contains("T1"));
}

#[test]
fn accepted_files_form_a_chain() {
    let harness = IngestHarness::new();
    for (name, bytes) in chained_files(&["T1", "T2", "T3", "T4"], 3) {
        harness.stage(&name, bytes);
    }

    let outcome = harness.run();
    assert!(outcome.is_complete());

    let completed = harness.listener.completed();
    assert_eq!(completed.len(), 4);
    for pair in completed.windows(2) {
        assert_eq!(pair[1].previous_hash, Some(pair[0].file_hash));
    }
    assert_eq!(
        harness.checkpoint().last_hash().unwrap(),
        Some(completed[3].file_hash)
    );
}

#[test]
fn broken_chain_halts_batch() {
    let harness = IngestHarness::new();
    let files = chained_files(&["T1", "T2"], 1);
    for (name, bytes) in files {
        harness.stage(&name, bytes);
    }
    let forged = RecordFileBuilder::new()
        .prev_hash(FileHash::from_bytes([0x55; 48]))
        .record(b"tx", b"rec")
        .build();
    harness.stage("T3", forged);
    harness.stage("T4", e2e_file());

    let outcome = harness.run();
    assert_eq!(outcome.processed, vec!["T1", "T2"]);
    let halted = outcome.halted.unwrap();
    assert_eq!(halted.name, "T3");
    assert!(matches!(halted.error, IngestError::ChainMismatch { .. }));
    assert!(harness.source.contains("T3"));
    assert!(harness.source.contains("T4"));
}

#[test]
fn bypass_window_expires() {
    let anchor = FileHash::from_bytes([0x11; 48]);
    let wrong = FileHash::from_bytes([0x22; 48]);

    let inside = IngestHarness::new();
    inside.checkpoint().set_last_hash(&anchor).unwrap();
    inside.checkpoint().set_bypass_until("T5").unwrap();
    inside.stage(
        "T3",
        RecordFileBuilder::new().prev_hash(wrong).record(b"a", b"b").build(),
    );
    let outcome = inside.run();
    assert_eq!(outcome.processed, vec!["T3"]);

    let outside = IngestHarness::new();
    outside.checkpoint().set_last_hash(&anchor).unwrap();
    outside.checkpoint().set_bypass_until("T5").unwrap();
    outside.stage(
        "T7",
        RecordFileBuilder::new().prev_hash(wrong).record(b"a", b"b").build(),
    );
    let outcome = outside.run();
    match outcome.halted {
        Some(halted) => match halted.error {
            IngestError::ChainMismatch {
                file,
                expected,
                actual,
            } => {
                assert_eq!(file, "T7");
                assert_eq!(expected, anchor);
                assert_eq!(actual, wrong);
            }
            other => panic!("expected ChainMismatch, got {other:?}"),
        },
        None => panic!("T7 should have been rejected"),
    }
    assert_eq!(outside.checkpoint().last_hash().unwrap(), Some(anchor));
}

#[test]
fn checkpoint_waits_for_on_end() {
    let harness = IngestHarness::new();
    let files = chained_files(&["T1", "T2"], 1);
    let first_hash = content_hash(&files[0].1);
    for (name, bytes) in files {
        harness.stage(&name, bytes);
    }
    harness.listener.fail_on_end("T2");

    let outcome = harness.run();
    assert_eq!(outcome.processed, vec!["T1"]);
    let halted = outcome.halted.unwrap();
    assert_eq!(halted.name, "T2");
    assert!(matches!(halted.error, IngestError::Listener { .. }));

    assert_eq!(harness.checkpoint().last_hash().unwrap(), Some(first_hash));
    assert_eq!(harness.listener.error_count(), 1);
    assert!(harness.source.contains("T2"));
}

#[test]
fn on_end_failure_on_first_file_leaves_checkpoint_empty() {
    let harness = IngestHarness::new();
    harness.stage("T1", e2e_file());
    harness.listener.fail_on_end("T1");

    harness.run();
    assert!(harness.store.is_empty());
    assert!(harness.store.read("last_processed_record_hash").unwrap().is_none());
}

#[test]
fn duplicate_is_skipped_and_batch_continues() {
    let harness = IngestHarness::new();
    let files = chained_files(&["F1", "F3"], 1);
    let f1_hash = content_hash(&files[0].1);
    for (name, bytes) in files {
        harness.stage(&name, bytes);
    }
    harness.stage(
        "F2",
        RecordFileBuilder::new().prev_hash(f1_hash).record(b"x", b"y").build(),
    );
    harness.listener.reject_as_duplicate("F2");

    let outcome = harness.run();
    assert_eq!(outcome.processed, vec!["F1", "F3"]);
    assert_eq!(outcome.skipped, vec!["F2"]);
    assert!(outcome.halted.is_none());
    assert!(harness.source.contains("F2"));
}

#[test]
fn truncated_file_halts_batch() {
    let harness = IngestHarness::new();
    let files = chained_files(&["F1", "F2", "F3"], 2);
    for (name, mut bytes) in files {
        if name == "F2" {
            bytes.truncate(bytes.len() - 3);
        }
        harness.stage(&name, bytes);
    }

    let outcome = harness.run();
    assert_eq!(outcome.processed, vec!["F1"]);
    let halted = outcome.halted.unwrap();
    assert_eq!(halted.name, "F2");
    assert!(matches!(
        halted.error,
        IngestError::Codec(CodecError::TruncatedStream { .. })
    ));

    let started: Vec<_> = harness
        .listener
        .events()
        .into_iter()
        .filter_map(|e| match e {
            Recorded::Start(name) => Some(name),
            _ => None,
        })
        .collect();
    assert_eq!(started, vec!["F1", "F2"]);
    assert!(harness.source.contains("F2"));
    assert!(harness.source.contains("F3"));

    let failures: Vec<_> = harness
        .metrics
        .named(PARSE_DURATION)
        .into_iter()
        .filter(|s| s.tag("success") == Some("false"))
        .collect();
    assert_eq!(failures.len(), 1);
}

#[test]
fn truncated_file_emits_no_later_items() {
    let harness = IngestHarness::new();
    let mut bytes = RecordFileBuilder::new()
        .prev_hash(FileHash::ZERO)
        .record(b"first", b"ok")
        .record(b"second", b"cut short")
        .record(b"third", b"never seen")
        .build();
    let cut = b"third".len() + b"never seen".len() + 9 + 4;
    bytes.truncate(bytes.len() - cut);
    harness.stage("T1", bytes);

    harness.run();
    assert_eq!(
        harness.listener.items(),
        vec![(b"first".to_vec(), b"ok".to_vec())]
    );
}

#[test]
fn shutdown_leaves_everything_staged() {
    let harness = IngestHarness::new();
    for (name, bytes) in chained_files(&["T1", "T2"], 1) {
        harness.stage(&name, bytes);
    }
    harness.shutdown.trigger();

    let outcome = harness.run();
    assert!(outcome.interrupted);
    assert!(outcome.processed.is_empty());
    assert!(harness.listener.events().is_empty());
    assert_eq!(harness.source.names().len(), 2);
}

#[test]
fn scheduler_over_directories() {
    let dir = StagingDir::new();
    let names = [
        "2024-01-01T00_00_00Z.rcd",
        "2024-01-01T00_00_02Z.rcd",
        "2024-01-01T00_00_04Z.rcd",
    ];
    let files = chained_files(&names, 2);
    let last_hash = content_hash(&files[2].1);
    for (name, bytes) in &files {
        dir.stage(name, bytes);
    }

    let config = ParserConfig::new()
        .source_dir(dir.staging())
        .checkpoint_dir(dir.checkpoint_dir())
        .move_processed_to(dir.archive());
    let store = Arc::new(dir.checkpoint_store());
    let listener = Arc::new(RecordingListener::new());
    let parser = RecordFileParser::new(store.clone())
        .with_item_listener(listener.clone())
        .with_file_listener(listener.clone());
    let batch = BatchIngestor::new(
        Arc::new(config.source()),
        Arc::new(config.lifecycle()),
        parser,
        ShutdownSignal::new(),
    );
    let scheduler = Scheduler::new(config, batch);

    scheduler.parse();

    for name in names {
        assert!(!dir.is_staged(name));
        assert!(dir.is_archived(name));
    }
    assert_eq!(listener.items().len(), 6);
    let stored = store.read("last_processed_record_hash").unwrap().unwrap();
    assert_eq!(String::from_utf8(stored).unwrap(), last_hash.to_hex());

    // A second tick finds nothing to do.
    assert!(scheduler.run_once().unwrap().is_none());
}

#[test]
fn checkpoint_survives_reopen() {
    let dir = StagingDir::new();
    let hash = FileHash::from_bytes([0x42; 48]);
    {
        let store = Arc::new(dir.checkpoint_store());
        let parser = RecordFileParser::new(store);
        parser.checkpoint().set_last_hash(&hash).unwrap();
    }

    let store: Arc<FileCheckpointStore> = Arc::new(dir.checkpoint_store());
    let parser = RecordFileParser::new(store);
    assert_eq!(parser.checkpoint().last_hash().unwrap(), Some(hash));
}

#[test]
fn missing_source_directory_is_logged_not_raised() {
    let dir = StagingDir::new();
    let config = ParserConfig::new().source_dir(dir.root().join("nope"));
    let parser = RecordFileParser::new(Arc::new(dir.checkpoint_store()));
    let batch = BatchIngestor::new(
        Arc::new(config.source()),
        Arc::new(config.lifecycle()),
        parser,
        ShutdownSignal::new(),
    );
    let scheduler = Scheduler::new(config, batch);

    scheduler.parse();
    assert!(scheduler.run_once().is_err());
}
