//! Fuzz targets for the decoder and the pipeline.
//!
//! Arbitrary input must produce a frame sequence or a typed error. A panic
//! is a bug.

use crate::integration::IngestHarness;
use chainfeed_codec::{read_prev_hash, FrameReader};

/// Fuzz target for frame decoding.
pub fn fuzz_decode(data: &[u8]) {
    if let Ok(reader) = FrameReader::new("fuzz", data) {
        for frame in reader {
            if frame.is_err() {
                break;
            }
        }
    }
    let _ = read_prev_hash("fuzz", data);
}

/// Fuzz target for the full pipeline on one file.
///
/// A rejected file must never advance the checkpoint.
pub fn fuzz_ingest(data: &[u8]) {
    let harness = IngestHarness::new();
    harness.stage("fuzz", data.to_vec());
    let outcome = harness.run();
    if outcome.halted.is_some() {
        assert!(
            harness.store.is_empty(),
            "Rejected file advanced the checkpoint"
        );
        assert!(harness.source.contains("fuzz"), "Rejected file was removed");
    }
}
