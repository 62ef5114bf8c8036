//! Shared inputs for chainfeed benchmarks.

use chainfeed_codec::{FileHash, FrameWriter, StreamHeader};

/// Builds a record file with `records` records of `payload` bytes each.
///
/// Payload bytes follow a fixed pattern so runs are comparable.
pub fn sample_file(prev: FileHash, records: usize, payload: usize) -> Vec<u8> {
    let mut writer = FrameWriter::new(
        Vec::with_capacity(records * (2 * payload + 9) + 64),
        StreamHeader::new(2, 30),
    )
    .expect("writing to a Vec cannot fail");
    writer.write_prev_hash(&prev).expect("writing to a Vec cannot fail");

    let transaction: Vec<u8> = (0..payload).map(|i| (i % 251) as u8).collect();
    let record: Vec<u8> = (0..payload).map(|i| (i % 241) as u8).collect();
    for _ in 0..records {
        writer
            .write_record(&transaction, &record)
            .expect("writing to a Vec cannot fail");
    }
    writer.into_inner()
}
