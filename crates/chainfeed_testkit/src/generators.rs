//! Property-based test generators using proptest.

use crate::fixtures::RecordFileBuilder;
use chainfeed_codec::{FileHash, HASH_SIZE};
use proptest::prelude::*;

/// Strategy for generating file hashes, zero included.
pub fn file_hash_strategy() -> impl Strategy<Value = FileHash> {
    prop_oneof![
        1 => Just(FileHash::ZERO),
        9 => prop::collection::vec(any::<u8>(), HASH_SIZE)
            .prop_map(|v| FileHash::from_slice(&v).expect("length is HASH_SIZE")),
    ]
}

/// Strategy for generating a transaction/result payload pair.
pub fn record_pair_strategy() -> impl Strategy<Value = (Vec<u8>, Vec<u8>)> {
    (
        prop::collection::vec(any::<u8>(), 0..256),
        prop::collection::vec(any::<u8>(), 0..256),
    )
}

/// Strategy for generating the records of one file.
pub fn records_strategy(max: usize) -> impl Strategy<Value = Vec<(Vec<u8>, Vec<u8>)>> {
    prop::collection::vec(record_pair_strategy(), 0..=max)
}

/// Strategy for generating sortable file name tokens.
pub fn file_token_strategy() -> impl Strategy<Value = String> {
    (2019u32..2030, 1u32..=12, 1u32..=28, 0u32..24, 0u32..60, 0u32..60).prop_map(
        |(y, mo, d, h, mi, s)| format!("{y:04}-{mo:02}-{d:02}T{h:02}_{mi:02}_{s:02}Z.rcd"),
    )
}

/// Strategy for generating complete, well-formed record files.
pub fn record_file_strategy() -> impl Strategy<Value = (FileHash, Vec<(Vec<u8>, Vec<u8>)>, Vec<u8>)>
{
    (file_hash_strategy(), records_strategy(8)).prop_map(|(prev, records)| {
        let mut builder = RecordFileBuilder::new().prev_hash(prev);
        for (tx, rec) in &records {
            builder = builder.record(tx, rec);
        }
        let bytes = builder.build();
        (prev, records, bytes)
    })
}
