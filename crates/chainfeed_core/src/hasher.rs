//! Streaming file content hashing.

use crate::error::{IngestError, IngestResult};
use chainfeed_codec::{FileHash, HASH_SIZE};
use sha2::{Digest as _, Sha384};
use std::io::{ErrorKind, Read};
use tracing::trace;

/// Hash algorithm of record file hashes.
pub const HASH_ALGORITHM: &str = "SHA-384";

/// Buffer size for streaming reads (64 KB).
const BUFFER_SIZE: usize = 64 * 1024;

/// Computes the SHA-384 hash of everything `reader` yields.
///
/// Memory use is constant regardless of file size. `name` only labels the
/// error.
///
/// # Errors
///
/// Returns [`IngestError::HashComputation`] if reading fails.
pub fn hash_stream<R: Read>(name: &str, mut reader: R) -> IngestResult<FileHash> {
    let mut hasher = Sha384::new();
    let mut buffer = vec![0u8; BUFFER_SIZE];

    loop {
        let n = match reader.read(&mut buffer) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(source) => {
                return Err(IngestError::HashComputation {
                    file: name.to_string(),
                    source,
                })
            }
        };
        hasher.update(&buffer[..n]);
    }

    let mut digest = [0u8; HASH_SIZE];
    digest.copy_from_slice(&hasher.finalize());
    let hash = FileHash::from_bytes(digest);
    trace!(file = name, algorithm = HASH_ALGORITHM, hash = %hash, "Computed file hash");
    Ok(hash)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::io;

    #[test]
    fn algorithm_label_matches_digest() {
        assert_eq!(HASH_ALGORITHM, "SHA-384");
        assert_eq!(<Sha384 as sha2::Digest>::output_size(), HASH_SIZE);
    }

    #[test]
    fn empty_input_has_known_hash() {
        let hash = hash_stream("empty", io::empty()).unwrap();
        assert_eq!(
            hash.to_hex(),
            "38b060a751ac96384cd9327eb1b1e36a21fdb71114be0743\
             4c0cc7bf63f6e1da274edebfe76f65fbd51ad2f14898b95b"
        );
    }

    #[test]
    fn known_value() {
        let hash = hash_stream("abc", &b"abc"[..]).unwrap();
        assert_eq!(
            hash.to_hex(),
            "cb00753f45a35e8bb5a03d699ac65007272c32ab0eded163\
             1a8b605a43ff5bed8086072ba1e7cc2358baeca134c825a7"
        );
    }

    #[test]
    fn read_failure_is_hash_computation() {
        struct Failing;
        impl Read for Failing {
            fn read(&mut self, _: &mut [u8]) -> io::Result<usize> {
                Err(io::Error::new(io::ErrorKind::PermissionDenied, "denied"))
            }
        }

        match hash_stream("locked.rcd", Failing) {
            Err(IngestError::HashComputation { file, source }) => {
                assert_eq!(file, "locked.rcd");
                assert_eq!(source.kind(), io::ErrorKind::PermissionDenied);
            }
            other => panic!("expected HashComputation, got {other:?}"),
        }
    }

    proptest! {
        #[test]
        fn chunking_does_not_change_hash(data in prop::collection::vec(any::<u8>(), 0..4096), split in 0usize..4096) {
            let split = split.min(data.len());
            let whole = hash_stream("a", data.as_slice()).unwrap();
            let chained = hash_stream("a", (&data[..split]).chain(&data[split..])).unwrap();
            prop_assert_eq!(whole, chained);
        }
    }
}
