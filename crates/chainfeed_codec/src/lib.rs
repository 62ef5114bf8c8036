//! # chainfeed codec
//!
//! Binary framing for record stream files.
//!
//! A record stream is an 8-byte header followed by tagged frames:
//! `PREV_HASH` carries the hash of the previous file in the chain,
//! `RECORD` carries one opaque transaction with its execution result,
//! and `SIGNATURE` carries opaque signature bytes.
//!
//! Decoding is streaming and strict: a frame is either read completely or
//! the stream is reported as truncated. Payloads are never interpreted here.
//!
//! ## Usage
//!
//! ```
//! use chainfeed_codec::{FileHash, Frame, FrameReader, FrameWriter, StreamHeader};
//!
//! let mut writer = FrameWriter::new(Vec::new(), StreamHeader::new(1, 1)).unwrap();
//! writer.write_prev_hash(&FileHash::ZERO).unwrap();
//! writer.write_record(&[0xDE, 0xAD], &[0xCA, 0xFE]).unwrap();
//! let bytes = writer.into_inner();
//!
//! let frames = FrameReader::new("a.rcd", bytes.as_slice()).unwrap();
//! for frame in frames {
//!     match frame.unwrap() {
//!         Frame::PrevHash(hash) => assert!(hash.is_zero()),
//!         Frame::Record { transaction, .. } => assert_eq!(transaction, vec![0xDE, 0xAD]),
//!         Frame::Signature(_) => {}
//!     }
//! }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod decoder;
mod encoder;
mod error;
mod frame;
mod hash;

pub use decoder::{read_prev_hash, FrameReader};
pub use encoder::FrameWriter;
pub use error::{CodecError, CodecResult};
pub use frame::{Frame, FrameTag, StreamHeader, HEADER_SIZE, LENGTH_SIZE, MAX_PAYLOAD_SIZE};
pub use hash::{FileHash, HASH_SIZE};
