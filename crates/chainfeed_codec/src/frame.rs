//! Record stream header and frame types.
//!
//! ```text
//! | record_format_version (4, BE) | protocol_version (4, BE) | frame* |
//!
//! PREV_HASH : | 0x01 | hash (48) |
//! RECORD    : | 0x02 | tx_len (4, BE) | tx (tx_len) | rec_len (4, BE) | rec (rec_len) |
//! SIGNATURE : | 0x03 | sig_len (4, BE) | sig (sig_len) |
//! ```

use crate::error::{CodecError, CodecResult};
use crate::hash::{FileHash, HASH_SIZE};
use bytes::BufMut;

/// Size of the stream header in bytes.
pub const HEADER_SIZE: usize = 8;

/// Size of a length prefix in bytes.
pub const LENGTH_SIZE: usize = 4;

/// Largest payload a 4-byte length prefix can describe.
pub const MAX_PAYLOAD_SIZE: usize = u32::MAX as usize;

/// Tag byte that starts every frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum FrameTag {
    /// Hash of the preceding file in the chain.
    PrevHash = 1,
    /// A transaction and its execution result.
    Record = 2,
    /// A signature over the file.
    Signature = 3,
}

impl FrameTag {
    /// Converts a byte to a frame tag.
    pub fn from_byte(b: u8) -> Option<Self> {
        match b {
            1 => Some(Self::PrevHash),
            2 => Some(Self::Record),
            3 => Some(Self::Signature),
            _ => None,
        }
    }

    /// Converts the tag to a byte.
    #[must_use]
    pub const fn as_byte(self) -> u8 {
        self as u8
    }
}

/// The two version integers at the start of every record stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub struct StreamHeader {
    /// Version of the record file layout.
    pub record_format_version: u32,
    /// Version of the ledger protocol that produced the file.
    pub protocol_version: u32,
}

impl StreamHeader {
    /// Creates a header.
    #[must_use]
    pub const fn new(record_format_version: u32, protocol_version: u32) -> Self {
        Self {
            record_format_version,
            protocol_version,
        }
    }

    /// Decodes a header from its 8 raw bytes.
    #[must_use]
    pub fn from_bytes(bytes: [u8; HEADER_SIZE]) -> Self {
        let [a, b, c, d, e, f, g, h] = bytes;
        Self {
            record_format_version: u32::from_be_bytes([a, b, c, d]),
            protocol_version: u32::from_be_bytes([e, f, g, h]),
        }
    }

    /// Appends the encoded header to `buf`.
    pub fn encode_into(&self, buf: &mut impl BufMut) {
        buf.put_u32(self.record_format_version);
        buf.put_u32(self.protocol_version);
    }
}

/// One decoded frame of a record stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    /// Declared hash of the previous file.
    PrevHash(FileHash),

    /// A transaction and its result, both opaque.
    Record {
        /// Raw transaction bytes.
        transaction: Vec<u8>,
        /// Raw execution result bytes.
        record: Vec<u8>,
    },

    /// Signature bytes, carried but not interpreted.
    Signature(Vec<u8>),
}

impl Frame {
    /// Returns the frame's tag.
    #[must_use]
    pub fn tag(&self) -> FrameTag {
        match self {
            Self::PrevHash(_) => FrameTag::PrevHash,
            Self::Record { .. } => FrameTag::Record,
            Self::Signature(_) => FrameTag::Signature,
        }
    }

    /// Returns the number of bytes this frame occupies once encoded.
    #[must_use]
    pub fn encoded_len(&self) -> usize {
        1 + match self {
            Self::PrevHash(_) => HASH_SIZE,
            Self::Record {
                transaction,
                record,
            } => 2 * LENGTH_SIZE + transaction.len() + record.len(),
            Self::Signature(sig) => LENGTH_SIZE + sig.len(),
        }
    }

    /// Appends the encoded frame to `buf`.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::PayloadTooLarge`] if a payload does not fit its
    /// 4-byte length prefix. Nothing is written in that case.
    pub fn encode_into(&self, buf: &mut impl BufMut) -> CodecResult<()> {
        match self {
            Self::PrevHash(hash) => {
                buf.put_u8(FrameTag::PrevHash.as_byte());
                buf.put_slice(hash.as_bytes());
            }
            Self::Record {
                transaction,
                record,
            } => {
                let tx_len = payload_len(transaction)?;
                let rec_len = payload_len(record)?;
                buf.put_u8(FrameTag::Record.as_byte());
                buf.put_u32(tx_len);
                buf.put_slice(transaction);
                buf.put_u32(rec_len);
                buf.put_slice(record);
            }
            Self::Signature(sig) => {
                let sig_len = payload_len(sig)?;
                buf.put_u8(FrameTag::Signature.as_byte());
                buf.put_u32(sig_len);
                buf.put_slice(sig);
            }
        }
        Ok(())
    }
}

fn payload_len(payload: &[u8]) -> CodecResult<u32> {
    u32::try_from(payload.len()).map_err(|_| CodecError::PayloadTooLarge {
        len: payload.len(),
        max: MAX_PAYLOAD_SIZE,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tag_roundtrip() {
        for tag in [FrameTag::PrevHash, FrameTag::Record, FrameTag::Signature] {
            assert_eq!(FrameTag::from_byte(tag.as_byte()), Some(tag));
        }
        assert_eq!(FrameTag::from_byte(0), None);
        assert_eq!(FrameTag::from_byte(4), None);
    }

    #[test]
    fn header_encoding_is_big_endian() {
        let mut buf = Vec::new();
        StreamHeader::new(1, 2).encode_into(&mut buf);
        assert_eq!(buf, vec![0, 0, 0, 1, 0, 0, 0, 2]);
        assert_eq!(StreamHeader::from_bytes([0, 0, 0, 1, 0, 0, 0, 2]), StreamHeader::new(1, 2));
    }

    #[test]
    fn record_frame_layout() {
        let frame = Frame::Record {
            transaction: vec![0xDE, 0xAD, 0xBE, 0xEF],
            record: vec![0xCA, 0xFE],
        };
        let mut buf = Vec::new();
        frame.encode_into(&mut buf).unwrap();
        assert_eq!(
            buf,
            vec![2, 0, 0, 0, 4, 0xDE, 0xAD, 0xBE, 0xEF, 0, 0, 0, 2, 0xCA, 0xFE]
        );
        assert_eq!(buf.len(), frame.encoded_len());
    }

    #[test]
    fn prev_hash_frame_layout() {
        let frame = Frame::PrevHash(FileHash::from_bytes([7; HASH_SIZE]));
        let mut buf = Vec::new();
        frame.encode_into(&mut buf).unwrap();
        assert_eq!(buf.len(), 1 + HASH_SIZE);
        assert_eq!(buf[0], 1);
        assert!(buf[1..].iter().all(|&b| b == 7));
    }

    #[test]
    fn signature_frame_layout() {
        let frame = Frame::Signature(vec![9, 9, 9]);
        let mut buf = Vec::new();
        frame.encode_into(&mut buf).unwrap();
        assert_eq!(buf, vec![3, 0, 0, 0, 3, 9, 9, 9]);
        assert_eq!(frame.tag(), FrameTag::Signature);
    }
}
