//! Record stream encoder.

use crate::error::{CodecError, CodecResult};
use crate::frame::{Frame, StreamHeader, HEADER_SIZE};
use crate::hash::FileHash;
use bytes::BytesMut;
use std::io::Write;

/// Writes a record stream frame by frame.
///
/// The header is written on construction. Each frame is encoded into a
/// scratch buffer first, so a payload that does not fit its length prefix
/// leaves the output untouched.
pub struct FrameWriter<W> {
    writer: W,
    name: String,
    scratch: BytesMut,
    frames_written: u64,
}

impl<W: Write> FrameWriter<W> {
    /// Creates a writer and emits the stream header.
    pub fn new(writer: W, header: StreamHeader) -> CodecResult<Self> {
        Self::named("<stream>", writer, header)
    }

    /// Creates a writer whose I/O errors carry `name`.
    pub fn named(name: impl Into<String>, writer: W, header: StreamHeader) -> CodecResult<Self> {
        let mut this = Self {
            writer,
            name: name.into(),
            scratch: BytesMut::with_capacity(HEADER_SIZE),
            frames_written: 0,
        };
        header.encode_into(&mut this.scratch);
        this.flush_scratch()?;
        Ok(this)
    }

    /// Encodes and writes one frame.
    pub fn write_frame(&mut self, frame: &Frame) -> CodecResult<()> {
        self.scratch.reserve(frame.encoded_len());
        if let Err(e) = frame.encode_into(&mut self.scratch) {
            self.scratch.clear();
            return Err(e);
        }
        self.flush_scratch()?;
        self.frames_written += 1;
        Ok(())
    }

    /// Writes a `PREV_HASH` frame.
    pub fn write_prev_hash(&mut self, hash: &FileHash) -> CodecResult<()> {
        self.write_frame(&Frame::PrevHash(*hash))
    }

    /// Writes a `RECORD` frame.
    pub fn write_record(&mut self, transaction: &[u8], record: &[u8]) -> CodecResult<()> {
        self.write_frame(&Frame::Record {
            transaction: transaction.to_vec(),
            record: record.to_vec(),
        })
    }

    /// Writes a `SIGNATURE` frame.
    pub fn write_signature(&mut self, signature: &[u8]) -> CodecResult<()> {
        self.write_frame(&Frame::Signature(signature.to_vec()))
    }

    /// Returns the number of frames written so far.
    #[must_use]
    pub fn frames_written(&self) -> u64 {
        self.frames_written
    }

    /// Flushes the underlying writer.
    pub fn flush(&mut self) -> CodecResult<()> {
        self.writer
            .flush()
            .map_err(|e| CodecError::io(self.name.clone(), e))
    }

    /// Consumes the writer and returns the underlying sink.
    pub fn into_inner(self) -> W {
        self.writer
    }

    fn flush_scratch(&mut self) -> CodecResult<()> {
        let chunk = self.scratch.split();
        self.writer
            .write_all(&chunk)
            .map_err(|e| CodecError::io(self.name.clone(), e))
    }
}
