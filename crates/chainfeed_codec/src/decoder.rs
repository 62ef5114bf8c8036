//! Streaming record stream decoder.
//!
//! Reads frames one at a time from any [`Read`], so a record file is never
//! held in memory as a whole. The sequence is forward-only and cannot be
//! restarted.
//!
//! ## Termination
//!
//! - **Exhausted**: zero bytes left exactly at a frame boundary, iteration ends
//! - **Truncated**: the stream ends inside the header, a length prefix or a
//!   payload, `Err(TruncatedStream)`
//! - **Unknown tag**: `Err(UnknownFrameTag)`, nothing more is read
//!
//! After an error the iterator is fused and yields `None`.

use crate::error::{CodecError, CodecResult};
use crate::frame::{Frame, FrameTag, StreamHeader, HEADER_SIZE, LENGTH_SIZE};
use crate::hash::{FileHash, HASH_SIZE};
use std::io::{ErrorKind, Read};

/// Upper bound on up-front allocation for a payload.
///
/// Declared lengths are untrusted until the bytes have actually arrived;
/// larger payloads grow the buffer as they are read.
const PREALLOC_LIMIT: usize = 64 * 1024;

/// A lazy iterator over the frames of one record stream.
///
/// # Example
///
/// ```
/// use chainfeed_codec::{Frame, FrameReader, FrameWriter, StreamHeader};
///
/// let mut writer = FrameWriter::new(Vec::new(), StreamHeader::new(2, 3)).unwrap();
/// writer.write_record(b"tx", b"result").unwrap();
/// let bytes = writer.into_inner();
///
/// let reader = FrameReader::new("example.rcd", bytes.as_slice()).unwrap();
/// assert_eq!(reader.header().record_format_version, 2);
/// let frames: Vec<Frame> = reader.collect::<Result<_, _>>().unwrap();
/// assert_eq!(frames.len(), 1);
/// ```
pub struct FrameReader<R> {
    reader: R,
    name: String,
    header: StreamHeader,
    bytes_read: u64,
    frames_read: u64,
    finished: bool,
}

impl<R: Read> FrameReader<R> {
    /// Creates a reader and consumes the stream header.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::TruncatedStream`] if fewer than 8 bytes are
    /// available, or an I/O error from the underlying reader.
    pub fn new(name: impl Into<String>, reader: R) -> CodecResult<Self> {
        let mut this = Self {
            reader,
            name: name.into(),
            header: StreamHeader::new(0, 0),
            bytes_read: 0,
            frames_read: 0,
            finished: false,
        };
        let mut header = [0u8; HEADER_SIZE];
        this.read_exact(&mut header)?;
        this.header = StreamHeader::from_bytes(header);
        Ok(this)
    }

    /// Returns the decoded stream header.
    #[must_use]
    pub fn header(&self) -> StreamHeader {
        self.header
    }

    /// Returns the stream name used in errors.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the number of bytes consumed so far, header included.
    #[must_use]
    pub fn bytes_read(&self) -> u64 {
        self.bytes_read
    }

    /// Returns the number of complete frames decoded so far.
    #[must_use]
    pub fn frames_read(&self) -> u64 {
        self.frames_read
    }

    /// Fills `buf` completely or fails with `TruncatedStream`.
    fn read_exact(&mut self, buf: &mut [u8]) -> CodecResult<()> {
        let mut filled = 0;
        while filled < buf.len() {
            match self.reader.read(&mut buf[filled..]) {
                Ok(0) => {
                    return Err(CodecError::truncated(
                        self.name.clone(),
                        buf.len() as u64,
                        filled as u64,
                    ))
                }
                Ok(n) => filled += n,
                Err(e) if e.kind() == ErrorKind::Interrupted => {}
                Err(e) => return Err(CodecError::io(self.name.clone(), e)),
            }
        }
        self.bytes_read += buf.len() as u64;
        Ok(())
    }

    fn read_length(&mut self) -> CodecResult<usize> {
        let mut len = [0u8; LENGTH_SIZE];
        self.read_exact(&mut len)?;
        Ok(u32::from_be_bytes(len) as usize)
    }

    /// Reads exactly `len` payload bytes without trusting `len` for allocation.
    fn read_payload(&mut self, len: usize) -> CodecResult<Vec<u8>> {
        let mut payload = Vec::with_capacity(len.min(PREALLOC_LIMIT));
        let read = (&mut self.reader)
            .take(len as u64)
            .read_to_end(&mut payload)
            .map_err(|e| CodecError::io(self.name.clone(), e))?;
        self.bytes_read += read as u64;
        if read < len {
            return Err(CodecError::truncated(
                self.name.clone(),
                len as u64,
                read as u64,
            ));
        }
        Ok(payload)
    }

    /// Reads the tag byte of the next frame, `None` when the stream is exhausted.
    fn read_tag(&mut self) -> CodecResult<Option<u8>> {
        let mut tag = [0u8; 1];
        loop {
            match self.reader.read(&mut tag) {
                Ok(0) => return Ok(None),
                Ok(_) => {
                    self.bytes_read += 1;
                    return Ok(Some(tag[0]));
                }
                Err(e) if e.kind() == ErrorKind::Interrupted => {}
                Err(e) => return Err(CodecError::io(self.name.clone(), e)),
            }
        }
    }

    /// Decodes the next frame.
    ///
    /// Returns `Ok(Some(frame))` for a complete frame, `Ok(None)` when the
    /// stream is exhausted at a frame boundary, and `Err(...)` otherwise.
    pub fn read_frame(&mut self) -> CodecResult<Option<Frame>> {
        if self.finished {
            return Ok(None);
        }

        let Some(tag_byte) = self.read_tag()? else {
            self.finished = true;
            return Ok(None);
        };

        let tag = FrameTag::from_byte(tag_byte).ok_or_else(|| CodecError::UnknownFrameTag {
            tag: tag_byte,
            file: self.name.clone(),
        })?;

        let frame = match tag {
            FrameTag::PrevHash => {
                let mut hash = [0u8; HASH_SIZE];
                self.read_exact(&mut hash)?;
                Frame::PrevHash(FileHash::from_bytes(hash))
            }
            FrameTag::Record => {
                let tx_len = self.read_length()?;
                let transaction = self.read_payload(tx_len)?;
                let rec_len = self.read_length()?;
                let record = self.read_payload(rec_len)?;
                Frame::Record {
                    transaction,
                    record,
                }
            }
            FrameTag::Signature => {
                let sig_len = self.read_length()?;
                Frame::Signature(self.read_payload(sig_len)?)
            }
        };

        self.frames_read += 1;
        Ok(Some(frame))
    }
}

impl<R: Read> Iterator for FrameReader<R> {
    type Item = CodecResult<Frame>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }

        match self.read_frame() {
            Ok(Some(frame)) => Some(Ok(frame)),
            Ok(None) => None,
            Err(e) => {
                self.finished = true;
                Some(Err(e))
            }
        }
    }
}

/// Reads only the header and first frame of a stream and returns the
/// declared previous-file hash.
///
/// Returns `Ok(None)` if the stream has no frames or its first frame is
/// not a `PREV_HASH` frame.
///
/// # Errors
///
/// Returns an error if the header or first frame is malformed.
pub fn read_prev_hash<R: Read>(name: &str, reader: R) -> CodecResult<Option<FileHash>> {
    let mut frames = FrameReader::new(name, reader)?;
    match frames.read_frame()? {
        Some(Frame::PrevHash(hash)) => Ok(Some(hash)),
        _ => Ok(None),
    }
}
