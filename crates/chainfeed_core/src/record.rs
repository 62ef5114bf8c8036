//! Decoded record items and completed record stream files.

use crate::error::IngestResult;
use chainfeed_codec::FileHash;
use serde::Serialize;
use std::time::{SystemTime, UNIX_EPOCH};

/// Interprets the opaque transaction and result payloads of a record.
///
/// The ingestion pipeline only needs two facts about each record: a
/// transaction type name used to tag metrics, and the consensus timestamp
/// used to measure ingestion latency.
pub trait TransactionDecoder: Send + Sync {
    /// Returns the transaction type name.
    fn transaction_type(&self, transaction: &[u8], record: &[u8]) -> IngestResult<String>;

    /// Returns the consensus timestamp, if the result carries one.
    fn consensus_timestamp(&self, record: &[u8]) -> IngestResult<Option<SystemTime>>;
}

/// A decoder that treats every payload as opaque.
///
/// Every record has type `UNKNOWN` and no consensus timestamp.
#[derive(Debug, Clone, Copy, Default)]
pub struct OpaqueTransactionDecoder;

impl OpaqueTransactionDecoder {
    /// Type name reported for every record.
    pub const TRANSACTION_TYPE: &'static str = "UNKNOWN";
}

impl TransactionDecoder for OpaqueTransactionDecoder {
    fn transaction_type(&self, _transaction: &[u8], _record: &[u8]) -> IngestResult<String> {
        Ok(Self::TRANSACTION_TYPE.to_string())
    }

    fn consensus_timestamp(&self, _record: &[u8]) -> IngestResult<Option<SystemTime>> {
        Ok(None)
    }
}

/// One ledger transaction and its execution result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordItem {
    transaction: Vec<u8>,
    record: Vec<u8>,
    transaction_type: String,
    consensus_timestamp: Option<SystemTime>,
}

impl RecordItem {
    /// Builds an item, asking `decoder` for the derived fields.
    pub fn new(
        transaction: Vec<u8>,
        record: Vec<u8>,
        decoder: &dyn TransactionDecoder,
    ) -> IngestResult<Self> {
        let transaction_type = decoder.transaction_type(&transaction, &record)?;
        let consensus_timestamp = decoder.consensus_timestamp(&record)?;
        Ok(Self {
            transaction,
            record,
            transaction_type,
            consensus_timestamp,
        })
    }

    /// Raw transaction bytes.
    #[must_use]
    pub fn transaction(&self) -> &[u8] {
        &self.transaction
    }

    /// Raw execution result bytes.
    #[must_use]
    pub fn record(&self) -> &[u8] {
        &self.record
    }

    /// Transaction type name.
    #[must_use]
    pub fn transaction_type(&self) -> &str {
        &self.transaction_type
    }

    /// Consensus timestamp, when known.
    #[must_use]
    pub fn consensus_timestamp(&self) -> Option<SystemTime> {
        self.consensus_timestamp
    }
}

/// Metadata of a fully ingested record stream file.
///
/// Handed to the stream listener once, after the last frame has been
/// decoded and the content hash computed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecordStreamFile {
    /// Stream name as listed by the source.
    pub name: String,
    /// Load start, seconds since the Unix epoch.
    pub load_start: u64,
    /// Load end, seconds since the Unix epoch.
    pub load_end: u64,
    /// Hash of the file's complete contents.
    pub file_hash: FileHash,
    /// Hash of the previous file, as declared by this file.
    pub previous_hash: Option<FileHash>,
    /// Declared record format version.
    pub record_format_version: u32,
    /// Declared protocol version.
    pub protocol_version: u32,
    /// Number of `RECORD` frames in the file.
    pub transaction_count: u64,
}

/// Seconds since the Unix epoch, saturating at zero for clocks set before it.
pub(crate) fn epoch_seconds(at: SystemTime) -> u64 {
    at.duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}
