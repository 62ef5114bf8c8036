//! Record file builders, listeners and decoders for tests.

use chainfeed_codec::{FileHash, Frame, FrameWriter, StreamHeader};
use chainfeed_core::{
    hash_stream, IngestError, IngestResult, RecordItem, RecordItemListener, RecordStreamFile,
    RecordStreamFileListener, TransactionDecoder,
};
use chainfeed_storage::{DirectoryLifecycle, DirectorySource, FileCheckpointStore};
use parking_lot::Mutex;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use tempfile::TempDir;

/// Builds record stream files frame by frame.
#[derive(Debug, Clone)]
pub struct RecordFileBuilder {
    header: StreamHeader,
    frames: Vec<Frame>,
    trailing: Vec<u8>,
}

impl Default for RecordFileBuilder {
    fn default() -> Self {
        Self {
            header: StreamHeader::new(2, 3),
            frames: Vec::new(),
            trailing: Vec::new(),
        }
    }
}

impl RecordFileBuilder {
    /// Creates an empty builder with header version 2, protocol 3.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the header.
    pub fn header(mut self, record_format_version: u32, protocol_version: u32) -> Self {
        self.header = StreamHeader::new(record_format_version, protocol_version);
        self
    }

    /// Appends a `PREV_HASH` frame.
    pub fn prev_hash(mut self, hash: FileHash) -> Self {
        self.frames.push(Frame::PrevHash(hash));
        self
    }

    /// Appends a `RECORD` frame.
    pub fn record(mut self, transaction: &[u8], record: &[u8]) -> Self {
        self.frames.push(Frame::Record {
            transaction: transaction.to_vec(),
            record: record.to_vec(),
        });
        self
    }

    /// Appends a `SIGNATURE` frame.
    pub fn signature(mut self, signature: &[u8]) -> Self {
        self.frames.push(Frame::Signature(signature.to_vec()));
        self
    }

    /// Appends raw bytes after the last frame, for corrupt files.
    pub fn trailing(mut self, bytes: &[u8]) -> Self {
        self.trailing.extend_from_slice(bytes);
        self
    }

    /// Encodes the file.
    pub fn build(&self) -> Vec<u8> {
        let mut writer =
            FrameWriter::new(Vec::new(), self.header).expect("Failed to write header");
        for frame in &self.frames {
            writer.write_frame(frame).expect("Failed to write frame");
        }
        let mut bytes = writer.into_inner();
        bytes.extend_from_slice(&self.trailing);
        bytes
    }
}

/// Returns the content hash of `bytes`.
pub fn content_hash(bytes: &[u8]) -> FileHash {
    hash_stream("fixture", bytes).expect("Hashing a slice cannot fail")
}

/// The header and frames of the end-to-end example file.
///
/// `00000001 00000001`, a zero `PREV_HASH`, then one record with
/// transaction `DEADBEEF` and result `CAFE`.
pub fn e2e_file() -> Vec<u8> {
    RecordFileBuilder::new()
        .header(1, 1)
        .prev_hash(FileHash::ZERO)
        .record(&[0xDE, 0xAD, 0xBE, 0xEF], &[0xCA, 0xFE])
        .build()
}

/// An event observed by [`RecordingListener`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Recorded {
    /// `on_start`
    Start(String),
    /// `on_item`, with transaction and result bytes.
    Item(Vec<u8>, Vec<u8>),
    /// `on_end`
    End(RecordStreamFile),
    /// `on_error`
    Error,
}

/// Records every listener call and can be told to fail.
#[derive(Debug, Default)]
pub struct RecordingListener {
    events: Mutex<Vec<Recorded>>,
    duplicates: Mutex<HashSet<String>>,
    fail_on_end: Mutex<HashSet<String>>,
    fail_on_item: Mutex<bool>,
}

impl RecordingListener {
    /// Creates a listener that accepts everything.
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes `on_start` report `name` as a duplicate.
    pub fn reject_as_duplicate(&self, name: &str) {
        self.duplicates.lock().insert(name.to_string());
    }

    /// Makes `on_end` fail for `name`.
    pub fn fail_on_end(&self, name: &str) {
        self.fail_on_end.lock().insert(name.to_string());
    }

    /// Makes every `on_item` fail.
    pub fn fail_on_item(&self) {
        *self.fail_on_item.lock() = true;
    }

    /// Returns the events seen so far.
    pub fn events(&self) -> Vec<Recorded> {
        self.events.lock().clone()
    }

    /// Returns the files that reached `on_end` successfully.
    pub fn completed(&self) -> Vec<RecordStreamFile> {
        self.events
            .lock()
            .iter()
            .filter_map(|e| match e {
                Recorded::End(file) => Some(file.clone()),
                _ => None,
            })
            .collect()
    }

    /// Returns the transaction/result pairs seen by `on_item`.
    pub fn items(&self) -> Vec<(Vec<u8>, Vec<u8>)> {
        self.events
            .lock()
            .iter()
            .filter_map(|e| match e {
                Recorded::Item(tx, rec) => Some((tx.clone(), rec.clone())),
                _ => None,
            })
            .collect()
    }

    /// Returns how many times `on_error` was called.
    pub fn error_count(&self) -> usize {
        self.events
            .lock()
            .iter()
            .filter(|e| matches!(e, Recorded::Error))
            .count()
    }
}

impl RecordItemListener for RecordingListener {
    fn on_item(&self, item: &RecordItem) -> IngestResult<()> {
        if *self.fail_on_item.lock() {
            return Err(IngestError::listener("injected on_item failure"));
        }
        self.events.lock().push(Recorded::Item(
            item.transaction().to_vec(),
            item.record().to_vec(),
        ));
        Ok(())
    }
}

impl RecordStreamFileListener for RecordingListener {
    fn on_start(&self, name: &str) -> IngestResult<()> {
        self.events.lock().push(Recorded::Start(name.to_string()));
        if self.duplicates.lock().contains(name) {
            return Err(IngestError::duplicate(name));
        }
        Ok(())
    }

    fn on_end(&self, file: &RecordStreamFile) -> IngestResult<()> {
        if self.fail_on_end.lock().contains(&file.name) {
            return Err(IngestError::listener("injected on_end failure"));
        }
        self.events.lock().push(Recorded::End(file.clone()));
        Ok(())
    }

    fn on_error(&self) {
        self.events.lock().push(Recorded::Error);
    }
}

/// A decoder that reports one fixed type and timestamp for every record.
#[derive(Debug, Clone)]
pub struct FixedDecoder {
    /// Type reported for every record.
    pub transaction_type: String,
    /// Consensus timestamp reported for every record.
    pub consensus_timestamp: Option<SystemTime>,
}

impl FixedDecoder {
    /// Creates a decoder reporting `transaction_type` and `consensus_timestamp`.
    pub fn new(transaction_type: &str, consensus_timestamp: Option<SystemTime>) -> Self {
        Self {
            transaction_type: transaction_type.to_string(),
            consensus_timestamp,
        }
    }
}

impl TransactionDecoder for FixedDecoder {
    fn transaction_type(&self, _transaction: &[u8], _record: &[u8]) -> IngestResult<String> {
        Ok(self.transaction_type.clone())
    }

    fn consensus_timestamp(&self, _record: &[u8]) -> IngestResult<Option<SystemTime>> {
        Ok(self.consensus_timestamp)
    }
}

/// A temporary staging area with checkpoint and archive directories.
pub struct StagingDir {
    _temp_dir: TempDir,
    root: PathBuf,
}

impl StagingDir {
    /// Creates an empty staging area.
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let root = temp_dir.path().to_path_buf();
        std::fs::create_dir_all(root.join("staging")).expect("Failed to create staging dir");
        Self {
            _temp_dir: temp_dir,
            root,
        }
    }

    /// Directory holding files awaiting ingestion.
    pub fn staging(&self) -> PathBuf {
        self.root.join("staging")
    }

    /// Directory of the checkpoint store.
    pub fn checkpoint_dir(&self) -> PathBuf {
        self.root.join("checkpoint")
    }

    /// Directory receiving moved files.
    pub fn archive(&self) -> PathBuf {
        self.root.join("archive")
    }

    /// Writes a staged file.
    pub fn stage(&self, name: &str, bytes: &[u8]) {
        std::fs::write(self.staging().join(name), bytes).expect("Failed to stage file");
    }

    /// Returns true if `name` is still staged.
    pub fn is_staged(&self, name: &str) -> bool {
        self.staging().join(name).exists()
    }

    /// Returns true if `name` was archived.
    pub fn is_archived(&self, name: &str) -> bool {
        self.archive().join(name).exists()
    }

    /// Opens a directory source over the staging directory.
    pub fn source(&self) -> DirectorySource {
        DirectorySource::new(self.staging())
    }

    /// A lifecycle moving processed files into the archive.
    pub fn archiving_lifecycle(&self) -> DirectoryLifecycle {
        DirectoryLifecycle::move_to(self.staging(), self.archive())
    }

    /// Opens the checkpoint store.
    pub fn checkpoint_store(&self) -> FileCheckpointStore {
        FileCheckpointStore::open(&self.checkpoint_dir()).expect("Failed to open checkpoint")
    }

    /// Root of the temporary tree.
    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl Default for StagingDir {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chainfeed_codec::FrameReader;

    #[test]
    fn e2e_file_bytes() {
        let bytes = e2e_file();
        let mut expected = vec![0, 0, 0, 1, 0, 0, 0, 1, 1];
        expected.extend_from_slice(&[0u8; 48]);
        expected.extend_from_slice(&[2, 0, 0, 0, 4, 0xDE, 0xAD, 0xBE, 0xEF, 0, 0, 0, 2, 0xCA, 0xFE]);
        assert_eq!(bytes, expected);
    }

    #[test]
    fn builder_output_decodes() {
        let bytes = RecordFileBuilder::new()
            .prev_hash(FileHash::ZERO)
            .record(b"a", b"b")
            .signature(b"sig")
            .build();
        let frames: Vec<_> = FrameReader::new("f", bytes.as_slice())
            .unwrap()
            .collect::<Result<_, _>>()
            .unwrap();
        assert_eq!(frames.len(), 3);
    }

    #[test]
    fn recording_listener_injects_failures() {
        let listener = RecordingListener::new();
        listener.reject_as_duplicate("T2");
        assert!(listener.on_start("T1").is_ok());
        assert!(listener.on_start("T2").unwrap_err().is_duplicate());
        assert_eq!(
            listener.events(),
            vec![Recorded::Start("T1".into()), Recorded::Start("T2".into())]
        );
    }

    #[test]
    fn staging_dir_layout() {
        let dir = StagingDir::new();
        dir.stage("T1", b"x");
        assert!(dir.is_staged("T1"));
        assert!(!dir.is_archived("T1"));
        assert!(dir.root().exists());
    }
}
