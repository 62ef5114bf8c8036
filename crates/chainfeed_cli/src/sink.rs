//! JSON-lines output sink.
//!
//! Items of a file are held in memory until the file completes, then
//! appended together with one summary line for the file. A failed file
//! leaves no trace in the output.
//!
//! ```text
//! {"kind":"item","file":"T1.rcd","transaction_type":"UNKNOWN","transaction":"deadbeef","record":"cafe"}
//! {"kind":"file","name":"T1.rcd","load_start":...,"file_hash":"...",...}
//! ```
//!
//! Completed file names are remembered, including those found in the output
//! file when it is opened. Starting one of them again is a duplicate.

use chainfeed_core::{
    file_token, IngestError, IngestResult, RecordItem, RecordItemListener, RecordStreamFile,
    RecordStreamFileListener,
};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs::{File, OpenOptions};
use std::io::{self, BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

#[derive(Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
enum OutputLine<'a> {
    Item {
        file: &'a str,
        transaction_type: &'a str,
        transaction: String,
        record: String,
    },
    File(&'a RecordStreamFile),
}

#[derive(Deserialize)]
struct ExistingLine {
    kind: String,
    #[serde(default)]
    name: Option<String>,
}

#[derive(Default)]
struct SinkState {
    current: Option<String>,
    pending: Vec<String>,
    completed: HashSet<String>,
}

/// Appends ingested files and items to a JSON-lines file.
pub struct JsonLinesSink {
    path: PathBuf,
    output: Mutex<File>,
    state: Mutex<SinkState>,
}

impl JsonLinesSink {
    /// Opens `path` for appending, creating it if needed.
    pub fn open(path: &Path) -> io::Result<Self> {
        let mut state = SinkState::default();
        if path.exists() {
            let reader = BufReader::new(File::open(path)?);
            for line in reader.lines() {
                let line = line?;
                if let Ok(ExistingLine {
                    kind,
                    name: Some(name),
                }) = serde_json::from_str::<ExistingLine>(&line)
                {
                    if kind == "file" {
                        state.completed.insert(file_token(&name).to_string());
                    }
                }
            }
        }

        let output = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self {
            path: path.to_path_buf(),
            output: Mutex::new(output),
            state: Mutex::new(state),
        })
    }

    /// Returns the output path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns the number of completed files known to the sink.
    pub fn completed_count(&self) -> usize {
        self.state.lock().completed.len()
    }

    fn render(line: &OutputLine<'_>) -> IngestResult<String> {
        serde_json::to_string(line).map_err(|e| IngestError::listener(e.to_string()))
    }
}

impl RecordItemListener for JsonLinesSink {
    fn on_item(&self, item: &RecordItem) -> IngestResult<()> {
        let mut state = self.state.lock();
        let file = state
            .current
            .clone()
            .ok_or_else(|| IngestError::listener("item received outside of a file"))?;
        let line = Self::render(&OutputLine::Item {
            file: &file,
            transaction_type: item.transaction_type(),
            transaction: hex::encode(item.transaction()),
            record: hex::encode(item.record()),
        })?;
        state.pending.push(line);
        Ok(())
    }
}

impl RecordStreamFileListener for JsonLinesSink {
    fn on_start(&self, name: &str) -> IngestResult<()> {
        let mut state = self.state.lock();
        if state.completed.contains(file_token(name)) {
            return Err(IngestError::duplicate(name));
        }
        state.current = Some(name.to_string());
        state.pending.clear();
        Ok(())
    }

    fn on_end(&self, file: &RecordStreamFile) -> IngestResult<()> {
        let mut state = self.state.lock();
        let mut chunk = String::new();
        for line in state.pending.drain(..) {
            chunk.push_str(&line);
            chunk.push('\n');
        }
        chunk.push_str(&Self::render(&OutputLine::File(file))?);
        chunk.push('\n');

        let mut output = self.output.lock();
        output
            .write_all(chunk.as_bytes())
            .and_then(|()| output.flush())
            .map_err(|e| IngestError::listener(format!("{}: {e}", self.path.display())))?;

        state.completed.insert(file_token(&file.name).to_string());
        state.current = None;
        Ok(())
    }

    fn on_error(&self) {
        let mut state = self.state.lock();
        state.current = None;
        state.pending.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chainfeed_codec::FileHash;
    use chainfeed_core::OpaqueTransactionDecoder;
    use tempfile::TempDir;

    fn stream_file(name: &str) -> RecordStreamFile {
        RecordStreamFile {
            name: name.into(),
            load_start: 1,
            load_end: 2,
            file_hash: FileHash::from_bytes([7; 48]),
            previous_hash: Some(FileHash::ZERO),
            record_format_version: 2,
            protocol_version: 3,
            transaction_count: 1,
        }
    }

    fn item() -> RecordItem {
        RecordItem::new(vec![0xDE, 0xAD], vec![0xCA, 0xFE], &OpaqueTransactionDecoder).unwrap()
    }

    fn lines(path: &Path) -> Vec<serde_json::Value> {
        std::fs::read_to_string(path)
            .unwrap()
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect()
    }

    #[test]
    fn completed_file_is_written_with_items() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("out.jsonl");
        let sink = JsonLinesSink::open(&path).unwrap();

        sink.on_start("T1").unwrap();
        sink.on_item(&item()).unwrap();
        sink.on_end(&stream_file("T1")).unwrap();

        let lines = lines(&path);
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0]["kind"], "item");
        assert_eq!(lines[0]["file"], "T1");
        assert_eq!(lines[0]["transaction"], "dead");
        assert_eq!(lines[0]["record"], "cafe");
        assert_eq!(lines[1]["kind"], "file");
        assert_eq!(lines[1]["name"], "T1");
        assert_eq!(lines[1]["file_hash"], "07".repeat(48));
    }

    #[test]
    fn failed_file_leaves_no_output() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("out.jsonl");
        let sink = JsonLinesSink::open(&path).unwrap();

        sink.on_start("T1").unwrap();
        sink.on_item(&item()).unwrap();
        sink.on_error();

        assert!(std::fs::read_to_string(&path).unwrap().is_empty());
        assert!(sink.on_start("T1").is_ok());
    }

    #[test]
    fn completed_names_are_duplicates() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("out.jsonl");
        let sink = JsonLinesSink::open(&path).unwrap();
        sink.on_start("T1").unwrap();
        sink.on_end(&stream_file("T1")).unwrap();

        assert!(sink.on_start("T1").unwrap_err().is_duplicate());
        assert!(sink.on_start("/elsewhere/T1").unwrap_err().is_duplicate());
    }

    #[test]
    fn reopened_sink_remembers_completed_files() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("out.jsonl");
        {
            let sink = JsonLinesSink::open(&path).unwrap();
            sink.on_start("T1").unwrap();
            sink.on_end(&stream_file("T1")).unwrap();
        }

        let sink = JsonLinesSink::open(&path).unwrap();
        assert_eq!(sink.completed_count(), 1);
        assert!(sink.on_start("T1").unwrap_err().is_duplicate());
        assert!(sink.on_start("T2").is_ok());
    }

    #[test]
    fn item_outside_file_is_rejected() {
        let dir = TempDir::new().unwrap();
        let sink = JsonLinesSink::open(&dir.path().join("out.jsonl")).unwrap();
        assert!(matches!(
            sink.on_item(&item()),
            Err(IngestError::Listener { .. })
        ));
    }
}
