//! Dump command implementation.

use chainfeed_codec::{Frame, FrameReader, StreamHeader};
use serde::Serialize;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

/// Frame representation for output.
#[derive(Debug, Serialize)]
pub struct FrameInfo {
    /// Position of the frame in the file.
    pub index: u64,
    /// Frame kind.
    pub kind: &'static str,
    /// Previous file hash (PREV_HASH only).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hash: Option<String>,
    /// Transaction bytes, hex-encoded (RECORD only).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transaction: Option<String>,
    /// Result bytes, hex-encoded (RECORD only).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub record: Option<String>,
    /// Signature length (SIGNATURE only).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub signature_len: Option<usize>,
}

impl FrameInfo {
    fn from_frame(index: u64, frame: &Frame) -> Self {
        let mut info = Self {
            index,
            kind: "",
            hash: None,
            transaction: None,
            record: None,
            signature_len: None,
        };
        match frame {
            Frame::PrevHash(hash) => {
                info.kind = "PREV_HASH";
                info.hash = Some(hash.to_hex());
            }
            Frame::Record {
                transaction,
                record,
            } => {
                info.kind = "RECORD";
                info.transaction = Some(hex::encode(transaction));
                info.record = Some(hex::encode(record));
            }
            Frame::Signature(sig) => {
                info.kind = "SIGNATURE";
                info.signature_len = Some(sig.len());
            }
        }
        info
    }
}

/// Whole-file dump.
#[derive(Debug, Serialize)]
pub struct DumpOutput {
    /// File name.
    pub file: String,
    /// Stream header.
    pub header: StreamHeader,
    /// Decoded frames.
    pub frames: Vec<FrameInfo>,
    /// Decode error that ended the dump early, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Runs the dump command.
pub fn run(path: &Path, limit: Option<usize>, format: &str) -> Result<(), Box<dyn std::error::Error>> {
    let output = read_frames(path, limit)?;

    match format {
        "json" => println!("{}", serde_json::to_string_pretty(&output)?),
        _ => print_text_output(&output),
    }
    Ok(())
}

fn read_frames(path: &Path, limit: Option<usize>) -> Result<DumpOutput, Box<dyn std::error::Error>> {
    let name = path.display().to_string();
    let reader = FrameReader::new(name.clone(), BufReader::new(File::open(path)?))?;
    let header = reader.header();
    let max_frames = limit.unwrap_or(usize::MAX);

    let mut frames = Vec::new();
    let mut error = None;
    for (index, frame) in reader.take(max_frames).enumerate() {
        match frame {
            Ok(frame) => frames.push(FrameInfo::from_frame(index as u64, &frame)),
            Err(e) => {
                error = Some(e.to_string());
                break;
            }
        }
    }

    Ok(DumpOutput {
        file: name,
        header,
        frames,
        error,
    })
}

fn print_text_output(output: &DumpOutput) {
    println!("Record file {}", output.file);
    println!(
        "  record format version {}, protocol version {}",
        output.header.record_format_version, output.header.protocol_version
    );
    println!();

    for frame in &output.frames {
        print!("[{:06}] {:10}", frame.index, frame.kind);
        if let Some(hash) = &frame.hash {
            print!(" {hash}");
        }
        if let (Some(tx), Some(rec)) = (&frame.transaction, &frame.record) {
            print!(" tx={} bytes rec={} bytes", tx.len() / 2, rec.len() / 2);
        }
        if let Some(len) = frame.signature_len {
            print!(" len={len}");
        }
        println!();
    }

    if let Some(error) = &output.error {
        println!();
        println!("error: {error}");
    }
}
