//! Listener seams of the ingestion pipeline.
//!
//! For each file the pipeline calls, in order:
//!
//! 1. [`RecordStreamFileListener::on_start`] before any bytes are parsed
//! 2. [`RecordItemListener::on_item`] once per `RECORD` frame
//! 3. exactly one of [`RecordStreamFileListener::on_end`] or
//!    [`RecordStreamFileListener::on_error`]
//!
//! If `on_end` itself fails, `on_error` follows it.
//!
//! Listeners run synchronously on the ingestion thread. An error returned
//! from any of them aborts the current file.

use crate::error::IngestResult;
use crate::record::{RecordItem, RecordStreamFile};
use std::sync::mpsc::{self, Receiver, Sender};

/// Receives decoded record items.
pub trait RecordItemListener: Send + Sync {
    /// Handles one item. An error aborts the file.
    fn on_item(&self, item: &RecordItem) -> IngestResult<()>;
}

/// Receives file-level lifecycle events.
pub trait RecordStreamFileListener: Send + Sync {
    /// Called before the file is parsed.
    ///
    /// Return [`IngestError::DuplicateFile`](crate::IngestError::DuplicateFile)
    /// to have the batch skip a file that was already ingested.
    fn on_start(&self, name: &str) -> IngestResult<()>;

    /// Called once the file is fully decoded and hashed.
    ///
    /// The chain checkpoint is only advanced after this returns `Ok`.
    fn on_end(&self, file: &RecordStreamFile) -> IngestResult<()>;

    /// Called when processing of the current file failed.
    fn on_error(&self);
}

/// Ignores every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopListener;

impl RecordItemListener for NoopListener {
    fn on_item(&self, _item: &RecordItem) -> IngestResult<()> {
        Ok(())
    }
}

impl RecordStreamFileListener for NoopListener {
    fn on_start(&self, _name: &str) -> IngestResult<()> {
        Ok(())
    }

    fn on_end(&self, _file: &RecordStreamFile) -> IngestResult<()> {
        Ok(())
    }

    fn on_error(&self) {}
}

/// An ingestion event forwarded by [`ChannelListener`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IngestEvent {
    /// A file is about to be parsed.
    Started(String),
    /// A record was decoded.
    Item(RecordItem),
    /// A file completed.
    Finished(RecordStreamFile),
    /// A file failed.
    Failed,
}

/// Forwards every event into an mpsc channel.
///
/// Events are dropped silently once the receiver is gone, so a consumer
/// that stops listening never fails ingestion.
#[derive(Debug, Clone)]
pub struct ChannelListener {
    sender: Sender<IngestEvent>,
}

impl ChannelListener {
    /// Creates a listener and the receiving end of its channel.
    pub fn new() -> (Self, Receiver<IngestEvent>) {
        let (sender, receiver) = mpsc::channel();
        (Self { sender }, receiver)
    }

    fn send(&self, event: IngestEvent) {
        let _ = self.sender.send(event);
    }
}

impl RecordItemListener for ChannelListener {
    fn on_item(&self, item: &RecordItem) -> IngestResult<()> {
        self.send(IngestEvent::Item(item.clone()));
        Ok(())
    }
}

impl RecordStreamFileListener for ChannelListener {
    fn on_start(&self, name: &str) -> IngestResult<()> {
        self.send(IngestEvent::Started(name.to_string()));
        Ok(())
    }

    fn on_end(&self, file: &RecordStreamFile) -> IngestResult<()> {
        self.send(IngestEvent::Finished(file.clone()));
        Ok(())
    }

    fn on_error(&self) {
        self.send(IngestEvent::Failed);
    }
}
