//! Cooperative shutdown flag.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// A cloneable flag polled between files.
///
/// Tripping it never interrupts a file in progress. The batch stops before
/// starting the next one.
#[derive(Debug, Clone, Default)]
pub struct ShutdownSignal {
    stopping: Arc<AtomicBool>,
}

impl ShutdownSignal {
    /// Creates an untripped signal.
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests shutdown.
    pub fn trigger(&self) {
        self.stopping.store(true, Ordering::SeqCst);
    }

    /// Returns true once shutdown was requested.
    pub fn is_stopping(&self) -> bool {
        self.stopping.load(Ordering::SeqCst)
    }
}
