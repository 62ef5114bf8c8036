//! # chainfeed testkit
//!
//! Test utilities for chainfeed.
//!
//! This crate provides:
//! - Record file builders and chained file fixtures
//! - Recording listeners with failure injection
//! - Property-based test generators using proptest
//! - An in-memory ingestion harness
//! - Fuzz targets for the decoder and the pipeline
//!
//! ## Usage
//!
//! ```rust
//! use chainfeed_testkit::prelude::*;
//!
//! let harness = IngestHarness::new();
//! for (name, bytes) in chained_files(&["T1", "T2"], 2) {
//!     harness.stage(&name, bytes);
//! }
//! let outcome = harness.run();
//! assert_eq!(outcome.processed.len(), 2);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod fixtures;
pub mod fuzz;
pub mod generators;
pub mod integration;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::fixtures::*;
    pub use crate::fuzz::*;
    pub use crate::generators::*;
    pub use crate::integration::*;
}

pub use fixtures::*;
pub use fuzz::*;
pub use generators::*;
pub use integration::*;
