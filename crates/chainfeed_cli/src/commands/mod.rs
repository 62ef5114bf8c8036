//! CLI command implementations.

pub mod checkpoint;
pub mod dump;
pub mod hash;
pub mod ingest;
