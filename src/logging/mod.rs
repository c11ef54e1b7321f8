//! Logging setup and NDJSON emission.

mod format;

pub use format::StructuredLogger;
