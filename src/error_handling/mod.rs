//! Error handling and processing statistics.
//!
//! This module provides:
//! - Error type definitions for every stage of an import
//! - Failure categorization (`ErrorType`) and a thread-safe tally of them
//!
//! Schema and configuration errors are fatal and surface before any record is
//! read. Record errors go through the pipeline's error policy. Bulk write errors
//! are fatal: the failed batch is not re-queued.

mod stats;
mod types;

// Re-export public API
pub use stats::ProcessingStats;
pub use types::{
    BatchWriteError, ConfigError, ConversionError, DatabaseError, ErrorType, ImportError,
    InitializationError, RecordError, SchemaError, SourceError,
};
