//! Configuration constants.
//!
//! This module defines the operational defaults used throughout the application.

/// Number of documents submitted to the store in one bulk write.
///
/// 5000 documents per bulk write measured roughly 1.5x faster than inserting
/// one document at a time on a reference dataset (80s vs 120s).
pub const DEFAULT_BATCH_SIZE: usize = 5000;

/// Default SQLite database file used as the document store.
pub const DB_PATH: &str = "./typed_import.db";

/// Default collection name when none is given.
pub const DEFAULT_COLLECTION: &str = "documents";

/// Default source text encoding.
pub const DEFAULT_ENCODING: &str = "UTF-8";

/// Log a progress line every this many records read.
pub const PROGRESS_LOG_INTERVAL: usize = 50_000;

/// Capacity of each worker's document channel when running with a worker pool.
///
/// Bounded so a slow store applies backpressure to the reader instead of
/// buffering the whole file in memory.
pub const WORKER_CHANNEL_CAPACITY: usize = 1024;

/// Upper bound on `--workers`.
///
/// SQLite serializes writers, so more workers than this only add lock contention.
pub const MAX_WORKERS: usize = 32;

/// Size of the raw byte buffer used when decoding non-UTF-8 sources.
pub const DECODE_BUFFER_SIZE: usize = 8 * 1024;
