//! Pipeline driver.
//!
//! Reads raw records, converts them against a bound schema and hands the
//! documents to batch loaders. Two drivers share the same per-record logic:
//! - `run_pipeline`: one loader, strictly sequential
//! - `run_pipeline_concurrent`: N worker tasks, each owning its own loader

mod driver;
mod workers;

use std::time::{Duration, Instant};

use log::warn;
use thiserror::Error;

use crate::app::log_progress;
use crate::config::{ErrorPolicy, PROGRESS_LOG_INTERVAL};
use crate::convert::{convert_record, RawRecord, TypedDocument};
use crate::error_handling::{ErrorType, ImportError, ProcessingStats, SourceError};
use crate::schema::FieldSchema;

pub use driver::run_pipeline;
pub use workers::run_pipeline_concurrent;

/// Counters for one pipeline run.
///
/// Reported whether the run completed or aborted.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PipelineStats {
    /// Rows taken from the source, including malformed ones
    pub records_read: usize,
    /// Rows converted into documents
    pub records_converted: usize,
    /// Documents committed to the store
    pub records_loaded: usize,
    /// Rows rejected by the source parser or the converter
    pub records_failed: usize,
    /// Converted documents left out of the store by a failed bulk write
    pub records_unflushed: usize,
    pub batches_flushed: usize,
    pub elapsed: Duration,
}

impl PipelineStats {
    pub fn elapsed_seconds(&self) -> f64 {
        self.elapsed.as_secs_f64()
    }
}

/// A run that stopped before the source was exhausted.
#[derive(Error, Debug)]
#[error("import aborted after {} records", .stats.records_read)]
pub struct PipelineAbort {
    pub stats: PipelineStats,
    #[source]
    pub cause: ImportError,
}

/// Read-side counters, owned by the driver.
#[derive(Debug, Default)]
struct ReadCounters {
    read: usize,
    converted: usize,
    failed: usize,
}

/// Turns one source item into a document.
///
/// `Ok(None)` means the record failed and the policy says skip it. Any `Err`
/// ends the run.
fn next_document(
    item: Result<RawRecord, SourceError>,
    schema: &FieldSchema,
    policy: ErrorPolicy,
    error_stats: &ProcessingStats,
    counters: &mut ReadCounters,
) -> Result<Option<TypedDocument>, ImportError> {
    let record = match item {
        Ok(record) => record,
        Err(err @ SourceError::Malformed { .. }) => {
            counters.read += 1;
            counters.failed += 1;
            error_stats.increment_error(ErrorType::MalformedRecord);
            warn!("{}", err);
            return match policy {
                ErrorPolicy::Skip => Ok(None),
                ErrorPolicy::Abort => Err(ImportError::Source(err)),
            };
        }
        Err(err) => return Err(ImportError::Source(err)),
    };
    counters.read += 1;

    match convert_record(&record, schema) {
        Ok(document) => {
            counters.converted += 1;
            Ok(Some(document))
        }
        Err(err) => {
            counters.failed += 1;
            error_stats.increment_error(ErrorType::from(&err));
            warn!("Line {}: {}", record.line(), err);
            match policy {
                ErrorPolicy::Skip => Ok(None),
                ErrorPolicy::Abort => Err(ImportError::Record {
                    line: record.line(),
                    source: err,
                }),
            }
        }
    }
}

fn maybe_log_progress(start: Instant, counters: &ReadCounters) {
    if counters.read > 0 && counters.read % PROGRESS_LOG_INTERVAL == 0 {
        log_progress(start, counters.read, counters.failed);
    }
}
