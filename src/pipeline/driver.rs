//! Sequential pipeline driver.

use std::time::Instant;

use log::{error, info};

use crate::config::ErrorPolicy;
use crate::convert::RawRecord;
use crate::error_handling::{ErrorType, ImportError, ProcessingStats, SourceError};
use crate::loader::BatchLoader;
use crate::schema::FieldSchema;
use crate::storage::DocumentStore;

use super::{maybe_log_progress, next_document, PipelineAbort, PipelineStats, ReadCounters};

/// Runs the whole source through `loader`, one record at a time.
///
/// Ends with a final flush so a partial trailing batch is committed. When a
/// record error aborts the run, documents already buffered are flushed first,
/// so every row before the failing one is persisted. A failed bulk write is
/// never retried; its batch stays in `loader` and is reported as unflushed.
///
/// # Errors
///
/// Returns `PipelineAbort` carrying the statistics gathered so far and the
/// error that stopped the run.
pub async fn run_pipeline<I, S>(
    source: I,
    schema: &FieldSchema,
    loader: &mut BatchLoader<S>,
    policy: ErrorPolicy,
    error_stats: &ProcessingStats,
) -> Result<PipelineStats, PipelineAbort>
where
    I: IntoIterator<Item = Result<RawRecord, SourceError>>,
    S: DocumentStore,
{
    let start = Instant::now();
    let loaded_before = loader.loaded();
    let batches_before = loader.batches_flushed();
    let mut counters = ReadCounters::default();

    let result = match drive(source, schema, loader, policy, error_stats, &mut counters, start)
        .await
    {
        Ok(()) => Ok(()),
        Err(cause @ ImportError::BatchWrite(_)) => {
            error_stats.increment_error(ErrorType::BatchWrite);
            Err(cause)
        }
        Err(cause) => {
            if let Err(flush_err) = loader.flush().await {
                error_stats.increment_error(ErrorType::BatchWrite);
                error!("Could not flush buffered documents after abort: {}", flush_err);
            }
            Err(cause)
        }
    };

    let stats = PipelineStats {
        records_read: counters.read,
        records_converted: counters.converted,
        records_loaded: loader.loaded() - loaded_before,
        records_failed: counters.failed,
        records_unflushed: loader.pending(),
        batches_flushed: loader.batches_flushed() - batches_before,
        elapsed: start.elapsed(),
    };

    match result {
        Ok(()) => {
            info!(
                "Pipeline finished: {} read, {} loaded, {} failed in {:.2}s",
                stats.records_read,
                stats.records_loaded,
                stats.records_failed,
                stats.elapsed_seconds()
            );
            Ok(stats)
        }
        Err(cause) => {
            error!("Pipeline aborted: {}", cause);
            Err(PipelineAbort { stats, cause })
        }
    }
}

async fn drive<I, S>(
    source: I,
    schema: &FieldSchema,
    loader: &mut BatchLoader<S>,
    policy: ErrorPolicy,
    error_stats: &ProcessingStats,
    counters: &mut ReadCounters,
    start: Instant,
) -> Result<(), ImportError>
where
    I: IntoIterator<Item = Result<RawRecord, SourceError>>,
    S: DocumentStore,
{
    for item in source {
        if let Some(document) = next_document(item, schema, policy, error_stats, counters)? {
            loader.add(document).await?;
        }
        maybe_log_progress(start, counters);
    }
    loader.flush().await?;
    Ok(())
}
