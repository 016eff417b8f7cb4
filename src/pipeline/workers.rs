//! Worker-pool pipeline driver.
//!
//! The calling task reads and converts; documents are dealt round-robin over
//! bounded channels to worker tasks. Each worker owns its loader and batch
//! outright, so no batch state is shared. Flush order across workers is not
//! preserved.

use std::time::Instant;

use futures::stream::FuturesUnordered;
use futures::StreamExt;
use log::{debug, error, info, warn};
use tokio::sync::mpsc;

use crate::config::{ErrorPolicy, WORKER_CHANNEL_CAPACITY};
use crate::convert::{RawRecord, TypedDocument};
use crate::error_handling::{
    BatchWriteError, ErrorType, ImportError, ProcessingStats, SourceError,
};
use crate::loader::{BatchConfig, BatchLoader};
use crate::schema::FieldSchema;
use crate::storage::DocumentStore;

use super::{maybe_log_progress, next_document, PipelineAbort, PipelineStats, ReadCounters};

struct WorkerOutcome {
    loaded: usize,
    batches_flushed: usize,
    unflushed: usize,
    error: Option<BatchWriteError>,
}

/// Runs the source through `workers` loader tasks sharing clones of `store`.
///
/// All workers are joined before the statistics are built. A bulk write
/// failure in any worker stops reading and aborts the run; the other workers
/// still flush what they hold. With `workers == 1` this behaves like
/// `run_pipeline` apart from running the loader on its own task.
///
/// # Errors
///
/// Returns `PipelineAbort` with the statistics gathered so far and the first
/// error that stopped the run.
pub async fn run_pipeline_concurrent<I, S>(
    source: I,
    schema: &FieldSchema,
    store: S,
    config: BatchConfig,
    workers: usize,
    policy: ErrorPolicy,
    error_stats: &ProcessingStats,
) -> Result<PipelineStats, PipelineAbort>
where
    I: IntoIterator<Item = Result<RawRecord, SourceError>>,
    S: DocumentStore + Clone + 'static,
{
    let start = Instant::now();
    let workers = workers.max(1);
    info!("Starting {} loader workers", workers);

    let mut senders = Vec::with_capacity(workers);
    let mut tasks = FuturesUnordered::new();
    for id in 0..workers {
        let (tx, rx) = mpsc::channel(WORKER_CHANNEL_CAPACITY);
        senders.push(tx);
        let loader = BatchLoader::new(store.clone(), config);
        tasks.push(tokio::spawn(run_worker(id, rx, loader)));
    }

    let mut counters = ReadCounters::default();
    let mut read_error = None;
    let mut undelivered = 0usize;
    let mut next = 0usize;

    for item in source {
        match next_document(item, schema, policy, error_stats, &mut counters) {
            Ok(Some(document)) => {
                if senders[next].send(document).await.is_err() {
                    // Worker stopped after a failed bulk write; its outcome has the cause.
                    undelivered += 1;
                    break;
                }
                next = (next + 1) % workers;
            }
            Ok(None) => {}
            Err(cause) => {
                read_error = Some(cause);
                break;
            }
        }
        maybe_log_progress(start, &counters);
    }
    drop(senders);

    let mut loaded = 0usize;
    let mut batches_flushed = 0usize;
    let mut unflushed = undelivered;
    let mut write_error = None;
    let mut worker_error = None;

    while let Some(joined) = tasks.next().await {
        match joined {
            Ok(outcome) => {
                loaded += outcome.loaded;
                batches_flushed += outcome.batches_flushed;
                unflushed += outcome.unflushed;
                if let Some(err) = outcome.error {
                    error_stats.increment_error(ErrorType::BatchWrite);
                    if write_error.is_none() {
                        write_error = Some(err);
                    } else {
                        warn!("Additional worker failure: {}", err);
                    }
                }
            }
            Err(join_error) => {
                warn!("Loader worker panicked: {:?}", join_error);
                worker_error.get_or_insert_with(|| join_error.to_string());
            }
        }
    }

    let stats = PipelineStats {
        records_read: counters.read,
        records_converted: counters.converted,
        records_loaded: loaded,
        records_failed: counters.failed,
        records_unflushed: unflushed,
        batches_flushed,
        elapsed: start.elapsed(),
    };

    let cause = read_error
        .or_else(|| write_error.map(ImportError::BatchWrite))
        .or_else(|| worker_error.map(ImportError::Worker));

    match cause {
        None => {
            info!(
                "Pipeline finished: {} read, {} loaded, {} failed in {:.2}s ({} workers)",
                stats.records_read,
                stats.records_loaded,
                stats.records_failed,
                stats.elapsed_seconds(),
                workers
            );
            Ok(stats)
        }
        Some(cause) => {
            error!("Pipeline aborted: {}", cause);
            Err(PipelineAbort { stats, cause })
        }
    }
}

async fn run_worker<S: DocumentStore>(
    id: usize,
    mut rx: mpsc::Receiver<TypedDocument>,
    mut loader: BatchLoader<S>,
) -> WorkerOutcome {
    let mut error = None;
    while let Some(document) = rx.recv().await {
        if let Err(err) = loader.add(document).await {
            error = Some(err);
            break;
        }
    }
    if error.is_none() {
        if let Err(err) = loader.flush().await {
            error = Some(err);
        }
    }

    let mut unflushed = loader.pending();
    if error.is_some() {
        rx.close();
        while rx.try_recv().is_ok() {
            unflushed += 1;
        }
    }

    debug!(
        "Worker {} done: {} loaded in {} batches, {} unflushed",
        id,
        loader.loaded(),
        loader.batches_flushed(),
        unflushed
    );

    WorkerOutcome {
        loaded: loader.loaded(),
        batches_flushed: loader.batches_flushed(),
        unflushed,
        error,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::test_store::MemoryStore;
    use crate::schema::bind_schema;
    use std::sync::Arc;

    fn numbered(n: u64) -> impl Iterator<Item = Result<RawRecord, SourceError>> {
        (0..n).map(|i| Ok(RawRecord::with_values(i + 1, [("n", i.to_string())])))
    }

    #[tokio::test]
    async fn test_workers_load_every_document_once() {
        let schema = bind_schema(&["n"], &["i"]).unwrap();
        let store = Arc::new(MemoryStore::new());

        let stats = run_pipeline_concurrent(
            numbered(1000),
            &schema,
            Arc::clone(&store),
            BatchConfig { batch_size: 64 },
            4,
            ErrorPolicy::Abort,
            &ProcessingStats::new(),
        )
        .await
        .expect("run completes");

        assert_eq!(stats.records_read, 1000);
        assert_eq!(stats.records_loaded, 1000);
        assert_eq!(stats.records_unflushed, 0);
        let mut numbers = store.numbers();
        numbers.sort_unstable();
        assert_eq!(numbers, (0..1000).collect::<Vec<i64>>());
        assert!(store.batch_sizes().iter().all(|size| *size <= 64));
    }

    #[tokio::test]
    async fn test_single_worker_matches_sequential_batching() {
        let schema = bind_schema(&["n"], &["i"]).unwrap();
        let store = Arc::new(MemoryStore::new());

        let stats = run_pipeline_concurrent(
            numbered(7),
            &schema,
            Arc::clone(&store),
            BatchConfig { batch_size: 3 },
            1,
            ErrorPolicy::Abort,
            &ProcessingStats::new(),
        )
        .await
        .unwrap();

        assert_eq!(stats.batches_flushed, 3);
        assert_eq!(store.batch_sizes(), vec![3, 3, 1]);
        assert_eq!(store.numbers(), (0..7).collect::<Vec<i64>>());
    }

    #[tokio::test]
    async fn test_skip_policy_with_workers() {
        let schema = bind_schema(&["n"], &["i"]).unwrap();
        let store = Arc::new(MemoryStore::new());
        let source = ["1", "bad", "3", "4"]
            .into_iter()
            .enumerate()
            .map(|(i, v)| Ok::<_, SourceError>(RawRecord::with_values(i as u64 + 1, [("n", v)])));
        let error_stats = ProcessingStats::new();

        let stats = run_pipeline_concurrent(
            source,
            &schema,
            Arc::clone(&store),
            BatchConfig { batch_size: 2 },
            2,
            ErrorPolicy::Skip,
            &error_stats,
        )
        .await
        .unwrap();

        assert_eq!(stats.records_failed, 1);
        assert_eq!(stats.records_loaded, 3);
        assert_eq!(error_stats.get_error_count(ErrorType::FieldConversion), 1);
    }

    #[tokio::test]
    async fn test_worker_write_failure_aborts_run() {
        let schema = bind_schema(&["n"], &["i"]).unwrap();
        let store = Arc::new(MemoryStore::failing_on_call(1));
        let error_stats = ProcessingStats::new();

        let abort = run_pipeline_concurrent(
            numbered(100),
            &schema,
            Arc::clone(&store),
            BatchConfig { batch_size: 10 },
            2,
            ErrorPolicy::Abort,
            &error_stats,
        )
        .await
        .unwrap_err();

        assert!(matches!(abort.cause, ImportError::BatchWrite(_)));
        assert_eq!(error_stats.get_error_count(ErrorType::BatchWrite), 1);
        assert_eq!(abort.stats.records_loaded, store.stored());
        assert!(abort.stats.records_unflushed >= 10);
        assert_eq!(
            abort.stats.records_loaded + abort.stats.records_unflushed,
            abort.stats.records_converted
        );
    }

    #[tokio::test]
    async fn test_record_abort_flushes_worker_batches() {
        let schema = bind_schema(&["n"], &["i"]).unwrap();
        let store = Arc::new(MemoryStore::new());
        let source = ["1", "2", "3", "x", "5"]
            .into_iter()
            .enumerate()
            .map(|(i, v)| Ok::<_, SourceError>(RawRecord::with_values(i as u64 + 1, [("n", v)])));

        let abort = run_pipeline_concurrent(
            source,
            &schema,
            Arc::clone(&store),
            BatchConfig { batch_size: 100 },
            2,
            ErrorPolicy::Abort,
            &ProcessingStats::new(),
        )
        .await
        .unwrap_err();

        assert!(matches!(abort.cause, ImportError::Record { line: 4, .. }));
        assert_eq!(abort.stats.records_loaded, 3);
        let mut numbers = store.numbers();
        numbers.sort_unstable();
        assert_eq!(numbers, vec![1, 2, 3]);
    }
}
