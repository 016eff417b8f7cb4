//! typed_import library: typed, batched CSV import into a document store
//!
//! Every column of the input is converted to a declared type (string, integer,
//! float or timestamp) before it is stored, so values such as zero-padded
//! codes or ambiguous dates never get coerced behind your back. Documents are
//! written in bulk, one transaction per batch, into a SQLite-backed
//! collection.
//!
//! # Example
//!
//! ```no_run
//! use typed_import::{run_import, Config};
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = Config {
//!     file: std::path::PathBuf::from("people.csv"),
//!     fields: vec!["name".into(), "age".into(), "price".into()],
//!     types: vec!["s".into(), "i".into(), "f".into()],
//!     collection: "people".into(),
//!     ..Default::default()
//! };
//!
//! let report = run_import(config).await?;
//! println!("Loaded {} of {} records", report.records_loaded, report.records_read);
//! # Ok(())
//! # }
//! ```
//!
//! The building blocks are usable on their own: `bind_schema` validates a
//! schema up front, and `run_pipeline` drives any record iterator into any
//! `DocumentStore` through a `BatchLoader`.
//!
//! # Requirements
//!
//! This library requires a Tokio runtime.

mod app;
pub mod config;
pub mod convert;
pub mod error_handling;
pub mod initialization;
pub mod loader;
pub mod pipeline;
pub mod schema;
pub mod source;
pub mod storage;

// Re-export public API
pub use config::{Config, ErrorPolicy, LogFormat, LogLevel};
pub use convert::{convert_record, RawRecord, TypedDocument};
pub use loader::{BatchConfig, BatchLoader};
pub use pipeline::{run_pipeline, run_pipeline_concurrent, PipelineAbort, PipelineStats};
pub use run::{run_history, run_import, ImportReport};
pub use schema::{bind_schema, FieldSchema, FieldValue, TypeRegistry, TypeTag};
pub use storage::{query_run_history, run_migrations, DocumentStore, RunSummary};

// Internal run module (wires config, source, storage and pipeline together)
mod run {
    use anyhow::{Context, Result};
    use chrono::Utc;
    use log::{info, warn};
    use std::path::{Path, PathBuf};
    use std::sync::atomic::{AtomicU64, Ordering};

    use crate::app::save_final_statistics;
    use crate::config::Config;
    use crate::error_handling::{ImportError, ProcessingStats};
    use crate::loader::{BatchConfig, BatchLoader};
    use crate::pipeline::{run_pipeline, run_pipeline_concurrent, PipelineAbort, PipelineStats};
    use crate::schema::bind_schema;
    use crate::source::CsvSource;
    use crate::storage::{
        drop_collection, init_db_pool_with_path, insert_run_metadata, query_run_history,
        run_migrations, RunMetadata, RunSummary, SqliteDocumentStore,
    };

    /// Results of a completed import run.
    #[derive(Debug, Clone)]
    pub struct ImportReport {
        /// Run identifier (format: `run_<timestamp_millis>_<pid>_<sequence>`)
        pub run_id: String,
        /// Path to the SQLite database holding the collection
        pub db_path: PathBuf,
        pub collection: String,
        pub records_read: usize,
        pub records_converted: usize,
        pub records_loaded: usize,
        /// Records skipped under `ErrorPolicy::Skip`
        pub records_failed: usize,
        /// Documents removed by `--drop` before loading
        pub documents_dropped: u64,
        pub elapsed_seconds: f64,
    }

    /// Runs an import with the provided configuration.
    ///
    /// The schema is bound and the source opened before the database is
    /// touched, so configuration mistakes fail without side effects. Every
    /// run, completed or aborted, is recorded in the `runs` table.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The configuration or schema is invalid
    /// - The input file cannot be opened
    /// - Database initialization fails
    /// - The pipeline aborts; the error is then a `PipelineAbort` (reachable
    ///   with `downcast_ref`) carrying the statistics of the partial run
    pub async fn run_import(config: Config) -> Result<ImportReport> {
        config.validate().context("Invalid configuration")?;
        let schema = bind_schema(&config.fields, &config.types).context("Invalid schema")?;
        info!("Schema: {}", schema.describe());

        let field_names = schema.names().map(str::to_string).collect();
        let source = CsvSource::open(
            &config.file,
            &config.encoding,
            field_names,
            config.skip_header,
        )
        .with_context(|| format!("Failed to open input file {}", config.file.display()))?;

        #[allow(clippy::cast_possible_truncation)]
        let max_connections = config.workers as u32;
        let pool = init_db_pool_with_path(&config.db_path, max_connections)
            .await
            .context("Failed to initialize database pool")?;
        run_migrations(&pool)
            .await
            .context("Failed to run database migrations")?;

        let documents_dropped = if config.drop {
            let dropped = drop_collection(&pool, &config.collection)
                .await
                .context("Failed to drop collection")?;
            info!(
                "Dropped {} documents from collection '{}'",
                dropped, config.collection
            );
            dropped
        } else {
            0
        };

        let start_time_epoch = Utc::now().timestamp_millis();
        let run_id = next_run_id(start_time_epoch);
        info!("Starting run: {}", run_id);

        let source_file = config.file.to_string_lossy();
        let schema_description = schema.describe();
        insert_run_metadata(
            &pool,
            &RunMetadata {
                run_id: &run_id,
                start_time_ms: start_time_epoch,
                version: env!("CARGO_PKG_VERSION"),
                source_file: &source_file,
                collection: &config.collection,
                schema: &schema_description,
                error_policy: config.on_error.as_str(),
                batch_size: config.batch_size,
            },
        )
        .await
        .context("Failed to insert run metadata")?;

        let error_stats = ProcessingStats::new();
        let store = SqliteDocumentStore::new(pool.clone(), config.collection.clone())
            .with_run_id(run_id.clone());
        let batch_config = BatchConfig {
            batch_size: config.batch_size,
        };

        let result = if config.workers > 1 {
            run_pipeline_concurrent(
                source,
                &schema,
                store,
                batch_config,
                config.workers,
                config.on_error,
                &error_stats,
            )
            .await
        } else {
            let mut loader = BatchLoader::new(store, batch_config);
            let result =
                run_pipeline(source, &schema, &mut loader, config.on_error, &error_stats).await;
            // A failed batch is not retried
            loader.discard();
            result
        };

        let (stats, abort_cause) = match result {
            Ok(stats) => (stats, None),
            Err(PipelineAbort { stats, cause }) => (stats, Some(cause)),
        };
        let outcome = if abort_cause.is_some() {
            "aborted"
        } else {
            "completed"
        };

        let saved = save_final_statistics(&pool, &run_id, &stats, &error_stats, outcome).await;

        if let Err(e) = sqlx::query("PRAGMA wal_checkpoint(TRUNCATE)")
            .execute(&pool)
            .await
        {
            warn!(
                "Failed to checkpoint WAL file (this is non-critical): {}",
                e
            );
        }
        pool.close().await;

        let stats = settle_run(&run_id, stats, abort_cause, saved)?;

        Ok(ImportReport {
            run_id,
            db_path: config.db_path,
            collection: config.collection,
            records_read: stats.records_read,
            records_converted: stats.records_converted,
            records_loaded: stats.records_loaded,
            records_failed: stats.records_failed,
            documents_dropped,
            elapsed_seconds: stats.elapsed_seconds(),
        })
    }

    static RUN_SEQUENCE: AtomicU64 = AtomicU64::new(0);

    /// Run ids stay unique for runs started in the same millisecond, in this
    /// process or another one sharing the database.
    fn next_run_id(start_time_ms: i64) -> String {
        let sequence = RUN_SEQUENCE.fetch_add(1, Ordering::Relaxed);
        format!("run_{}_{}_{}", start_time_ms, std::process::id(), sequence)
    }

    /// Picks the error `run_import` reports. An abort always wins over a
    /// failure to record the run's statistics, so callers keep the counts.
    fn settle_run(
        run_id: &str,
        stats: PipelineStats,
        abort_cause: Option<ImportError>,
        saved: Result<()>,
    ) -> Result<PipelineStats> {
        match abort_cause {
            Some(cause) => {
                if let Err(e) = saved {
                    warn!("Failed to record statistics for aborted run {}: {:#}", run_id, e);
                }
                Err(PipelineAbort { stats, cause }.into())
            }
            None => saved.map(|()| stats),
        }
    }

    /// Finished runs recorded in the database at `db_path`, most recent first.
    pub async fn run_history(db_path: &Path, limit: Option<usize>) -> Result<Vec<RunSummary>> {
        let pool = init_db_pool_with_path(db_path, 1)
            .await
            .context("Failed to initialize database pool")?;
        run_migrations(&pool)
            .await
            .context("Failed to run database migrations")?;
        let runs = query_run_history(&pool, limit)
            .await
            .context("Failed to query run history")?;
        pool.close().await;
        Ok(runs)
    }

    #[cfg(test)]
    mod tests {
        use super::*;
        use std::time::Duration;

        fn partial_stats() -> PipelineStats {
            PipelineStats {
                records_read: 12,
                records_converted: 12,
                records_loaded: 10,
                records_failed: 0,
                records_unflushed: 2,
                batches_flushed: 2,
                elapsed: Duration::from_millis(40),
            }
        }

        #[test]
        fn test_run_ids_differ_within_one_millisecond() {
            let first = next_run_id(1_397_692_800_000);
            let second = next_run_id(1_397_692_800_000);
            assert_ne!(first, second);
            assert!(first.starts_with("run_1397692800000_"));
        }

        #[test]
        fn test_abort_survives_failed_statistics_update() {
            let err = settle_run(
                "run_1",
                partial_stats(),
                Some(ImportError::Worker("disk full".into())),
                Err(anyhow::anyhow!("Failed to update run statistics")),
            )
            .unwrap_err();

            let abort = err
                .downcast_ref::<PipelineAbort>()
                .expect("abort keeps its statistics");
            assert_eq!(abort.stats.records_read, 12);
            assert_eq!(abort.stats.records_loaded, 10);
            assert_eq!(abort.stats.records_unflushed, 2);
        }

        #[test]
        fn test_completed_run_reports_failed_statistics_update() {
            let err = settle_run(
                "run_1",
                partial_stats(),
                None,
                Err(anyhow::anyhow!("Failed to update run statistics")),
            )
            .unwrap_err();
            assert!(err.downcast_ref::<PipelineAbort>().is_none());

            let stats = settle_run("run_1", partial_stats(), None, Ok(())).unwrap();
            assert_eq!(stats.records_loaded, 10);
        }
    }
}
