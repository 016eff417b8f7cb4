//! Run metadata insertion.
//!
//! This module handles inserting and updating run-level metadata and statistics.

use serde::Serialize;
use sqlx::{Row, SqlitePool};

use crate::error_handling::DatabaseError;

/// Metadata for an import run, recorded at start.
pub struct RunMetadata<'a> {
    pub run_id: &'a str,
    pub start_time_ms: i64,
    pub version: &'a str,
    pub source_file: &'a str,
    pub collection: &'a str,
    pub schema: &'a str,
    pub error_policy: &'a str,
    pub batch_size: usize,
}

/// Statistics for a finished import run, recorded at end.
pub struct RunStats<'a> {
    pub run_id: &'a str,
    pub records_read: i64,
    pub records_converted: i64,
    pub records_loaded: i64,
    pub records_failed: i64,
    pub records_unflushed: i64,
    pub elapsed_seconds: f64,
    /// `completed` or `aborted`
    pub outcome: &'a str,
}

/// A run as stored in the `runs` table.
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub run_id: String,
    pub version: String,
    pub source_file: String,
    pub collection: String,
    pub schema: String,
    pub start_time_ms: i64,
    pub end_time_ms: Option<i64>,
    pub records_read: Option<i64>,
    pub records_loaded: Option<i64>,
    pub records_failed: Option<i64>,
    pub elapsed_seconds: Option<f64>,
    pub outcome: Option<String>,
}

/// Inserts or updates run metadata in the runs table.
///
/// This should be called at the start of a run, before any record is read.
pub async fn insert_run_metadata(
    pool: &SqlitePool,
    meta: &RunMetadata<'_>,
) -> Result<(), DatabaseError> {
    #[allow(clippy::cast_possible_wrap)]
    let batch_size = meta.batch_size as i64;

    sqlx::query(
        "INSERT INTO runs (run_id, version, source_file, collection, schema, error_policy, batch_size, start_time_ms)
         VALUES (?, ?, ?, ?, ?, ?, ?, ?)
         ON CONFLICT(run_id) DO UPDATE SET
             version=excluded.version,
             source_file=excluded.source_file,
             collection=excluded.collection,
             schema=excluded.schema,
             error_policy=excluded.error_policy,
             batch_size=excluded.batch_size,
             start_time_ms=excluded.start_time_ms",
    )
    .bind(meta.run_id)
    .bind(meta.version)
    .bind(meta.source_file)
    .bind(meta.collection)
    .bind(meta.schema)
    .bind(meta.error_policy)
    .bind(batch_size)
    .bind(meta.start_time_ms)
    .execute(pool)
    .await
    .map_err(DatabaseError::SqlError)?;

    Ok(())
}

/// Updates run statistics when a run ends, whether it completed or aborted.
pub async fn update_run_stats(
    pool: &SqlitePool,
    stats: &RunStats<'_>,
) -> Result<(), DatabaseError> {
    let end_time_ms = chrono::Utc::now().timestamp_millis();

    sqlx::query(
        "UPDATE runs
         SET end_time_ms = ?, records_read = ?, records_converted = ?, records_loaded = ?,
             records_failed = ?, records_unflushed = ?, elapsed_seconds = ?, outcome = ?
         WHERE run_id = ?",
    )
    .bind(end_time_ms)
    .bind(stats.records_read)
    .bind(stats.records_converted)
    .bind(stats.records_loaded)
    .bind(stats.records_failed)
    .bind(stats.records_unflushed)
    .bind(stats.elapsed_seconds)
    .bind(stats.outcome)
    .bind(stats.run_id)
    .execute(pool)
    .await
    .map_err(DatabaseError::SqlError)?;

    Ok(())
}

/// Query run history from the database.
///
/// Returns all finished runs sorted by start_time_ms (most recent first).
///
/// # Example
///
/// ```no_run
/// use typed_import::query_run_history;
/// use sqlx::SqlitePool;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let pool = SqlitePool::connect("sqlite:./typed_import.db").await?;
/// let runs = query_run_history(&pool, Some(10)).await?;
/// for run in runs {
///     println!("{}: {} loaded into {}", run.run_id,
///              run.records_loaded.unwrap_or(0), run.collection);
/// }
/// # Ok(())
/// # }
/// ```
pub async fn query_run_history(
    pool: &SqlitePool,
    limit: Option<usize>,
) -> Result<Vec<RunSummary>, DatabaseError> {
    let query = if let Some(limit) = limit {
        format!(
            "SELECT run_id, version, source_file, collection, schema, start_time_ms, end_time_ms,
                    records_read, records_loaded, records_failed, elapsed_seconds, outcome
             FROM runs
             WHERE end_time_ms IS NOT NULL
             ORDER BY start_time_ms DESC
             LIMIT {}",
            limit
        )
    } else {
        "SELECT run_id, version, source_file, collection, schema, start_time_ms, end_time_ms,
                records_read, records_loaded, records_failed, elapsed_seconds, outcome
         FROM runs
         WHERE end_time_ms IS NOT NULL
         ORDER BY start_time_ms DESC"
            .to_string()
    };

    let rows = sqlx::query(&query)
        .fetch_all(pool)
        .await
        .map_err(DatabaseError::SqlError)?;

    let summaries: Vec<RunSummary> = rows
        .into_iter()
        .map(|row| RunSummary {
            run_id: row.get("run_id"),
            version: row.get("version"),
            source_file: row.get("source_file"),
            collection: row.get("collection"),
            schema: row.get("schema"),
            start_time_ms: row.get("start_time_ms"),
            end_time_ms: row.get("end_time_ms"),
            records_read: row.get("records_read"),
            records_loaded: row.get("records_loaded"),
            records_failed: row.get("records_failed"),
            elapsed_seconds: row.get("elapsed_seconds"),
            outcome: row.get("outcome"),
        })
        .collect();

    Ok(summaries)
}
