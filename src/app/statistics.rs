//! Statistics printing and database updates.

use anyhow::{Context, Result};
use log::info;
use strum::IntoEnumIterator;

use crate::error_handling::{ErrorType, ProcessingStats};
use crate::pipeline::PipelineStats;
use crate::storage::{update_run_stats, RunStats};

/// Records the final counters of a run and logs a summary.
///
/// Called for completed and aborted runs alike, so every run row ends up
/// with its counts.
pub async fn save_final_statistics(
    pool: &sqlx::SqlitePool,
    run_id: &str,
    stats: &PipelineStats,
    error_stats: &ProcessingStats,
    outcome: &str,
) -> Result<()> {
    info!(
        "Run statistics: read={}, converted={}, loaded={}, failed={}, unflushed={}",
        stats.records_read,
        stats.records_converted,
        stats.records_loaded,
        stats.records_failed,
        stats.records_unflushed
    );

    // SQLite integers are i64; record counts always fit
    #[allow(clippy::cast_possible_wrap)]
    let run_stats = RunStats {
        run_id,
        records_read: stats.records_read as i64,
        records_converted: stats.records_converted as i64,
        records_loaded: stats.records_loaded as i64,
        records_failed: stats.records_failed as i64,
        records_unflushed: stats.records_unflushed as i64,
        elapsed_seconds: stats.elapsed_seconds(),
        outcome,
    };
    update_run_stats(pool, &run_stats)
        .await
        .context("Failed to update run statistics")?;

    print_error_statistics(error_stats);
    print_simple_summary(stats, outcome);

    Ok(())
}

fn print_simple_summary(stats: &PipelineStats, outcome: &str) {
    info!(
        "Import {}: {} record{} read ({} loaded, {} failed) in {:.1}s",
        outcome,
        stats.records_read,
        if stats.records_read == 1 { "" } else { "s" },
        stats.records_loaded,
        stats.records_failed,
        stats.elapsed_seconds()
    );
}

/// Logs a count per failure category, skipping categories that never occurred.
pub fn print_error_statistics(error_stats: &ProcessingStats) {
    let total_errors = error_stats.total_errors();
    if total_errors == 0 {
        return;
    }

    info!("Error Counts ({} total):", total_errors);
    for error_type in ErrorType::iter() {
        let count = error_stats.get_error_count(error_type);
        if count > 0 {
            info!("   {}: {}", error_type.as_str(), count);
        }
    }
}
