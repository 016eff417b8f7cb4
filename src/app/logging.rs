//! Progress logging utilities.

use log::info;

/// Logs how many records have been read so far and the read rate.
///
/// # Arguments
///
/// * `start_time` - When the pipeline started
/// * `records_read` - Records taken from the source so far
/// * `records_failed` - Records rejected so far
pub fn log_progress(start_time: std::time::Instant, records_read: usize, records_failed: usize) {
    let elapsed_secs = start_time.elapsed().as_secs_f64();
    let rate = if elapsed_secs > 0.0 {
        records_read as f64 / elapsed_secs
    } else {
        0.0
    };
    info!(
        "Read {} records ({} failed) in {:.2} seconds (~{:.2} records/sec)",
        records_read, records_failed, elapsed_secs, rate
    );
}
