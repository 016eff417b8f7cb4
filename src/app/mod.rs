//! Application-level helpers.
//!
//! Progress logging and end-of-run statistics used by `run_import`.

pub mod logging;
pub mod statistics;

// Re-export public API
pub use logging::log_progress;
pub use statistics::save_final_statistics;
