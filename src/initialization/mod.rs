//! Process-level initialization.
//!
//! Database setup lives in `storage`; this module only covers what the binary
//! configures once at startup.

mod logger;

// Re-export public API
pub use logger::init_logger_with;
