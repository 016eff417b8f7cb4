//! Application configuration and constants.
//!
//! This module provides:
//! - Configuration constants (batch size, default paths, logging intervals)
//! - CLI option types and parsing
//! - The library `Config` struct and its validation

mod constants;
mod types;

// Re-export all constants
pub use constants::*;
pub use types::{
    Cli, Command, Config, ErrorPolicy, ImportArgs, LogFormat, LogLevel, RunsArgs,
};
