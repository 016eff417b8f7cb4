//! Configuration types and CLI options.
//!
//! This module defines enums and structs used for command-line argument parsing
//! and configuration.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::config::constants::{
    DB_PATH, DEFAULT_BATCH_SIZE, DEFAULT_COLLECTION, DEFAULT_ENCODING, MAX_WORKERS,
};
use crate::error_handling::ConfigError;

/// Logging level for the application.
///
/// Controls the verbosity of log output, from most restrictive (Error) to most
/// verbose (Trace).
#[derive(Clone, Debug, ValueEnum)]
pub enum LogLevel {
    /// Only error messages
    Error,
    /// Error and warning messages
    Warn,
    /// Error, warning, and informational messages
    Info,
    /// All messages except trace
    Debug,
    /// All messages including trace
    Trace,
}

impl From<LogLevel> for log::LevelFilter {
    fn from(l: LogLevel) -> Self {
        match l {
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Trace => log::LevelFilter::Trace,
        }
    }
}

/// Log output format.
///
/// Controls how log messages are formatted:
/// - `Plain`: Human-readable format with colors (default)
/// - `Json`: Structured JSON format for machine parsing
#[derive(Clone, Debug, ValueEnum)]
pub enum LogFormat {
    /// Human-readable format with colors (default)
    Plain,
    /// Structured JSON format for machine parsing
    Json,
}

/// What the pipeline does when a single record cannot be read or converted.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, ValueEnum)]
pub enum ErrorPolicy {
    /// Stop the whole run at the first bad record (default).
    #[default]
    Abort,
    /// Count the bad record as failed, log it, and keep going.
    Skip,
}

impl ErrorPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorPolicy::Abort => "abort",
            ErrorPolicy::Skip => "skip",
        }
    }
}

/// Library configuration (no CLI dependencies).
///
/// This is the core configuration struct used by the library. It can be
/// constructed programmatically without any CLI dependencies.
///
/// # Examples
///
/// ```no_run
/// use typed_import::Config;
/// use std::path::PathBuf;
///
/// let config = Config {
///     file: PathBuf::from("people.csv"),
///     fields: vec!["name".into(), "age".into()],
///     types: vec!["s".into(), "i".into()],
///     collection: "people".into(),
///     ..Default::default()
/// };
/// ```
#[derive(Debug, Clone)]
pub struct Config {
    /// Delimited text file to read
    pub file: PathBuf,

    /// Field names, in column order
    pub fields: Vec<String>,

    /// Type tags (`s`, `i`, `f`, `d`), parallel to `fields`
    pub types: Vec<String>,

    /// Source text encoding label (e.g. `UTF-8`, `cp1252`)
    pub encoding: String,

    /// Database path (SQLite file)
    pub db_path: PathBuf,

    /// Destination collection
    pub collection: String,

    /// Delete the collection's existing documents before loading
    pub drop: bool,

    /// Documents per bulk write
    pub batch_size: usize,

    /// Behavior on a bad record
    pub on_error: ErrorPolicy,

    /// Number of loader workers (1 = sequential)
    pub workers: usize,

    /// Discard the first line of the file
    pub skip_header: bool,

    /// Log level
    pub log_level: LogLevel,

    /// Log format
    pub log_format: LogFormat,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            file: PathBuf::from("data.csv"),
            fields: Vec::new(),
            types: Vec::new(),
            encoding: DEFAULT_ENCODING.to_string(),
            db_path: PathBuf::from(DB_PATH),
            collection: DEFAULT_COLLECTION.to_string(),
            drop: false,
            batch_size: DEFAULT_BATCH_SIZE,
            on_error: ErrorPolicy::Abort,
            workers: 1,
            skip_header: false,
            log_level: LogLevel::Info,
            log_format: LogFormat::Plain,
        }
    }
}

impl Config {
    /// Checks settings that can be rejected before any file or database is opened.
    ///
    /// Schema problems (arity, unknown tags) are reported by schema binding instead.
    pub fn validate(&self) -> Result<(), ConfigError> {
        // A one-sided empty list is an arity mismatch, left to schema binding
        if self.fields.is_empty() && self.types.is_empty() {
            return Err(ConfigError::NoFields);
        }
        if self.batch_size == 0 {
            return Err(ConfigError::InvalidBatchSize);
        }
        if self.workers == 0 || self.workers > MAX_WORKERS {
            return Err(ConfigError::InvalidWorkers {
                workers: self.workers,
                max: MAX_WORKERS,
            });
        }
        if self.collection.trim().is_empty() {
            return Err(ConfigError::EmptyCollection);
        }
        if encoding_rs::Encoding::for_label(self.encoding.as_bytes()).is_none() {
            return Err(ConfigError::UnknownEncoding(self.encoding.clone()));
        }
        Ok(())
    }
}

/// Command-line interface.
#[derive(Debug, Parser)]
#[command(
    name = "typed_import",
    version,
    about = "Imports a CSV file into a document store with a declared type for every column."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

/// Top-level subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Load a delimited text file into a collection
    Import(ImportArgs),
    /// Show previous import runs recorded in the database
    Runs(RunsArgs),
}

/// Options for `typed_import import`.
///
/// # Examples
///
/// ```bash
/// # Three typed columns into the `people` collection
/// typed_import import people.csv --fields name age price --types s i f --collection people
///
/// # Windows-1252 input, replace existing documents, keep going past bad rows
/// typed_import import legacy.csv --encoding cp1252 --drop --on-error skip \
///     --fields id created --types i d
/// ```
#[derive(Debug, Args)]
pub struct ImportArgs {
    /// CSV file to read
    #[arg(value_parser)]
    pub file: PathBuf,

    /// Space separated list of field names, e.g. --fields name age dob
    #[arg(long, num_args = 1.., required = true)]
    pub fields: Vec<String>,

    /// Space separated list of field types (s=string, i=integer, f=float, d=timestamp),
    /// e.g. --types s i d
    #[arg(long, num_args = 1.., required = true)]
    pub types: Vec<String>,

    /// Source encoding (UTF-8, cp1252, latin1, utf-16le, ...)
    #[arg(long, default_value = DEFAULT_ENCODING)]
    pub encoding: String,

    /// Database path (SQLite file)
    #[arg(long = "db", value_parser, default_value = DB_PATH)]
    pub db_path: PathBuf,

    /// Destination collection
    #[arg(long, default_value = DEFAULT_COLLECTION)]
    pub collection: String,

    /// Drop existing documents in the collection before loading (default: don't drop)
    #[arg(long, default_value_t = false)]
    pub drop: bool,

    /// Documents per bulk write
    #[arg(long, default_value_t = DEFAULT_BATCH_SIZE)]
    pub batch_size: usize,

    /// What to do with a record that cannot be converted: abort|skip
    #[arg(long, value_enum, default_value_t = ErrorPolicy::Abort)]
    pub on_error: ErrorPolicy,

    /// Number of concurrent loader workers, each flushing its own batches
    #[arg(long, default_value_t = 1)]
    pub workers: usize,

    /// Treat the first line as a header and skip it
    #[arg(long, default_value_t = false)]
    pub skip_header: bool,

    /// Log level: error|warn|info|debug|trace
    #[arg(long, value_enum, default_value_t = LogLevel::Info)]
    pub log_level: LogLevel,

    /// Log format: plain|json
    #[arg(long, value_enum, default_value_t = LogFormat::Plain)]
    pub log_format: LogFormat,
}

/// Options for `typed_import runs`.
#[derive(Debug, Args)]
pub struct RunsArgs {
    /// Database path (SQLite file)
    #[arg(long = "db", value_parser, default_value = DB_PATH)]
    pub db_path: PathBuf,

    /// Show at most this many runs (most recent first)
    #[arg(long)]
    pub limit: Option<usize>,
}

impl From<ImportArgs> for Config {
    fn from(args: ImportArgs) -> Self {
        Self {
            file: args.file,
            fields: args.fields,
            types: args.types,
            encoding: args.encoding,
            db_path: args.db_path,
            collection: args.collection,
            drop: args.drop,
            batch_size: args.batch_size,
            on_error: args.on_error,
            workers: args.workers,
            skip_header: args.skip_header,
            log_level: args.log_level,
            log_format: args.log_format,
        }
    }
}
