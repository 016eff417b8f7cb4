//! Error type definitions.
//!
//! This module defines all error types used throughout the application, plus the
//! `ErrorType` categories tallied by `ProcessingStats`.

use log::SetLoggerError;
use strum_macros::EnumIter as EnumIterMacro;
use thiserror::Error;

use crate::schema::TypeTag;

/// Error types for initialization failures.
#[derive(Error, Debug)]
#[allow(clippy::enum_variant_names)] // All variants end with "Error" by convention
pub enum InitializationError {
    /// Error initializing the logger.
    #[error("Logger initialization error: {0}")]
    LoggerError(#[from] SetLoggerError),
}

/// Configuration rejected before the run starts.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("at least one field name is required")]
    NoFields,

    #[error("batch size must be greater than zero")]
    InvalidBatchSize,

    #[error("workers must be between 1 and {max}, got {workers}")]
    InvalidWorkers { workers: usize, max: usize },

    #[error("collection name must not be empty")]
    EmptyCollection,

    #[error("unknown text encoding: {0}")]
    UnknownEncoding(String),
}

/// Errors raised while binding field names to type tags.
///
/// These are always fatal and surface before any record is read.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum SchemaError {
    /// Tag is not one of `s`, `i`, `f`, `d`.
    #[error("unknown type tag '{tag}' (expected one of s, i, f, d)")]
    UnknownTypeTag { tag: String },

    #[error("{fields} field names but {types} type tags; they must agree in length")]
    SchemaArityMismatch { fields: usize, types: usize },

    #[error("field '{0}' is declared more than once")]
    DuplicateField(String),

    #[error("schema has no fields")]
    EmptySchema,
}

/// A single text value could not be converted to its declared type.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("cannot convert {raw:?} to {tag}: {reason}")]
pub struct ConversionError {
    pub tag: TypeTag,
    pub raw: String,
    pub reason: String,
}

/// Errors for a single record. The pipeline's error policy decides whether
/// the run continues.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RecordError {
    #[error("record is missing field '{field}'")]
    MissingField { field: String },

    #[error("field '{field}': cannot convert {raw:?} to {tag}")]
    FieldConversionError {
        field: String,
        raw: String,
        tag: TypeTag,
        #[source]
        source: ConversionError,
    },
}

/// Error types for database operations.
#[derive(Error, Debug)]
pub enum DatabaseError {
    /// Error creating the database file.
    #[error("Database file creation error: {0}")]
    FileCreationError(String),

    /// SQL execution error.
    #[error("SQL error: {0}")]
    SqlError(#[from] sqlx::Error),

    /// Schema migration failed.
    #[error("Migration error: {0}")]
    MigrationError(#[from] sqlx::migrate::MigrateError),

    /// A document could not be serialized for storage.
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}

/// A bulk write was rejected by the store.
///
/// The batch is left unflushed; nothing in it was persisted.
#[derive(Error, Debug)]
#[error("bulk write of {count} documents failed: {source}")]
pub struct BatchWriteError {
    pub count: usize,
    #[source]
    pub source: DatabaseError,
}

/// Errors produced while reading the source stream.
#[derive(Error, Debug)]
pub enum SourceError {
    /// The underlying file could not be read. Always fatal.
    #[error("I/O error reading source: {0}")]
    Io(#[from] std::io::Error),

    /// A row could not be parsed. Handled per the error policy.
    #[error("malformed record at line {line}: {reason}")]
    Malformed { line: u64, reason: String },

    #[error("unknown text encoding: {0}")]
    UnknownEncoding(String),
}

/// Why a pipeline run stopped early.
#[derive(Error, Debug)]
pub enum ImportError {
    #[error("line {line}: {source}")]
    Record {
        line: u64,
        #[source]
        source: RecordError,
    },

    #[error(transparent)]
    Source(#[from] SourceError),

    #[error(transparent)]
    BatchWrite(#[from] BatchWriteError),

    /// A loader worker task panicked or was cancelled.
    #[error("loader worker failed: {0}")]
    Worker(String),
}

/// Categories of failures counted during a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIterMacro)]
pub enum ErrorType {
    MissingField,
    FieldConversion,
    MalformedRecord,
    BatchWrite,
}

impl std::fmt::Display for ErrorType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl ErrorType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorType::MissingField => "Missing field",
            ErrorType::FieldConversion => "Field conversion error",
            ErrorType::MalformedRecord => "Malformed record",
            ErrorType::BatchWrite => "Bulk write error",
        }
    }
}

impl From<&RecordError> for ErrorType {
    fn from(err: &RecordError) -> Self {
        match err {
            RecordError::MissingField { .. } => ErrorType::MissingField,
            RecordError::FieldConversionError { .. } => ErrorType::FieldConversion,
        }
    }
}
