//! Data ingestion and storage for the query pipeline
//!
//! Files are parsed into raw records, coerced and cleaned, then committed
//! as tables in an embedded SQLite store that also executes queries.

pub mod config;
pub mod import;
pub mod schema;
pub mod sources;

use std::fmt;
use thiserror::Error;

// Re-exports
pub use config::{CleaningPolicy, FileFormat, StoreSettings};
pub use import::{next_table_name, ImportPipeline};
pub use sources::{ParsedFile, TableStore};

/// Errors that can occur in data operations
#[derive(Error, Debug)]
pub enum DataError {
    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Schema conflict: {0}")]
    SchemaConflict(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Query error: {message} (in `{sql}`)")]
    Query { sql: String, message: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),
}

/// Category of a `DataError`, for display and matching
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    ParseError,
    SchemaConflict,
    StorageError,
    QueryError,
    IoError,
    ConfigError,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorKind::ParseError => "ParseError",
            ErrorKind::SchemaConflict => "SchemaConflict",
            ErrorKind::StorageError => "StorageError",
            ErrorKind::QueryError => "QueryError",
            ErrorKind::IoError => "IoError",
            ErrorKind::ConfigError => "ConfigError",
        };
        f.write_str(name)
    }
}

impl DataError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            DataError::Parse(_) => ErrorKind::ParseError,
            DataError::SchemaConflict(_) => ErrorKind::SchemaConflict,
            DataError::Storage(_) => ErrorKind::StorageError,
            DataError::Query { .. } => ErrorKind::QueryError,
            DataError::Io(_) => ErrorKind::IoError,
            DataError::Config(_) => ErrorKind::ConfigError,
        }
    }

    pub(crate) fn storage(error: impl fmt::Display) -> Self {
        DataError::Storage(error.to_string())
    }

    pub(crate) fn query(sql: &str, error: impl fmt::Display) -> Self {
        DataError::Query {
            sql: sql.to_string(),
            message: error.to_string(),
        }
    }
}

impl From<csv::Error> for DataError {
    fn from(error: csv::Error) -> Self {
        match error.kind() {
            csv::ErrorKind::Io(io_err) => DataError::Io(std::io::Error::new(io_err.kind(), error.to_string())),
            _ => DataError::Parse(error.to_string()),
        }
    }
}

impl From<calamine::Error> for DataError {
    fn from(error: calamine::Error) -> Self {
        DataError::Parse(format!("spreadsheet: {}", error))
    }
}

impl From<insight_core::DuplicateColumn> for DataError {
    fn from(error: insight_core::DuplicateColumn) -> Self {
        DataError::SchemaConflict(error.to_string())
    }
}
