//! Error types for the data-loader crate.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while loading or writing dataset files.
#[derive(Error, Debug)]
pub enum DataLoadError {
    /// File could not be found
    #[error("File not found: {path}")]
    FileNotFound { path: PathBuf },

    /// I/O error occurred while reading or writing a file
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parquet error: {0}")]
    Parquet(#[from] parquet::errors::ParquetError),

    #[error("Arrow error: {0}")]
    Arrow(#[from] arrow::error::ArrowError),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// A required column is absent from the file
    #[error("{file}: missing required column '{column}'")]
    MissingColumn { file: String, column: String },

    /// A column is present but carries an unsupported Arrow type
    #[error("{file}: column '{column}' has unsupported type {found}")]
    ColumnType {
        file: String,
        column: String,
        found: String,
    },

    /// A cell in a data file couldn't be parsed
    #[error("Parse error at row {row} in {file}: {reason}")]
    ParseError {
        file: String,
        row: usize,
        reason: String,
    },

    /// A data field had an invalid value
    #[error("Invalid value for {field}: {value}")]
    InvalidValue { field: String, value: String },
}

/// Convenience type alias for Results in this crate
pub type Result<T> = std::result::Result<T, DataLoadError>;
