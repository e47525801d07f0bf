//! Error types for input loading and feature construction.

use std::path::PathBuf;
use thiserror::Error;

/// Result type for data operations.
pub type Result<T> = std::result::Result<T, DataError>;

/// Errors that can occur while reading issuers or building features.
///
/// Every variant is input-fatal: the run aborts before any artifact is written.
#[derive(Debug, Error)]
pub enum DataError {
    /// Input file does not exist
    #[error("Input file not found: {}", path.display())]
    InputMissing {
        /// Path that was looked up
        path: PathBuf,
    },

    /// Required column absent after renaming source spellings
    #[error("Missing required column: {0}")]
    MissingColumn(String),

    /// A cell holds a value that cannot be coerced to a number
    #[error("Non-numeric value in column {column} at data row {row}")]
    NonNumeric {
        /// Canonical column name
        column: String,
        /// Zero-based data row index
        row: usize,
    },

    /// A cell that must be populated is empty
    #[error("Missing value in column {column} at data row {row}")]
    MissingValue {
        /// Canonical column name
        column: String,
        /// Zero-based data row index
        row: usize,
    },

    /// Unknown risk tier spelling
    #[error("Invalid risk tier {value:?} at data row {row} (expected Low, Moderate or High)")]
    InvalidRiskTier {
        /// Zero-based data row index
        row: usize,
        /// Offending value
        value: String,
    },

    /// Input table has no data rows
    #[error("Input table is empty")]
    EmptyInput,

    /// Polars error
    #[error("Polars error: {0}")]
    Polars(#[from] polars::prelude::PolarsError),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
