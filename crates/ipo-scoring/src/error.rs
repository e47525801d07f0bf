//! Error types for normalization, ranking and aggregation.

use thiserror::Error;

/// Result type for scoring operations.
pub type Result<T> = std::result::Result<T, ScoringError>;

/// Errors that can occur while scoring or aggregating issuers.
#[derive(Debug, Error)]
pub enum ScoringError {
    /// Row-aligned inputs have different lengths
    #[error("Length mismatch: expected {expected} rows, got {actual}")]
    LengthMismatch {
        /// Rows expected
        expected: usize,
        /// Rows supplied
        actual: usize,
    },

    /// Nothing to score or aggregate
    #[error("No issuers to score")]
    EmptyInput,

    /// A sector has no issuers
    #[error("Sector '{0}' has no issuers")]
    EmptySector(String),

    /// A raw score is NaN or infinite
    #[error("Non-finite raw score at row {row}")]
    NonFiniteScore {
        /// Offending row
        row: usize,
    },
}
