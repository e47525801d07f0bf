//! Pipeline errors and their classification.

use crate::config::ConfigError;
use ipo_data::DataError;
use ipo_model::ModelError;
use ipo_output::ExportError;
use ipo_scoring::ScoringError;
use thiserror::Error;

/// Errors that abort a pipeline run.
///
/// No artifact is replaced when a run fails with any of these.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Invalid configuration
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Input could not be read or coerced
    #[error("Input error: {0}")]
    Data(#[from] DataError),

    /// The fallback regressor could not be trained
    #[error("Model error: {0}")]
    Model(#[from] ModelError),

    /// Normalization, ranking or aggregation failed
    #[error("Scoring error: {0}")]
    Scoring(#[from] ScoringError),

    /// Artifacts could not be written
    #[error("Export error: {0}")]
    Export(#[from] ExportError),
}

impl PipelineError {
    /// Input missing, or required columns missing or non-numeric.
    pub const fn is_input_fatal(&self) -> bool {
        matches!(self, Self::Data(e) if !matches!(e, DataError::EmptyInput))
    }

    /// Empty input table or a sector without issuers.
    pub const fn is_aggregation_fatal(&self) -> bool {
        matches!(
            self,
            Self::Data(DataError::EmptyInput)
                | Self::Scoring(ScoringError::EmptyInput | ScoringError::EmptySector(_))
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_classification() {
        let missing: PipelineError = DataError::InputMissing {
            path: PathBuf::from("ipo.csv"),
        }
        .into();
        assert!(missing.is_input_fatal());
        assert!(!missing.is_aggregation_fatal());

        let empty: PipelineError = DataError::EmptyInput.into();
        assert!(!empty.is_input_fatal());
        assert!(empty.is_aggregation_fatal());

        let sector: PipelineError = ScoringError::EmptySector("Tech".to_string()).into();
        assert!(sector.is_aggregation_fatal());

        let model: PipelineError = ModelError::EmptyTrainingSet.into();
        assert!(!model.is_input_fatal());
        assert!(!model.is_aggregation_fatal());
    }
}
