#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/ipo-priority/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod booster;
pub mod explain;
pub mod metrics;
pub mod split;
pub mod trainer;

use thiserror::Error;

// Re-export main types
pub use booster::{Booster, BoosterParams, Node, Objective, PairwiseNdcg, SquaredError, Tree};
pub use explain::{AttributionError, FeatureImportance, explain, mean_abs_attribution, tree_shap};
pub use split::{GroupKFold, GroupSplit, contiguous_groups};
pub use trainer::{ModelTrainer, RankerError, Trained, TrainerConfig, TrainingMode, TrainingReport};

/// Errors that can occur during splitting, fitting or prediction
#[derive(Debug, Clone, Error)]
pub enum ModelError {
    /// Invalid hyperparameter or configuration value
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// Matrix or vector dimensions disagree
    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch {
        /// Expected dimension
        expected: usize,
        /// Actual dimension
        actual: usize,
    },

    /// No rows to train on
    #[error("Training set is empty")]
    EmptyTrainingSet,

    /// Fewer than two folds requested
    #[error("Grouped split needs at least 2 folds, got {0}")]
    TooFewFolds(usize),

    /// More folds requested than there are groups
    #[error("Cannot split {n_groups} groups into {n_folds} folds")]
    TooFewGroups {
        /// Requested folds
        n_folds: usize,
        /// Distinct groups available
        n_groups: usize,
    },

    /// Ranking group sizes do not describe the training rows
    #[error("Invalid ranking groups: {0}")]
    InvalidGroups(String),

    /// No group holds two issuers with different labels
    #[error("No ranking group has two issuers with different labels")]
    NoComparablePairs,

    /// A gradient or prediction became NaN or infinite
    #[error("Non-finite value during {0}")]
    NonFinite(String),
}
