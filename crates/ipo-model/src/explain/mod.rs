//! Global feature importance from TreeSHAP attributions.
//!
//! Attribution is optional output: [`explain`] turns every failure into
//! `None` and a warning, so callers decide how to report missing importance.

mod tree_shap;

pub use tree_shap::{expected_value, tree_shap};

use crate::booster::Booster;
use ndarray::{Array2, Axis};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

/// Errors that stop feature attribution.
#[derive(Debug, Error)]
pub enum AttributionError {
    /// No rows to attribute
    #[error("No rows to attribute")]
    Empty,

    /// Feature matrix width differs from the model's
    #[error("Model expects {expected} features, got {actual}")]
    DimensionMismatch {
        /// Features the model was fitted on
        expected: usize,
        /// Columns supplied
        actual: usize,
    },

    /// Number of feature names differs from the matrix width
    #[error("{names} feature names for {columns} columns")]
    NameMismatch {
        /// Names supplied
        names: usize,
        /// Columns in the matrix
        columns: usize,
    },

    /// Attributions do not add up to the prediction
    #[error("Attributions for row {row} miss the prediction by {gap}")]
    Additivity {
        /// Offending row
        row: usize,
        /// Absolute gap between attribution sum and prediction
        gap: f64,
    },

    /// An attribution became NaN or infinite
    #[error("Non-finite attribution for row {row}")]
    NonFinite {
        /// Offending row
        row: usize,
    },
}

/// Mean absolute attribution of one feature.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureImportance {
    /// Feature name
    pub feature: String,
    /// Mean of `|attribution|` over all rows
    pub mean_abs_shap: f64,
}

/// Mean absolute attribution per feature, sorted descending.
///
/// Ties keep feature column order.
pub fn mean_abs_attribution(
    model: &Booster,
    features: &Array2<f64>,
    names: &[&str],
) -> Result<Vec<FeatureImportance>, AttributionError> {
    if names.len() != features.ncols() {
        return Err(AttributionError::NameMismatch {
            names: names.len(),
            columns: features.ncols(),
        });
    }

    let values = tree_shap(model, features)?;
    let mean_abs = values.mapv(f64::abs).mean_axis(Axis(0)).ok_or(AttributionError::Empty)?;

    let mut importance: Vec<FeatureImportance> = names
        .iter()
        .zip(mean_abs.iter())
        .map(|(name, &value)| FeatureImportance {
            feature: (*name).to_string(),
            mean_abs_shap: value,
        })
        .collect();
    importance.sort_by(|a, b| b.mean_abs_shap.total_cmp(&a.mean_abs_shap));
    Ok(importance)
}

/// Feature importance, or `None` (with a warning) if attribution fails.
pub fn explain(
    model: &Booster,
    features: &Array2<f64>,
    names: &[&str],
) -> Option<Vec<FeatureImportance>> {
    match mean_abs_attribution(model, features, names) {
        Ok(importance) => {
            info!(features = importance.len(), "computed feature importance");
            Some(importance)
        }
        Err(err) => {
            warn!(%err, "feature attribution skipped");
            None
        }
    }
}
