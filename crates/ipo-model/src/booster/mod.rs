//! Gradient-boosted regression trees.
//!
//! Second-order boosting: every round computes gradients and hessians of the
//! objective at the current predictions and fits one regression tree to them
//! on a seeded row and column subsample.
//!
//! # Prediction
//!
//! `prediction = base_score + Σ leaf_value(tree, row)`, where leaf values
//! already carry the learning rate.

mod objective;
mod tree;

pub use objective::{Objective, PairwiseNdcg, SquaredError};
pub(crate) use objective::relevance_grades;
pub(crate) use tree::goes_left;
pub use tree::{Node, Tree};

use crate::ModelError;
use ndarray::{Array1, Array2, ArrayView1, ArrayView2};
use rand::{SeedableRng, rngs::StdRng, seq::index};
use serde::{Deserialize, Serialize};
use tracing::debug;
use tree::TreeBuilder;

/// Booster hyperparameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoosterParams {
    /// Number of boosting rounds (trees)
    pub n_estimators: usize,
    /// Shrinkage applied to every leaf value
    pub learning_rate: f64,
    /// Maximum tree depth; 0 grows single-leaf trees
    pub max_depth: usize,
    /// Fraction of rows sampled per tree
    pub subsample: f64,
    /// Fraction of features sampled per tree
    pub colsample_bytree: f64,
    /// Minimum hessian sum in each child of a split
    pub min_child_weight: f64,
    /// L2 regularization on leaf weights
    pub reg_lambda: f64,
    /// Minimum gain required to split
    pub gamma: f64,
}

impl BoosterParams {
    /// Defaults for the sector-grouped ranker.
    ///
    /// Pairwise hessians are small, so the child weight floor is far below
    /// the regression default.
    pub const fn ranker_default() -> Self {
        Self {
            n_estimators: 400,
            learning_rate: 0.05,
            max_depth: 5,
            subsample: 0.8,
            colsample_bytree: 0.8,
            min_child_weight: 0.01,
            reg_lambda: 1.0,
            gamma: 0.0,
        }
    }

    /// Defaults for the point-wise regressor.
    pub const fn regressor_default() -> Self {
        Self {
            n_estimators: 600,
            learning_rate: 0.05,
            max_depth: 6,
            subsample: 0.8,
            colsample_bytree: 0.8,
            min_child_weight: 1.0,
            reg_lambda: 1.0,
            gamma: 0.0,
        }
    }

    /// Check every value is in range.
    pub fn validate(&self) -> Result<(), ModelError> {
        let invalid = |msg: String| Err(ModelError::InvalidParameter(msg));

        if self.n_estimators == 0 {
            return invalid("n_estimators must be at least 1".to_string());
        }
        if !(self.learning_rate > 0.0 && self.learning_rate <= 1.0) {
            return invalid(format!(
                "learning_rate {} (should be 0 < lr <= 1)",
                self.learning_rate
            ));
        }
        if !(self.subsample > 0.0 && self.subsample <= 1.0) {
            return invalid(format!("subsample {} (should be in (0, 1])", self.subsample));
        }
        if !(self.colsample_bytree > 0.0 && self.colsample_bytree <= 1.0) {
            return invalid(format!(
                "colsample_bytree {} (should be in (0, 1])",
                self.colsample_bytree
            ));
        }
        if !(self.min_child_weight >= 0.0 && self.reg_lambda >= 0.0 && self.gamma >= 0.0) {
            return invalid(
                "min_child_weight, reg_lambda and gamma must be non-negative".to_string(),
            );
        }
        Ok(())
    }
}

impl Default for BoosterParams {
    fn default() -> Self {
        Self::regressor_default()
    }
}

/// Number of items kept when sampling `fraction` of `n`, at least one.
fn sample_size(n: usize, fraction: f64) -> usize {
    ((n as f64 * fraction).round() as usize).clamp(1, n.max(1))
}

/// A fitted tree ensemble.
#[derive(Debug, Clone)]
pub struct Booster {
    base_score: f64,
    trees: Vec<Tree>,
    n_features: usize,
    objective: &'static str,
}

impl Booster {
    /// Fit an ensemble to `features` and `labels` under `objective`.
    ///
    /// # Errors
    /// Returns an error for invalid parameters, mismatched dimensions, an
    /// empty training set, or non-finite gradients or predictions.
    pub fn fit<O: Objective>(
        params: &BoosterParams,
        objective: &O,
        features: ArrayView2<'_, f64>,
        labels: ArrayView1<'_, f64>,
        seed: u64,
    ) -> Result<Self, ModelError> {
        params.validate()?;
        let (n_rows, n_features) = features.dim();
        if n_rows == 0 || n_features == 0 {
            return Err(ModelError::EmptyTrainingSet);
        }
        if labels.len() != n_rows {
            return Err(ModelError::DimensionMismatch {
                expected: n_rows,
                actual: labels.len(),
            });
        }

        let base_score = objective.base_score(labels);
        let mut predictions = vec![base_score; n_rows];
        let mut grad = vec![0.0; n_rows];
        let mut hess = vec![0.0; n_rows];
        let mut trees = Vec::with_capacity(params.n_estimators);
        let mut rng = StdRng::seed_from_u64(seed);

        let n_sampled_rows = sample_size(n_rows, params.subsample);
        let n_sampled_cols = sample_size(n_features, params.colsample_bytree);

        for round in 0..params.n_estimators {
            objective.gradients(&predictions, labels, &mut grad, &mut hess);
            if grad.iter().chain(&hess).any(|v| !v.is_finite()) {
                return Err(ModelError::NonFinite(format!("gradients at round {round}")));
            }

            let mut rows = index::sample(&mut rng, n_rows, n_sampled_rows).into_vec();
            rows.sort_unstable();
            let mut columns = index::sample(&mut rng, n_features, n_sampled_cols).into_vec();
            columns.sort_unstable();

            let tree =
                TreeBuilder::new(params, features.view(), &grad, &hess, &columns).build(rows);
            for (i, prediction) in predictions.iter_mut().enumerate() {
                *prediction += tree.predict_row(features.row(i));
            }
            if predictions.iter().any(|p| !p.is_finite()) {
                return Err(ModelError::NonFinite(format!(
                    "predictions at round {round}"
                )));
            }
            trees.push(tree);
        }

        debug!(
            objective = objective.name(),
            trees = trees.len(),
            rows = n_rows,
            base_score,
            "fitted booster"
        );

        Ok(Self {
            base_score,
            trees,
            n_features,
            objective: objective.name(),
        })
    }

    /// Prediction for one row.
    pub fn predict_row(&self, row: ArrayView1<'_, f64>) -> f64 {
        self.base_score + self.trees.iter().map(|t| t.predict_row(row)).sum::<f64>()
    }

    /// Predictions for every row of `features`.
    pub fn predict(&self, features: &Array2<f64>) -> Result<Array1<f64>, ModelError> {
        if features.ncols() != self.n_features {
            return Err(ModelError::DimensionMismatch {
                expected: self.n_features,
                actual: features.ncols(),
            });
        }
        Ok(features
            .rows()
            .into_iter()
            .map(|row| self.predict_row(row))
            .collect())
    }

    /// Initial prediction shared by every row.
    pub const fn base_score(&self) -> f64 {
        self.base_score
    }

    /// Fitted trees in boosting order.
    pub fn trees(&self) -> &[Tree] {
        &self.trees
    }

    /// Number of features the ensemble was fitted on.
    pub const fn n_features(&self) -> usize {
        self.n_features
    }

    /// Name of the objective the ensemble was fitted with.
    pub const fn objective(&self) -> &'static str {
        self.objective
    }
}
