//! Ranker-first model training with regression fallback.
//!
//! The trainer first fits a pairwise NDCG ranker with each sector as one
//! ranking group. If the grouped split is infeasible or the ranking fit
//! fails, the reason is recorded and a squared-error regressor is fitted on
//! the same features and labels instead. Either way the selected model
//! scores the full feature matrix.

use crate::booster::{Booster, BoosterParams, PairwiseNdcg, SquaredError};
use crate::metrics::{mean_group_ndcg, rmse};
use crate::split::{GroupKFold, GroupSplit, contiguous_groups};
use crate::ModelError;
use derive_more::Display;
use ipo_data::FeatureSet;
use ndarray::{Array1, Array2, Axis};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

/// Which learner produced the raw scores.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrainingMode {
    /// Pairwise learning-to-rank model grouped by sector
    #[display("ranker")]
    Ranker,
    /// Point-wise squared-error regression model
    #[display("regressor")]
    Regressor,
}

/// Why the ranking attempt was abandoned.
#[derive(Debug, Error)]
pub enum RankerError {
    /// The grouped train/validation split could not be formed
    #[error("grouped split infeasible: {0}")]
    Split(#[source] ModelError),

    /// The ranking objective or booster failed
    #[error("ranking fit failed: {0}")]
    Fit(#[source] ModelError),
}

/// Trainer settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainerConfig {
    /// Upper bound on the number of grouped folds
    pub fold_cap: usize,
    /// Seed for row and column subsampling
    pub seed: u64,
    /// Ranker hyperparameters
    pub ranker: BoosterParams,
    /// Regressor hyperparameters
    pub regressor: BoosterParams,
}

impl Default for TrainerConfig {
    fn default() -> Self {
        Self {
            fold_cap: 3,
            seed: 42,
            ranker: BoosterParams::ranker_default(),
            regressor: BoosterParams::regressor_default(),
        }
    }
}

impl TrainerConfig {
    /// Check every setting is usable.
    pub fn validate(&self) -> Result<(), ModelError> {
        if self.fold_cap < 2 {
            return Err(ModelError::InvalidParameter(format!(
                "fold_cap {} (should be at least 2)",
                self.fold_cap
            )));
        }
        self.ranker.validate()?;
        self.regressor.validate()
    }
}

/// Diagnostics of one training run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrainingReport {
    /// Why the ranker was abandoned, if it was
    pub fallback_reason: Option<String>,
    /// Held-out metric of the selected model; `None` without a validation fold
    pub validation_metric: Option<f64>,
    /// Name of the held-out metric (`ndcg` or `rmse`)
    pub metric_name: &'static str,
    /// Rows the model was fitted on
    pub n_train: usize,
    /// Rows held out for validation
    pub n_validation: usize,
}

/// Result of training: the selected mode, its model and the raw scores of
/// every row of the feature set.
#[derive(Debug, Clone)]
pub struct Trained {
    /// Learner that produced the model
    pub mode: TrainingMode,
    /// Fitted ensemble
    pub model: Booster,
    /// Raw model output for every row, in feature set order
    pub raw_scores: Array1<f64>,
    /// Training diagnostics
    pub report: TrainingReport,
}

/// Fits the ranker, falling back to the regressor.
#[derive(Debug, Clone)]
pub struct ModelTrainer {
    config: TrainerConfig,
}

impl ModelTrainer {
    /// Create a trainer.
    ///
    /// # Errors
    /// Returns [`ModelError::InvalidParameter`] for an invalid configuration.
    pub fn new(config: TrainerConfig) -> Result<Self, ModelError> {
        config.validate()?;
        Ok(Self { config })
    }

    /// Trainer settings.
    pub const fn config(&self) -> &TrainerConfig {
        &self.config
    }

    /// Train on `set` and score every row.
    ///
    /// A ranker failure is not an error; only a failing regressor is.
    pub fn train(&self, set: &FeatureSet) -> Result<Trained, ModelError> {
        let split = self.split(set);

        let ranked = match &split {
            Ok(split) => self.fit_ranker(set, split).map_err(RankerError::Fit),
            Err(err) => Err(RankerError::Split(err.clone())),
        };

        let (mode, model, report) = match ranked {
            Ok((model, report)) => (TrainingMode::Ranker, model, report),
            Err(reason) => {
                warn!(%reason, "ranker failed, using regressor");
                let (model, mut report) = self.fit_regressor(set, split.as_ref().ok())?;
                report.fallback_reason = Some(reason.to_string());
                (TrainingMode::Regressor, model, report)
            }
        };

        let raw_scores = model.predict(set.features())?;
        info!(
            %mode,
            n_train = report.n_train,
            n_validation = report.n_validation,
            metric = report.metric_name,
            validation_metric = ?report.validation_metric,
            "trained model"
        );

        Ok(Trained {
            mode,
            model,
            raw_scores,
            report,
        })
    }

    fn split(&self, set: &FeatureSet) -> Result<GroupSplit, ModelError> {
        let n_groups = set.distinct_sectors().len();
        GroupKFold::capped(self.config.fold_cap, n_groups)?.first_split(set.sectors())
    }

    fn fit_ranker(
        &self,
        set: &FeatureSet,
        split: &GroupSplit,
    ) -> Result<(Booster, TrainingReport), ModelError> {
        let (rows, sizes) = contiguous_groups(&split.train, set.sectors());
        let (x, y) = select_rows(set, &rows);
        let objective = PairwiseNdcg::new(y.view(), &sizes)?;
        let model = Booster::fit(
            &self.config.ranker,
            &objective,
            x.view(),
            y.view(),
            self.config.seed,
        )?;

        let validation_metric = if split.validation.is_empty() {
            None
        } else {
            let (xv, yv) = select_rows(set, &split.validation);
            let preds = model.predict(&xv)?;
            let groups: Vec<String> = split
                .validation
                .iter()
                .map(|&r| set.sectors()[r].clone())
                .collect();
            mean_group_ndcg(&preds.to_vec(), &yv.to_vec(), &groups)
        };

        Ok((
            model,
            TrainingReport {
                fallback_reason: None,
                validation_metric,
                metric_name: "ndcg",
                n_train: rows.len(),
                n_validation: split.validation.len(),
            },
        ))
    }

    /// Fit the regressor on the training fold, or on every row when the
    /// grouped split is infeasible.
    fn fit_regressor(
        &self,
        set: &FeatureSet,
        split: Option<&GroupSplit>,
    ) -> Result<(Booster, TrainingReport), ModelError> {
        let all_rows: Vec<usize> = (0..set.n_rows()).collect();
        let (train_rows, validation_rows) = match split {
            Some(s) => (s.train.as_slice(), s.validation.as_slice()),
            None => (all_rows.as_slice(), &[][..]),
        };

        let (x, y) = select_rows(set, train_rows);
        let model = Booster::fit(
            &self.config.regressor,
            &SquaredError,
            x.view(),
            y.view(),
            self.config.seed,
        )?;

        let validation_metric = if validation_rows.is_empty() {
            None
        } else {
            let (xv, yv) = select_rows(set, validation_rows);
            let preds = model.predict(&xv)?;
            rmse(&preds.to_vec(), &yv.to_vec())
        };

        Ok((
            model,
            TrainingReport {
                fallback_reason: None,
                validation_metric,
                metric_name: "rmse",
                n_train: train_rows.len(),
                n_validation: validation_rows.len(),
            },
        ))
    }
}

fn select_rows(set: &FeatureSet, rows: &[usize]) -> (Array2<f64>, Array1<f64>) {
    (
        set.features().select(Axis(0), rows),
        set.labels().select(Axis(0), rows),
    )
}
