//! Run manifest: what a run did and when it finished.

use crate::export::ExportError;
use chrono::{DateTime, Utc};
use ipo_model::TrainingMode;
use serde::{Deserialize, Serialize};

/// Metadata of one completed run, written as `run_manifest.json`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RunManifest {
    /// Learner that produced the scores.
    pub mode: TrainingMode,

    /// Why the ranker was abandoned, if it was.
    pub fallback_reason: Option<String>,

    /// Held-out metric of the selected model.
    pub validation_metric: Option<f64>,

    /// Name of the held-out metric.
    pub metric_name: String,

    /// Number of scored issuers.
    pub n_issuers: usize,

    /// Number of sectors.
    pub n_sectors: usize,

    /// Reference year used for `years_since_ipo`.
    pub reference_year: i32,

    /// Random seed of the run.
    pub seed: u64,

    /// Whether `shap_mean_abs.csv` was written.
    pub has_feature_importance: bool,

    /// Completion timestamp.
    pub completed_at: DateTime<Utc>,
}

impl RunManifest {
    /// Convert the manifest to a JSON string.
    pub fn to_json(&self) -> Result<String, ExportError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Parse a manifest from JSON.
    pub fn from_json(json: &str) -> Result<Self, ExportError> {
        Ok(serde_json::from_str(json)?)
    }
}

/// Builder for creating run manifests.
#[derive(Debug, Default)]
pub struct RunManifestBuilder {
    mode: Option<TrainingMode>,
    fallback_reason: Option<String>,
    validation_metric: Option<f64>,
    metric_name: Option<String>,
    n_issuers: usize,
    n_sectors: usize,
    reference_year: Option<i32>,
    seed: Option<u64>,
    has_feature_importance: bool,
    completed_at: Option<DateTime<Utc>>,
}

impl RunManifestBuilder {
    /// Create a new manifest builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the training mode.
    pub const fn mode(mut self, mode: TrainingMode) -> Self {
        self.mode = Some(mode);
        self
    }

    /// Set the fallback reason.
    pub fn fallback_reason(mut self, reason: Option<String>) -> Self {
        self.fallback_reason = reason;
        self
    }

    /// Set the validation metric and its name.
    pub fn validation(mut self, name: &str, value: Option<f64>) -> Self {
        self.metric_name = Some(name.to_string());
        self.validation_metric = value;
        self
    }

    /// Set the issuer count.
    pub const fn n_issuers(mut self, n: usize) -> Self {
        self.n_issuers = n;
        self
    }

    /// Set the sector count.
    pub const fn n_sectors(mut self, n: usize) -> Self {
        self.n_sectors = n;
        self
    }

    /// Set the reference year.
    pub const fn reference_year(mut self, year: i32) -> Self {
        self.reference_year = Some(year);
        self
    }

    /// Set the seed.
    pub const fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Record whether feature importance was produced.
    pub const fn has_feature_importance(mut self, present: bool) -> Self {
        self.has_feature_importance = present;
        self
    }

    /// Set the completion time (defaults to now).
    pub const fn completed_at(mut self, at: DateTime<Utc>) -> Self {
        self.completed_at = Some(at);
        self
    }

    /// Build the manifest.
    pub fn build(self) -> RunManifest {
        RunManifest {
            mode: self.mode.unwrap_or(TrainingMode::Ranker),
            fallback_reason: self.fallback_reason,
            validation_metric: self.validation_metric,
            metric_name: self.metric_name.unwrap_or_default(),
            n_issuers: self.n_issuers,
            n_sectors: self.n_sectors,
            reference_year: self.reference_year.unwrap_or(2025),
            seed: self.seed.unwrap_or(42),
            has_feature_importance: self.has_feature_importance,
            completed_at: self.completed_at.unwrap_or_else(Utc::now),
        }
    }
}
