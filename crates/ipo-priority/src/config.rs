//! Pipeline configuration.
//!
//! Defaults reproduce the production constants. A TOML file may override any
//! subset of fields, including single booster parameters:
//!
//! ```toml
//! reference_year = 2026
//!
//! [ranker]
//! n_estimators = 200
//! ```

use ipo_model::{BoosterParams, ModelError, TrainerConfig};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Config file could not be read
    #[error("Cannot read config file {}: {source}", path.display())]
    Read {
        /// Config file path
        path: PathBuf,
        /// Underlying IO error
        source: std::io::Error,
    },

    /// Config file is not valid TOML for this structure
    #[error("Invalid config file: {0}")]
    Parse(#[from] toml::de::Error),

    /// A value is out of range
    #[error("Invalid configuration: {0}")]
    Invalid(#[from] ModelError),
}

/// Everything a run depends on besides its input.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineConfig {
    /// Year `years_since_ipo` is measured against
    pub reference_year: i32,
    /// Upper bound on the number of grouped folds
    pub fold_cap: usize,
    /// Random seed for subsampling
    pub seed: u64,
    /// Ranker hyperparameters
    pub ranker: BoosterParams,
    /// Regressor hyperparameters
    pub regressor: BoosterParams,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            reference_year: 2025,
            fold_cap: 3,
            seed: 42,
            ranker: BoosterParams::ranker_default(),
            regressor: BoosterParams::regressor_default(),
        }
    }
}

impl PipelineConfig {
    /// Load defaults overridden by the TOML file at `path`.
    pub fn from_toml_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    /// Parse defaults overridden by TOML `content`.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let file: ConfigFile = toml::from_str(content)?;
        let config = file.apply(Self::default());
        config.validate()?;
        Ok(config)
    }

    /// Check every value is in range.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.trainer_config().validate()?;
        Ok(())
    }

    /// Settings handed to the model trainer.
    pub fn trainer_config(&self) -> TrainerConfig {
        TrainerConfig {
            fold_cap: self.fold_cap,
            seed: self.seed,
            ranker: self.ranker.clone(),
            regressor: self.regressor.clone(),
        }
    }
}

/// On-disk form: every field optional.
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct ConfigFile {
    reference_year: Option<i32>,
    fold_cap: Option<usize>,
    seed: Option<u64>,
    ranker: BoosterOverrides,
    regressor: BoosterOverrides,
}

impl ConfigFile {
    fn apply(self, base: PipelineConfig) -> PipelineConfig {
        PipelineConfig {
            reference_year: self.reference_year.unwrap_or(base.reference_year),
            fold_cap: self.fold_cap.unwrap_or(base.fold_cap),
            seed: self.seed.unwrap_or(base.seed),
            ranker: self.ranker.apply(base.ranker),
            regressor: self.regressor.apply(base.regressor),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct BoosterOverrides {
    n_estimators: Option<usize>,
    learning_rate: Option<f64>,
    max_depth: Option<usize>,
    subsample: Option<f64>,
    colsample_bytree: Option<f64>,
    min_child_weight: Option<f64>,
    reg_lambda: Option<f64>,
    gamma: Option<f64>,
}

impl BoosterOverrides {
    fn apply(self, base: BoosterParams) -> BoosterParams {
        BoosterParams {
            n_estimators: self.n_estimators.unwrap_or(base.n_estimators),
            learning_rate: self.learning_rate.unwrap_or(base.learning_rate),
            max_depth: self.max_depth.unwrap_or(base.max_depth),
            subsample: self.subsample.unwrap_or(base.subsample),
            colsample_bytree: self.colsample_bytree.unwrap_or(base.colsample_bytree),
            min_child_weight: self.min_child_weight.unwrap_or(base.min_child_weight),
            reg_lambda: self.reg_lambda.unwrap_or(base.reg_lambda),
            gamma: self.gamma.unwrap_or(base.gamma),
        }
    }
}
