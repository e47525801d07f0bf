//! The priority scoring pipeline.
//!
//! Stages run strictly downstream: features, grouped split and training,
//! per-sector normalization and ranking, sector aggregation, then optional
//! feature attribution. Each stage produces a new value; nothing is written
//! until every stage has succeeded.

use crate::config::PipelineConfig;
use crate::error::PipelineError;
use ipo_data::{FeatureSet, IssuerRecord, load_issuers};
use ipo_model::{FeatureImportance, ModelTrainer, TrainingMode, TrainingReport, explain};
use ipo_output::{
    ArtifactSet, ArtifactWriter, RunManifest, RunManifestBuilder, ScoredIssuerRow,
    SectorSummaryRow, WrittenArtifacts,
};
use ipo_scoring::{ScoredIssuer, SectorSummary, aggregate_sectors, score_issuers};
use std::path::Path;
use tracing::info;

/// In-memory result of scoring an issuer table.
#[derive(Debug, Clone)]
pub struct PipelineOutput {
    /// Scored issuers in input order
    pub scored: Vec<ScoredIssuer>,
    /// Sector summaries ordered by priority
    pub sectors: Vec<SectorSummary>,
    /// Global feature importance, if attribution succeeded
    pub importance: Option<Vec<FeatureImportance>>,
    /// Learner that produced the raw scores
    pub mode: TrainingMode,
    /// Training diagnostics
    pub report: TrainingReport,
}

/// Result of a run that wrote its artifacts.
#[derive(Debug, Clone)]
pub struct RunOutcome {
    /// Scored tables
    pub output: PipelineOutput,
    /// Manifest that was written
    pub manifest: RunManifest,
    /// Paths of the written artifacts
    pub written: WrittenArtifacts,
}

/// Configured pipeline.
#[derive(Debug, Clone)]
pub struct Pipeline {
    config: PipelineConfig,
    trainer: ModelTrainer,
}

impl Pipeline {
    /// Create a pipeline.
    ///
    /// # Errors
    /// Returns [`PipelineError::Config`] for an invalid configuration.
    pub fn new(config: PipelineConfig) -> Result<Self, PipelineError> {
        config.validate()?;
        let trainer = ModelTrainer::new(config.trainer_config())?;
        Ok(Self { config, trainer })
    }

    /// Active configuration.
    pub const fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Score `records` without touching the disk.
    pub fn score(&self, records: &[IssuerRecord]) -> Result<PipelineOutput, PipelineError> {
        let features = FeatureSet::build(records, self.config.reference_year)?;
        info!(
            issuers = features.n_rows(),
            sectors = features.distinct_sectors().len(),
            "built features"
        );

        let trained = self.trainer.train(&features)?;
        let raw_scores = trained.raw_scores.to_vec();

        let scored = score_issuers(records, &raw_scores)?;
        let sectors = aggregate_sectors(&scored)?;
        let importance = explain(&trained.model, features.features(), features.feature_names());

        Ok(PipelineOutput {
            scored,
            sectors,
            importance,
            mode: trained.mode,
            report: trained.report,
        })
    }

    /// Read `input`, score it and replace the artifacts in `output_dir`.
    ///
    /// Any failure before the write leaves existing artifacts untouched.
    pub fn run(&self, input: &Path, output_dir: &Path) -> Result<RunOutcome, PipelineError> {
        let records = load_issuers(input)?;

        let output = self.score(&records)?;
        let manifest = RunManifestBuilder::new()
            .mode(output.mode)
            .fallback_reason(output.report.fallback_reason.clone())
            .validation(output.report.metric_name, output.report.validation_metric)
            .n_issuers(output.scored.len())
            .n_sectors(output.sectors.len())
            .reference_year(self.config.reference_year)
            .seed(self.config.seed)
            .has_feature_importance(output.importance.is_some())
            .build();

        let set = ArtifactSet {
            scored: output.scored.iter().map(ScoredIssuerRow::from).collect(),
            sectors: output.sectors.iter().map(SectorSummaryRow::from).collect(),
            importance: output.importance.clone(),
            manifest: manifest.clone(),
        };
        let written = ArtifactWriter::new(output_dir).write(&set)?;
        info!(
            mode = %output.mode,
            scored = %written.scored.display(),
            sectors = %written.sectors.display(),
            importance = written.importance.is_some(),
            "run complete"
        );

        Ok(RunOutcome {
            output,
            manifest,
            written,
        })
    }
}
