//! Artifact rows and CSV/JSON export.
//!
//! The CSV writer cannot flatten nested structs, so every artifact has a flat
//! row type whose field names are the published column names.

use ipo_data::{IssuerRecord, RiskTier};
use ipo_model::FeatureImportance;
use ipo_scoring::{ScoredIssuer, SectorSummary};
use serde::{Deserialize, Serialize};
use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur during export or read-back.
#[derive(Debug, Error)]
pub enum ExportError {
    /// CSV serialization error.
    #[error("CSV serialization error: {0}")]
    Csv(#[from] csv::Error),

    /// JSON serialization error.
    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// A required artifact has not been produced yet.
    #[error("Artifact {name} not found at {}; run the pipeline first", path.display())]
    ArtifactMissing {
        /// Artifact file name.
        name: &'static str,
        /// Path that was looked up.
        path: PathBuf,
    },
}

impl ExportError {
    /// Whether this is the "run the pipeline first" precondition failure.
    pub const fn is_artifact_missing(&self) -> bool {
        matches!(self, Self::ArtifactMissing { .. })
    }
}

/// Export format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    /// Comma-separated values format, as the artifacts are written.
    Csv,

    /// Pretty-printed JSON array of row objects.
    Json,
}

/// One row of `priority_xgb_sector.csv`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScoredIssuerRow {
    /// Issuer identifier.
    pub issuer_name: String,
    /// Sector.
    pub sector: String,
    /// Year of the issuance.
    pub issue_year: i32,
    /// Offer price.
    pub issue_price: Option<f64>,
    /// Close on the first listing day.
    pub first_day_close: Option<f64>,
    /// Offering size (crore).
    pub issue_size_cr: Option<f64>,
    /// First-day listing return in percent.
    pub listing_return_pct: f64,
    /// GDP growth at issuance.
    pub macro_gdp_growth_pct: Option<f64>,
    /// Inflation at issuance.
    pub macro_inflation_pct: Option<f64>,
    /// Unemployment at issuance.
    pub macro_unemployment_pct: Option<f64>,
    /// Risk tier.
    pub risk_tier: RiskTier,
    /// Raw model output.
    pub xgb_score: f64,
    /// Priority score within the sector.
    pub priority_score_0_100: f64,
    /// Dense rank within the sector.
    pub sector_rank: u32,
}

impl From<&ScoredIssuer> for ScoredIssuerRow {
    fn from(scored: &ScoredIssuer) -> Self {
        let r = &scored.record;
        Self {
            issuer_name: r.issuer_name.clone(),
            sector: r.sector.clone(),
            issue_year: r.issue_year,
            issue_price: r.issue_price,
            first_day_close: r.first_day_close,
            issue_size_cr: r.issue_size_cr,
            listing_return_pct: r.listing_return_pct,
            macro_gdp_growth_pct: r.macro_gdp_growth_pct,
            macro_inflation_pct: r.macro_inflation_pct,
            macro_unemployment_pct: r.macro_unemployment_pct,
            risk_tier: r.risk_tier,
            xgb_score: scored.xgb_score,
            priority_score_0_100: scored.priority_score_0_100,
            sector_rank: scored.sector_rank,
        }
    }
}

impl From<ScoredIssuerRow> for ScoredIssuer {
    fn from(row: ScoredIssuerRow) -> Self {
        Self {
            record: IssuerRecord {
                issuer_name: row.issuer_name,
                sector: row.sector,
                issue_year: row.issue_year,
                issue_price: row.issue_price,
                first_day_close: row.first_day_close,
                issue_size_cr: row.issue_size_cr,
                listing_return_pct: row.listing_return_pct,
                macro_gdp_growth_pct: row.macro_gdp_growth_pct,
                macro_inflation_pct: row.macro_inflation_pct,
                macro_unemployment_pct: row.macro_unemployment_pct,
                risk_tier: row.risk_tier,
            },
            xgb_score: row.xgb_score,
            priority_score_0_100: row.priority_score_0_100,
            sector_rank: row.sector_rank,
        }
    }
}

/// One row of `sector_summary.csv`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SectorSummaryRow {
    /// Sector name (the table index).
    pub sector: String,
    /// Mean priority score.
    pub sector_priority: f64,
    /// Number of issuers.
    pub n_ipo: usize,
    /// Mean listing return.
    pub mean_return: f64,
    /// Median listing return.
    pub median_return: f64,
    /// Share of low-risk issuers.
    #[serde(rename = "Low_pct")]
    pub low_pct: f64,
    /// Share of moderate-risk issuers.
    #[serde(rename = "Moderate_pct")]
    pub moderate_pct: f64,
    /// Share of high-risk issuers.
    #[serde(rename = "High_pct")]
    pub high_pct: f64,
}

impl From<&SectorSummary> for SectorSummaryRow {
    fn from(s: &SectorSummary) -> Self {
        Self {
            sector: s.sector.clone(),
            sector_priority: s.sector_priority,
            n_ipo: s.n_ipo,
            mean_return: s.mean_return,
            median_return: s.median_return,
            low_pct: s.low_pct,
            moderate_pct: s.moderate_pct,
            high_pct: s.high_pct,
        }
    }
}

impl From<SectorSummaryRow> for SectorSummary {
    fn from(row: SectorSummaryRow) -> Self {
        Self {
            sector: row.sector,
            sector_priority: row.sector_priority,
            n_ipo: row.n_ipo,
            mean_return: row.mean_return,
            median_return: row.median_return,
            low_pct: row.low_pct,
            moderate_pct: row.moderate_pct,
            high_pct: row.high_pct,
        }
    }
}

/// Trait for exporting data in various formats.
pub trait Exporter {
    /// Export data to a string in the specified format.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    fn export_to_string(&self, format: ExportFormat) -> Result<String, ExportError>;
}

fn rows_to_string<T: Serialize>(rows: &[T], format: ExportFormat) -> Result<String, ExportError> {
    match format {
        ExportFormat::Csv => {
            let mut wtr = csv::Writer::from_writer(vec![]);
            for row in rows {
                wtr.serialize(row)?;
            }
            let bytes = wtr.into_inner().map_err(|e| e.into_error())?;
            String::from_utf8(bytes)
                .map_err(|e| ExportError::Io(io::Error::new(io::ErrorKind::InvalidData, e)))
        }
        ExportFormat::Json => Ok(serde_json::to_string_pretty(rows)?),
    }
}

impl Exporter for [ScoredIssuerRow] {
    fn export_to_string(&self, format: ExportFormat) -> Result<String, ExportError> {
        rows_to_string(self, format)
    }
}

impl Exporter for [SectorSummaryRow] {
    fn export_to_string(&self, format: ExportFormat) -> Result<String, ExportError> {
        rows_to_string(self, format)
    }
}

impl Exporter for [FeatureImportance] {
    fn export_to_string(&self, format: ExportFormat) -> Result<String, ExportError> {
        rows_to_string(self, format)
    }
}
