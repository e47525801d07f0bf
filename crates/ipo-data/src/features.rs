//! Feature construction.
//!
//! Turns issuer records into the fixed, ordered feature matrix used for both
//! training and scoring, the label vector and the sector key of every row.

use crate::error::{DataError, Result};
use crate::record::IssuerRecord;
use ndarray::{Array1, Array2};
use tracing::debug;

/// Number of model features.
pub const N_FEATURES: usize = 8;

/// Feature names in matrix column order.
///
/// This order is part of the model contract and never changes between
/// training and scoring.
pub const FEATURE_NAMES: [&str; N_FEATURES] = [
    "issue_year",
    "issue_price",
    "first_day_close",
    "issue_size_cr",
    "macro_gdp_growth_pct",
    "macro_inflation_pct",
    "macro_unemployment_pct",
    "years_since_ipo",
];

/// Row-aligned features, labels and sector keys.
#[derive(Debug, Clone)]
pub struct FeatureSet {
    features: Array2<f64>,
    labels: Array1<f64>,
    sectors: Vec<String>,
    reference_year: i32,
}

impl FeatureSet {
    /// Build the feature set from issuer records.
    ///
    /// Missing optional fields become `NaN`. `years_since_ipo` is computed
    /// against `reference_year`, never against the current date.
    ///
    /// # Errors
    ///
    /// Returns [`DataError::EmptyInput`] for an empty slice and
    /// [`DataError::NonNumeric`] if a label is not finite.
    pub fn build(records: &[IssuerRecord], reference_year: i32) -> Result<Self> {
        if records.is_empty() {
            return Err(DataError::EmptyInput);
        }

        let mut features = Array2::<f64>::zeros((records.len(), N_FEATURES));
        let mut labels = Array1::<f64>::zeros(records.len());
        let mut sectors = Vec::with_capacity(records.len());

        for (row, record) in records.iter().enumerate() {
            if !record.listing_return_pct.is_finite() {
                return Err(DataError::NonNumeric {
                    column: "listing_return_pct".to_string(),
                    row,
                });
            }

            let values = [
                f64::from(record.issue_year),
                record.issue_price.unwrap_or(f64::NAN),
                record.first_day_close.unwrap_or(f64::NAN),
                record.issue_size_cr.unwrap_or(f64::NAN),
                record.macro_gdp_growth_pct.unwrap_or(f64::NAN),
                record.macro_inflation_pct.unwrap_or(f64::NAN),
                record.macro_unemployment_pct.unwrap_or(f64::NAN),
                f64::from(record.years_since_ipo(reference_year)),
            ];
            for (col, value) in values.into_iter().enumerate() {
                features[[row, col]] = value;
            }
            labels[row] = record.listing_return_pct;
            sectors.push(record.sector.clone());
        }

        debug!(
            rows = records.len(),
            features = N_FEATURES,
            reference_year,
            "built feature set"
        );

        Ok(Self {
            features,
            labels,
            sectors,
            reference_year,
        })
    }

    /// Feature matrix (rows x [`N_FEATURES`]).
    pub const fn features(&self) -> &Array2<f64> {
        &self.features
    }

    /// Label vector (`listing_return_pct`).
    pub const fn labels(&self) -> &Array1<f64> {
        &self.labels
    }

    /// Sector key of every row.
    pub fn sectors(&self) -> &[String] {
        &self.sectors
    }

    /// Reference year used for `years_since_ipo`.
    pub const fn reference_year(&self) -> i32 {
        self.reference_year
    }

    /// Number of rows.
    pub fn n_rows(&self) -> usize {
        self.labels.len()
    }

    /// Feature names in column order.
    pub const fn feature_names(&self) -> &'static [&'static str] {
        &FEATURE_NAMES
    }

    /// Distinct sectors in order of first appearance.
    pub fn distinct_sectors(&self) -> Vec<&str> {
        let mut seen: Vec<&str> = Vec::new();
        for sector in &self.sectors {
            if !seen.contains(&sector.as_str()) {
                seen.push(sector);
            }
        }
        seen
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::RiskTier;
    use approx::assert_relative_eq;

    fn record(name: &str, sector: &str, year: i32, label: f64) -> IssuerRecord {
        IssuerRecord {
            issuer_name: name.to_string(),
            sector: sector.to_string(),
            issue_year: year,
            issue_price: Some(100.0),
            first_day_close: Some(100.0 + label),
            issue_size_cr: None,
            listing_return_pct: label,
            macro_gdp_growth_pct: Some(6.0),
            macro_inflation_pct: Some(5.0),
            macro_unemployment_pct: Some(7.0),
            risk_tier: RiskTier::Moderate,
        }
    }

    #[test]
    fn test_feature_layout() {
        let records = vec![
            record("Acme", "Tech", 2019, 12.5),
            record("Birch", "Energy", 2023, -3.0),
        ];
        let set = FeatureSet::build(&records, 2025).unwrap();

        assert_eq!(set.features().dim(), (2, N_FEATURES));
        assert_relative_eq!(set.features()[[0, 0]], 2019.0);
        assert_relative_eq!(set.features()[[0, 2]], 112.5);
        assert!(set.features()[[0, 3]].is_nan());
        assert_relative_eq!(set.features()[[0, 7]], 6.0);
        assert_relative_eq!(set.features()[[1, 7]], 2.0);
        assert_relative_eq!(set.labels()[1], -3.0);
        assert_eq!(set.sectors(), ["Tech", "Energy"]);
    }

    #[test]
    fn test_reference_year_is_configurable() {
        let records = vec![record("Acme", "Tech", 2019, 1.0)];
        let set = FeatureSet::build(&records, 2030).unwrap();
        assert_relative_eq!(set.features()[[0, 7]], 11.0);
        assert_eq!(set.reference_year(), 2030);
    }

    #[test]
    fn test_empty_records() {
        assert!(matches!(
            FeatureSet::build(&[], 2025),
            Err(DataError::EmptyInput)
        ));
    }

    #[test]
    fn test_non_finite_label() {
        let records = vec![record("Acme", "Tech", 2019, f64::NAN)];
        assert!(matches!(
            FeatureSet::build(&records, 2025),
            Err(DataError::NonNumeric { row: 0, .. })
        ));
    }

    #[test]
    fn test_distinct_sectors_keep_first_appearance() {
        let records = vec![
            record("A", "Tech", 2019, 1.0),
            record("B", "Energy", 2019, 1.0),
            record("C", "Tech", 2019, 1.0),
            record("D", "Banking", 2019, 1.0),
        ];
        let set = FeatureSet::build(&records, 2025).unwrap();
        assert_eq!(set.distinct_sectors(), vec!["Tech", "Energy", "Banking"]);
        assert_eq!(set.feature_names().len(), N_FEATURES);
    }
}
