//! Issuers with their raw score, priority score and sector rank.

use crate::error::{Result, ScoringError};
use crate::normalize::normalize_within_sectors;
use crate::rank::dense_rank_within_sectors;
use ipo_data::IssuerRecord;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::info;

/// One issuer after scoring.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredIssuer {
    /// The input record, unchanged.
    pub record: IssuerRecord,

    /// Raw model output.
    pub xgb_score: f64,

    /// Raw score rescaled to `[0, 100]` within the sector, two decimals.
    pub priority_score_0_100: f64,

    /// Dense rank within the sector, 1 = highest priority.
    pub sector_rank: u32,
}

impl fmt::Display for ScoredIssuer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "#{} {} ({}, {}): priority {:.2}, listing return {:.2}%",
            self.sector_rank,
            self.record.issuer_name,
            self.record.sector,
            self.record.issue_year,
            self.priority_score_0_100,
            self.record.listing_return_pct
        )
    }
}

/// Attach raw scores, per-sector priority scores and dense ranks to
/// `records`, keeping input order.
///
/// # Examples
///
/// ```
/// use ipo_data::{IssuerRecord, RiskTier};
/// use ipo_scoring::score_issuers;
///
/// let record = |sector: &str| IssuerRecord {
///     issuer_name: "Acme".to_string(),
///     sector: sector.to_string(),
///     issue_year: 2020,
///     issue_price: Some(100.0),
///     first_day_close: Some(110.0),
///     issue_size_cr: None,
///     listing_return_pct: 10.0,
///     macro_gdp_growth_pct: None,
///     macro_inflation_pct: None,
///     macro_unemployment_pct: None,
///     risk_tier: RiskTier::Low,
/// };
/// let records = vec![record("A"), record("A"), record("B")];
/// let scored = score_issuers(&records, &[0.2, 0.9, -1.0]).unwrap();
///
/// assert_eq!(scored[1].priority_score_0_100, 100.0);
/// assert_eq!(scored[1].sector_rank, 1);
/// assert_eq!(scored[2].priority_score_0_100, 50.0);
/// ```
pub fn score_issuers(records: &[IssuerRecord], raw_scores: &[f64]) -> Result<Vec<ScoredIssuer>> {
    if records.len() != raw_scores.len() {
        return Err(ScoringError::LengthMismatch {
            expected: records.len(),
            actual: raw_scores.len(),
        });
    }

    let sectors: Vec<String> = records.iter().map(|r| r.sector.clone()).collect();
    let priority = normalize_within_sectors(raw_scores, &sectors)?;
    let ranks = dense_rank_within_sectors(&priority, &sectors)?;

    let scored: Vec<ScoredIssuer> = records
        .iter()
        .zip(raw_scores)
        .zip(priority.into_iter().zip(ranks))
        .map(|((record, &xgb_score), (priority_score_0_100, sector_rank))| ScoredIssuer {
            record: record.clone(),
            xgb_score,
            priority_score_0_100,
            sector_rank,
        })
        .collect();

    info!(issuers = scored.len(), "scored issuers");
    Ok(scored)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ipo_data::RiskTier;

    fn record(name: &str, sector: &str) -> IssuerRecord {
        IssuerRecord {
            issuer_name: name.to_string(),
            sector: sector.to_string(),
            issue_year: 2021,
            issue_price: Some(100.0),
            first_day_close: Some(120.0),
            issue_size_cr: Some(900.0),
            listing_return_pct: 20.0,
            macro_gdp_growth_pct: Some(8.7),
            macro_inflation_pct: Some(5.5),
            macro_unemployment_pct: Some(7.7),
            risk_tier: RiskTier::Moderate,
        }
    }

    #[test]
    fn test_concrete_scenario() {
        let records = vec![
            record("a1", "A"),
            record("a2", "A"),
            record("a3", "A"),
            record("b1", "B"),
        ];
        let scored = score_issuers(&records, &[10.0, 20.0, 30.0, 5.0]).unwrap();

        let priority: Vec<f64> = scored.iter().map(|s| s.priority_score_0_100).collect();
        let ranks: Vec<u32> = scored.iter().map(|s| s.sector_rank).collect();
        assert_eq!(priority, vec![0.0, 50.0, 100.0, 50.0]);
        assert_eq!(ranks, vec![3, 2, 1, 1]);
        assert_eq!(scored[3].xgb_score, 5.0);
        assert_eq!(scored[0].record, records[0]);
    }

    #[test]
    fn test_length_mismatch() {
        let records = vec![record("a1", "A")];
        assert!(matches!(
            score_issuers(&records, &[1.0, 2.0]),
            Err(ScoringError::LengthMismatch { .. })
        ));
    }

    #[test]
    fn test_display() {
        let scored = score_issuers(&[record("Acme", "Tech")], &[1.0]).unwrap();
        assert_eq!(
            scored[0].to_string(),
            "#1 Acme (Tech, 2021): priority 50.00, listing return 20.00%"
        );
    }
}
