//! Sector-level summaries.
//!
//! One row per sector: issuer count, mean and median listing return, the
//! risk-tier mix in percent and the sector priority, which is the mean
//! priority score of its issuers. Summaries are ordered by sector priority,
//! highest first; equal priorities keep sector name order.

use crate::error::{Result, ScoringError};
use crate::scored::ScoredIssuer;
use ipo_data::RiskTier;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use tracing::info;

/// Aggregate statistics of one sector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SectorSummary {
    /// Sector name.
    pub sector: String,

    /// Mean `priority_score_0_100` of the sector's issuers.
    pub sector_priority: f64,

    /// Number of issuers.
    pub n_ipo: usize,

    /// Mean listing return in percent.
    pub mean_return: f64,

    /// Median listing return in percent.
    pub median_return: f64,

    /// Share of low-risk issuers in percent.
    pub low_pct: f64,

    /// Share of moderate-risk issuers in percent.
    pub moderate_pct: f64,

    /// Share of high-risk issuers in percent.
    pub high_pct: f64,
}

impl SectorSummary {
    /// Summarize the issuers of one sector.
    ///
    /// # Errors
    ///
    /// Returns [`ScoringError::EmptySector`] if `members` is empty.
    pub fn from_members(sector: &str, members: &[&ScoredIssuer]) -> Result<Self> {
        if members.is_empty() {
            return Err(ScoringError::EmptySector(sector.to_string()));
        }
        let n = members.len() as f64;

        let sector_priority = members.iter().map(|m| m.priority_score_0_100).sum::<f64>() / n;
        let mut returns: Vec<f64> = members
            .iter()
            .map(|m| m.record.listing_return_pct)
            .collect();
        let mean_return = returns.iter().sum::<f64>() / n;
        let median_return = median(&mut returns);

        let tier_pct = |tier: RiskTier| {
            let count = members.iter().filter(|m| m.record.risk_tier == tier).count();
            count as f64 / n * 100.0
        };

        Ok(Self {
            sector: sector.to_string(),
            sector_priority,
            n_ipo: members.len(),
            mean_return,
            median_return,
            low_pct: tier_pct(RiskTier::Low),
            moderate_pct: tier_pct(RiskTier::Moderate),
            high_pct: tier_pct(RiskTier::High),
        })
    }

    /// Percentage of issuers in `tier`.
    pub const fn tier_pct(&self, tier: RiskTier) -> f64 {
        match tier {
            RiskTier::Low => self.low_pct,
            RiskTier::Moderate => self.moderate_pct,
            RiskTier::High => self.high_pct,
        }
    }
}

impl fmt::Display for SectorSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: priority {:.2} over {} IPOs, mean return {:.2}%, median {:.2}% \
             (risk {:.0}/{:.0}/{:.0} low/moderate/high)",
            self.sector,
            self.sector_priority,
            self.n_ipo,
            self.mean_return,
            self.median_return,
            self.low_pct,
            self.moderate_pct,
            self.high_pct
        )
    }
}

/// Median of a non-empty slice; sorts it in place.
fn median(values: &mut [f64]) -> f64 {
    values.sort_by(f64::total_cmp);
    let mid = values.len() / 2;
    if values.len() % 2 == 0 {
        (values[mid - 1] + values[mid]) / 2.0
    } else {
        values[mid]
    }
}

/// Summaries of every sector, ordered by `sector_priority` descending.
///
/// # Errors
///
/// Returns [`ScoringError::EmptyInput`] when there are no scored issuers.
pub fn aggregate_sectors(scored: &[ScoredIssuer]) -> Result<Vec<SectorSummary>> {
    if scored.is_empty() {
        return Err(ScoringError::EmptyInput);
    }

    let mut by_sector: BTreeMap<&str, Vec<&ScoredIssuer>> = BTreeMap::new();
    for issuer in scored {
        by_sector
            .entry(issuer.record.sector.as_str())
            .or_default()
            .push(issuer);
    }

    let mut summaries = by_sector
        .into_iter()
        .map(|(sector, members)| SectorSummary::from_members(sector, &members))
        .collect::<Result<Vec<_>>>()?;
    summaries.sort_by(|a, b| b.sector_priority.total_cmp(&a.sector_priority));

    info!(sectors = summaries.len(), "aggregated sectors");
    Ok(summaries)
}
