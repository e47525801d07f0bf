//! Per-sector min-max normalization.

use crate::error::{Result, ScoringError};
use std::collections::HashMap;
use tracing::debug;

/// Score given to every issuer of a sector whose raw scores are all equal.
pub const CONSTANT_SECTOR_SCORE: f64 = 50.0;

/// Round to two decimals, ties to even.
///
/// # Examples
///
/// ```
/// use ipo_scoring::round2;
///
/// assert_eq!(round2(33.333333), 33.33);
/// assert_eq!(round2(66.666666), 66.67);
/// ```
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round_ties_even() / 100.0
}

/// Rescale `raw` scores to `[0, 100]` independently within each sector.
///
/// `100 * (score - min) / (max - min)` per sector, rounded to two decimals.
/// When `max == min` every issuer of the sector gets
/// [`CONSTANT_SECTOR_SCORE`].
///
/// # Errors
///
/// Returns [`ScoringError::LengthMismatch`] if `raw` and `sectors` differ in
/// length, [`ScoringError::EmptyInput`] for no rows and
/// [`ScoringError::NonFiniteScore`] for a NaN or infinite score.
pub fn normalize_within_sectors(raw: &[f64], sectors: &[String]) -> Result<Vec<f64>> {
    if raw.len() != sectors.len() {
        return Err(ScoringError::LengthMismatch {
            expected: sectors.len(),
            actual: raw.len(),
        });
    }
    if raw.is_empty() {
        return Err(ScoringError::EmptyInput);
    }
    if let Some(row) = raw.iter().position(|s| !s.is_finite()) {
        return Err(ScoringError::NonFiniteScore { row });
    }

    let mut bounds: HashMap<&str, (f64, f64)> = HashMap::new();
    for (score, sector) in raw.iter().zip(sectors) {
        bounds
            .entry(sector.as_str())
            .and_modify(|(lo, hi)| {
                *lo = lo.min(*score);
                *hi = hi.max(*score);
            })
            .or_insert((*score, *score));
    }

    let constant = bounds.values().filter(|(lo, hi)| lo == hi).count();
    debug!(
        sectors = bounds.len(),
        constant_sectors = constant,
        "normalizing scores within sectors"
    );

    Ok(raw
        .iter()
        .zip(sectors)
        .map(|(score, sector)| {
            let (lo, hi) = bounds[sector.as_str()];
            if hi == lo {
                CONSTANT_SECTOR_SCORE
            } else {
                round2(100.0 * (score - lo) / (hi - lo))
            }
        })
        .collect())
}
