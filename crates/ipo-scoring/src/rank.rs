//! Dense ranking within sectors.

use crate::error::{Result, ScoringError};
use std::collections::HashMap;

/// Dense, descending rank of every score within its sector.
///
/// Rank 1 is the sector's highest score. Equal scores share a rank and the
/// next distinct score gets the immediately following rank, so a sector with
/// `k` distinct scores uses exactly the ranks `1..=k`.
pub fn dense_rank_within_sectors(scores: &[f64], sectors: &[String]) -> Result<Vec<u32>> {
    if scores.len() != sectors.len() {
        return Err(ScoringError::LengthMismatch {
            expected: sectors.len(),
            actual: scores.len(),
        });
    }

    let mut distinct: HashMap<&str, Vec<f64>> = HashMap::new();
    for (score, sector) in scores.iter().zip(sectors) {
        distinct.entry(sector.as_str()).or_default().push(*score);
    }
    for values in distinct.values_mut() {
        values.sort_by(|a, b| b.total_cmp(a));
        values.dedup();
    }

    Ok(scores
        .iter()
        .zip(sectors)
        .map(|(score, sector)| {
            let values = &distinct[sector.as_str()];
            // Descending order: count of strictly greater scores
            values.partition_point(|v| v > score) as u32 + 1
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn sectors(n: usize) -> Vec<String> {
        vec!["A".to_string(); n]
    }

    #[rstest]
    #[case(&[0.0, 50.0, 100.0], &[3, 2, 1])]
    #[case(&[80.0, 80.0, 20.0], &[1, 1, 2])]
    #[case(&[10.0, 90.0, 90.0, 10.0, 55.5], &[3, 1, 1, 3, 2])]
    #[case(&[50.0], &[1])]
    fn test_dense_rank(#[case] scores: &[f64], #[case] expected: &[u32]) {
        let ranks = dense_rank_within_sectors(scores, &sectors(scores.len())).unwrap();
        assert_eq!(ranks, expected);
    }

    #[test]
    fn test_ranks_restart_per_sector() {
        let s: Vec<String> = ["A", "B", "A", "B"].iter().map(|s| s.to_string()).collect();
        let ranks = dense_rank_within_sectors(&[10.0, 5.0, 20.0, 1.0], &s).unwrap();
        assert_eq!(ranks, vec![2, 1, 1, 2]);
    }

    #[test]
    fn test_length_mismatch() {
        assert!(dense_rank_within_sectors(&[1.0, 2.0], &sectors(1)).is_err());
    }
}
