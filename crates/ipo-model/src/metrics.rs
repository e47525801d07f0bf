//! Validation metrics.

use crate::booster::relevance_grades;
use std::collections::BTreeMap;

/// Root mean squared error. `None` for empty input.
pub fn rmse(predictions: &[f64], labels: &[f64]) -> Option<f64> {
    if predictions.is_empty() || predictions.len() != labels.len() {
        return None;
    }
    let sse: f64 = predictions
        .iter()
        .zip(labels)
        .map(|(p, y)| (p - y).powi(2))
        .sum();
    Some((sse / predictions.len() as f64).sqrt())
}

/// NDCG of one group ordered by `predictions`, with dense-rank relevance grades.
///
/// `None` when every label in the group is equal (ideal DCG is zero).
pub fn ndcg(predictions: &[f64], labels: &[f64]) -> Option<f64> {
    let grades = relevance_grades(labels);

    let mut ideal = grades.clone();
    ideal.sort_by(|a, b| b.total_cmp(a));
    let ideal_dcg = dcg(&ideal);
    if ideal_dcg <= 0.0 {
        return None;
    }

    let mut order: Vec<usize> = (0..predictions.len()).collect();
    order.sort_by(|&a, &b| predictions[b].total_cmp(&predictions[a]));
    let ranked: Vec<f64> = order.iter().map(|&i| grades[i]).collect();

    Some(dcg(&ranked) / ideal_dcg)
}

/// Mean NDCG over groups; groups without label variation are skipped.
pub fn mean_group_ndcg(predictions: &[f64], labels: &[f64], groups: &[String]) -> Option<f64> {
    let mut members: BTreeMap<&str, (Vec<f64>, Vec<f64>)> = BTreeMap::new();
    for ((p, y), g) in predictions.iter().zip(labels).zip(groups) {
        let entry = members.entry(g.as_str()).or_default();
        entry.0.push(*p);
        entry.1.push(*y);
    }

    let scores: Vec<f64> = members
        .values()
        .filter_map(|(p, y)| ndcg(p, y))
        .collect();
    if scores.is_empty() {
        None
    } else {
        Some(scores.iter().sum::<f64>() / scores.len() as f64)
    }
}

fn dcg(grades: &[f64]) -> f64 {
    grades
        .iter()
        .enumerate()
        .map(|(pos, g)| g / (pos as f64 + 2.0).log2())
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_rmse() {
        assert_relative_eq!(rmse(&[1.0, 3.0], &[1.0, 1.0]).unwrap(), 2.0_f64.sqrt());
        assert!(rmse(&[], &[]).is_none());
    }

    #[test]
    fn test_perfect_ordering_has_unit_ndcg() {
        let value = ndcg(&[3.0, 2.0, 1.0], &[30.0, 20.0, 10.0]).unwrap();
        assert_relative_eq!(value, 1.0);
    }

    #[test]
    fn test_reversed_ordering_is_penalised() {
        let value = ndcg(&[1.0, 2.0, 3.0], &[30.0, 20.0, 10.0]).unwrap();
        assert!(value < 1.0);
        assert!(value > 0.0);
    }

    #[test]
    fn test_constant_labels_have_no_ndcg() {
        assert!(ndcg(&[1.0, 2.0], &[5.0, 5.0]).is_none());
    }

    #[test]
    fn test_mean_group_ndcg_skips_flat_groups() {
        let groups = ["A", "A", "B"].map(String::from);
        let value = mean_group_ndcg(&[2.0, 1.0, 0.0], &[10.0, 5.0, 1.0], &groups).unwrap();
        assert_relative_eq!(value, 1.0);
    }
}
