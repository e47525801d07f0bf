//! Boosting objectives.
//!
//! An objective turns the current predictions into per-row first and second
//! order gradients. Trees are then fitted to those statistics.

use crate::ModelError;
use ndarray::ArrayView1;
use std::ops::Range;

/// Loss function driving the booster.
pub trait Objective {
    /// Short name for logging.
    fn name(&self) -> &'static str;

    /// Initial prediction shared by every row.
    fn base_score(&self, labels: ArrayView1<'_, f64>) -> f64;

    /// Fill `grad` and `hess` for the current `predictions`.
    fn gradients(
        &self,
        predictions: &[f64],
        labels: ArrayView1<'_, f64>,
        grad: &mut [f64],
        hess: &mut [f64],
    );
}

/// Point-wise squared error, `½(p − y)²`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SquaredError;

impl Objective for SquaredError {
    fn name(&self) -> &'static str {
        "reg:squarederror"
    }

    fn base_score(&self, labels: ArrayView1<'_, f64>) -> f64 {
        labels.mean().unwrap_or(0.0)
    }

    fn gradients(
        &self,
        predictions: &[f64],
        labels: ArrayView1<'_, f64>,
        grad: &mut [f64],
        hess: &mut [f64],
    ) {
        for (i, (&p, &y)) in predictions.iter().zip(labels.iter()).enumerate() {
            grad[i] = p - y;
            hess[i] = 1.0;
        }
    }
}

/// Dense-rank relevance grades: the lowest label gets 0, the next distinct
/// label 1, and so on.
pub(crate) fn relevance_grades(labels: &[f64]) -> Vec<f64> {
    let mut distinct: Vec<f64> = labels.to_vec();
    distinct.sort_by(f64::total_cmp);
    distinct.dedup();

    labels
        .iter()
        .map(|y| distinct.partition_point(|d| d < y) as f64)
        .collect()
}

/// Pairwise logistic loss weighted by the NDCG change of swapping each pair
/// (LambdaMART).
///
/// Rows must be laid out as contiguous groups. Within a group the relevance
/// of a row is the dense rank of its label, with linear gain.
#[derive(Debug, Clone)]
pub struct PairwiseNdcg {
    groups: Vec<Range<usize>>,
    grades: Vec<f64>,
    ideal_dcg: Vec<f64>,
}

impl PairwiseNdcg {
    /// Minimum hessian contributed by a pair.
    const MIN_HESSIAN: f64 = 1e-16;

    /// Build the objective for contiguous groups of the given sizes.
    ///
    /// # Errors
    /// Returns [`ModelError::InvalidGroups`] if the sizes do not cover the
    /// labels exactly, and [`ModelError::NoComparablePairs`] if no group
    /// contains two different labels.
    pub fn new(labels: ArrayView1<'_, f64>, group_sizes: &[usize]) -> Result<Self, ModelError> {
        let total: usize = group_sizes.iter().sum();
        if total != labels.len() {
            return Err(ModelError::InvalidGroups(format!(
                "group sizes sum to {}, but there are {} rows",
                total,
                labels.len()
            )));
        }
        if group_sizes.contains(&0) {
            return Err(ModelError::InvalidGroups("empty group".to_string()));
        }

        let labels = labels.to_vec();
        let mut groups = Vec::with_capacity(group_sizes.len());
        let mut grades = Vec::with_capacity(labels.len());
        let mut ideal_dcg = Vec::with_capacity(group_sizes.len());
        let mut start = 0;
        for &size in group_sizes {
            let range = start..start + size;
            let group_grades = relevance_grades(&labels[range.clone()]);

            let mut ideal = group_grades.clone();
            ideal.sort_by(|a, b| b.total_cmp(a));
            ideal_dcg.push(
                ideal
                    .iter()
                    .enumerate()
                    .map(|(pos, g)| g * discount(pos))
                    .sum(),
            );

            grades.extend(group_grades);
            groups.push(range);
            start += size;
        }

        if ideal_dcg.iter().all(|&d| d <= 0.0) {
            return Err(ModelError::NoComparablePairs);
        }

        Ok(Self {
            groups,
            grades,
            ideal_dcg,
        })
    }

    /// Number of ranking groups.
    pub fn n_groups(&self) -> usize {
        self.groups.len()
    }
}

impl Objective for PairwiseNdcg {
    fn name(&self) -> &'static str {
        "rank:ndcg"
    }

    fn base_score(&self, _labels: ArrayView1<'_, f64>) -> f64 {
        0.0
    }

    fn gradients(
        &self,
        predictions: &[f64],
        _labels: ArrayView1<'_, f64>,
        grad: &mut [f64],
        hess: &mut [f64],
    ) {
        grad.fill(0.0);
        hess.fill(0.0);

        for (range, &idcg) in self.groups.iter().zip(&self.ideal_dcg) {
            if idcg <= 0.0 {
                continue;
            }

            // Position of every group row under the current predicted
            // ordering, indexed by `row - range.start`
            let mut order: Vec<usize> = range.clone().collect();
            order.sort_by(|&a, &b| predictions[b].total_cmp(&predictions[a]));
            let mut position = vec![0usize; range.len()];
            for (pos, &row) in order.iter().enumerate() {
                position[row - range.start] = pos;
            }

            for i in range.clone() {
                for j in range.clone() {
                    if self.grades[i] <= self.grades[j] {
                        continue;
                    }
                    let rho = 1.0 / (1.0 + (predictions[i] - predictions[j]).exp());
                    let swap = discount(position[i - range.start])
                        - discount(position[j - range.start]);
                    let delta = ((self.grades[i] - self.grades[j]) * swap).abs() / idcg;

                    let lambda = rho * delta;
                    let h = (rho * (1.0 - rho) * delta).max(Self::MIN_HESSIAN);
                    grad[i] -= lambda;
                    grad[j] += lambda;
                    hess[i] += h;
                    hess[j] += h;
                }
            }
        }
    }
}

fn discount(position: usize) -> f64 {
    1.0 / (position as f64 + 2.0).log2()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::array;

    #[test]
    fn test_squared_error_gradients() {
        let labels = array![1.0, 3.0];
        let mut grad = [0.0; 2];
        let mut hess = [0.0; 2];
        SquaredError.gradients(&[2.0, 2.0], labels.view(), &mut grad, &mut hess);

        assert_eq!(grad, [1.0, -1.0]);
        assert_eq!(hess, [1.0, 1.0]);
        assert_relative_eq!(SquaredError.base_score(labels.view()), 2.0);
    }

    #[test]
    fn test_relevance_grades_are_dense() {
        assert_eq!(
            relevance_grades(&[12.0, -3.0, 12.0, 40.0]),
            vec![1.0, 0.0, 1.0, 2.0]
        );
    }

    #[test]
    fn test_pairwise_pushes_better_rows_up() {
        let labels = array![10.0, 30.0, 20.0];
        let objective = PairwiseNdcg::new(labels.view(), &[3]).unwrap();
        let mut grad = [0.0; 3];
        let mut hess = [0.0; 3];
        objective.gradients(&[0.0, 0.0, 0.0], labels.view(), &mut grad, &mut hess);

        // Negative gradient raises the prediction
        assert!(grad[1] < 0.0);
        assert!(grad[0] > 0.0);
        assert!(hess.iter().all(|&h| h > 0.0));
        assert_relative_eq!(grad.iter().sum::<f64>(), 0.0, epsilon = 1e-12);
    }

    #[test]
    fn test_singleton_groups_have_no_pairs() {
        let labels = array![10.0, 30.0, 20.0];
        assert!(matches!(
            PairwiseNdcg::new(labels.view(), &[1, 1, 1]),
            Err(ModelError::NoComparablePairs)
        ));
    }

    #[test]
    fn test_flat_groups_have_no_pairs() {
        let labels = array![5.0, 5.0, 7.0, 7.0];
        assert!(matches!(
            PairwiseNdcg::new(labels.view(), &[2, 2]),
            Err(ModelError::NoComparablePairs)
        ));
    }

    #[test]
    fn test_group_sizes_must_cover_rows() {
        let labels = array![1.0, 2.0, 3.0];
        assert!(matches!(
            PairwiseNdcg::new(labels.view(), &[2]),
            Err(ModelError::InvalidGroups(_))
        ));
        assert!(matches!(
            PairwiseNdcg::new(labels.view(), &[3, 0]),
            Err(ModelError::InvalidGroups(_))
        ));
    }

    #[test]
    fn test_later_groups_use_their_own_positions() {
        // Second group mirrors the first, shifted by three rows
        let labels = array![1.0, 2.0, 3.0, 1.0, 2.0, 3.0];
        let objective = PairwiseNdcg::new(labels.view(), &[3, 3]).unwrap();
        let predictions = [0.3, 0.1, 0.2, 0.3, 0.1, 0.2];

        let mut grad = [0.0; 6];
        let mut hess = [0.0; 6];
        objective.gradients(&predictions, labels.view(), &mut grad, &mut hess);

        for i in 0..3 {
            assert_relative_eq!(grad[i], grad[i + 3], epsilon = 1e-12);
            assert_relative_eq!(hess[i], hess[i + 3], epsilon = 1e-12);
        }
        assert!(grad[2] < 0.0);
    }

    #[test]
    fn test_singleton_rows_get_zero_gradient() {
        let labels = array![1.0, 2.0, 9.0];
        let objective = PairwiseNdcg::new(labels.view(), &[2, 1]).unwrap();
        assert_eq!(objective.n_groups(), 2);

        let mut grad = [0.0; 3];
        let mut hess = [0.0; 3];
        objective.gradients(&[0.0; 3], labels.view(), &mut grad, &mut hess);
        assert_eq!(grad[2], 0.0);
        assert_eq!(hess[2], 0.0);
    }
}
