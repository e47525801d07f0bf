//! Path-dependent TreeSHAP.
//!
//! Exact Shapley values for tree ensembles in polynomial time. Every tree is
//! walked once per row while maintaining the set of unique features on the
//! current path together with the proportion of subsets that flow through
//! it. Missing features follow the cover of each child, which is why trees
//! keep their training row counts.

use super::AttributionError;
use crate::booster::{Booster, Node, Tree, goes_left};
use ndarray::{Array2, ArrayView1};

/// Relative gap between the attribution sum and the prediction that is
/// still accepted.
const ADDITIVITY_TOLERANCE: f64 = 1e-6;

#[derive(Debug, Clone, Copy)]
struct PathElement {
    feature: Option<usize>,
    zero_fraction: f64,
    one_fraction: f64,
    weight: f64,
}

const EMPTY: PathElement = PathElement {
    feature: None,
    zero_fraction: 0.0,
    one_fraction: 0.0,
    weight: 0.0,
};

fn extend_path(
    path: &mut [PathElement],
    depth: usize,
    zero_fraction: f64,
    one_fraction: f64,
    feature: Option<usize>,
) {
    path[depth] = PathElement {
        feature,
        zero_fraction,
        one_fraction,
        weight: if depth == 0 { 1.0 } else { 0.0 },
    };
    let d = depth as f64;
    for i in (0..depth).rev() {
        path[i + 1].weight += one_fraction * path[i].weight * (i as f64 + 1.0) / (d + 1.0);
        path[i].weight = zero_fraction * path[i].weight * (d - i as f64) / (d + 1.0);
    }
}

fn unwind_path(path: &mut [PathElement], depth: usize, index: usize) {
    let one_fraction = path[index].one_fraction;
    let zero_fraction = path[index].zero_fraction;
    let d = depth as f64;
    let mut next_one_portion = path[depth].weight;

    for i in (0..depth).rev() {
        if one_fraction != 0.0 {
            let tmp = path[i].weight;
            path[i].weight = next_one_portion * (d + 1.0) / ((i as f64 + 1.0) * one_fraction);
            next_one_portion = tmp - path[i].weight * zero_fraction * (d - i as f64) / (d + 1.0);
        } else {
            path[i].weight = path[i].weight * (d + 1.0) / (zero_fraction * (d - i as f64));
        }
    }

    for i in index..depth {
        path[i].feature = path[i + 1].feature;
        path[i].zero_fraction = path[i + 1].zero_fraction;
        path[i].one_fraction = path[i + 1].one_fraction;
    }
}

/// Total weight of the path with element `index` removed, without
/// modifying it.
fn unwound_path_sum(path: &[PathElement], depth: usize, index: usize) -> f64 {
    let one_fraction = path[index].one_fraction;
    let zero_fraction = path[index].zero_fraction;
    let d = depth as f64;
    let mut next_one_portion = path[depth].weight;
    let mut total = 0.0;

    for i in (0..depth).rev() {
        if one_fraction != 0.0 {
            let tmp = next_one_portion * (d + 1.0) / ((i as f64 + 1.0) * one_fraction);
            total += tmp;
            next_one_portion = path[i].weight - tmp * zero_fraction * (d - i as f64) / (d + 1.0);
        } else if zero_fraction != 0.0 {
            total += path[i].weight / zero_fraction / ((d - i as f64) / (d + 1.0));
        }
    }
    total
}

struct Walker<'a, 'r> {
    nodes: &'a [Node],
    row: ArrayView1<'r, f64>,
    phi: &'a mut [f64],
}

impl Walker<'_, '_> {
    fn recurse(
        &mut self,
        node: usize,
        parent_path: &[PathElement],
        depth: usize,
        zero_fraction: f64,
        one_fraction: f64,
        feature: Option<usize>,
    ) {
        let mut path = parent_path[..depth].to_vec();
        path.push(EMPTY);
        extend_path(&mut path, depth, zero_fraction, one_fraction, feature);

        match self.nodes[node] {
            Node::Leaf { value, .. } => {
                for i in 1..=depth {
                    let weight = unwound_path_sum(&path, depth, i);
                    let element = path[i];
                    if let Some(f) = element.feature {
                        self.phi[f] +=
                            weight * (element.one_fraction - element.zero_fraction) * value;
                    }
                }
            }
            Node::Split {
                feature: split_feature,
                threshold,
                left,
                right,
                cover,
            } => {
                let (hot, cold) = if goes_left(self.row[split_feature], threshold) {
                    (left, right)
                } else {
                    (right, left)
                };
                let hot_zero = self.nodes[hot].cover() / cover;
                let cold_zero = self.nodes[cold].cover() / cover;

                let mut depth = depth;
                let mut incoming_zero = 1.0;
                let mut incoming_one = 1.0;
                if let Some(index) =
                    (1..=depth).find(|&i| path[i].feature == Some(split_feature))
                {
                    incoming_zero = path[index].zero_fraction;
                    incoming_one = path[index].one_fraction;
                    unwind_path(&mut path, depth, index);
                    depth -= 1;
                }

                self.recurse(
                    hot,
                    &path,
                    depth + 1,
                    hot_zero * incoming_zero,
                    incoming_one,
                    Some(split_feature),
                );
                self.recurse(
                    cold,
                    &path,
                    depth + 1,
                    cold_zero * incoming_zero,
                    0.0,
                    Some(split_feature),
                );
            }
        }
    }
}

/// Add the attributions of one tree for `row` to `phi`.
pub(crate) fn tree_contributions(tree: &Tree, row: ArrayView1<'_, f64>, phi: &mut [f64]) {
    let nodes = tree.nodes();
    if nodes.is_empty() || nodes[0].cover() <= 0.0 {
        return;
    }
    let mut walker = Walker { nodes, row, phi };
    walker.recurse(0, &[], 0, 1.0, 1.0, None);
}

/// Expected ensemble output over the training distribution.
pub fn expected_value(model: &Booster) -> f64 {
    model.base_score() + model.trees().iter().map(Tree::expected_value).sum::<f64>()
}

/// Per-row, per-feature attributions (rows x features).
///
/// For every row, `expected_value + Σ attributions` equals the model's
/// prediction; a violation is reported as [`AttributionError::Additivity`].
pub fn tree_shap(model: &Booster, features: &Array2<f64>) -> Result<Array2<f64>, AttributionError> {
    let (n_rows, n_features) = features.dim();
    if n_rows == 0 {
        return Err(AttributionError::Empty);
    }
    if n_features != model.n_features() {
        return Err(AttributionError::DimensionMismatch {
            expected: model.n_features(),
            actual: n_features,
        });
    }

    let base = expected_value(model);
    let mut values = Array2::<f64>::zeros((n_rows, n_features));
    for (r, row) in features.rows().into_iter().enumerate() {
        let mut phi = vec![0.0; n_features];
        for tree in model.trees() {
            tree_contributions(tree, row, &mut phi);
        }

        let prediction = model.predict_row(row);
        let explained = base + phi.iter().sum::<f64>();
        let gap = (explained - prediction).abs();
        if !gap.is_finite() {
            return Err(AttributionError::NonFinite { row: r });
        }
        if gap > ADDITIVITY_TOLERANCE * prediction.abs().max(1.0) {
            return Err(AttributionError::Additivity { row: r, gap });
        }

        for (c, value) in phi.into_iter().enumerate() {
            values[[r, c]] = value;
        }
    }
    Ok(values)
}
