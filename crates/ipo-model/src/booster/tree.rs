//! Regression trees fitted to gradient statistics.
//!
//! Trees are grown depth-first with exact greedy split search. A row whose
//! split feature is `NaN` always goes to the left child, both while growing
//! and while predicting.
//!
//! # Node layout
//!
//! Nodes are stored in pre-order; the root is node 0. Leaf values already
//! include the learning rate. `cover` is the number of training rows that
//! reached the node and is what attribution weights paths by.

use super::BoosterParams;
use ndarray::{ArrayView1, ArrayView2};

/// A single node in a regression tree.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    /// Internal node routing rows by one feature.
    Split {
        /// Feature column index
        feature: usize,
        /// Rows with `value <= threshold` (or `NaN`) go left
        threshold: f64,
        /// Left child index
        left: usize,
        /// Right child index
        right: usize,
        /// Training rows reaching this node
        cover: f64,
    },
    /// Terminal node.
    Leaf {
        /// Contribution to the prediction
        value: f64,
        /// Training rows reaching this node
        cover: f64,
    },
}

impl Node {
    /// Training rows reaching this node.
    pub const fn cover(&self) -> f64 {
        match self {
            Self::Split { cover, .. } | Self::Leaf { cover, .. } => *cover,
        }
    }
}

/// Whether a feature value is routed to the left child.
#[inline]
pub(crate) fn goes_left(value: f64, threshold: f64) -> bool {
    value.is_nan() || value <= threshold
}

/// A fitted regression tree.
#[derive(Debug, Clone, PartialEq)]
pub struct Tree {
    nodes: Vec<Node>,
}

impl Tree {
    /// Build a tree from pre-ordered nodes.
    pub const fn from_nodes(nodes: Vec<Node>) -> Self {
        Self { nodes }
    }

    /// Nodes in pre-order.
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// Number of leaves.
    pub fn n_leaves(&self) -> usize {
        self.nodes
            .iter()
            .filter(|n| matches!(n, Node::Leaf { .. }))
            .count()
    }

    /// Leaf value reached by `row`.
    #[inline]
    pub fn predict_row(&self, row: ArrayView1<'_, f64>) -> f64 {
        let mut idx = 0usize;
        loop {
            match &self.nodes[idx] {
                Node::Leaf { value, .. } => return *value,
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                    ..
                } => {
                    idx = if goes_left(row[*feature], *threshold) {
                        *left
                    } else {
                        *right
                    };
                }
            }
        }
    }

    /// Cover-weighted mean leaf value, the tree's expected output.
    pub fn expected_value(&self) -> f64 {
        let root_cover = self.nodes.first().map_or(0.0, Node::cover);
        if root_cover <= 0.0 {
            return 0.0;
        }
        self.nodes
            .iter()
            .map(|n| match n {
                Node::Leaf { value, cover } => value * cover / root_cover,
                Node::Split { .. } => 0.0,
            })
            .sum()
    }
}

/// Best split found for one node.
#[derive(Debug, Clone, Copy)]
struct SplitCandidate {
    feature: usize,
    threshold: f64,
    gain: f64,
}

/// Grows one tree over a subset of rows and columns.
pub(crate) struct TreeBuilder<'a> {
    params: &'a BoosterParams,
    features: ArrayView2<'a, f64>,
    grad: &'a [f64],
    hess: &'a [f64],
    columns: &'a [usize],
    nodes: Vec<Node>,
}

impl<'a> TreeBuilder<'a> {
    pub(crate) const fn new(
        params: &'a BoosterParams,
        features: ArrayView2<'a, f64>,
        grad: &'a [f64],
        hess: &'a [f64],
        columns: &'a [usize],
    ) -> Self {
        Self {
            params,
            features,
            grad,
            hess,
            columns,
            nodes: Vec::new(),
        }
    }

    pub(crate) fn build(mut self, rows: Vec<usize>) -> Tree {
        self.grow(rows, 0);
        Tree::from_nodes(self.nodes)
    }

    fn grow(&mut self, rows: Vec<usize>, depth: usize) -> usize {
        let g: f64 = rows.iter().map(|&r| self.grad[r]).sum();
        let h: f64 = rows.iter().map(|&r| self.hess[r]).sum();
        let cover = rows.len() as f64;

        let split = if depth < self.params.max_depth && rows.len() >= 2 {
            self.best_split(&rows, g, h)
        } else {
            None
        };

        let Some(split) = split else {
            let denom = h + self.params.reg_lambda;
            let value = if denom > 0.0 {
                -g / denom * self.params.learning_rate
            } else {
                0.0
            };
            self.nodes.push(Node::Leaf { value, cover });
            return self.nodes.len() - 1;
        };

        let idx = self.nodes.len();
        self.nodes.push(Node::Leaf { value: 0.0, cover });

        let (left_rows, right_rows): (Vec<usize>, Vec<usize>) = rows
            .into_iter()
            .partition(|&r| goes_left(self.features[[r, split.feature]], split.threshold));
        let left = self.grow(left_rows, depth + 1);
        let right = self.grow(right_rows, depth + 1);

        self.nodes[idx] = Node::Split {
            feature: split.feature,
            threshold: split.threshold,
            left,
            right,
            cover,
        };
        idx
    }

    fn best_split(&self, rows: &[usize], g: f64, h: f64) -> Option<SplitCandidate> {
        let lambda = self.params.reg_lambda;
        let parent_score = g * g / (h + lambda);
        let mut best: Option<SplitCandidate> = None;

        for &feature in self.columns {
            let mut missing_g = 0.0;
            let mut missing_h = 0.0;
            let mut present: Vec<(f64, f64, f64)> = Vec::with_capacity(rows.len());
            for &r in rows {
                let x = self.features[[r, feature]];
                if x.is_nan() {
                    missing_g += self.grad[r];
                    missing_h += self.hess[r];
                } else {
                    present.push((x, self.grad[r], self.hess[r]));
                }
            }
            present.sort_by(|a, b| a.0.total_cmp(&b.0));

            let mut gl = missing_g;
            let mut hl = missing_h;
            for w in 0..present.len().saturating_sub(1) {
                let (x, gi, hi) = present[w];
                gl += gi;
                hl += hi;
                let next = present[w + 1].0;
                if x == next {
                    continue;
                }

                let gr = g - gl;
                let hr = h - hl;
                if hl < self.params.min_child_weight || hr < self.params.min_child_weight {
                    continue;
                }

                let gain = 0.5 * (gl * gl / (hl + lambda) + gr * gr / (hr + lambda) - parent_score)
                    - self.params.gamma;
                if gain > 0.0 && best.is_none_or(|b| gain > b.gain) {
                    best = Some(SplitCandidate {
                        feature,
                        threshold: x + (next - x) / 2.0,
                        gain,
                    });
                }
            }
        }

        best
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::array;

    fn stump() -> Tree {
        Tree::from_nodes(vec![
            Node::Split {
                feature: 0,
                threshold: 50.0,
                left: 1,
                right: 2,
                cover: 4.0,
            },
            Node::Leaf {
                value: 2.0,
                cover: 3.0,
            },
            Node::Leaf {
                value: -1.0,
                cover: 1.0,
            },
        ])
    }

    #[test]
    fn test_traverse() {
        let tree = stump();
        assert_eq!(tree.predict_row(array![30.0].view()), 2.0);
        assert_eq!(tree.predict_row(array![50.0].view()), 2.0);
        assert_eq!(tree.predict_row(array![70.0].view()), -1.0);
    }

    #[test]
    fn test_nan_goes_left() {
        assert_eq!(stump().predict_row(array![f64::NAN].view()), 2.0);
    }

    #[test]
    fn test_expected_value() {
        assert_relative_eq!(stump().expected_value(), (2.0 * 3.0 - 1.0) / 4.0);
        assert_eq!(stump().n_leaves(), 2);
    }

    #[test]
    fn test_builder_finds_separating_split() {
        let params = BoosterParams {
            max_depth: 1,
            learning_rate: 1.0,
            reg_lambda: 0.0,
            min_child_weight: 0.0,
            ..BoosterParams::regressor_default()
        };
        let x = array![[1.0], [2.0], [10.0], [11.0]];
        // Gradients of squared error at prediction 0 for labels [0, 0, 5, 5]
        let grad = [0.0, 0.0, -5.0, -5.0];
        let hess = [1.0; 4];
        let tree = TreeBuilder::new(&params, x.view(), &grad, &hess, &[0]).build(vec![0, 1, 2, 3]);

        match &tree.nodes()[0] {
            Node::Split {
                feature, threshold, ..
            } => {
                assert_eq!(*feature, 0);
                assert_relative_eq!(*threshold, 6.0);
            }
            Node::Leaf { .. } => panic!("expected a split at the root"),
        }
        assert_relative_eq!(tree.predict_row(array![1.5].view()), 0.0);
        assert_relative_eq!(tree.predict_row(array![10.5].view()), 5.0);
    }

    #[test]
    fn test_builder_respects_max_depth_zero() {
        let params = BoosterParams {
            max_depth: 0,
            ..BoosterParams::regressor_default()
        };
        let x = array![[1.0], [2.0]];
        let tree =
            TreeBuilder::new(&params, x.view(), &[1.0, -1.0], &[1.0, 1.0], &[0]).build(vec![0, 1]);
        assert_eq!(tree.nodes().len(), 1);
    }
}
