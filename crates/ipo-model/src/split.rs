//! Group-aware train/validation splitting.
//!
//! Every row of a group lands in the same fold, so a sector is never split
//! between training and validation. Groups are assigned largest first, each
//! to the fold with the fewest rows so far; fold 0 becomes the validation
//! fold of the first (and only used) pairing.
//!
//! Groups of equal size are visited in descending name order, the order a
//! reversed stable sort of group sizes over name-sorted groups produces.

use crate::ModelError;
use std::collections::HashMap;
use tracing::debug;

/// One train/validation pairing of row indices, both in original row order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupSplit {
    /// Training rows
    pub train: Vec<usize>,
    /// Validation rows
    pub validation: Vec<usize>,
    /// Number of folds the groups were distributed over
    pub n_folds: usize,
}

/// K-fold iterator variant with non-overlapping groups.
#[derive(Debug, Clone, Copy)]
pub struct GroupKFold {
    n_folds: usize,
}

impl GroupKFold {
    /// Create a splitter with `n_folds` folds.
    ///
    /// # Errors
    /// Returns [`ModelError::TooFewFolds`] for fewer than two folds.
    pub const fn new(n_folds: usize) -> Result<Self, ModelError> {
        if n_folds < 2 {
            return Err(ModelError::TooFewFolds(n_folds));
        }
        Ok(Self { n_folds })
    }

    /// Fold count for a run: `min(fold_cap, n_groups)`.
    pub fn capped(fold_cap: usize, n_groups: usize) -> Result<Self, ModelError> {
        Self::new(fold_cap.min(n_groups))
    }

    /// Number of folds.
    pub const fn n_folds(&self) -> usize {
        self.n_folds
    }

    /// Validation rows of every fold.
    pub fn folds(&self, groups: &[String]) -> Result<Vec<Vec<usize>>, ModelError> {
        let mut sizes: HashMap<&str, usize> = HashMap::new();
        for group in groups {
            *sizes.entry(group.as_str()).or_default() += 1;
        }
        if sizes.len() < self.n_folds {
            return Err(ModelError::TooFewGroups {
                n_folds: self.n_folds,
                n_groups: sizes.len(),
            });
        }

        let mut ordered: Vec<(&str, usize)> = sizes.into_iter().collect();
        ordered.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| b.0.cmp(a.0)));

        let mut fold_weights = vec![0usize; self.n_folds];
        let mut fold_of: HashMap<&str, usize> = HashMap::new();
        for (group, size) in ordered {
            let lightest = fold_weights
                .iter()
                .enumerate()
                .min_by_key(|&(i, w)| (*w, i))
                .map_or(0, |(i, _)| i);
            fold_weights[lightest] += size;
            fold_of.insert(group, lightest);
        }

        let mut folds = vec![Vec::new(); self.n_folds];
        for (row, group) in groups.iter().enumerate() {
            folds[fold_of[group.as_str()]].push(row);
        }
        debug!(n_folds = self.n_folds, ?fold_weights, "assigned groups to folds");
        Ok(folds)
    }

    /// The first train/validation pairing.
    pub fn first_split(&self, groups: &[String]) -> Result<GroupSplit, ModelError> {
        let folds = self.folds(groups)?;
        let validation = folds[0].clone();
        let mut train: Vec<usize> = folds.into_iter().skip(1).flatten().collect();
        train.sort_unstable();

        Ok(GroupSplit {
            train,
            validation,
            n_folds: self.n_folds,
        })
    }
}

/// Reorder `rows` so each group forms one contiguous block.
///
/// Blocks follow the order in which groups first appear in `rows`; rows keep
/// their relative order inside a block. Returns the reordered rows and the
/// block sizes.
pub fn contiguous_groups(rows: &[usize], groups: &[String]) -> (Vec<usize>, Vec<usize>) {
    let mut order: Vec<&str> = Vec::new();
    let mut blocks: HashMap<&str, Vec<usize>> = HashMap::new();
    for &row in rows {
        let group = groups[row].as_str();
        blocks
            .entry(group)
            .or_insert_with(|| {
                order.push(group);
                Vec::new()
            })
            .push(row);
    }

    let mut reordered = Vec::with_capacity(rows.len());
    let mut sizes = Vec::with_capacity(order.len());
    for group in order {
        let block = &blocks[group];
        sizes.push(block.len());
        reordered.extend_from_slice(block);
    }
    (reordered, sizes)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn groups(labels: &[&str]) -> Vec<String> {
        labels.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_fold_count_capped_by_groups() {
        assert_eq!(GroupKFold::capped(3, 5).unwrap().n_folds(), 3);
        assert_eq!(GroupKFold::capped(3, 2).unwrap().n_folds(), 2);
        assert!(matches!(
            GroupKFold::capped(3, 1),
            Err(ModelError::TooFewFolds(1))
        ));
    }

    #[test]
    fn test_groups_never_straddle_folds() {
        let g = groups(&["A", "B", "A", "C", "B", "D", "A", "C"]);
        let folds = GroupKFold::new(3).unwrap().folds(&g).unwrap();

        assert_eq!(folds.iter().map(Vec::len).sum::<usize>(), g.len());
        for (i, fold) in folds.iter().enumerate() {
            for other in folds.iter().skip(i + 1) {
                for &a in fold {
                    for &b in other {
                        assert_ne!(g[a], g[b]);
                    }
                }
            }
        }
    }

    #[test]
    fn test_largest_group_is_validated_first() {
        let g = groups(&["A", "B", "A", "C", "A"]);
        let split = GroupKFold::new(3).unwrap().first_split(&g).unwrap();

        assert_eq!(split.validation, vec![0, 2, 4]);
        assert_eq!(split.train, vec![1, 3]);
    }

    #[test]
    fn test_equal_groups_visited_in_reverse_name_order() {
        let g = groups(&["A", "B", "C", "D", "E"]);
        let split = GroupKFold::new(3).unwrap().first_split(&g).unwrap();

        // E and B share fold 0, D and A fold 1, C fold 2
        assert_eq!(split.validation, vec![1, 4]);
        assert_eq!(split.train, vec![0, 2, 3]);

        let folds = GroupKFold::new(3).unwrap().folds(&g).unwrap();
        assert_eq!(folds, vec![vec![1, 4], vec![0, 3], vec![2]]);
    }

    #[test]
    fn test_more_folds_than_groups() {
        let g = groups(&["A", "A", "B"]);
        assert!(matches!(
            GroupKFold::new(3).unwrap().folds(&g),
            Err(ModelError::TooFewGroups {
                n_folds: 3,
                n_groups: 2
            })
        ));
    }

    #[test]
    fn test_contiguous_groups_keep_first_appearance() {
        let g = groups(&["B", "A", "B", "C", "A"]);
        let (rows, sizes) = contiguous_groups(&[0, 1, 2, 3, 4], &g);

        assert_eq!(rows, vec![0, 2, 1, 4, 3]);
        assert_eq!(sizes, vec![2, 2, 1]);
    }

    #[test]
    fn test_contiguous_groups_on_subset() {
        let g = groups(&["B", "A", "B", "C", "A"]);
        let (rows, sizes) = contiguous_groups(&[1, 3, 4], &g);

        assert_eq!(rows, vec![1, 4, 3]);
        assert_eq!(sizes, vec![2, 1]);
    }
}
