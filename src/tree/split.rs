//! Exhaustive Gini split search.

use crate::core::types::FeatureIndex;
use ndarray::{ArrayView1, ArrayView2};

/// Gini impurity of a node with `positives` class-1 samples out of `total`.
pub fn gini(positives: f64, total: f64) -> f64 {
    if total <= 0.0 {
        return 0.0;
    }
    let p = positives / total;
    1.0 - p * p - (1.0 - p) * (1.0 - p)
}

/// Best split found for a node.
#[derive(Debug, Clone, PartialEq)]
pub struct SplitInfo {
    /// Feature to split on
    pub feature: FeatureIndex,
    /// Samples with `value <= threshold` go left
    pub threshold: f64,
    /// `n·I(node) - n_l·I(left) - n_r·I(right)`
    pub gain: f64,
    /// Samples sent left
    pub left_count: usize,
    /// Class-1 samples sent left
    pub left_positives: usize,
}

/// Finds the best Gini split over a node's sample indices.
#[derive(Debug, Clone, Copy)]
pub struct SplitFinder {
    min_samples_leaf: usize,
}

impl SplitFinder {
    /// Creates a split finder.
    pub fn new(min_samples_leaf: usize) -> Self {
        SplitFinder {
            min_samples_leaf: min_samples_leaf.max(1),
        }
    }

    /// Search `feature_order` for the split with the largest impurity decrease.
    ///
    /// Constant features are skipped without counting toward `budget`. Once
    /// `budget` features have been evaluated the search stops, but only if a
    /// valid split has been found. Ties keep the first split seen.
    pub fn find_best_split(
        &self,
        features: &ArrayView2<'_, f64>,
        labels: &ArrayView1<'_, f64>,
        indices: &[usize],
        feature_order: &[FeatureIndex],
        budget: usize,
    ) -> Option<SplitInfo> {
        let total = indices.len();
        let positives = indices.iter().filter(|&&i| labels[i] == 1.0).count();
        let parent = total as f64 * gini(positives as f64, total as f64);

        let mut best: Option<SplitInfo> = None;
        let mut visited = 0usize;
        let mut column: Vec<(f64, bool)> = Vec::with_capacity(total);

        for &feature in feature_order {
            if visited >= budget && best.is_some() {
                break;
            }

            column.clear();
            column.extend(indices.iter().map(|&i| (features[[i, feature]], labels[i] == 1.0)));
            column.sort_by(|a, b| a.0.total_cmp(&b.0));

            if column.first().map(|c| c.0) == column.last().map(|c| c.0) {
                continue;
            }
            visited += 1;

            if let Some(candidate) = self.best_for_feature(feature, &column, positives, parent) {
                if best.as_ref().map_or(true, |b| candidate.gain > b.gain) {
                    best = Some(candidate);
                }
            }
        }

        best
    }

    fn best_for_feature(
        &self,
        feature: FeatureIndex,
        sorted: &[(f64, bool)],
        positives: usize,
        parent: f64,
    ) -> Option<SplitInfo> {
        let total = sorted.len();
        let mut best: Option<SplitInfo> = None;
        let mut left_positives = 0usize;

        for pos in 1..total {
            if sorted[pos - 1].1 {
                left_positives += 1;
            }

            let (lo, hi) = (sorted[pos - 1].0, sorted[pos].0);
            if lo >= hi || pos < self.min_samples_leaf || total - pos < self.min_samples_leaf {
                continue;
            }

            let left = pos as f64;
            let right = (total - pos) as f64;
            let gain = parent
                - left * gini(left_positives as f64, left)
                - right * gini((positives - left_positives) as f64, right);

            if best.as_ref().map_or(true, |b| gain > b.gain) {
                let mut threshold = lo + (hi - lo) / 2.0;
                if threshold >= hi {
                    threshold = lo;
                }
                best = Some(SplitInfo {
                    feature,
                    threshold,
                    gain,
                    left_count: pos,
                    left_positives,
                });
            }
        }

        best
    }
}
