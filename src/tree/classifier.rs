//! CART decision tree classifier.

use crate::config::ModelConfig;
use crate::core::constants::{DEFAULT_MIN_SAMPLES_LEAF, DEFAULT_MIN_SAMPLES_SPLIT, DEFAULT_RANDOM_SEED};
use crate::core::error::{Result, XaiError};
use crate::core::traits::{Classifier, TreeEnsemble};
use crate::core::types::MaxFeatures;
use crate::tree::sampling::FeatureSampler;
use crate::tree::split::{gini, SplitFinder};
use crate::tree::tree::{NodeStats, Tree};
use ndarray::{Array1, Array2, ArrayView1, ArrayView2};

/// Growth limits of a single tree.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TreeParams {
    /// Maximum depth (None = grow until leaves are pure)
    pub max_depth: Option<usize>,
    /// Minimum samples required to split a node
    pub min_samples_split: usize,
    /// Minimum samples in each child
    pub min_samples_leaf: usize,
    /// Features evaluated per node
    pub max_features: MaxFeatures,
}

impl Default for TreeParams {
    fn default() -> Self {
        TreeParams {
            max_depth: None,
            min_samples_split: DEFAULT_MIN_SAMPLES_SPLIT,
            min_samples_leaf: DEFAULT_MIN_SAMPLES_LEAF,
            max_features: MaxFeatures::All,
        }
    }
}

impl From<&ModelConfig> for TreeParams {
    fn from(config: &ModelConfig) -> Self {
        TreeParams {
            max_depth: config.max_depth,
            min_samples_split: config.min_samples_split,
            min_samples_leaf: config.min_samples_leaf,
            max_features: config.effective_max_features(),
        }
    }
}

/// Check that features and labels can be fitted on.
pub(crate) fn validate_training_data(
    features: &ArrayView2<'_, f64>,
    labels: &ArrayView1<'_, f64>,
) -> Result<()> {
    if features.nrows() == 0 || features.ncols() == 0 {
        return Err(XaiError::training("Cannot fit on an empty feature matrix"));
    }
    if features.nrows() != labels.len() {
        return Err(XaiError::dimension_mismatch(
            format!("{} labels", features.nrows()),
            format!("{} labels", labels.len()),
        ));
    }
    if labels.iter().any(|&y| y != 0.0 && y != 1.0) {
        return Err(XaiError::training("Labels must be 0 or 1"));
    }
    if features.iter().any(|v| !v.is_finite()) {
        return Err(XaiError::training("Features must be finite"));
    }
    Ok(())
}

fn node_stats(labels: &ArrayView1<'_, f64>, indices: &[usize]) -> (NodeStats, usize) {
    let total = indices.len();
    let positives = indices.iter().filter(|&&i| labels[i] == 1.0).count();
    let stats = NodeStats {
        cover: total as f64,
        value: positives as f64 / total as f64,
        impurity: gini(positives as f64, total as f64),
    };
    (stats, positives)
}

/// Grow one CART tree on `indices` (duplicates allowed, as in a bootstrap).
pub(crate) fn build_tree(
    features: &ArrayView2<'_, f64>,
    labels: &ArrayView1<'_, f64>,
    indices: Vec<usize>,
    params: &TreeParams,
    seed: u64,
) -> Result<Tree> {
    if indices.is_empty() {
        return Err(XaiError::training("Cannot grow a tree on zero samples"));
    }

    let finder = SplitFinder::new(params.min_samples_leaf);
    let mut sampler = FeatureSampler::new(features.ncols(), params.max_features, seed);

    let (root, _) = node_stats(labels, &indices);
    let mut tree = Tree::new(root);
    let mut stack = vec![(0usize, indices)];

    while let Some((node_index, node_indices)) = stack.pop() {
        let Some(node) = tree.node(node_index) else {
            return Err(XaiError::training(format!("Missing node {}", node_index)));
        };

        let at_max_depth = params.max_depth.map_or(false, |d| node.depth() >= d);
        if at_max_depth
            || node_indices.len() < params.min_samples_split
            || node_indices.len() < 2 * params.min_samples_leaf
            || node.impurity() <= 0.0
        {
            continue;
        }

        let order = sampler.node_order();
        let Some(split) =
            finder.find_best_split(features, labels, &node_indices, &order, sampler.budget())
        else {
            continue;
        };

        let (left_indices, right_indices): (Vec<usize>, Vec<usize>) = node_indices
            .iter()
            .copied()
            .partition(|&i| features[[i, split.feature]] <= split.threshold);

        let (left, _) = node_stats(labels, &left_indices);
        let (right, _) = node_stats(labels, &right_indices);
        let (left_index, right_index) = tree.split_node(
            node_index,
            split.feature,
            split.threshold,
            split.gain,
            left,
            right,
        )?;

        stack.push((right_index, right_indices));
        stack.push((left_index, left_indices));
    }

    Ok(tree)
}

/// Normalize importances to sum to one; all-zero stays all-zero.
pub(crate) fn normalize(mut importance: Array1<f64>) -> Array1<f64> {
    let total = importance.sum();
    if total > 0.0 {
        importance /= total;
    }
    importance
}

/// Single CART tree with Gini impurity.
#[derive(Debug, Clone)]
pub struct DecisionTreeClassifier {
    params: TreeParams,
    seed: u64,
    trees: Vec<Tree>,
    num_features: Option<usize>,
}

impl Default for DecisionTreeClassifier {
    fn default() -> Self {
        DecisionTreeClassifier::new(TreeParams::default(), DEFAULT_RANDOM_SEED)
    }
}

impl DecisionTreeClassifier {
    /// Creates an unfitted classifier.
    pub fn new(params: TreeParams, seed: u64) -> Self {
        DecisionTreeClassifier {
            params,
            seed,
            trees: Vec::new(),
            num_features: None,
        }
    }

    /// Creates an unfitted classifier from the model section of the configuration.
    pub fn from_config(config: &ModelConfig, seed: u64) -> Self {
        DecisionTreeClassifier::new(TreeParams::from(config), seed)
    }

    /// Growth limits.
    pub fn params(&self) -> &TreeParams {
        &self.params
    }

    /// The fitted tree.
    pub fn tree(&self) -> Result<&Tree> {
        self.trees
            .first()
            .ok_or_else(|| XaiError::not_fitted(self.name()))
    }
}

impl Classifier for DecisionTreeClassifier {
    fn fit(&mut self, features: &ArrayView2<'_, f64>, labels: &ArrayView1<'_, f64>) -> Result<()> {
        validate_training_data(features, labels)?;

        let indices: Vec<usize> = (0..features.nrows()).collect();
        let tree = build_tree(features, labels, indices, &self.params, self.seed)?;

        log::info!(
            "Fitted decision tree: {} leaves, depth {}",
            tree.num_leaves(),
            tree.depth()
        );

        self.trees = vec![tree];
        self.num_features = Some(features.ncols());
        Ok(())
    }

    fn predict_proba(&self, features: &ArrayView2<'_, f64>) -> Result<Array2<f64>> {
        let tree = self.tree()?;
        check_width(self.num_features, features)?;

        let p1 = tree.predict_batch(features)?;
        let mut proba = Array2::zeros((features.nrows(), 2));
        for (i, &p) in p1.iter().enumerate() {
            proba[[i, 0]] = 1.0 - p;
            proba[[i, 1]] = p;
        }
        Ok(proba)
    }

    fn feature_importances(&self) -> Result<Array1<f64>> {
        let tree = self.tree()?;
        let n = self.num_features.unwrap_or(0);
        Ok(normalize(tree.feature_importance(n)))
    }

    fn name(&self) -> &'static str {
        "DecisionTreeClassifier"
    }

    fn is_fitted(&self) -> bool {
        !self.trees.is_empty()
    }

    fn num_features(&self) -> Option<usize> {
        self.num_features
    }
}

impl TreeEnsemble for DecisionTreeClassifier {
    fn trees(&self) -> &[Tree] {
        &self.trees
    }
}

/// Reject matrices whose width differs from the fitted width.
pub(crate) fn check_width(fitted: Option<usize>, features: &ArrayView2<'_, f64>) -> Result<()> {
    match fitted {
        Some(n) if n != features.ncols() => Err(XaiError::dimension_mismatch(
            format!("{} features", n),
            format!("{} features", features.ncols()),
        )),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::array;

    fn xor_like() -> (Array2<f64>, Array1<f64>) {
        let x = array![
            [0.0, 0.0, 3.0],
            [0.0, 1.0, 3.0],
            [1.0, 0.0, 3.0],
            [1.0, 1.0, 3.0],
            [0.1, 0.1, 3.0],
            [0.9, 0.9, 3.0],
        ];
        let y = array![0.0, 1.0, 1.0, 0.0, 0.0, 0.0];
        (x, y)
    }

    #[test]
    fn test_fits_training_data_exactly() {
        let (x, y) = xor_like();
        let mut model = DecisionTreeClassifier::default();
        model.fit(&x.view(), &y.view()).unwrap();

        assert!(model.is_fitted());
        assert_eq!(model.predict(&x.view()).unwrap(), y);
        assert!(model.tree().unwrap().validate().is_ok());

        let proba = model.predict_proba(&x.view()).unwrap();
        for row in proba.rows() {
            assert_relative_eq!(row.sum(), 1.0);
        }
    }

    #[test]
    fn test_importances_ignore_constant_feature() {
        let (x, y) = xor_like();
        let mut model = DecisionTreeClassifier::default();
        model.fit(&x.view(), &y.view()).unwrap();

        let importance = model.feature_importances().unwrap();
        assert_relative_eq!(importance.sum(), 1.0, epsilon = 1e-12);
        assert_eq!(importance[2], 0.0);
    }

    #[test]
    fn test_max_depth_limits_growth() {
        let (x, y) = xor_like();
        let params = TreeParams {
            max_depth: Some(1),
            ..TreeParams::default()
        };
        let mut model = DecisionTreeClassifier::new(params, 0);
        model.fit(&x.view(), &y.view()).unwrap();
        assert!(model.tree().unwrap().depth() <= 1);
    }

    #[test]
    fn test_pure_labels_give_single_leaf() {
        let x = array![[1.0], [2.0], [3.0]];
        let y = array![1.0, 1.0, 1.0];
        let mut model = DecisionTreeClassifier::default();
        model.fit(&x.view(), &y.view()).unwrap();
        assert_eq!(model.tree().unwrap().num_leaves(), 1);
        assert_eq!(model.feature_importances().unwrap().to_vec(), vec![0.0]);
    }

    #[test]
    fn test_errors() {
        let model = DecisionTreeClassifier::default();
        assert!(model.predict_proba(&array![[1.0]].view()).is_err());

        let mut model = DecisionTreeClassifier::default();
        assert!(model.fit(&array![[1.0], [2.0]].view(), &array![0.0, 3.0].view()).is_err());
        assert!(model.fit(&array![[1.0], [2.0]].view(), &array![0.0].view()).is_err());

        model.fit(&array![[1.0], [2.0]].view(), &array![0.0, 1.0].view()).unwrap();
        assert!(model.predict_proba(&array![[1.0, 2.0]].view()).is_err());
    }
}
