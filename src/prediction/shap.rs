//! SHAP value computation for tree models.
//!
//! Exact path-dependent TreeSHAP (Lundberg, Erion & Lee, Algorithm 2) on the
//! class-1 probability output. For an ensemble, values are averaged over the
//! trees, matching the mean-of-trees prediction, so local accuracy
//! `expected_value + Σφ = P(class 1)` holds for every row.

use crate::core::error::{Result, XaiError};
use crate::core::traits::TreeEnsemble;
use crate::core::types::{FeatureIndex, Score};
use crate::tree::Tree;
use ndarray::{Array1, Array2, ArrayView1, ArrayView2, Axis};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

/// Configuration for SHAP calculations
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShapConfig {
    /// Check `expected + Σφ = prediction` for every explained row
    pub validate_local_accuracy: bool,
    /// Tolerance for the local accuracy check
    pub validation_tolerance: f64,
}

impl Default for ShapConfig {
    fn default() -> Self {
        ShapConfig {
            validate_local_accuracy: true,
            validation_tolerance: 1e-6,
        }
    }
}

/// One feature's slot on the current root-to-node path.
#[derive(Debug, Clone, Copy)]
struct PathElement {
    feature: Option<FeatureIndex>,
    zero_fraction: f64,
    one_fraction: f64,
    weight: f64,
}

fn extend_path(path: &mut Vec<PathElement>, zero_fraction: f64, one_fraction: f64, feature: Option<FeatureIndex>) {
    let depth = path.len();
    path.push(PathElement {
        feature,
        zero_fraction,
        one_fraction,
        weight: if depth == 0 { 1.0 } else { 0.0 },
    });

    let denom = (depth + 1) as f64;
    for i in (0..depth).rev() {
        path[i + 1].weight += one_fraction * path[i].weight * (i + 1) as f64 / denom;
        path[i].weight = zero_fraction * path[i].weight * (depth - i) as f64 / denom;
    }
}

fn unwind_path(path: &mut Vec<PathElement>, index: usize) {
    let depth = path.len() - 1;
    let one = path[index].one_fraction;
    let zero = path[index].zero_fraction;
    let denom = (depth + 1) as f64;
    let mut next_one_portion = path[depth].weight;

    for i in (0..depth).rev() {
        if one != 0.0 {
            let tmp = path[i].weight;
            path[i].weight = next_one_portion * denom / ((i + 1) as f64 * one);
            next_one_portion = tmp - path[i].weight * zero * (depth - i) as f64 / denom;
        } else {
            path[i].weight = path[i].weight * denom / (zero * (depth - i) as f64);
        }
    }

    for i in index..depth {
        path[i].feature = path[i + 1].feature;
        path[i].zero_fraction = path[i + 1].zero_fraction;
        path[i].one_fraction = path[i + 1].one_fraction;
    }
    path.pop();
}

/// Total path weight if the element at `index` were unwound.
fn unwound_path_sum(path: &[PathElement], index: usize) -> f64 {
    let depth = path.len() - 1;
    let one = path[index].one_fraction;
    let zero = path[index].zero_fraction;
    let denom = (depth + 1) as f64;
    let mut next_one_portion = path[depth].weight;
    let mut total = 0.0;

    for i in (0..depth).rev() {
        if one != 0.0 {
            let tmp = next_one_portion * denom / ((i + 1) as f64 * one);
            total += tmp;
            next_one_portion = path[i].weight - tmp * zero * (depth - i) as f64 / denom;
        } else if zero != 0.0 {
            total += path[i].weight / zero / ((depth - i) as f64 / denom);
        }
    }
    total
}

/// Add one tree's SHAP values for `row` into `phi`.
fn tree_shap(tree: &Tree, row: &ArrayView1<'_, f64>, phi: &mut Array1<f64>) -> Result<()> {
    recurse(tree, 0, row, phi, &[], 1.0, 1.0, None)
}

#[allow(clippy::too_many_arguments)]
fn recurse(
    tree: &Tree,
    node_index: usize,
    row: &ArrayView1<'_, f64>,
    phi: &mut Array1<f64>,
    parent_path: &[PathElement],
    zero_fraction: f64,
    one_fraction: f64,
    feature: Option<FeatureIndex>,
) -> Result<()> {
    let node = tree
        .node(node_index)
        .ok_or_else(|| XaiError::index_out_of_bounds(node_index, tree.num_nodes()))?;

    let mut path = Vec::with_capacity(parent_path.len() + 1);
    path.extend_from_slice(parent_path);
    extend_path(&mut path, zero_fraction, one_fraction, feature);

    let (Some(split), Some(threshold), Some(left), Some(right)) = (
        node.split_feature(),
        node.split_threshold(),
        node.left_child(),
        node.right_child(),
    ) else {
        for i in 1..path.len() {
            let element = path[i];
            if let Some(f) = element.feature {
                let w = unwound_path_sum(&path, i);
                phi[f] += w * (element.one_fraction - element.zero_fraction) * node.value();
            }
        }
        return Ok(());
    };

    if split >= row.len() {
        return Err(XaiError::index_out_of_bounds(split, row.len()));
    }

    let (hot, cold) = if row[split] <= threshold { (left, right) } else { (right, left) };
    let cover_of = |index: usize| -> Result<f64> {
        tree.node(index)
            .map(|n| n.cover())
            .ok_or_else(|| XaiError::index_out_of_bounds(index, tree.num_nodes()))
    };
    let hot_zero = cover_of(hot)? / node.cover();
    let cold_zero = cover_of(cold)? / node.cover();

    let mut incoming_zero = 1.0;
    let mut incoming_one = 1.0;
    if let Some(k) = (1..path.len()).find(|&k| path[k].feature == Some(split)) {
        incoming_zero = path[k].zero_fraction;
        incoming_one = path[k].one_fraction;
        unwind_path(&mut path, k);
    }

    recurse(tree, hot, row, phi, &path, hot_zero * incoming_zero, incoming_one, Some(split))?;
    recurse(tree, cold, row, phi, &path, cold_zero * incoming_zero, 0.0, Some(split))
}

/// A SHAP local explanation: `(feature name, φ)` in feature order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShapExplanation {
    /// Feature names paired with their class-1 SHAP values
    pub entries: Vec<(String, f64)>,
    /// Expected model output
    pub expected_value: Score,
    /// Model class-1 probability for the row
    pub prediction: Score,
}

impl ShapExplanation {
    /// Entries sorted by |φ| descending.
    pub fn sorted_by_magnitude(&self) -> Vec<(String, f64)> {
        let mut sorted = self.entries.clone();
        sorted.sort_by(|a, b| b.1.abs().total_cmp(&a.1.abs()));
        sorted
    }

    /// Names of the `k` features with the largest |φ|.
    pub fn top_features(&self, k: usize) -> Vec<String> {
        self.sorted_by_magnitude()
            .into_iter()
            .take(k)
            .map(|(name, _)| name)
            .collect()
    }
}

/// TreeSHAP explainer over a fitted tree model.
#[derive(Debug)]
pub struct ShapExplainer<'a> {
    trees: &'a [Tree],
    num_features: usize,
    expected_value: Score,
    config: ShapConfig,
}

impl<'a> ShapExplainer<'a> {
    /// Create an explainer for a fitted model with `num_features` inputs.
    pub fn new<M: TreeEnsemble + ?Sized>(model: &'a M, num_features: usize) -> Result<Self> {
        Self::with_config(model, num_features, ShapConfig::default())
    }

    /// Create an explainer with custom configuration.
    pub fn with_config<M: TreeEnsemble + ?Sized>(
        model: &'a M,
        num_features: usize,
        config: ShapConfig,
    ) -> Result<Self> {
        let trees = model.trees();
        if trees.is_empty() {
            return Err(XaiError::not_fitted("tree model (no trees to explain)"));
        }
        let expected_value =
            trees.iter().map(Tree::expected_value).sum::<f64>() / trees.len() as f64;

        Ok(ShapExplainer {
            trees,
            num_features,
            expected_value,
            config,
        })
    }

    /// Mean class-1 output over the training distribution.
    pub fn expected_value(&self) -> Score {
        self.expected_value
    }

    /// Get SHAP configuration
    pub fn config(&self) -> &ShapConfig {
        &self.config
    }

    /// Class-1 SHAP values of a single row.
    pub fn shap_values_row(&self, row: &ArrayView1<'_, f64>) -> Result<Array1<f64>> {
        if row.len() != self.num_features {
            return Err(XaiError::dimension_mismatch(
                format!("{} features", self.num_features),
                format!("{} features", row.len()),
            ));
        }

        let mut phi = Array1::zeros(self.num_features);
        for tree in self.trees {
            tree_shap(tree, row, &mut phi)?;
        }
        phi /= self.trees.len() as f64;

        if self.config.validate_local_accuracy {
            let prediction = self.predict_row(row)?;
            let error = (self.expected_value + phi.sum() - prediction).abs();
            if error > self.config.validation_tolerance {
                return Err(XaiError::explanation(format!(
                    "SHAP local accuracy violated: error {:.3e} exceeds tolerance {:.3e}",
                    error, self.config.validation_tolerance
                )));
            }
        }

        Ok(phi)
    }

    /// Class-1 SHAP values, one row per sample. Rows are explained in parallel.
    pub fn shap_values(&self, features: &ArrayView2<'_, f64>) -> Result<Array2<f64>> {
        let rows: Vec<Array1<f64>> = features
            .axis_iter(Axis(0))
            .into_par_iter()
            .map(|row| self.shap_values_row(&row))
            .collect::<Result<_>>()?;

        let mut values = Array2::zeros((features.nrows(), self.num_features));
        for (mut target, row) in values.axis_iter_mut(Axis(0)).zip(rows) {
            target.assign(&row);
        }
        log::debug!("Computed SHAP values for {} rows", features.nrows());
        Ok(values)
    }

    /// SHAP values for `class` (0 or 1). Binary outputs sum to one, so the
    /// class-0 values are the negated class-1 values.
    pub fn class_values(class_one_values: &Array2<f64>, class: usize) -> Result<Array2<f64>> {
        match class {
            0 => Ok(class_one_values.mapv(|v| -v)),
            1 => Ok(class_one_values.clone()),
            other => Err(XaiError::invalid_parameter(
                "class",
                other.to_string(),
                "binary models have classes 0 and 1",
            )),
        }
    }

    /// Mean-of-trees class-1 prediction for one row.
    pub fn predict_row(&self, row: &ArrayView1<'_, f64>) -> Result<Score> {
        let mut total = 0.0;
        for tree in self.trees {
            total += tree.predict(row)?;
        }
        Ok(total / self.trees.len() as f64)
    }

    /// Explain one row as `(feature name, φ)` pairs.
    pub fn explain_row(&self, row: &ArrayView1<'_, f64>, feature_names: &[String]) -> Result<ShapExplanation> {
        if feature_names.len() != self.num_features {
            return Err(XaiError::dimension_mismatch(
                format!("{} feature names", self.num_features),
                format!("{} feature names", feature_names.len()),
            ));
        }
        let phi = self.shap_values_row(row)?;
        Ok(ShapExplanation {
            entries: feature_names.iter().cloned().zip(phi.iter().copied()).collect(),
            expected_value: self.expected_value,
            prediction: self.predict_row(row)?,
        })
    }
}

/// Mean |SHAP| per feature (column).
pub fn mean_abs_shap(values: &Array2<f64>) -> Array1<f64> {
    if values.nrows() == 0 {
        return Array1::zeros(values.ncols());
    }
    values.mapv(f64::abs).sum_axis(Axis(0)) / values.nrows() as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::traits::Classifier;
    use crate::tree::tree::tests::stump_pair;
    use crate::tree::DecisionTreeClassifier;
    use approx::assert_abs_diff_eq;
    use ndarray::array;

    struct Single(Vec<Tree>);

    impl TreeEnsemble for Single {
        fn trees(&self) -> &[Tree] {
            &self.0
        }
    }

    /// Path-dependent conditional expectation of the tree given the
    /// features in `known` take their values from `row`.
    fn conditional_expectation(tree: &Tree, index: usize, row: &[f64], known: &[usize]) -> f64 {
        let node = tree.node(index).unwrap();
        match (node.split_feature(), node.split_threshold()) {
            (Some(f), Some(t)) => {
                let (l, r) = (node.left_child().unwrap(), node.right_child().unwrap());
                if known.contains(&f) {
                    let next = if row[f] <= t { l } else { r };
                    conditional_expectation(tree, next, row, known)
                } else {
                    let lc = tree.node(l).unwrap().cover();
                    let rc = tree.node(r).unwrap().cover();
                    (lc * conditional_expectation(tree, l, row, known)
                        + rc * conditional_expectation(tree, r, row, known))
                        / node.cover()
                }
            }
            _ => node.value(),
        }
    }

    fn brute_force_shapley(tree: &Tree, row: &[f64], n: usize) -> Vec<f64> {
        let fact = |k: usize| (1..=k).product::<usize>() as f64;
        let mut phi = vec![0.0; n];
        for i in 0..n {
            for mask in 0..(1usize << n) {
                if mask & (1 << i) != 0 {
                    continue;
                }
                let subset: Vec<usize> = (0..n).filter(|j| mask & (1 << j) != 0).collect();
                let mut with_i = subset.clone();
                with_i.push(i);
                let weight = fact(subset.len()) * fact(n - subset.len() - 1) / fact(n);
                phi[i] += weight
                    * (conditional_expectation(tree, 0, row, &with_i)
                        - conditional_expectation(tree, 0, row, &subset));
            }
        }
        phi
    }

    #[test]
    fn test_stump_values() {
        let model = Single(vec![stump_pair()]);
        let explainer = ShapExplainer::new(&model, 2).unwrap();
        assert_abs_diff_eq!(explainer.expected_value(), 0.5);

        // E[f] = 0.5, E[f | x0] = 0.95, E[f | x1] = 0.6 * 0.0 + 0.4 * 0.95 = 0.38.
        let phi = explainer.shap_values_row(&array![1.0, 0.0].view()).unwrap();
        assert_abs_diff_eq!(phi[0], 0.51, epsilon = 1e-12);
        assert_abs_diff_eq!(phi[1], -0.06, epsilon = 1e-12);
    }

    #[test]
    fn test_matches_brute_force_shapley() {
        let model = Single(vec![stump_pair()]);
        let explainer = ShapExplainer::new(&model, 2).unwrap();
        for row in [[0.0, 1.0], [0.0, 2.0], [1.0, 1.0], [1.0, 2.0]] {
            let phi = explainer.shap_values_row(&array![row[0], row[1]].view()).unwrap();
            let expected = brute_force_shapley(&model.0[0], &row, 2);
            for (a, b) in phi.iter().zip(&expected) {
                assert_abs_diff_eq!(*a, *b, epsilon = 1e-12);
            }
        }
    }

    #[test]
    fn test_repeated_feature_on_path_matches_brute_force() {
        let x = array![
            [1.0, 5.0, 0.0],
            [2.0, 4.0, 1.0],
            [3.0, 3.0, 0.0],
            [4.0, 2.0, 1.0],
            [5.0, 1.0, 1.0],
            [6.0, 0.0, 0.0],
            [7.0, 2.5, 1.0],
            [8.0, 3.5, 0.0],
        ];
        let y = array![0.0, 1.0, 0.0, 1.0, 1.0, 0.0, 1.0, 0.0];
        let mut model = DecisionTreeClassifier::default();
        model.fit(&x.view(), &y.view()).unwrap();

        let explainer = ShapExplainer::new(&model, 3).unwrap();
        for row in x.rows() {
            let phi = explainer.shap_values_row(&row).unwrap();
            let expected = brute_force_shapley(model.tree().unwrap(), row.as_slice().unwrap(), 3);
            for (a, b) in phi.iter().zip(&expected) {
                assert_abs_diff_eq!(*a, *b, epsilon = 1e-9);
            }
        }
    }

    #[test]
    fn test_local_accuracy_and_class_values() {
        let model = Single(vec![stump_pair(), stump_pair()]);
        let explainer = ShapExplainer::new(&model, 2).unwrap();
        let x = array![[0.0, 1.0], [0.2, 3.0], [2.0, 0.0]];

        let values = explainer.shap_values(&x.view()).unwrap();
        for (i, row) in x.rows().into_iter().enumerate() {
            let prediction = explainer.predict_row(&row).unwrap();
            assert_abs_diff_eq!(
                explainer.expected_value() + values.row(i).sum(),
                prediction,
                epsilon = 1e-12
            );
        }

        let class_zero = ShapExplainer::class_values(&values, 0).unwrap();
        assert_abs_diff_eq!(class_zero[[0, 0]], -values[[0, 0]]);
        assert!(ShapExplainer::class_values(&values, 2).is_err());
        assert_eq!(mean_abs_shap(&values).len(), 2);
    }

    #[test]
    fn test_explain_row_and_errors() {
        let model = Single(vec![stump_pair()]);
        let explainer = ShapExplainer::new(&model, 2).unwrap();
        let names = vec!["Glucose".to_string(), "BMI".to_string()];

        let explanation = explainer.explain_row(&array![1.0, 0.0].view(), &names).unwrap();
        assert_eq!(explanation.entries[0].0, "Glucose");
        assert_eq!(explanation.top_features(1), vec!["Glucose".to_string()]);
        assert_abs_diff_eq!(explanation.prediction, 0.95);

        assert!(explainer.shap_values_row(&array![1.0].view()).is_err());
        assert!(ShapExplainer::new(&Single(Vec::new()), 2).is_err());
    }
}
