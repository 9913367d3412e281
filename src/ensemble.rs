//! Random forest classifier.
//!
//! Bagged CART trees with per-node feature subsampling. The forest's class-1
//! probability is the plain mean of its trees' leaf probabilities, which is
//! what lets TreeSHAP explain it tree by tree.

use crate::config::ModelConfig;
use crate::core::constants::{DEFAULT_N_ESTIMATORS, DEFAULT_RANDOM_SEED};
use crate::core::error::{Result, XaiError};
use crate::core::traits::{Classifier, TreeEnsemble};
use crate::core::types::MaxFeatures;
use crate::tree::classifier::{build_tree, check_width, normalize, validate_training_data};
use crate::tree::{Tree, TreeParams};
use ndarray::{Array1, Array2, ArrayView1, ArrayView2};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;

/// Forest-level settings.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ForestParams {
    /// Number of trees
    pub n_estimators: usize,
    /// Draw a bootstrap sample per tree
    pub bootstrap: bool,
    /// Tree growth limits
    pub tree: TreeParams,
}

impl Default for ForestParams {
    fn default() -> Self {
        ForestParams {
            n_estimators: DEFAULT_N_ESTIMATORS,
            bootstrap: true,
            tree: TreeParams {
                max_features: MaxFeatures::Sqrt,
                ..TreeParams::default()
            },
        }
    }
}

impl From<&ModelConfig> for ForestParams {
    fn from(config: &ModelConfig) -> Self {
        ForestParams {
            n_estimators: config.n_estimators,
            bootstrap: config.bootstrap,
            tree: TreeParams::from(config),
        }
    }
}

/// Bagged ensemble of CART trees.
#[derive(Debug, Clone)]
pub struct RandomForestClassifier {
    params: ForestParams,
    seed: u64,
    trees: Vec<Tree>,
    num_features: Option<usize>,
}

impl Default for RandomForestClassifier {
    fn default() -> Self {
        RandomForestClassifier::new(ForestParams::default(), DEFAULT_RANDOM_SEED)
    }
}

impl RandomForestClassifier {
    /// Create an unfitted forest.
    pub fn new(params: ForestParams, seed: u64) -> Self {
        RandomForestClassifier {
            params,
            seed,
            trees: Vec::new(),
            num_features: None,
        }
    }

    /// Create an unfitted forest from the model section of the configuration.
    pub fn from_config(config: &ModelConfig, seed: u64) -> Self {
        RandomForestClassifier::new(ForestParams::from(config), seed)
    }

    /// Forest settings.
    pub fn params(&self) -> &ForestParams {
        &self.params
    }

    /// Number of fitted trees.
    pub fn num_trees(&self) -> usize {
        self.trees.len()
    }

    fn ensure_fitted(&self) -> Result<()> {
        if self.trees.is_empty() {
            return Err(XaiError::not_fitted(self.name()));
        }
        Ok(())
    }
}

impl Classifier for RandomForestClassifier {
    fn fit(&mut self, features: &ArrayView2<'_, f64>, labels: &ArrayView1<'_, f64>) -> Result<()> {
        validate_training_data(features, labels)?;
        if self.params.n_estimators == 0 {
            return Err(XaiError::invalid_parameter(
                "n_estimators",
                "0",
                "must be at least 1",
            ));
        }

        let n = features.nrows();
        let mut rng = StdRng::seed_from_u64(self.seed);
        let tree_seeds: Vec<u64> = (0..self.params.n_estimators).map(|_| rng.gen()).collect();

        let params = self.params;
        let trees = tree_seeds
            .par_iter()
            .map(|&tree_seed| {
                let mut tree_rng = StdRng::seed_from_u64(tree_seed);
                let indices: Vec<usize> = if params.bootstrap {
                    (0..n).map(|_| tree_rng.gen_range(0..n)).collect()
                } else {
                    (0..n).collect()
                };
                build_tree(features, labels, indices, &params.tree, tree_rng.gen())
            })
            .collect::<Result<Vec<Tree>>>()?;

        let mean_leaves =
            trees.iter().map(Tree::num_leaves).sum::<usize>() as f64 / trees.len() as f64;
        log::info!(
            "Fitted random forest: {} trees, {:.1} leaves on average",
            trees.len(),
            mean_leaves
        );

        self.trees = trees;
        self.num_features = Some(features.ncols());
        Ok(())
    }

    fn predict_proba(&self, features: &ArrayView2<'_, f64>) -> Result<Array2<f64>> {
        self.ensure_fitted()?;
        check_width(self.num_features, features)?;

        let mut p1 = Array1::<f64>::zeros(features.nrows());
        for tree in &self.trees {
            p1 += &tree.predict_batch(features)?;
        }
        p1 /= self.trees.len() as f64;

        let mut proba = Array2::zeros((features.nrows(), 2));
        proba.column_mut(1).assign(&p1);
        proba.column_mut(0).assign(&p1.mapv(|p| 1.0 - p));
        Ok(proba)
    }

    fn feature_importances(&self) -> Result<Array1<f64>> {
        self.ensure_fitted()?;
        let n = self.num_features.unwrap_or(0);

        let mut total = Array1::<f64>::zeros(n);
        for tree in &self.trees {
            total += &normalize(tree.feature_importance(n));
        }
        total /= self.trees.len() as f64;
        Ok(normalize(total))
    }

    fn name(&self) -> &'static str {
        "RandomForestClassifier"
    }

    fn is_fitted(&self) -> bool {
        !self.trees.is_empty()
    }

    fn num_features(&self) -> Option<usize> {
        self.num_features
    }
}

impl TreeEnsemble for RandomForestClassifier {
    fn trees(&self) -> &[Tree] {
        &self.trees
    }
}
