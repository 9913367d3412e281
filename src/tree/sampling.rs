//! Per-node feature sampling for tree construction.

use crate::core::types::{FeatureIndex, MaxFeatures};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

/// Draws the order in which features are tried at each node.
///
/// The split finder evaluates features in this order and stops once `budget`
/// non-constant features have been tried, unless no valid split has turned up
/// yet, in which case it keeps going.
#[derive(Debug, Clone)]
pub struct FeatureSampler {
    num_features: usize,
    budget: usize,
    rng: StdRng,
}

impl FeatureSampler {
    /// Creates a sampler for `num_features` columns.
    pub fn new(num_features: usize, max_features: MaxFeatures, seed: u64) -> Self {
        FeatureSampler {
            num_features,
            budget: max_features.resolve(num_features),
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Number of non-constant features to evaluate per node.
    pub fn budget(&self) -> usize {
        self.budget
    }

    /// A fresh random permutation of all feature indices.
    pub fn node_order(&mut self) -> Vec<FeatureIndex> {
        let mut order: Vec<FeatureIndex> = (0..self.num_features).collect();
        order.shuffle(&mut self.rng);
        order
    }
}
