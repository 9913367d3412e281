//! Decision tree module for xai-compare.
//!
//! - [`tree`]: array-backed binary tree with class-1 probabilities at nodes
//! - [`node`]: node storage (split, cover, value, impurity)
//! - [`split`]: exhaustive Gini split search
//! - [`sampling`]: per-node random feature order
//! - [`classifier`]: the CART [`DecisionTreeClassifier`]

pub mod classifier;
pub mod node;
pub mod sampling;
pub mod split;
pub mod tree;

pub use classifier::{DecisionTreeClassifier, TreeParams};
pub use node::TreeNode;
pub use sampling::FeatureSampler;
pub use split::{gini, SplitFinder, SplitInfo};
pub use tree::{NodeStats, Tree};
