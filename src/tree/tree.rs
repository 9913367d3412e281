//! Binary classification tree.
//!
//! Nodes live in a contiguous vector with the root at index 0; children are
//! always appended after their parent.

use crate::core::error::{Result, XaiError};
use crate::core::types::{FeatureIndex, NodeIndex, Score};
use crate::tree::node::TreeNode;
use ndarray::{Array1, ArrayView1, ArrayView2, Axis};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Statistics of a node about to be created.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NodeStats {
    /// Training samples reaching the node
    pub cover: f64,
    /// Class-1 fraction
    pub value: Score,
    /// Gini impurity
    pub impurity: f64,
}

/// Decision tree whose leaves hold class-1 probabilities.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tree {
    /// Vector of tree nodes (index 0 is always the root)
    nodes: Vec<TreeNode>,
    /// Current number of leaf nodes
    num_leaves: usize,
    /// Deepest node depth
    max_depth: usize,
}

impl Tree {
    /// Creates a tree consisting of a single root leaf.
    pub fn new(root: NodeStats) -> Self {
        Tree {
            nodes: vec![TreeNode::new_leaf(
                root.cover,
                root.value,
                root.impurity,
                0,
                None,
            )],
            num_leaves: 1,
            max_depth: 0,
        }
    }

    /// Returns the number of nodes in the tree.
    pub fn num_nodes(&self) -> usize {
        self.nodes.len()
    }

    /// Returns the number of leaf nodes in the tree.
    pub fn num_leaves(&self) -> usize {
        self.num_leaves
    }

    /// Returns the depth of the deepest node.
    pub fn depth(&self) -> usize {
        self.max_depth
    }

    /// Returns the node at `index`.
    pub fn node(&self, index: NodeIndex) -> Option<&TreeNode> {
        self.nodes.get(index)
    }

    /// All nodes in storage order.
    pub fn nodes(&self) -> &[TreeNode] {
        &self.nodes
    }

    /// Returns the root node.
    pub fn root(&self) -> &TreeNode {
        &self.nodes[0]
    }

    /// Cover-weighted mean prediction, i.e. the root value.
    pub fn expected_value(&self) -> Score {
        self.root().value()
    }

    /// Index of the leaf reached by `features`.
    pub fn predict_leaf_index(&self, features: &ArrayView1<'_, f64>) -> Result<NodeIndex> {
        let mut node_index = 0;

        loop {
            let node = &self.nodes[node_index];
            let (Some(feature), Some(threshold)) = (node.split_feature(), node.split_threshold())
            else {
                return Ok(node_index);
            };

            if feature >= features.len() {
                return Err(XaiError::index_out_of_bounds(feature, features.len()));
            }

            let next = if features[feature] <= threshold {
                node.left_child()
            } else {
                node.right_child()
            };
            node_index = next.ok_or_else(|| {
                XaiError::prediction(format!("Internal node {} has no child", node_index))
            })?;
        }
    }

    /// Class-1 probability for a single data point.
    pub fn predict(&self, features: &ArrayView1<'_, f64>) -> Result<Score> {
        let leaf = self.predict_leaf_index(features)?;
        Ok(self.nodes[leaf].value())
    }

    /// Class-1 probabilities for multiple data points.
    pub fn predict_batch(&self, features: &ArrayView2<'_, f64>) -> Result<Array1<Score>> {
        features
            .axis_iter(Axis(0))
            .map(|row| self.predict(&row))
            .collect()
    }

    /// Splits a leaf into an internal node with two new leaf children.
    pub fn split_node(
        &mut self,
        node_index: NodeIndex,
        split_feature: FeatureIndex,
        split_threshold: f64,
        split_gain: f64,
        left: NodeStats,
        right: NodeStats,
    ) -> Result<(NodeIndex, NodeIndex)> {
        let depth = match self.nodes.get(node_index) {
            None => return Err(XaiError::index_out_of_bounds(node_index, self.nodes.len())),
            Some(node) if !node.is_leaf() => {
                return Err(XaiError::training(format!(
                    "Cannot split non-leaf node {}",
                    node_index
                )))
            }
            Some(node) => node.depth() + 1,
        };

        let left_index = self.nodes.len();
        let right_index = left_index + 1;

        self.nodes.push(TreeNode::new_leaf(
            left.cover,
            left.value,
            left.impurity,
            depth,
            Some(node_index),
        ));
        self.nodes.push(TreeNode::new_leaf(
            right.cover,
            right.value,
            right.impurity,
            depth,
            Some(node_index),
        ));
        self.nodes[node_index].set_split(
            left_index,
            right_index,
            split_feature,
            split_threshold,
            split_gain,
        );

        self.num_leaves += 1;
        self.max_depth = self.max_depth.max(depth);
        Ok((left_index, right_index))
    }

    /// Returns all leaf node indices.
    pub fn leaf_indices(&self) -> Vec<NodeIndex> {
        self.nodes
            .iter()
            .enumerate()
            .filter_map(|(i, node)| if node.is_leaf() { Some(i) } else { None })
            .collect()
    }

    /// Total impurity decrease per feature (not normalized).
    pub fn feature_importance(&self, num_features: usize) -> Array1<f64> {
        let mut importance = Array1::zeros(num_features);

        for node in &self.nodes {
            if let Some(feature_idx) = node.split_feature() {
                if feature_idx < num_features {
                    importance[feature_idx] += node.split_gain();
                }
            }
        }

        importance
    }

    /// Returns a textual representation of the tree structure.
    pub fn to_string_representation(&self) -> String {
        let mut result = String::new();
        self.tree_to_string_recursive(0, "", true, &mut result);
        result
    }

    fn tree_to_string_recursive(
        &self,
        node_index: NodeIndex,
        prefix: &str,
        is_last: bool,
        result: &mut String,
    ) {
        let Some(node) = self.nodes.get(node_index) else {
            return;
        };
        let current_prefix = if is_last { "└── " } else { "├── " };
        result.push_str(&format!("{}{}{}\n", prefix, current_prefix, node));

        let new_prefix = format!("{}{}", prefix, if is_last { "    " } else { "│   " });
        if let Some(left_child) = node.left_child() {
            self.tree_to_string_recursive(left_child, &new_prefix, false, result);
        }
        if let Some(right_child) = node.right_child() {
            self.tree_to_string_recursive(right_child, &new_prefix, true, result);
        }
    }

    /// Validates parent/child links, leaf count and cover conservation.
    pub fn validate(&self) -> Result<()> {
        if self.nodes[0].parent().is_some() {
            return Err(XaiError::training("Root node should not have a parent"));
        }

        let mut leaf_count = 0;
        for (i, node) in self.nodes.iter().enumerate() {
            if node.is_leaf() {
                leaf_count += 1;
                continue;
            }

            let (Some(left), Some(right)) = (node.left_child(), node.right_child()) else {
                return Err(XaiError::training(format!("Internal node {} missing children", i)));
            };

            if left >= self.nodes.len() || right >= self.nodes.len() {
                return Err(XaiError::training(format!("Node {} has invalid child indices", i)));
            }

            if self.nodes[left].parent() != Some(i) || self.nodes[right].parent() != Some(i) {
                return Err(XaiError::training(format!("Children of node {} have wrong parent", i)));
            }

            let child_cover = self.nodes[left].cover() + self.nodes[right].cover();
            if (child_cover - node.cover()).abs() > 1e-9 {
                return Err(XaiError::training(format!(
                    "Cover of node {} ({}) differs from its children ({})",
                    i,
                    node.cover(),
                    child_cover
                )));
            }
        }

        if leaf_count != self.num_leaves {
            return Err(XaiError::training(format!(
                "Leaf count mismatch: expected {}, found {}",
                self.num_leaves, leaf_count
            )));
        }

        Ok(())
    }

    /// Converts the tree to a JSON representation.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Creates a tree from a JSON representation.
    pub fn from_json(json: &str) -> Result<Self> {
        let tree: Tree = serde_json::from_str(json)?;
        if tree.nodes.is_empty() {
            return Err(XaiError::training("Tree has no nodes"));
        }
        tree.validate()?;
        Ok(tree)
    }
}

impl fmt::Display for Tree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Tree(nodes={}, leaves={}, depth={})",
            self.num_nodes(),
            self.num_leaves(),
            self.depth()
        )
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use ndarray::array;

    fn stats(cover: f64, value: f64) -> NodeStats {
        NodeStats {
            cover,
            value,
            impurity: 2.0 * value * (1.0 - value),
        }
    }

    /// Two-level tree on features 0 and 1 used by several test modules.
    pub(crate) fn stump_pair() -> Tree {
        let mut tree = Tree::new(stats(10.0, 0.5));
        let (left, right) = tree
            .split_node(0, 0, 0.5, 2.0, stats(6.0, 0.2), stats(4.0, 0.95))
            .unwrap();
        tree.split_node(left, 1, 1.5, 0.5, stats(3.0, 0.0), stats(3.0, 0.4))
            .unwrap();
        let _ = right;
        tree
    }

    #[test]
    fn test_new_tree() {
        let tree = Tree::new(stats(5.0, 0.4));
        assert_eq!(tree.num_nodes(), 1);
        assert_eq!(tree.num_leaves(), 1);
        assert_eq!(tree.depth(), 0);
        assert!(tree.root().is_leaf());
        assert_eq!(tree.expected_value(), 0.4);
    }

    #[test]
    fn test_split_and_predict() {
        let tree = stump_pair();
        assert_eq!(tree.num_leaves(), 3);
        assert_eq!(tree.depth(), 2);
        assert!(tree.validate().is_ok());

        assert_eq!(tree.predict(&array![0.0, 1.0].view()).unwrap(), 0.0);
        assert_eq!(tree.predict(&array![0.0, 2.0].view()).unwrap(), 0.4);
        assert_eq!(tree.predict(&array![1.0, 0.0].view()).unwrap(), 0.95);

        let batch = tree
            .predict_batch(&array![[0.5, 1.5], [0.6, 0.0]].view())
            .unwrap();
        assert_eq!(batch.to_vec(), vec![0.0, 0.95]);
        assert!(tree.predict(&array![0.0].view()).is_err());
    }

    #[test]
    fn test_cannot_split_internal_node() {
        let mut tree = stump_pair();
        assert!(tree
            .split_node(0, 1, 0.0, 0.0, stats(1.0, 0.0), stats(1.0, 1.0))
            .is_err());
        assert!(tree
            .split_node(99, 1, 0.0, 0.0, stats(1.0, 0.0), stats(1.0, 1.0))
            .is_err());
    }

    #[test]
    fn test_feature_importance_and_json() {
        let tree = stump_pair();
        assert_eq!(tree.feature_importance(3).to_vec(), vec![2.0, 0.5, 0.0]);

        let restored = Tree::from_json(&tree.to_json().unwrap()).unwrap();
        assert_eq!(restored, tree);
        assert!(tree.to_string_representation().contains("Split(feature=0"));
    }
}
