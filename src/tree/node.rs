//! Tree node for CART classification trees.
//!
//! Every node, internal or leaf, keeps its cover (number of training samples
//! that reached it, bootstrap duplicates included) and the class-1 fraction of
//! those samples. TreeSHAP reads both.

use crate::core::types::{FeatureIndex, NodeIndex, Score};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Tree node representation supporting both internal and leaf nodes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TreeNode {
    /// Left child node index (for internal nodes only)
    left_child: Option<NodeIndex>,
    /// Right child node index (for internal nodes only)
    right_child: Option<NodeIndex>,
    /// Parent node index (None for root node)
    parent: Option<NodeIndex>,
    /// Split feature index (for internal nodes only)
    split_feature: Option<FeatureIndex>,
    /// Split threshold; samples with `value <= threshold` go left
    split_threshold: Option<f64>,
    /// Weighted impurity decrease of the split
    split_gain: f64,
    /// Training samples reaching this node
    cover: f64,
    /// Fraction of class 1 among those samples
    value: Score,
    /// Gini impurity of the node
    impurity: f64,
    /// Node depth in the tree
    depth: usize,
}

impl TreeNode {
    /// Creates a new leaf node with the given statistics.
    pub fn new_leaf(
        cover: f64,
        value: Score,
        impurity: f64,
        depth: usize,
        parent: Option<NodeIndex>,
    ) -> Self {
        TreeNode {
            left_child: None,
            right_child: None,
            parent,
            split_feature: None,
            split_threshold: None,
            split_gain: 0.0,
            cover,
            value,
            impurity,
            depth,
        }
    }

    /// Returns true if this node is a leaf node.
    pub fn is_leaf(&self) -> bool {
        self.split_feature.is_none()
    }

    /// Returns the left child node index (for internal nodes).
    pub fn left_child(&self) -> Option<NodeIndex> {
        self.left_child
    }

    /// Returns the right child node index (for internal nodes).
    pub fn right_child(&self) -> Option<NodeIndex> {
        self.right_child
    }

    /// Returns the parent node index.
    pub fn parent(&self) -> Option<NodeIndex> {
        self.parent
    }

    /// Returns the split feature index (for internal nodes).
    pub fn split_feature(&self) -> Option<FeatureIndex> {
        self.split_feature
    }

    /// Returns the split threshold value (for internal nodes).
    pub fn split_threshold(&self) -> Option<f64> {
        self.split_threshold
    }

    /// Returns the weighted impurity decrease of the split.
    pub fn split_gain(&self) -> f64 {
        self.split_gain
    }

    /// Returns the number of training samples that reached this node.
    pub fn cover(&self) -> f64 {
        self.cover
    }

    /// Returns the class-1 probability at this node.
    pub fn value(&self) -> Score {
        self.value
    }

    /// Returns the Gini impurity of this node.
    pub fn impurity(&self) -> f64 {
        self.impurity
    }

    /// Returns the node depth in the tree.
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Converts this node from leaf to internal node with the given split.
    pub(crate) fn set_split(
        &mut self,
        left_child: NodeIndex,
        right_child: NodeIndex,
        split_feature: FeatureIndex,
        split_threshold: f64,
        split_gain: f64,
    ) {
        self.left_child = Some(left_child);
        self.right_child = Some(right_child);
        self.split_feature = Some(split_feature);
        self.split_threshold = Some(split_threshold);
        self.split_gain = split_gain;
    }
}

impl fmt::Display for TreeNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.split_feature, self.split_threshold) {
            (Some(feature), Some(threshold)) => write!(
                f,
                "Split(feature={}, threshold={:.4}, gain={:.4}, cover={})",
                feature, threshold, self.split_gain, self.cover
            ),
            _ => write!(f, "Leaf(value={:.4}, cover={})", self.value, self.cover),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_leaf_then_split() {
        let mut node = TreeNode::new_leaf(10.0, 0.3, 0.42, 0, None);
        assert!(node.is_leaf());
        assert_eq!(node.cover(), 10.0);
        assert!(node.to_string().starts_with("Leaf"));

        node.set_split(1, 2, 4, 1.5, 2.0);
        assert!(!node.is_leaf());
        assert_eq!(node.split_feature(), Some(4));
        assert_eq!(node.left_child(), Some(1));
        assert_eq!(node.value(), 0.3);
        assert!(node.to_string().starts_with("Split"));
    }
}
