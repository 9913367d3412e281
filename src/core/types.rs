//! Core data types for xai-compare.
//!
//! Scalar aliases and the small enumerations shared by configuration, the
//! pipeline, and the report.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::core::error::XaiError;

/// Probability, attribution weight, and score type.
pub type Score = f64;

/// Feature index type for identifying features in the dataset.
pub type FeatureIndex = usize;

/// Tree node identifier type.
pub type NodeIndex = usize;

/// Classifier family analysed by the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelKind {
    /// A single CART decision tree
    DecisionTree,
    /// A bagged forest of randomized CART trees
    RandomForest,
}

impl Default for ModelKind {
    fn default() -> Self {
        ModelKind::RandomForest
    }
}

impl fmt::Display for ModelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModelKind::DecisionTree => write!(f, "Decision Tree"),
            ModelKind::RandomForest => write!(f, "Random Forest"),
        }
    }
}

impl FromStr for ModelKind {
    type Err = XaiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().replace('_', "-").as_str() {
            "decision-tree" | "tree" | "dt" => Ok(ModelKind::DecisionTree),
            "random-forest" | "forest" | "rf" => Ok(ModelKind::RandomForest),
            other => Err(XaiError::invalid_parameter(
                "model",
                other,
                "expected decision-tree or random-forest",
            )),
        }
    }
}

/// Attribution technique being scored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Technique {
    /// Shapley-value attribution (TreeSHAP)
    Shap,
    /// Local surrogate attribution (LIME)
    Lime,
}

impl fmt::Display for Technique {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Technique::Shap => write!(f, "SHAP"),
            Technique::Lime => write!(f, "LIME"),
        }
    }
}

/// How explanation tokens are matched against feature names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchStrategy {
    /// Token contains the feature name anywhere
    Substring,
    /// One whitespace/operator-separated part of the token equals the name
    Token,
}

impl Default for MatchStrategy {
    fn default() -> Self {
        MatchStrategy::Substring
    }
}

impl FromStr for MatchStrategy {
    type Err = XaiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "substring" => Ok(MatchStrategy::Substring),
            "token" | "exact" => Ok(MatchStrategy::Token),
            other => Err(XaiError::invalid_parameter(
                "match_strategy",
                other,
                "expected substring or token",
            )),
        }
    }
}

/// Feature selection used by the LIME surrogate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeatureSelection {
    /// Forward selection for six features or fewer, highest weights otherwise
    Auto,
    /// Greedy forward selection on weighted R²
    ForwardSelection,
    /// Largest |coefficient × instance value| of a full ridge fit
    HighestWeights,
    /// Use every feature
    None,
}

impl Default for FeatureSelection {
    fn default() -> Self {
        FeatureSelection::Auto
    }
}

/// Number of features considered at each split of a tree.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MaxFeatures {
    /// All features
    All,
    /// floor(sqrt(n_features)), at least one
    Sqrt,
    /// floor(log2(n_features)), at least one
    Log2,
    /// A fixed count, clamped to the feature count
    Count(usize),
}

impl MaxFeatures {
    /// Resolve to a concrete feature count for `n_features` columns.
    pub fn resolve(&self, n_features: usize) -> usize {
        let count = match *self {
            MaxFeatures::All => n_features,
            MaxFeatures::Sqrt => (n_features as f64).sqrt() as usize,
            MaxFeatures::Log2 => (n_features as f64).log2() as usize,
            MaxFeatures::Count(count) => count,
        };
        count.clamp(1, n_features.max(1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_model_kind_parsing() {
        assert_eq!("decision-tree".parse::<ModelKind>().unwrap(), ModelKind::DecisionTree);
        assert_eq!("random_forest".parse::<ModelKind>().unwrap(), ModelKind::RandomForest);
        assert_eq!("RF".parse::<ModelKind>().unwrap(), ModelKind::RandomForest);
        assert!("svm".parse::<ModelKind>().is_err());
    }

    #[test]
    fn test_model_kind_display() {
        assert_eq!(ModelKind::DecisionTree.to_string(), "Decision Tree");
        assert_eq!(ModelKind::RandomForest.to_string(), "Random Forest");
    }

    #[test]
    fn test_max_features_resolution() {
        assert_eq!(MaxFeatures::All.resolve(8), 8);
        assert_eq!(MaxFeatures::Sqrt.resolve(8), 2);
        assert_eq!(MaxFeatures::Log2.resolve(8), 3);
        assert_eq!(MaxFeatures::Count(20).resolve(8), 8);
        assert_eq!(MaxFeatures::Sqrt.resolve(1), 1);
    }

    #[test]
    fn test_match_strategy_parsing() {
        assert_eq!("token".parse::<MatchStrategy>().unwrap(), MatchStrategy::Token);
        assert_eq!(MatchStrategy::default(), MatchStrategy::Substring);
        assert!("regex".parse::<MatchStrategy>().is_err());
    }
}
