//! Core trait definitions for xai-compare.
//!
//! The analysis pipeline is written once against these capabilities, so any
//! classifier that can be fitted, queried for probabilities and importances,
//! and opened up as a set of trees can be explained and scored.

use crate::core::error::Result;
use crate::tree::Tree;
use ndarray::{Array1, Array2, ArrayView1, ArrayView2};

use std::fmt::Debug;

/// A binary classifier over dense `f64` features.
pub trait Classifier: Send + Sync + Debug {
    /// Fit the model on a feature matrix and 0/1 labels.
    fn fit(&mut self, features: &ArrayView2<'_, f64>, labels: &ArrayView1<'_, f64>) -> Result<()>;

    /// Predict class labels (0.0 or 1.0).
    fn predict(&self, features: &ArrayView2<'_, f64>) -> Result<Array1<f64>> {
        let proba = self.predict_proba(features)?;
        Ok(proba
            .rows()
            .into_iter()
            .map(|row| if row[1] > row[0] { 1.0 } else { 0.0 })
            .collect())
    }

    /// Predict class probabilities, one row per sample and one column per class.
    fn predict_proba(&self, features: &ArrayView2<'_, f64>) -> Result<Array2<f64>>;

    /// Normalized global feature importances (sum to one unless all zero).
    fn feature_importances(&self) -> Result<Array1<f64>>;

    /// Human-readable model name.
    fn name(&self) -> &'static str;

    /// Whether `fit` has completed.
    fn is_fitted(&self) -> bool;

    /// Number of features seen during `fit`.
    fn num_features(&self) -> Option<usize>;
}

/// A model whose prediction is the mean of its trees' class-1 probabilities.
pub trait TreeEnsemble {
    /// The fitted trees; empty before `fit`.
    fn trees(&self) -> &[Tree];
}

/// Decides whether an explanation token refers to a feature.
///
/// LIME tokens are bin descriptions such as `"25.00 < Age <= 29.00"`, so the
/// token is rarely the bare feature name.
pub trait FeatureMatcher: Send + Sync + Debug {
    /// Return true when `token` refers to `feature`.
    fn matches(&self, token: &str, feature: &str) -> bool;

    /// Strategy name for logging.
    fn name(&self) -> &'static str;
}
