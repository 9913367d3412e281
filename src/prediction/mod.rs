//! Explanation engines for fitted classifiers.
//!
//! - [`shap`]: exact path-dependent TreeSHAP over a tree ensemble
//! - [`lime`]: tabular LIME with a weighted ridge surrogate
//! - [`discretize`]: quartile bins used by LIME
//! - [`ridge`]: weighted ridge regression
//! - [`feature_importance`]: global importance rankings

pub mod discretize;
pub mod feature_importance;
pub mod lime;
pub mod ridge;
pub mod shap;

pub use discretize::QuartileDiscretizer;
pub use feature_importance::{importance_ranking, rank_model_features, ranking_summary, FeatureImportance};
pub use lime::{LimeExplanation, LimeTabularExplainer};
pub use ridge::{fit_weighted_ridge, weighted_r2, RidgeFit};
pub use shap::{mean_abs_shap, ShapConfig, ShapExplainer, ShapExplanation};
