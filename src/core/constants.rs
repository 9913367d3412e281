//! Default values used throughout the analysis.
//!
//! These mirror the settings of the reference diabetes study; every one of
//! them can be overridden through [`crate::config::AnalysisConfig`].

/// Crate version string.
pub const XAI_COMPARE_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default name of the binary outcome column.
pub const DEFAULT_TARGET_COLUMN: &str = "Outcome";

/// Default fraction of rows held out for testing.
pub const DEFAULT_TEST_FRACTION: f64 = 0.2;

/// Default random seed for reproducibility.
pub const DEFAULT_RANDOM_SEED: u64 = 42;

/// Default number of trees in a random forest.
pub const DEFAULT_N_ESTIMATORS: usize = 100;

/// Default minimum number of samples required to split a node.
pub const DEFAULT_MIN_SAMPLES_SPLIT: usize = 2;

/// Default minimum number of samples in a leaf.
pub const DEFAULT_MIN_SAMPLES_LEAF: usize = 1;

/// Weight of the sparsity score in the composite score.
pub const DEFAULT_SPARSITY_WEIGHT: f64 = 0.3;

/// Weight of the stability score in the composite score.
pub const DEFAULT_STABILITY_WEIGHT: f64 = 0.3;

/// Weight of the fidelity score in the composite score.
pub const DEFAULT_FIDELITY_WEIGHT: f64 = 0.4;

/// Number of perturbed samples LIME draws around an instance.
pub const DEFAULT_LIME_NUM_SAMPLES: usize = 5000;

/// Number of features kept in a scored LIME explanation.
pub const DEFAULT_LIME_NUM_FEATURES: usize = 5;

/// LIME kernel width is `sqrt(n_features) * DEFAULT_KERNEL_WIDTH_FACTOR`.
pub const DEFAULT_KERNEL_WIDTH_FACTOR: f64 = 0.75;

/// Ridge penalty of the LIME surrogate model.
pub const DEFAULT_LIME_RIDGE_ALPHA: f64 = 1.0;

/// Ridge penalty used when ranking features by highest weights.
pub const HIGHEST_WEIGHTS_RIDGE_ALPHA: f64 = 0.01;

/// `FeatureSelection::Auto` switches to highest weights above this count.
pub const AUTO_FORWARD_SELECTION_LIMIT: usize = 6;

/// Number of top-|SHAP| features counted as "used" by a SHAP explanation.
pub const DEFAULT_SHAP_TOP_K: usize = 5;

/// Test rows explained by both techniques for the scoring step.
pub const DEFAULT_EXPLAINED_INSTANCES: [usize; 2] = [0, 1];

/// Features plotted in the dependence figures.
pub const DEFAULT_DEPENDENCE_FEATURES: [&str; 3] = ["Glucose", "BMI", "Age"];

/// Maximum number of test rows in a SHAP-vs-LIME dependence figure.
pub const DEFAULT_DEPENDENCE_INSTANCES: usize = 100;

/// Figure number of the first SHAP-vs-LIME dependence figure.
pub const FIRST_COMPARISON_FIGURE: usize = 11;

/// Columns of the two-class scatter figure (x, y).
pub const DEFAULT_SCATTER_FEATURES: [&str; 2] = ["Glucose", "Age"];

/// Number of bins per histogram in figure 3.
pub const HISTOGRAM_BINS: usize = 20;

/// Display names of the two outcome classes.
pub const CLASS_NAMES: [&str; 2] = ["No Diabetes", "Diabetes"];

/// Added to per-bin standard deviations so truncated normal draws never
/// divide by zero.
pub const BIN_STD_EPSILON: f64 = 1e-11;

/// Default directory for figure and report artifacts.
pub const DEFAULT_OUTPUT_DIR: &str = "output";

/// Default number of threads for parallel processing.
/// 0 means use all available cores.
pub const DEFAULT_NUM_THREADS: usize = 0;

/// Tolerance used when comparing probabilities and weights.
pub const EPSILON: f64 = 1e-12;
