//! # xai-compare
//!
//! Comparative interpretability analysis of two explanation techniques,
//! exact TreeSHAP and tabular LIME, applied to tree classifiers trained on a
//! tabular binary-outcome dataset.
//!
//! ## Features
//!
//! - **Tree classifiers**: a CART decision tree and a bagged random forest,
//!   both trained in pure Rust and parallelized with Rayon.
//! - **Explanations**: path-dependent TreeSHAP values and LIME surrogate
//!   explanations over quartile-discretized features.
//! - **Scoring**: sparsity, stability and fidelity per technique, combined
//!   into a weighted composite score and a verdict.
//! - **Artifacts**: diagnostic figure data as JSON and an HTML LIME report.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use xai_compare::{AnalysisPipeline, ConfigBuilder, ModelKind};
//!
//! # fn main() -> xai_compare::Result<()> {
//! xai_compare::init();
//!
//! let config = ConfigBuilder::new()
//!     .data_path("diabetes.csv")
//!     .model_kind(ModelKind::DecisionTree)
//!     .build()?;
//!
//! let pipeline = AnalysisPipeline::new(config)?;
//! let dataset = pipeline.load_dataset()?;
//! let report = pipeline.run_configured(&dataset)?;
//! println!("{}", report.console_report());
//! # Ok(())
//! # }
//! ```

#![deny(unsafe_code)]
#![warn(
    missing_debug_implementations,
    rust_2018_idioms,
    non_snake_case,
    non_upper_case_globals
)]

// Core infrastructure module - always available
pub mod core;

// Configuration management module
pub mod config;

// Dataset management module
pub mod dataset;

// Decision tree module
pub mod tree;

// Random forest module
pub mod ensemble;

// Explanation engines
pub mod prediction;

// Interpretability scoring
pub mod interpretability;

// Metrics evaluation module
pub mod metrics_eval;

// Figure artifacts
pub mod figures;

// Console and HTML reports
pub mod report;

// Analysis pipeline
pub mod pipeline;

// Re-export core functionality for convenience
pub use self::core::{
    constants::*,
    error::{Result, XaiError},
    traits::*,
    types::*,
};

// Re-export configuration functionality
pub use config::{AnalysisConfig, ConfigBuilder, LimeConfig, ModelConfig, ScoringWeights};

// Re-export dataset functionality
pub use dataset::{train_test_split, CsvLoader, Dataset, TrainTestSplit};

// Re-export model functionality
pub use ensemble::{ForestParams, RandomForestClassifier};
pub use tree::{DecisionTreeClassifier, Tree, TreeParams};

// Re-export explanation functionality
pub use prediction::{LimeExplanation, LimeTabularExplainer, ShapExplainer, ShapExplanation};

// Re-export scoring functionality
pub use interpretability::{
    attribution_vector, composite_score, explanation_to_vector, fidelity_score, sparsity_score, stability_score,
    InterpretabilityReport, SubstringMatcher, TechniqueScores, TokenMatcher, Verdict,
};

// Re-export metrics evaluation functionality
pub use metrics_eval::{evaluate_binary_classification, ClassificationMetrics};

// Re-export pipeline functionality
pub use pipeline::{AnalysisPipeline, AnalysisReport};

// Version information
pub use self::core::constants::XAI_COMPARE_VERSION as VERSION;

/// Initialize the library.
///
/// Installs the `env_logger` backend once per process (`info` unless
/// `RUST_LOG` says otherwise). Calling it again has no effect.
pub fn init() {
    self::core::initialize_logging();
}

/// Check if the library has been initialized.
pub fn is_initialized() -> bool {
    self::core::is_logging_initialized()
}
