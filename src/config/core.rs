//! Core configuration structures for xai-compare.
//!
//! [`AnalysisConfig`] holds every knob of the analysis: where the data lives,
//! how the classifier is grown, how LIME samples its neighbourhood, and how
//! the three interpretability scores are weighted into a composite.

use crate::core::constants::*;
use crate::core::error::{Result, XaiError};
use crate::core::types::*;

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Prefix of the environment variables read by
/// [`AnalysisConfig::apply_environment_overrides`].
pub const ENV_PREFIX: &str = "XAI_";

/// Weights of the composite interpretability score.
///
/// `composite = sparsity * sparsity_weight + stability * stability_weight
/// + fidelity * fidelity_weight`. Raising a weight makes the verdict more
/// sensitive to that score; the weights are not normalized.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoringWeights {
    /// Weight of the sparsity score
    pub sparsity: f64,
    /// Weight of the stability score
    pub stability: f64,
    /// Weight of the fidelity score
    pub fidelity: f64,
}

impl ScoringWeights {
    /// Create a weight triple.
    pub fn new(sparsity: f64, stability: f64, fidelity: f64) -> Self {
        ScoringWeights {
            sparsity,
            stability,
            fidelity,
        }
    }

    /// Sum of the three weights.
    pub fn total(&self) -> f64 {
        self.sparsity + self.stability + self.fidelity
    }

    /// Validate that every weight is finite and non-negative and that at least
    /// one is positive.
    pub fn validate(&self) -> Result<()> {
        for (name, value) in [
            ("scoring_weights.sparsity", self.sparsity),
            ("scoring_weights.stability", self.stability),
            ("scoring_weights.fidelity", self.fidelity),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(XaiError::invalid_parameter(
                    name,
                    value.to_string(),
                    "must be finite and non-negative",
                ));
            }
        }

        if self.total() <= 0.0 {
            return Err(XaiError::invalid_parameter(
                "scoring_weights",
                format!("{:?}", self),
                "at least one weight must be positive",
            ));
        }

        if (self.total() - 1.0).abs() > 1e-9 {
            log::warn!(
                "Scoring weights sum to {:.4}, composite scores are not on a [0, 1] scale",
                self.total()
            );
        }

        Ok(())
    }
}

impl Default for ScoringWeights {
    fn default() -> Self {
        ScoringWeights::new(
            DEFAULT_SPARSITY_WEIGHT,
            DEFAULT_STABILITY_WEIGHT,
            DEFAULT_FIDELITY_WEIGHT,
        )
    }
}

impl std::str::FromStr for ScoringWeights {
    type Err = XaiError;

    /// Parse `"0.3,0.3,0.4"` (sparsity, stability, fidelity).
    fn from_str(s: &str) -> Result<Self> {
        let parts: Vec<&str> = s.split(',').map(str::trim).collect();
        if parts.len() != 3 {
            return Err(XaiError::invalid_parameter(
                "scoring_weights",
                s,
                "expected three comma-separated numbers",
            ));
        }

        let mut values = [0.0; 3];
        for (slot, part) in values.iter_mut().zip(&parts) {
            *slot = part.parse().map_err(|_| {
                XaiError::invalid_parameter("scoring_weights", s, "weights must be numbers")
            })?;
        }

        Ok(ScoringWeights::new(values[0], values[1], values[2]))
    }
}

/// Classifier hyperparameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    /// Classifier family
    pub kind: ModelKind,
    /// Number of trees (random forest only)
    pub n_estimators: usize,
    /// Maximum tree depth (None = grow until pure)
    pub max_depth: Option<usize>,
    /// Minimum number of samples required to split a node
    pub min_samples_split: usize,
    /// Minimum number of samples in each leaf
    pub min_samples_leaf: usize,
    /// Features considered per split (None = All for a tree, Sqrt for a forest)
    pub max_features: Option<MaxFeatures>,
    /// Draw bootstrap samples for each forest tree
    pub bootstrap: bool,
}

impl ModelConfig {
    /// Effective per-split feature budget for the configured model kind.
    pub fn effective_max_features(&self) -> MaxFeatures {
        self.max_features.unwrap_or(match self.kind {
            ModelKind::DecisionTree => MaxFeatures::All,
            ModelKind::RandomForest => MaxFeatures::Sqrt,
        })
    }
}

impl Default for ModelConfig {
    fn default() -> Self {
        ModelConfig {
            kind: ModelKind::default(),
            n_estimators: DEFAULT_N_ESTIMATORS,
            max_depth: None,
            min_samples_split: DEFAULT_MIN_SAMPLES_SPLIT,
            min_samples_leaf: DEFAULT_MIN_SAMPLES_LEAF,
            max_features: None,
            bootstrap: true,
        }
    }
}

/// LIME surrogate settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LimeConfig {
    /// Perturbed samples drawn around each instance
    pub num_samples: usize,
    /// Features kept in the explanations used for scoring
    pub num_features: usize,
    /// Kernel width factor; width = sqrt(n_features) * factor
    pub kernel_width_factor: f64,
    /// Ridge penalty of the surrogate
    pub ridge_alpha: f64,
    /// Feature selection method
    pub feature_selection: FeatureSelection,
}

impl Default for LimeConfig {
    fn default() -> Self {
        LimeConfig {
            num_samples: DEFAULT_LIME_NUM_SAMPLES,
            num_features: DEFAULT_LIME_NUM_FEATURES,
            kernel_width_factor: DEFAULT_KERNEL_WIDTH_FACTOR,
            ridge_alpha: DEFAULT_LIME_RIDGE_ALPHA,
            feature_selection: FeatureSelection::default(),
        }
    }
}

/// Complete analysis configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Path of the CSV dataset
    pub data_path: PathBuf,
    /// Name of the binary outcome column
    pub target_column: String,
    /// Fraction of rows held out for testing
    pub test_fraction: f64,
    /// Random seed for the split, the forest and LIME sampling
    pub random_seed: u64,
    /// Classifier settings
    pub model: ModelConfig,
    /// LIME settings
    pub lime: LimeConfig,
    /// Composite score weights
    pub scoring_weights: ScoringWeights,
    /// Number of top-|SHAP| features counted as used by a SHAP explanation
    pub shap_top_k: usize,
    /// The two test rows explained for stability and fidelity
    pub explained_instances: [usize; 2],
    /// Features of the dependence figures
    pub dependence_features: Vec<String>,
    /// Maximum test rows in the SHAP-vs-LIME dependence figures
    pub dependence_instances: usize,
    /// Columns of the two-class scatter figure (x, y)
    pub scatter_features: [String; 2],
    /// Directory receiving figure and report artifacts
    pub output_dir: PathBuf,
    /// Token-to-feature matching used by the explanation vectorizer
    pub match_strategy: MatchStrategy,
    /// Worker threads (0 = all cores)
    pub num_threads: usize,
    /// Write the figure artifacts
    pub write_figures: bool,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        AnalysisConfig {
            data_path: PathBuf::from("diabetes-dataset.csv"),
            target_column: DEFAULT_TARGET_COLUMN.to_string(),
            test_fraction: DEFAULT_TEST_FRACTION,
            random_seed: DEFAULT_RANDOM_SEED,
            model: ModelConfig::default(),
            lime: LimeConfig::default(),
            scoring_weights: ScoringWeights::default(),
            shap_top_k: DEFAULT_SHAP_TOP_K,
            explained_instances: DEFAULT_EXPLAINED_INSTANCES,
            dependence_features: DEFAULT_DEPENDENCE_FEATURES
                .iter()
                .map(|s| s.to_string())
                .collect(),
            dependence_instances: DEFAULT_DEPENDENCE_INSTANCES,
            scatter_features: [
                DEFAULT_SCATTER_FEATURES[0].to_string(),
                DEFAULT_SCATTER_FEATURES[1].to_string(),
            ],
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            match_strategy: MatchStrategy::default(),
            num_threads: DEFAULT_NUM_THREADS,
            write_figures: true,
        }
    }
}

impl AnalysisConfig {
    /// Create a new configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate the configuration parameters
    pub fn validate(&self) -> Result<()> {
        if self.target_column.trim().is_empty() {
            return Err(XaiError::invalid_parameter(
                "target_column",
                self.target_column.clone(),
                "must not be empty",
            ));
        }

        if !(self.test_fraction > 0.0 && self.test_fraction < 1.0) {
            return Err(XaiError::invalid_parameter(
                "test_fraction",
                self.test_fraction.to_string(),
                "must be in range (0.0, 1.0)",
            ));
        }

        if self.model.n_estimators == 0 {
            return Err(XaiError::invalid_parameter(
                "model.n_estimators",
                "0",
                "must be at least 1",
            ));
        }

        if self.model.min_samples_split < 2 {
            return Err(XaiError::invalid_parameter(
                "model.min_samples_split",
                self.model.min_samples_split.to_string(),
                "must be at least 2",
            ));
        }

        if self.model.min_samples_leaf == 0 {
            return Err(XaiError::invalid_parameter(
                "model.min_samples_leaf",
                "0",
                "must be at least 1",
            ));
        }

        if self.model.max_depth == Some(0) {
            return Err(XaiError::invalid_parameter(
                "model.max_depth",
                "0",
                "must be at least 1 when specified",
            ));
        }

        if let Some(MaxFeatures::Count(0)) = self.model.max_features {
            return Err(XaiError::invalid_parameter(
                "model.max_features",
                "0",
                "must be at least 1",
            ));
        }

        if self.lime.num_samples < 2 {
            return Err(XaiError::invalid_parameter(
                "lime.num_samples",
                self.lime.num_samples.to_string(),
                "must be at least 2",
            ));
        }

        if self.lime.num_features == 0 {
            return Err(XaiError::invalid_parameter(
                "lime.num_features",
                "0",
                "must be at least 1",
            ));
        }

        if !(self.lime.kernel_width_factor > 0.0 && self.lime.kernel_width_factor.is_finite()) {
            return Err(XaiError::invalid_parameter(
                "lime.kernel_width_factor",
                self.lime.kernel_width_factor.to_string(),
                "must be positive",
            ));
        }

        if !(self.lime.ridge_alpha >= 0.0 && self.lime.ridge_alpha.is_finite()) {
            return Err(XaiError::invalid_parameter(
                "lime.ridge_alpha",
                self.lime.ridge_alpha.to_string(),
                "must be non-negative",
            ));
        }

        self.scoring_weights.validate()?;

        if self.shap_top_k == 0 {
            return Err(XaiError::invalid_parameter(
                "shap_top_k",
                "0",
                "must be at least 1",
            ));
        }

        if self.explained_instances[0] == self.explained_instances[1] {
            return Err(XaiError::invalid_parameter(
                "explained_instances",
                format!("{:?}", self.explained_instances),
                "stability needs two different instances",
            ));
        }

        if self.num_threads > num_cpus::get() * 2 {
            log::warn!(
                "num_threads ({}) is much larger than available cores ({})",
                self.num_threads,
                num_cpus::get()
            );
        }

        Ok(())
    }

    /// Load configuration from a `.json` or `.toml` file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            XaiError::config(format!(
                "Failed to read config file {}: {}",
                path.display(),
                e
            ))
        })?;

        let config: AnalysisConfig = match path.extension().and_then(|s| s.to_str()) {
            Some("json") => serde_json::from_str(&content)?,
            Some("toml") => toml::from_str(&content)?,
            _ => {
                return Err(XaiError::config(
                    "Unsupported config file format. Use .json or .toml",
                ))
            }
        };

        log::info!("Loaded configuration from {}", path.display());
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to a `.json` or `.toml` file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let content = match path.extension().and_then(|s| s.to_str()) {
            Some("json") => serde_json::to_string_pretty(self)?,
            Some("toml") => toml::to_string_pretty(self)?,
            _ => {
                return Err(XaiError::config(
                    "Unsupported config file format. Use .json or .toml",
                ))
            }
        };

        std::fs::write(path, content)?;
        Ok(())
    }

    /// Apply `XAI_*` environment variable overrides to this configuration
    pub fn apply_environment_overrides(&mut self) -> Result<()> {
        let vars: HashMap<String, String> = std::env::vars()
            .filter(|(key, _)| key.starts_with(ENV_PREFIX))
            .collect();
        self.apply_overrides(&vars)
    }

    /// Load the defaults overlaid with `XAI_*` environment variables
    pub fn load_from_environment() -> Result<Self> {
        let mut config = AnalysisConfig::default();
        config.apply_environment_overrides()?;
        Ok(config)
    }

    /// Apply overrides from a map of `XAI_*` keys to raw string values.
    ///
    /// Unknown `XAI_*` keys are logged and ignored.
    pub fn apply_overrides(&mut self, vars: &HashMap<String, String>) -> Result<()> {
        for (key, value) in vars {
            let Some(name) = key.strip_prefix(ENV_PREFIX) else {
                continue;
            };

            match name {
                "DATA_PATH" => self.data_path = PathBuf::from(value),
                "TARGET_COLUMN" => self.target_column = value.clone(),
                "TEST_FRACTION" => self.test_fraction = parse_value(key, value)?,
                "RANDOM_SEED" => self.random_seed = parse_value(key, value)?,
                "MODEL" => self.model.kind = value.parse()?,
                "N_ESTIMATORS" => self.model.n_estimators = parse_value(key, value)?,
                "MAX_DEPTH" => self.model.max_depth = Some(parse_value(key, value)?),
                "LIME_NUM_SAMPLES" => self.lime.num_samples = parse_value(key, value)?,
                "LIME_NUM_FEATURES" => self.lime.num_features = parse_value(key, value)?,
                "WEIGHTS" => self.scoring_weights = value.parse()?,
                "SHAP_TOP_K" => self.shap_top_k = parse_value(key, value)?,
                "OUTPUT_DIR" => self.output_dir = PathBuf::from(value),
                "MATCH_STRATEGY" => self.match_strategy = value.parse()?,
                "NUM_THREADS" => self.num_threads = parse_value(key, value)?,
                "WRITE_FIGURES" => self.write_figures = parse_value(key, value)?,
                _ => log::warn!("Unknown configuration variable: {}", key),
            }
        }

        self.validate()
    }

    /// Get the effective number of threads (0 means use all available cores)
    pub fn effective_num_threads(&self) -> usize {
        if self.num_threads == 0 {
            num_cpus::get()
        } else {
            self.num_threads
        }
    }
}

fn parse_value<T: std::str::FromStr>(key: &str, value: &str) -> Result<T> {
    value
        .trim()
        .parse()
        .map_err(|_| XaiError::config(format!("Invalid {}: {}", key, value)))
}

/// Configuration builder for fluent configuration creation
#[derive(Debug, Clone, Default)]
pub struct ConfigBuilder {
    config: AnalysisConfig,
}

impl ConfigBuilder {
    /// Create a new configuration builder
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the dataset path
    pub fn data_path<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.config.data_path = path.into();
        self
    }

    /// Set the outcome column
    pub fn target_column<S: Into<String>>(mut self, column: S) -> Self {
        self.config.target_column = column.into();
        self
    }

    /// Set the held-out test fraction
    pub fn test_fraction(mut self, fraction: f64) -> Self {
        self.config.test_fraction = fraction;
        self
    }

    /// Set the random seed
    pub fn random_seed(mut self, seed: u64) -> Self {
        self.config.random_seed = seed;
        self
    }

    /// Set the classifier family
    pub fn model_kind(mut self, kind: ModelKind) -> Self {
        self.config.model.kind = kind;
        self
    }

    /// Set the number of forest trees
    pub fn n_estimators(mut self, n: usize) -> Self {
        self.config.model.n_estimators = n;
        self
    }

    /// Set the maximum tree depth
    pub fn max_depth(mut self, depth: Option<usize>) -> Self {
        self.config.model.max_depth = depth;
        self
    }

    /// Set the per-split feature budget
    pub fn max_features(mut self, max_features: MaxFeatures) -> Self {
        self.config.model.max_features = Some(max_features);
        self
    }

    /// Set the number of LIME perturbation samples
    pub fn lime_num_samples(mut self, n: usize) -> Self {
        self.config.lime.num_samples = n;
        self
    }

    /// Set the number of features in a scored LIME explanation
    pub fn lime_num_features(mut self, n: usize) -> Self {
        self.config.lime.num_features = n;
        self
    }

    /// Set the LIME feature selection method
    pub fn feature_selection(mut self, selection: FeatureSelection) -> Self {
        self.config.lime.feature_selection = selection;
        self
    }

    /// Set the composite score weights
    pub fn scoring_weights(mut self, weights: ScoringWeights) -> Self {
        self.config.scoring_weights = weights;
        self
    }

    /// Set the SHAP top-k feature count
    pub fn shap_top_k(mut self, k: usize) -> Self {
        self.config.shap_top_k = k;
        self
    }

    /// Set the two explained test rows
    pub fn explained_instances(mut self, first: usize, second: usize) -> Self {
        self.config.explained_instances = [first, second];
        self
    }

    /// Set the dependence figure features
    pub fn dependence_features<I, S>(mut self, features: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config.dependence_features = features.into_iter().map(Into::into).collect();
        self
    }

    /// Set the maximum rows of the SHAP-vs-LIME dependence figures
    pub fn dependence_instances(mut self, n: usize) -> Self {
        self.config.dependence_instances = n;
        self
    }

    /// Set the scatter figure columns
    pub fn scatter_features<S: Into<String>>(mut self, x: S, y: S) -> Self {
        self.config.scatter_features = [x.into(), y.into()];
        self
    }

    /// Set the artifact directory
    pub fn output_dir<P: Into<PathBuf>>(mut self, dir: P) -> Self {
        self.config.output_dir = dir.into();
        self
    }

    /// Set the explanation token matching strategy
    pub fn match_strategy(mut self, strategy: MatchStrategy) -> Self {
        self.config.match_strategy = strategy;
        self
    }

    /// Set the worker thread count
    pub fn num_threads(mut self, n: usize) -> Self {
        self.config.num_threads = n;
        self
    }

    /// Enable or disable figure artifacts
    pub fn write_figures(mut self, enabled: bool) -> Self {
        self.config.write_figures = enabled;
        self
    }

    /// Build and validate the configuration
    pub fn build(self) -> Result<AnalysisConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}
