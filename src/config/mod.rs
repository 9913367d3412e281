//! Configuration management for xai-compare.
//!
//! Settings are layered: built-in defaults, then an optional `.toml`/`.json`
//! file, then `XAI_*` environment variables. Command-line flags are applied
//! last by the binary.

pub mod core;

pub use self::core::{AnalysisConfig, ConfigBuilder, LimeConfig, ModelConfig, ScoringWeights, ENV_PREFIX};

use crate::core::error::Result;
use std::path::Path;

/// Default configuration file looked up by the binary.
pub const DEFAULT_CONFIG_FILE: &str = "xai-compare.toml";

/// Where a configuration layer came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    /// Built-in defaults
    Default,
    /// A configuration file
    File(String),
    /// `XAI_*` environment variables
    Environment,
    /// Command-line arguments
    CommandLine,
}

impl std::fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigSource::Default => write!(f, "defaults"),
            ConfigSource::File(path) => write!(f, "file {}", path),
            ConfigSource::Environment => write!(f, "environment"),
            ConfigSource::CommandLine => write!(f, "command line"),
        }
    }
}

/// Load defaults, overlay `file` when given, then overlay the environment.
///
/// Returns the configuration with the list of layers that contributed to it.
pub fn load_layered(file: Option<&Path>) -> Result<(AnalysisConfig, Vec<ConfigSource>)> {
    let mut sources = vec![ConfigSource::Default];

    let mut config = match file {
        Some(path) => {
            sources.push(ConfigSource::File(path.display().to_string()));
            AnalysisConfig::load_from_file(path)?
        }
        None => AnalysisConfig::default(),
    };

    if std::env::vars().any(|(key, _)| key.starts_with(ENV_PREFIX)) {
        sources.push(ConfigSource::Environment);
    }
    config.apply_environment_overrides()?;

    log::debug!(
        "Configuration resolved from {}",
        sources
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(" < ")
    );

    Ok((config, sources))
}
