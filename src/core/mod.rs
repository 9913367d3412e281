//! Core infrastructure module for xai-compare.
//!
//! - [`types`]: Shared scalar aliases and enumerations
//! - [`constants`]: Configuration defaults
//! - [`error`]: Error type and `Result` alias
//! - [`traits`]: Classifier, tree-ensemble, and feature-matching capabilities

pub mod constants;
pub mod error;
pub mod traits;
pub mod types;

pub use constants::*;
pub use error::{Result, XaiError};
pub use traits::*;
pub use types::*;

use std::sync::Once;

static LOGGING_INIT: Once = Once::new();

/// Initialize the logging subsystem.
///
/// Installs `env_logger` once per process with an `info` default filter;
/// `RUST_LOG` takes precedence when set. Safe to call repeatedly.
pub fn initialize_logging() {
    LOGGING_INIT.call_once(|| {
        let env = env_logger::Env::default().default_filter_or("info");
        // Ignore the error if the host application already installed a logger.
        let _ = env_logger::Builder::from_env(env)
            .format_timestamp_millis()
            .try_init();
        log::debug!("Logging initialized");
    });
}

/// Initialize logging with an explicit level, used by the `--verbose` flag.
pub fn initialize_logging_with_level(level: log::LevelFilter) {
    LOGGING_INIT.call_once(|| {
        let _ = env_logger::Builder::new()
            .filter_level(level)
            .parse_env("RUST_LOG")
            .format_timestamp_millis()
            .try_init();
    });
}

/// Whether the logging subsystem has been initialized.
pub fn is_logging_initialized() -> bool {
    LOGGING_INIT.is_completed()
}
