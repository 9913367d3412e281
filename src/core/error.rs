//! Error handling and error types for xai-compare.
//!
//! Every fallible operation in the crate returns [`Result`], so failures
//! propagate with `?` up to the caller. The analysis is fail-fast: nothing is
//! retried and a malformed dataset or an empty explanation aborts the run.

use std::io;
use thiserror::Error;

/// Main error type for the crate.
#[derive(Error, Debug)]
pub enum XaiError {
    /// Configuration and validation errors
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// Dataset-related errors
    #[error("Dataset error: {message}")]
    Dataset { message: String },

    /// Data loading and parsing errors
    #[error("Data loading error: {message}")]
    DataLoading { message: String },

    /// Model fitting errors
    #[error("Training error: {message}")]
    Training { message: String },

    /// Prediction errors
    #[error("Prediction error: {message}")]
    Prediction { message: String },

    /// Errors raised while building a SHAP or LIME explanation
    #[error("Explanation error: {message}")]
    Explanation { message: String },

    /// Numerical computation errors (singular systems, NaN, empty reductions)
    #[error("Numerical error: {message}")]
    Numerical { message: String },

    /// Report and figure artifact errors
    #[error("Report error: {message}")]
    Report { message: String },

    /// A model was used before `fit` was called
    #[error("Model not fitted: {model}")]
    NotFitted { model: String },

    /// File I/O errors
    #[error("I/O error: {source}")]
    IO {
        #[from]
        source: io::Error,
    },

    /// CSV parsing errors
    #[error("CSV parsing error: {source}")]
    Csv {
        #[from]
        source: csv::Error,
    },

    /// JSON serialization errors
    #[error("JSON error: {source}")]
    Json {
        #[from]
        source: serde_json::Error,
    },

    /// TOML deserialization errors
    #[error("TOML parse error: {source}")]
    TomlDe {
        #[from]
        source: toml::de::Error,
    },

    /// TOML serialization errors
    #[error("TOML serialization error: {source}")]
    TomlSer {
        #[from]
        source: toml::ser::Error,
    },

    /// Invalid input parameters
    #[error("Invalid parameter: {parameter} = {value}, {reason}")]
    InvalidParameter {
        parameter: String,
        value: String,
        reason: String,
    },

    /// Dimension mismatch errors
    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: String, actual: String },

    /// Out of bounds access
    #[error("Index out of bounds: index {index}, length {length}")]
    IndexOutOfBounds { index: usize, length: usize },
}

/// Type alias for Results using XaiError
pub type Result<T> = std::result::Result<T, XaiError>;

impl XaiError {
    /// Create a configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        XaiError::Config {
            message: message.into(),
        }
    }

    /// Create a dataset error
    pub fn dataset<S: Into<String>>(message: S) -> Self {
        XaiError::Dataset {
            message: message.into(),
        }
    }

    /// Create a data loading error
    pub fn data_loading<S: Into<String>>(message: S) -> Self {
        XaiError::DataLoading {
            message: message.into(),
        }
    }

    /// Create a training error
    pub fn training<S: Into<String>>(message: S) -> Self {
        XaiError::Training {
            message: message.into(),
        }
    }

    /// Create a prediction error
    pub fn prediction<S: Into<String>>(message: S) -> Self {
        XaiError::Prediction {
            message: message.into(),
        }
    }

    /// Create an explanation error
    pub fn explanation<S: Into<String>>(message: S) -> Self {
        XaiError::Explanation {
            message: message.into(),
        }
    }

    /// Create a numerical error
    pub fn numerical<S: Into<String>>(message: S) -> Self {
        XaiError::Numerical {
            message: message.into(),
        }
    }

    /// Create a report error
    pub fn report<S: Into<String>>(message: S) -> Self {
        XaiError::Report {
            message: message.into(),
        }
    }

    /// Create a not-fitted error for the named model
    pub fn not_fitted<S: Into<String>>(model: S) -> Self {
        XaiError::NotFitted {
            model: model.into(),
        }
    }

    /// Create an invalid parameter error
    pub fn invalid_parameter<P, V, R>(parameter: P, value: V, reason: R) -> Self
    where
        P: Into<String>,
        V: Into<String>,
        R: Into<String>,
    {
        XaiError::InvalidParameter {
            parameter: parameter.into(),
            value: value.into(),
            reason: reason.into(),
        }
    }

    /// Create a dimension mismatch error
    pub fn dimension_mismatch<E, A>(expected: E, actual: A) -> Self
    where
        E: Into<String>,
        A: Into<String>,
    {
        XaiError::DimensionMismatch {
            expected: expected.into(),
            actual: actual.into(),
        }
    }

    /// Create an index out of bounds error
    pub fn index_out_of_bounds(index: usize, length: usize) -> Self {
        XaiError::IndexOutOfBounds { index, length }
    }

    /// Get error category for logging
    pub fn category(&self) -> &'static str {
        match self {
            XaiError::Config { .. } => "config",
            XaiError::Dataset { .. } => "dataset",
            XaiError::DataLoading { .. } => "data_loading",
            XaiError::Training { .. } => "training",
            XaiError::Prediction { .. } => "prediction",
            XaiError::Explanation { .. } => "explanation",
            XaiError::Numerical { .. } => "numerical",
            XaiError::Report { .. } => "report",
            XaiError::NotFitted { .. } => "not_fitted",
            XaiError::IO { .. } => "io",
            XaiError::Csv { .. } => "csv",
            XaiError::Json { .. } => "json",
            XaiError::TomlDe { .. } | XaiError::TomlSer { .. } => "toml",
            XaiError::InvalidParameter { .. } => "invalid_parameter",
            XaiError::DimensionMismatch { .. } => "dimension_mismatch",
            XaiError::IndexOutOfBounds { .. } => "index_out_of_bounds",
        }
    }
}

/// Return early with the given error unless the condition holds.
#[macro_export]
macro_rules! ensure {
    ($cond:expr, $err:expr) => {
        if !($cond) {
            return Err($err.into());
        }
    };
}
