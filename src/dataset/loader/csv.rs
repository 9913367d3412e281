//! CSV file loader for xai-compare.
//!
//! Reads a headered CSV, pulls the outcome column out by name and parses every
//! other column as a numeric feature. Anything unexpected is an error.

use crate::core::constants::DEFAULT_TARGET_COLUMN;
use crate::core::error::{Result, XaiError};
use crate::dataset::Dataset;
use csv::{ReaderBuilder, StringRecord, Trim};
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// CSV-specific configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CsvConfig {
    /// Field delimiter
    pub delimiter: char,
    /// Quote character
    pub quote_char: char,
    /// Comment character
    pub comment_char: Option<char>,
    /// Maximum number of rows to read
    pub max_rows: Option<usize>,
    /// Trim whitespace from fields
    pub trim: bool,
}

impl Default for CsvConfig {
    fn default() -> Self {
        CsvConfig {
            delimiter: ',',
            quote_char: '"',
            comment_char: None,
            max_rows: None,
            trim: true,
        }
    }
}

/// CSV data loader
#[derive(Debug, Clone)]
pub struct CsvLoader {
    target_column: String,
    csv_config: CsvConfig,
}

impl Default for CsvLoader {
    fn default() -> Self {
        CsvLoader::new(DEFAULT_TARGET_COLUMN)
    }
}

impl CsvLoader {
    /// Create a loader that treats `target_column` as the outcome
    pub fn new(target_column: impl Into<String>) -> Self {
        CsvLoader {
            target_column: target_column.into(),
            csv_config: CsvConfig::default(),
        }
    }

    /// Create CSV loader with custom configuration
    pub fn with_csv_config(mut self, csv_config: CsvConfig) -> Self {
        self.csv_config = csv_config;
        self
    }

    /// Set delimiter character
    pub fn with_delimiter(mut self, delimiter: char) -> Self {
        self.csv_config.delimiter = delimiter;
        self
    }

    /// Set maximum rows to read
    pub fn with_max_rows(mut self, max_rows: usize) -> Self {
        self.csv_config.max_rows = Some(max_rows);
        self
    }

    /// Load CSV file
    pub fn load_csv<P: AsRef<Path>>(&self, path: P) -> Result<Dataset> {
        let path = path.as_ref();
        log::info!("Loading CSV file: {}", path.display());

        if !path.is_file() {
            return Err(XaiError::data_loading(format!(
                "File does not exist or is not a file: {}",
                path.display()
            )));
        }

        let file = File::open(path)?;
        let dataset = self.load_from_reader(file)?;

        log::info!(
            "Loaded {} rows x {} features from {} (class counts {:?})",
            dataset.num_rows(),
            dataset.num_features(),
            path.display(),
            dataset.class_counts()
        );
        Ok(dataset)
    }

    /// Load CSV data from any reader
    pub fn load_from_reader<R: Read>(&self, reader: R) -> Result<Dataset> {
        let mut csv_reader = ReaderBuilder::new()
            .has_headers(true)
            .delimiter(ascii_byte("delimiter", self.csv_config.delimiter)?)
            .quote(ascii_byte("quote_char", self.csv_config.quote_char)?)
            .comment(
                self.csv_config
                    .comment_char
                    .map(|c| ascii_byte("comment_char", c))
                    .transpose()?,
            )
            .trim(if self.csv_config.trim { Trim::All } else { Trim::None })
            .flexible(false)
            .from_reader(reader);

        let headers = csv_reader.headers()?.clone();
        let target_index = headers
            .iter()
            .position(|h| h == self.target_column)
            .ok_or_else(|| {
                XaiError::data_loading(format!(
                    "Target column '{}' not found in header",
                    self.target_column
                ))
            })?;

        let feature_names: Vec<String> = headers
            .iter()
            .enumerate()
            .filter(|(i, _)| *i != target_index)
            .map(|(_, h)| h.to_string())
            .collect();

        if feature_names.is_empty() {
            return Err(XaiError::data_loading("CSV contains no feature columns"));
        }

        let mut values: Vec<f64> = Vec::new();
        let mut labels: Vec<f64> = Vec::new();
        let mut record = StringRecord::new();
        let mut row = 0usize;

        while csv_reader.read_record(&mut record)? {
            if self.csv_config.max_rows.map_or(false, |max| row >= max) {
                break;
            }

            for (col, field) in record.iter().enumerate() {
                let value = parse_cell(field, row, &headers[col])?;
                if col == target_index {
                    labels.push(value);
                } else {
                    values.push(value);
                }
            }
            row += 1;
        }

        if row == 0 {
            return Err(XaiError::data_loading("CSV contains no data rows"));
        }

        let features = Array2::from_shape_vec((row, feature_names.len()), values)
            .map_err(|e| XaiError::data_loading(format!("Failed to shape feature matrix: {}", e)))?;

        Dataset::new(
            features,
            Array1::from_vec(labels),
            feature_names,
            self.target_column.clone(),
        )
    }
}

fn ascii_byte(name: &str, c: char) -> Result<u8> {
    if c.is_ascii() {
        Ok(c as u8)
    } else {
        Err(XaiError::invalid_parameter(
            name,
            c.to_string(),
            "must be an ASCII character",
        ))
    }
}

fn parse_cell(field: &str, row: usize, column: &str) -> Result<f64> {
    field.parse::<f64>().map_err(|_| {
        XaiError::data_loading(format!(
            "Invalid numeric value '{}' in column '{}' at data row {}",
            field,
            column,
            row + 1
        ))
    })
}
