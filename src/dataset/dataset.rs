//! In-memory tabular dataset with a binary outcome.

use crate::core::error::{Result, XaiError};
use crate::core::types::FeatureIndex;
use ndarray::{Array1, Array2, ArrayView1, ArrayView2, Axis};
use serde::{Deserialize, Serialize};

/// Dense feature matrix, 0/1 labels and ordered feature names.
///
/// The feature names are the analysis feature set; the target column is kept
/// apart and never appears among them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dataset {
    features: Array2<f64>,
    labels: Array1<f64>,
    feature_names: Vec<String>,
    target_name: String,
}

impl Dataset {
    /// Create a dataset, checking shapes, names and that labels are 0 or 1.
    pub fn new(
        features: Array2<f64>,
        labels: Array1<f64>,
        feature_names: Vec<String>,
        target_name: impl Into<String>,
    ) -> Result<Self> {
        let target_name = target_name.into();

        if features.nrows() != labels.len() {
            return Err(XaiError::dimension_mismatch(
                format!("{} labels", features.nrows()),
                format!("{} labels", labels.len()),
            ));
        }

        if features.ncols() != feature_names.len() {
            return Err(XaiError::dimension_mismatch(
                format!("{} feature names", features.ncols()),
                format!("{} feature names", feature_names.len()),
            ));
        }

        if feature_names.iter().any(|name| name == &target_name) {
            return Err(XaiError::dataset(format!(
                "Target column '{}' must not be a feature",
                target_name
            )));
        }

        for (row, &label) in labels.iter().enumerate() {
            if label != 0.0 && label != 1.0 {
                return Err(XaiError::dataset(format!(
                    "Label {} at row {} is not binary (expected 0 or 1)",
                    label, row
                )));
            }
        }

        Ok(Dataset {
            features,
            labels,
            feature_names,
            target_name,
        })
    }

    /// Number of rows.
    pub fn num_rows(&self) -> usize {
        self.features.nrows()
    }

    /// Number of feature columns.
    pub fn num_features(&self) -> usize {
        self.features.ncols()
    }

    /// Whether the dataset has no rows.
    pub fn is_empty(&self) -> bool {
        self.num_rows() == 0
    }

    /// Feature matrix view.
    pub fn features(&self) -> ArrayView2<'_, f64> {
        self.features.view()
    }

    /// Label vector view.
    pub fn labels(&self) -> ArrayView1<'_, f64> {
        self.labels.view()
    }

    /// Ordered feature names.
    pub fn feature_names(&self) -> &[String] {
        &self.feature_names
    }

    /// Name of the outcome column.
    pub fn target_name(&self) -> &str {
        &self.target_name
    }

    /// Position of `name` in the feature set.
    pub fn feature_index(&self, name: &str) -> Result<FeatureIndex> {
        self.feature_names
            .iter()
            .position(|candidate| candidate == name)
            .ok_or_else(|| XaiError::dataset(format!("Unknown feature '{}'", name)))
    }

    /// Values of the named feature column.
    pub fn column(&self, name: &str) -> Result<ArrayView1<'_, f64>> {
        let index = self.feature_index(name)?;
        Ok(self.features.column(index))
    }

    /// Feature values of one row.
    pub fn row(&self, index: usize) -> Result<ArrayView1<'_, f64>> {
        if index >= self.num_rows() {
            return Err(XaiError::index_out_of_bounds(index, self.num_rows()));
        }
        Ok(self.features.row(index))
    }

    /// New dataset holding the given rows in the given order.
    pub fn select_rows(&self, indices: &[usize]) -> Result<Dataset> {
        if let Some(&bad) = indices.iter().find(|&&i| i >= self.num_rows()) {
            return Err(XaiError::index_out_of_bounds(bad, self.num_rows()));
        }

        Ok(Dataset {
            features: self.features.select(Axis(0), indices),
            labels: self.labels.select(Axis(0), indices),
            feature_names: self.feature_names.clone(),
            target_name: self.target_name.clone(),
        })
    }

    /// Features with the target appended as the last column, plus the matching
    /// column names.
    pub fn frame(&self) -> (Array2<f64>, Vec<String>) {
        let mut frame = Array2::zeros((self.num_rows(), self.num_features() + 1));
        frame
            .slice_mut(ndarray::s![.., ..self.num_features()])
            .assign(&self.features);
        frame.column_mut(self.num_features()).assign(&self.labels);

        let mut names = self.feature_names.clone();
        names.push(self.target_name.clone());
        (frame, names)
    }

    /// Number of rows labelled 0 and 1.
    pub fn class_counts(&self) -> [usize; 2] {
        let positives = self.labels.iter().filter(|&&y| y == 1.0).count();
        [self.num_rows() - positives, positives]
    }
}
