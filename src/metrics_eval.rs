//! Evaluation metrics and numeric helpers for xai-compare.
//!
//! Binary classification metrics for the performance table, plus the small
//! statistics the interpretability scores and figures are built on.

use crate::core::error::{Result, XaiError};
use ndarray::{Array1, Array2, ArrayView1, ArrayView2};
use serde::{Deserialize, Serialize};

/// Confusion matrix counts of a binary classifier.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfusionMatrix {
    pub true_positives: usize,
    pub false_positives: usize,
    pub true_negatives: usize,
    pub false_negatives: usize,
}

impl ConfusionMatrix {
    /// Count outcomes; labels and predictions above 0.5 are positive.
    pub fn from_predictions(predictions: &ArrayView1<'_, f64>, labels: &ArrayView1<'_, f64>) -> Result<Self> {
        if predictions.len() != labels.len() {
            return Err(XaiError::dimension_mismatch(
                format!("{} predictions", labels.len()),
                format!("{} predictions", predictions.len()),
            ));
        }

        let mut matrix = ConfusionMatrix::default();
        for (&pred, &label) in predictions.iter().zip(labels.iter()) {
            match (pred > 0.5, label > 0.5) {
                (true, true) => matrix.true_positives += 1,
                (true, false) => matrix.false_positives += 1,
                (false, false) => matrix.true_negatives += 1,
                (false, true) => matrix.false_negatives += 1,
            }
        }
        Ok(matrix)
    }

    /// Total number of samples counted.
    pub fn total(&self) -> usize {
        self.true_positives + self.false_positives + self.true_negatives + self.false_negatives
    }
}

/// Binary classification evaluation metrics
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClassificationMetrics {
    /// Accuracy
    pub accuracy: f64,
    /// Precision
    pub precision: f64,
    /// Recall
    pub recall: f64,
    /// F1-score
    pub f1_score: f64,
}

impl ClassificationMetrics {
    /// Metrics of a confusion matrix; a zero denominator yields 0.
    pub fn from_confusion(matrix: &ConfusionMatrix) -> Self {
        let tp = matrix.true_positives as f64;
        let fp = matrix.false_positives as f64;
        let fn_ = matrix.false_negatives as f64;
        let total = matrix.total() as f64;

        let accuracy = if total > 0.0 {
            (tp + matrix.true_negatives as f64) / total
        } else {
            0.0
        };
        let precision = if tp + fp > 0.0 { tp / (tp + fp) } else { 0.0 };
        let recall = if tp + fn_ > 0.0 { tp / (tp + fn_) } else { 0.0 };
        let f1_score = if precision + recall > 0.0 {
            2.0 * precision * recall / (precision + recall)
        } else {
            0.0
        };

        ClassificationMetrics {
            accuracy,
            precision,
            recall,
            f1_score,
        }
    }

    /// `(label, value)` rows in table order.
    pub fn rows(&self) -> [(&'static str, f64); 4] {
        [
            ("Accuracy", self.accuracy),
            ("Precision", self.precision),
            ("Recall", self.recall),
            ("F1 Score", self.f1_score),
        ]
    }
}

/// Evaluate hard 0/1 predictions against 0/1 labels.
pub fn evaluate_binary_classification(
    predictions: &ArrayView1<'_, f64>,
    labels: &ArrayView1<'_, f64>,
) -> Result<ClassificationMetrics> {
    let matrix = ConfusionMatrix::from_predictions(predictions, labels)?;
    Ok(ClassificationMetrics::from_confusion(&matrix))
}

/// Mean squared error between two equally long sequences.
pub fn mean_squared_error(expected: &[f64], actual: &[f64]) -> Result<f64> {
    if expected.len() != actual.len() {
        return Err(XaiError::dimension_mismatch(
            format!("{} values", expected.len()),
            format!("{} values", actual.len()),
        ));
    }
    if expected.is_empty() {
        return Err(XaiError::numerical("Mean squared error of an empty sequence"));
    }

    let sum: f64 = expected
        .iter()
        .zip(actual)
        .map(|(e, a)| (e - a).powi(2))
        .sum();
    Ok(sum / expected.len() as f64)
}

/// Cosine similarity of two vectors. A zero vector has similarity 0 with
/// anything.
pub fn cosine_similarity(a: &[f64], b: &[f64]) -> Result<f64> {
    if a.len() != b.len() {
        return Err(XaiError::dimension_mismatch(
            format!("{} components", a.len()),
            format!("{} components", b.len()),
        ));
    }

    let dot: f64 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a = a.iter().map(|x| x * x).sum::<f64>().sqrt();
    let norm_b = b.iter().map(|x| x * x).sum::<f64>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return Ok(0.0);
    }
    Ok(dot / (norm_a * norm_b))
}

/// Pearson correlation between the columns of `data`.
///
/// A constant column has correlation 1 with itself and 0 with every other
/// column.
pub fn correlation_matrix(data: &ArrayView2<'_, f64>) -> Result<Array2<f64>> {
    let (n, p) = data.dim();
    if n < 2 {
        return Err(XaiError::numerical("Correlation needs at least two rows"));
    }

    let means: Array1<f64> = data.columns().into_iter().map(|c| c.sum() / n as f64).collect();
    let centred = data - &means;
    let norms: Vec<f64> = centred
        .columns()
        .into_iter()
        .map(|c| c.dot(&c).sqrt())
        .collect();

    let mut corr = Array2::zeros((p, p));
    for i in 0..p {
        corr[[i, i]] = 1.0;
        for j in i + 1..p {
            let denom = norms[i] * norms[j];
            let value = if denom > 0.0 {
                centred.column(i).dot(&centred.column(j)) / denom
            } else {
                0.0
            };
            corr[[i, j]] = value;
            corr[[j, i]] = value;
        }
    }
    Ok(corr)
}

/// Equal-width histogram.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Histogram {
    /// `bins + 1` edges from min to max
    pub edges: Vec<f64>,
    /// Count per bin
    pub counts: Vec<usize>,
}

/// Histogram with `bins` equal-width bins over the value range. The last bin
/// is closed on the right. A constant sequence gets the range `v - 0.5..v + 0.5`.
pub fn histogram(values: &ArrayView1<'_, f64>, bins: usize) -> Result<Histogram> {
    if bins == 0 {
        return Err(XaiError::invalid_parameter("bins", "0", "must be at least 1"));
    }
    if values.is_empty() {
        return Err(XaiError::numerical("Histogram of an empty sequence"));
    }

    let mut min = values.fold(f64::INFINITY, |m, &v| m.min(v));
    let mut max = values.fold(f64::NEG_INFINITY, |m, &v| m.max(v));
    if min == max {
        min -= 0.5;
        max += 0.5;
    }

    let width = (max - min) / bins as f64;
    let edges = (0..=bins).map(|i| min + width * i as f64).collect();
    let mut counts = vec![0; bins];
    for &value in values {
        let bin = (((value - min) / width) as usize).min(bins - 1);
        counts[bin] += 1;
    }

    Ok(Histogram { edges, counts })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::array;

    #[test]
    fn test_binary_classification_metrics() {
        let pred = array![1.0, 1.0, 0.0, 0.0, 1.0];
        let truth = array![1.0, 0.0, 0.0, 1.0, 1.0];
        let metrics = evaluate_binary_classification(&pred.view(), &truth.view()).unwrap();

        assert_abs_diff_eq!(metrics.accuracy, 0.6);
        assert_abs_diff_eq!(metrics.precision, 2.0 / 3.0);
        assert_abs_diff_eq!(metrics.recall, 2.0 / 3.0);
        assert_abs_diff_eq!(metrics.f1_score, 2.0 / 3.0);
    }

    #[test]
    fn test_zero_division_yields_zero() {
        let pred = array![0.0, 0.0];
        let truth = array![0.0, 0.0];
        let metrics = evaluate_binary_classification(&pred.view(), &truth.view()).unwrap();
        assert_eq!(metrics.accuracy, 1.0);
        assert_eq!(metrics.precision, 0.0);
        assert_eq!(metrics.recall, 0.0);
        assert_eq!(metrics.f1_score, 0.0);
    }

    #[test]
    fn test_mean_squared_error() {
        assert_abs_diff_eq!(mean_squared_error(&[0.2, 0.8], &[0.3, 0.7]).unwrap(), 0.01, epsilon = 1e-12);
        assert!(mean_squared_error(&[1.0], &[]).is_err());
        assert!(mean_squared_error(&[], &[]).is_err());
    }

    #[test]
    fn test_cosine_similarity() {
        assert_abs_diff_eq!(cosine_similarity(&[1.0, 0.0, 0.0], &[1.0, 0.0, 0.0]).unwrap(), 1.0);
        assert_abs_diff_eq!(cosine_similarity(&[1.0, 0.0, 0.0], &[0.0, 1.0, 0.0]).unwrap(), 0.0);
        assert_abs_diff_eq!(cosine_similarity(&[1.0, 1.0], &[-1.0, -1.0]).unwrap(), -1.0, epsilon = 1e-12);
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 2.0]).unwrap(), 0.0);
    }

    #[test]
    fn test_correlation_matrix() {
        let data = array![[1.0, 2.0, 5.0, 3.0], [2.0, 4.0, 4.0, 3.0], [3.0, 6.0, 3.0, 3.0]];
        let corr = correlation_matrix(&data.view()).unwrap();
        assert_abs_diff_eq!(corr[[0, 1]], 1.0, epsilon = 1e-12);
        assert_abs_diff_eq!(corr[[0, 2]], -1.0, epsilon = 1e-12);
        assert_eq!(corr[[0, 3]], 0.0);
        assert_eq!(corr[[3, 3]], 1.0);
        assert_eq!(corr, corr.t());
    }

    #[test]
    fn test_histogram_counts_every_value() {
        let values = array![0.0, 1.0, 2.0, 3.0, 4.0, 10.0];
        let hist = histogram(&values.view(), 5).unwrap();
        assert_eq!(hist.edges.len(), 6);
        assert_eq!(hist.counts, vec![2, 2, 1, 0, 1]);
        assert_eq!(hist.counts.iter().sum::<usize>(), values.len());

        let constant = histogram(&array![3.0, 3.0].view(), 4).unwrap();
        assert_eq!(constant.counts.iter().sum::<usize>(), 2);
    }
}
