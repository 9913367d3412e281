//! Quartile discretization of continuous features.
//!
//! Each feature is cut at its 25th/50th/75th percentiles (duplicates removed).
//! Per-bin statistics of the training data let a bin be turned back into a
//! plausible continuous value with a truncated normal draw.

use crate::core::constants::BIN_STD_EPSILON;
use crate::core::error::{Result, XaiError};
use ndarray::{ArrayView1, ArrayView2};
use rand::Rng;
use rand_distr::{Distribution, Normal};

/// Linear-interpolated percentile of already sorted values, `q` in [0, 100].
pub fn percentile(sorted: &[f64], q: f64) -> f64 {
    match sorted.len() {
        0 => f64::NAN,
        1 => sorted[0],
        n => {
            let position = q / 100.0 * (n - 1) as f64;
            let lower = position.floor() as usize;
            let upper = (lower + 1).min(n - 1);
            let fraction = position - lower as f64;
            sorted[lower] + (sorted[upper] - sorted[lower]) * fraction
        }
    }
}

/// Draw from `normal` truncated to [low, high].
///
/// Falls back to a uniform draw on the interval when rejection sampling
/// keeps missing it (narrow or far-tail intervals).
pub fn truncated_normal<R: Rng + ?Sized>(rng: &mut R, normal: &Normal<f64>, low: f64, high: f64) -> f64 {
    const MAX_ATTEMPTS: usize = 64;

    if high <= low {
        return low;
    }

    for _ in 0..MAX_ATTEMPTS {
        let value = normal.sample(rng);
        if value >= low && value <= high {
            return value;
        }
    }
    rng.gen_range(low..=high)
}

/// Quartile bins with per-bin training statistics.
#[derive(Debug, Clone)]
pub struct QuartileDiscretizer {
    boundaries: Vec<Vec<f64>>,
    names: Vec<Vec<String>>,
    normals: Vec<Vec<Normal<f64>>>,
    mins: Vec<Vec<f64>>,
    maxs: Vec<Vec<f64>>,
}

impl QuartileDiscretizer {
    /// Compute quartile boundaries, bin names and bin statistics.
    pub fn fit(training: &ArrayView2<'_, f64>, feature_names: &[String]) -> Result<Self> {
        if training.nrows() == 0 {
            return Err(XaiError::explanation("Cannot discretize an empty training set"));
        }
        if training.ncols() != feature_names.len() {
            return Err(XaiError::dimension_mismatch(
                format!("{} feature names", training.ncols()),
                format!("{} feature names", feature_names.len()),
            ));
        }

        let n_features = training.ncols();
        let mut discretizer = QuartileDiscretizer {
            boundaries: Vec::with_capacity(n_features),
            names: Vec::with_capacity(n_features),
            normals: Vec::with_capacity(n_features),
            mins: Vec::with_capacity(n_features),
            maxs: Vec::with_capacity(n_features),
        };

        for (feature, name) in feature_names.iter().enumerate() {
            let mut sorted: Vec<f64> = training.column(feature).to_vec();
            sorted.sort_by(f64::total_cmp);

            let mut qts: Vec<f64> = [25.0, 50.0, 75.0]
                .iter()
                .map(|&q| percentile(&sorted, q))
                .collect();
            qts.dedup();

            let last = qts.len() - 1;
            let mut names = Vec::with_capacity(qts.len() + 1);
            names.push(format!("{} <= {:.2}", name, qts[0]));
            for i in 0..last {
                names.push(format!("{:.2} < {} <= {:.2}", qts[i], name, qts[i + 1]));
            }
            names.push(format!("{} > {:.2}", name, qts[last]));

            let n_bins = qts.len() + 1;
            let mut buckets: Vec<Vec<f64>> = vec![Vec::new(); n_bins];
            for &value in training.column(feature) {
                buckets[bin_of(&qts, value)].push(value);
            }

            let normals = buckets
                .iter()
                .map(|bucket| {
                    let (mean, std) = if bucket.is_empty() {
                        (0.0, BIN_STD_EPSILON)
                    } else {
                        let mean = bucket.iter().sum::<f64>() / bucket.len() as f64;
                        let var = bucket.iter().map(|v| (v - mean).powi(2)).sum::<f64>()
                            / bucket.len() as f64;
                        (mean, var.sqrt() + BIN_STD_EPSILON)
                    };
                    Normal::new(mean, std).map_err(|e| {
                        XaiError::explanation(format!("Invalid bin statistics for '{}': {}", name, e))
                    })
                })
                .collect::<Result<Vec<_>>>()?;

            let mut mins = vec![sorted[0]];
            mins.extend_from_slice(&qts);
            let mut maxs = qts.clone();
            maxs.push(sorted[sorted.len() - 1]);

            discretizer.boundaries.push(qts);
            discretizer.names.push(names);
            discretizer.normals.push(normals);
            discretizer.mins.push(mins);
            discretizer.maxs.push(maxs);
        }

        Ok(discretizer)
    }

    /// Number of features.
    pub fn num_features(&self) -> usize {
        self.boundaries.len()
    }

    /// Number of bins of `feature`.
    pub fn num_bins(&self, feature: usize) -> usize {
        self.boundaries.get(feature).map_or(0, |b| b.len() + 1)
    }

    /// Quartile boundaries of `feature`.
    pub fn boundaries(&self, feature: usize) -> &[f64] {
        &self.boundaries[feature]
    }

    /// Bin index of `value` for `feature`.
    pub fn bin(&self, feature: usize, value: f64) -> usize {
        bin_of(&self.boundaries[feature], value)
    }

    /// Bin index of every value of `row`.
    pub fn discretize_row(&self, row: &ArrayView1<'_, f64>) -> Vec<usize> {
        row.iter()
            .enumerate()
            .map(|(feature, &value)| self.bin(feature, value))
            .collect()
    }

    /// Human-readable description of a bin, e.g. `Glucose > 140.25`.
    pub fn bin_name(&self, feature: usize, bin: usize) -> &str {
        &self.names[feature][bin]
    }

    /// Draw a continuous value inside `bin` of `feature`.
    pub fn undiscretize<R: Rng + ?Sized>(&self, feature: usize, bin: usize, rng: &mut R) -> f64 {
        let (low, high) = (self.mins[feature][bin], self.maxs[feature][bin]);
        if low == high {
            return low;
        }
        truncated_normal(rng, &self.normals[feature][bin], low, high)
    }
}

/// Number of boundaries strictly below `value`.
fn bin_of(boundaries: &[f64], value: f64) -> usize {
    boundaries.partition_point(|&b| b < value)
}
