//! Seeded train/test partitioning.

use crate::core::error::{Result, XaiError};
use crate::dataset::Dataset;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

/// Training and held-out parts of a dataset.
#[derive(Debug, Clone)]
pub struct TrainTestSplit {
    /// Training rows
    pub train: Dataset,
    /// Held-out rows
    pub test: Dataset,
    /// Original row index of every training row
    pub train_indices: Vec<usize>,
    /// Original row index of every test row
    pub test_indices: Vec<usize>,
}

/// Shuffle rows with a seeded `StdRng` and hold out `ceil(n * test_fraction)`
/// of them. Both parts must end up non-empty.
pub fn train_test_split(dataset: &Dataset, test_fraction: f64, seed: u64) -> Result<TrainTestSplit> {
    if !(test_fraction > 0.0 && test_fraction < 1.0) {
        return Err(XaiError::invalid_parameter(
            "test_fraction",
            test_fraction.to_string(),
            "must be in range (0.0, 1.0)",
        ));
    }

    let n = dataset.num_rows();
    let n_test = (n as f64 * test_fraction).ceil() as usize;
    if n_test == 0 || n_test >= n {
        return Err(XaiError::dataset(format!(
            "Cannot split {} rows with test fraction {}: both parts must be non-empty",
            n, test_fraction
        )));
    }

    let mut indices: Vec<usize> = (0..n).collect();
    let mut rng = StdRng::seed_from_u64(seed);
    indices.shuffle(&mut rng);

    let test_indices = indices[..n_test].to_vec();
    let train_indices = indices[n_test..].to_vec();

    log::debug!(
        "Split {} rows into {} train / {} test (seed {})",
        n,
        train_indices.len(),
        test_indices.len(),
        seed
    );

    Ok(TrainTestSplit {
        train: dataset.select_rows(&train_indices)?,
        test: dataset.select_rows(&test_indices)?,
        train_indices,
        test_indices,
    })
}
