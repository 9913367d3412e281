//! Dataset management for xai-compare.
//!
//! - [`Dataset`]: dense features, binary labels and the ordered feature set
//! - [`loader`]: CSV loading
//! - [`partition`]: seeded train/test split

pub mod dataset;
pub mod loader;
pub mod partition;

pub use dataset::Dataset;
pub use loader::{CsvConfig, CsvLoader};
pub use partition::{train_test_split, TrainTestSplit};
