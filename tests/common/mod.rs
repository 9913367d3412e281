//! Common test utilities for xai-compare integration tests.

#![allow(dead_code)]

use ndarray::{Array1, Array2};
use rand::prelude::*;
use std::fs;
use std::path::Path;
use xai_compare::Dataset;

/// Column names of the diabetes dataset, in file order.
pub const DIABETES_FEATURES: [&str; 8] = [
    "Pregnancies",
    "Glucose",
    "BloodPressure",
    "SkinThickness",
    "Insulin",
    "BMI",
    "DiabetesPedigreeFunction",
    "Age",
];

/// Create diabetes-like features with plausible ranges.
pub fn create_diabetes_features(num_samples: usize, seed: u64) -> Array2<f64> {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut features = Array2::zeros((num_samples, DIABETES_FEATURES.len()));

    for i in 0..num_samples {
        features[[i, 0]] = rng.gen_range(0..15) as f64;
        features[[i, 1]] = rng.gen_range(60.0..200.0_f64).round();
        features[[i, 2]] = rng.gen_range(40.0..110.0_f64).round();
        features[[i, 3]] = rng.gen_range(0.0..50.0_f64).round();
        features[[i, 4]] = if rng.gen_bool(0.5) { 0.0 } else { rng.gen_range(15.0..400.0_f64).round() };
        features[[i, 5]] = (rng.gen_range(18.0..50.0_f64) * 10.0).round() / 10.0;
        features[[i, 6]] = (rng.gen_range(0.08..2.4_f64) * 1000.0).round() / 1000.0;
        features[[i, 7]] = rng.gen_range(21..81) as f64;
    }

    features
}

/// Outcome driven mostly by glucose and BMI, with some label noise.
pub fn create_diabetes_labels(features: &Array2<f64>, seed: u64) -> Array1<f64> {
    let mut rng = StdRng::seed_from_u64(seed.wrapping_add(1));
    features
        .rows()
        .into_iter()
        .map(|row| {
            let risk = (row[1] - 125.0) / 30.0 + (row[5] - 32.0) / 8.0 + (row[7] - 45.0) / 40.0;
            let positive = risk > 0.0;
            let flipped = rng.gen_bool(0.05);
            if positive != flipped {
                1.0
            } else {
                0.0
            }
        })
        .collect()
}

/// Diabetes-like dataset.
pub fn create_diabetes_dataset(num_samples: usize, seed: u64) -> Dataset {
    let features = create_diabetes_features(num_samples, seed);
    let labels = create_diabetes_labels(&features, seed);
    let names = DIABETES_FEATURES.iter().map(|s| s.to_string()).collect();
    Dataset::new(features, labels, names, "Outcome").expect("valid synthetic dataset")
}

/// Write a dataset as CSV with the outcome as the last column.
pub fn write_diabetes_csv(path: &Path, dataset: &Dataset) -> std::io::Result<()> {
    let mut content = String::new();
    content.push_str(&dataset.feature_names().join(","));
    content.push_str(",Outcome\n");

    for (row, label) in dataset.features().rows().into_iter().zip(dataset.labels().iter()) {
        let values: Vec<String> = row.iter().map(|v| v.to_string()).collect();
        content.push_str(&values.join(","));
        content.push_str(&format!(",{}\n", *label as u8));
    }

    fs::write(path, content)
}

/// Assert that two floating point values are approximately equal
pub fn assert_approx_eq(a: f64, b: f64, tolerance: f64) {
    assert!(
        (a - b).abs() < tolerance,
        "Values not approximately equal: {} vs {} (tolerance: {})",
        a,
        b,
        tolerance
    );
}
