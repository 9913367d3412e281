//! LIME explanations for tabular classifiers.
//!
//! An instance is explained by sampling a neighbourhood in quartile-bin space,
//! weighting each sample by its closeness to the instance, and fitting a
//! weighted ridge surrogate to the model's class-1 probabilities. The
//! surrogate works on the binary "same bin as the instance" representation,
//! so every coefficient reads as the effect of a bin description such as
//! `Glucose > 140.25`.

use crate::config::LimeConfig;
use crate::core::constants::{AUTO_FORWARD_SELECTION_LIMIT, CLASS_NAMES, HIGHEST_WEIGHTS_RIDGE_ALPHA};
use crate::core::error::{Result, XaiError};
use crate::core::traits::{Classifier, FeatureMatcher};
use crate::core::types::{FeatureSelection, Score};
use crate::prediction::discretize::QuartileDiscretizer;
use crate::prediction::ridge::fit_weighted_ridge;
use ndarray::{Array1, Array2, ArrayView1, ArrayView2, Axis};
use rand::distributions::{Distribution, WeightedIndex};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

/// A fitted local surrogate for one instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LimeExplanation {
    /// `(bin description, weight)` sorted by |weight| descending
    pub entries: Vec<(String, f64)>,
    /// Feature index of every entry
    pub feature_indices: Vec<usize>,
    /// Surrogate intercept
    pub intercept: f64,
    /// Surrogate prediction at the instance
    pub local_pred: Score,
    /// Weighted R² of the surrogate on the neighbourhood
    pub score: f64,
    /// Model probabilities of the instance, class 0 then class 1
    pub predict_proba: [Score; 2],
    /// Raw feature values of the instance
    pub instance: Vec<f64>,
    /// Feature names, in dataset order
    pub feature_names: Vec<String>,
    /// Outcome class names
    pub class_names: [String; 2],
}

impl LimeExplanation {
    /// Number of features the explanation uses.
    pub fn num_used_features(&self) -> usize {
        self.entries.len()
    }

    /// Weight of the first entry whose token refers to `feature`, or 0.
    pub fn weight_for(&self, feature: &str, matcher: &dyn FeatureMatcher) -> f64 {
        self.entries
            .iter()
            .find(|(token, _)| matcher.matches(token, feature))
            .map_or(0.0, |(_, weight)| *weight)
    }
}

/// Tabular LIME explainer fitted on training data.
#[derive(Debug, Clone)]
pub struct LimeTabularExplainer {
    feature_names: Vec<String>,
    class_names: [String; 2],
    discretizer: QuartileDiscretizer,
    bin_values: Vec<Vec<usize>>,
    bin_samplers: Vec<WeightedIndex<f64>>,
    kernel_width: f64,
    config: LimeConfig,
}

impl LimeTabularExplainer {
    /// Build the explainer from the training features.
    pub fn new(training: &ArrayView2<'_, f64>, feature_names: &[String], config: LimeConfig) -> Result<Self> {
        let discretizer = QuartileDiscretizer::fit(training, feature_names)?;

        let mut bin_values = Vec::with_capacity(feature_names.len());
        let mut bin_samplers = Vec::with_capacity(feature_names.len());
        for feature in 0..feature_names.len() {
            let mut counts = vec![0usize; discretizer.num_bins(feature)];
            for &value in training.column(feature) {
                counts[discretizer.bin(feature, value)] += 1;
            }

            let (values, frequencies): (Vec<usize>, Vec<f64>) = counts
                .iter()
                .enumerate()
                .filter(|(_, &count)| count > 0)
                .map(|(bin, &count)| (bin, count as f64 / training.nrows() as f64))
                .unzip();

            let sampler = WeightedIndex::new(&frequencies).map_err(|e| {
                XaiError::explanation(format!(
                    "Invalid bin frequencies for '{}': {}",
                    feature_names[feature], e
                ))
            })?;
            bin_values.push(values);
            bin_samplers.push(sampler);
        }

        let kernel_width = (feature_names.len() as f64).sqrt() * config.kernel_width_factor;
        log::debug!(
            "LIME explainer ready: {} features, kernel width {:.4}",
            feature_names.len(),
            kernel_width
        );

        Ok(LimeTabularExplainer {
            feature_names: feature_names.to_vec(),
            class_names: [CLASS_NAMES[0].to_string(), CLASS_NAMES[1].to_string()],
            discretizer,
            bin_values,
            bin_samplers,
            kernel_width,
            config,
        })
    }

    /// Kernel width used to weight neighbourhood samples.
    pub fn kernel_width(&self) -> f64 {
        self.kernel_width
    }

    /// The fitted discretizer.
    pub fn discretizer(&self) -> &QuartileDiscretizer {
        &self.discretizer
    }

    /// Exponential kernel on distances in binary space.
    pub fn kernel(&self, distance: f64) -> f64 {
        (-(distance * distance) / (self.kernel_width * self.kernel_width))
            .exp()
            .sqrt()
    }

    /// Sample the neighbourhood of `instance`.
    ///
    /// Returns the binary representation (1 = same bin as the instance) and the
    /// matching continuous rows. Row 0 is the instance itself.
    pub fn sample_neighbourhood(
        &self,
        instance: &ArrayView1<'_, f64>,
        rng: &mut StdRng,
    ) -> Result<(Array2<f64>, Array2<f64>)> {
        let n_features = self.feature_names.len();
        if instance.len() != n_features {
            return Err(XaiError::dimension_mismatch(
                format!("{} features", n_features),
                format!("{} features", instance.len()),
            ));
        }

        let num_samples = self.config.num_samples;
        let instance_bins = self.discretizer.discretize_row(instance);
        let mut binary = Array2::zeros((num_samples, n_features));
        let mut inverse = Array2::zeros((num_samples, n_features));

        for feature in 0..n_features {
            binary[[0, feature]] = 1.0;
            inverse[[0, feature]] = instance[feature];

            for row in 1..num_samples {
                let bin = self.bin_values[feature][self.bin_samplers[feature].sample(rng)];
                if bin == instance_bins[feature] {
                    binary[[row, feature]] = 1.0;
                }
                inverse[[row, feature]] = self.discretizer.undiscretize(feature, bin, rng);
            }
        }

        Ok((binary, inverse))
    }

    /// Explain the model's class-1 probability at `instance`.
    ///
    /// `num_features` caps the number of entries; `seed` makes the
    /// neighbourhood reproducible.
    ///
    /// Kernel distances are Euclidean on the unscaled 0/1 "same bin"
    /// representation. The Python `lime` package standardises that
    /// representation with its fitted scaler first, so kernel weights differ
    /// from its output.
    pub fn explain_instance<C: Classifier + ?Sized>(
        &self,
        instance: &ArrayView1<'_, f64>,
        model: &C,
        num_features: usize,
        seed: u64,
    ) -> Result<LimeExplanation> {
        if num_features == 0 {
            return Err(XaiError::invalid_parameter(
                "num_features",
                "0",
                "must be at least 1",
            ));
        }

        let mut rng = StdRng::seed_from_u64(seed);
        let (binary, inverse) = self.sample_neighbourhood(instance, &mut rng)?;

        let proba = model.predict_proba(&inverse.view())?;
        if proba.ncols() != 2 {
            return Err(XaiError::explanation(format!(
                "Expected two class probabilities, got {}",
                proba.ncols()
            )));
        }
        let labels = proba.column(1).to_owned();

        let weights: Array1<f64> = binary
            .axis_iter(Axis(0))
            .map(|row| {
                let distance = row.iter().map(|&v| (v - 1.0).powi(2)).sum::<f64>().sqrt();
                self.kernel(distance)
            })
            .collect();

        let used = self.select_features(&binary.view(), &labels.view(), &weights.view(), num_features)?;
        let selected = binary.select(Axis(1), &used);
        let surrogate =
            fit_weighted_ridge(&selected.view(), &labels.view(), &weights.view(), self.config.ridge_alpha)?;
        let score = surrogate.score(&selected.view(), &labels.view(), &weights.view());
        let local_pred = surrogate.predict_row(&selected.row(0));

        let instance_bins = self.discretizer.discretize_row(instance);
        let mut ranked: Vec<(usize, f64)> = used
            .iter()
            .copied()
            .zip(surrogate.coef.iter().copied())
            .collect();
        ranked.sort_by(|a, b| b.1.abs().total_cmp(&a.1.abs()));

        let entries = ranked
            .iter()
            .map(|&(feature, weight)| {
                (
                    self.discretizer
                        .bin_name(feature, instance_bins[feature])
                        .to_string(),
                    weight,
                )
            })
            .collect();

        Ok(LimeExplanation {
            entries,
            feature_indices: ranked.iter().map(|&(feature, _)| feature).collect(),
            intercept: surrogate.intercept,
            local_pred,
            score,
            predict_proba: [proba[[0, 0]], proba[[0, 1]]],
            instance: instance.to_vec(),
            feature_names: self.feature_names.clone(),
            class_names: self.class_names.clone(),
        })
    }

    fn select_features(
        &self,
        data: &ArrayView2<'_, f64>,
        labels: &ArrayView1<'_, f64>,
        weights: &ArrayView1<'_, f64>,
        num_features: usize,
    ) -> Result<Vec<usize>> {
        let n_features = data.ncols();
        let method = match self.config.feature_selection {
            FeatureSelection::Auto if num_features <= AUTO_FORWARD_SELECTION_LIMIT => {
                FeatureSelection::ForwardSelection
            }
            FeatureSelection::Auto => FeatureSelection::HighestWeights,
            other => other,
        };

        match method {
            FeatureSelection::None | FeatureSelection::Auto => Ok((0..n_features).collect()),
            FeatureSelection::ForwardSelection => {
                let mut used: Vec<usize> = Vec::new();
                for _ in 0..num_features.min(n_features) {
                    let mut best_score = f64::NEG_INFINITY;
                    let mut best = None;
                    for candidate in (0..n_features).filter(|f| !used.contains(f)) {
                        let mut columns = used.clone();
                        columns.push(candidate);
                        let x = data.select(Axis(1), &columns);
                        let fit = fit_weighted_ridge(&x.view(), labels, weights, 0.0)?;
                        let score = fit.score(&x.view(), labels, weights);
                        if score > best_score || best.is_none() {
                            best_score = score;
                            best = Some(candidate);
                        }
                    }
                    used.extend(best);
                }
                Ok(used)
            }
            FeatureSelection::HighestWeights => {
                let fit = fit_weighted_ridge(data, labels, weights, HIGHEST_WEIGHTS_RIDGE_ALPHA)?;
                let first = data.row(0);
                let mut ranked: Vec<(usize, f64)> = fit
                    .coef
                    .iter()
                    .zip(first.iter())
                    .map(|(&c, &x)| c * x)
                    .enumerate()
                    .collect();
                ranked.sort_by(|a, b| b.1.abs().total_cmp(&a.1.abs()));
                Ok(ranked.into_iter().take(num_features).map(|(f, _)| f).collect())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interpretability::SubstringMatcher;
    use crate::tree::DecisionTreeClassifier;
    use approx::assert_abs_diff_eq;
    use rand::Rng;

    fn training(n: usize) -> (Array2<f64>, Array1<f64>, Vec<String>) {
        let mut rng = StdRng::seed_from_u64(11);
        let x = Array2::from_shape_fn((n, 3), |_| rng.gen_range(0.0..100.0));
        let y = x.column(0).mapv(|v| if v > 60.0 { 1.0 } else { 0.0 });
        let names = vec!["Glucose".to_string(), "BMI".to_string(), "Age".to_string()];
        (x, y, names)
    }

    fn small_config() -> LimeConfig {
        LimeConfig {
            num_samples: 800,
            ..LimeConfig::default()
        }
    }

    #[test]
    fn test_kernel_width_and_kernel() {
        let (x, _, names) = training(100);
        let explainer = LimeTabularExplainer::new(&x.view(), &names, small_config()).unwrap();
        assert_abs_diff_eq!(explainer.kernel_width(), 3.0_f64.sqrt() * 0.75);
        assert_abs_diff_eq!(explainer.kernel(0.0), 1.0);
        assert!(explainer.kernel(1.0) < 1.0);
    }

    #[test]
    fn test_neighbourhood_first_row_is_instance() {
        let (x, _, names) = training(100);
        let explainer = LimeTabularExplainer::new(&x.view(), &names, small_config()).unwrap();
        let mut rng = StdRng::seed_from_u64(0);
        let (binary, inverse) = explainer.sample_neighbourhood(&x.row(3), &mut rng).unwrap();

        assert_eq!(binary.dim(), (800, 3));
        assert!(binary.row(0).iter().all(|&v| v == 1.0));
        assert_eq!(inverse.row(0), x.row(3));
        assert!(binary.iter().all(|&v| v == 0.0 || v == 1.0));

        // A row marked "same bin" must undiscretize back into the instance's bin.
        let bins = explainer.discretizer().discretize_row(&x.row(3));
        for row in 1..800 {
            for f in 0..3 {
                let same = explainer.discretizer().bin(f, inverse[[row, f]]) == bins[f];
                if binary[[row, f]] == 1.0 {
                    assert!(same);
                }
            }
        }
    }

    #[test]
    fn test_explanation_highlights_decisive_feature() {
        let (x, y, names) = training(300);
        let mut model = DecisionTreeClassifier::default();
        model.fit(&x.view(), &y.view()).unwrap();

        let explainer = LimeTabularExplainer::new(&x.view(), &names, small_config()).unwrap();
        let explanation = explainer.explain_instance(&x.row(0), &model, 2, 7).unwrap();

        assert_eq!(explanation.num_used_features(), 2);
        assert!(explanation.entries[0].0.contains("Glucose"));
        assert!(explanation.entries[0].1.abs() >= explanation.entries[1].1.abs());
        assert_eq!(explanation.feature_indices[0], 0);
        assert_abs_diff_eq!(explanation.predict_proba.iter().sum::<f64>(), 1.0, epsilon = 1e-12);
        assert!(explanation.weight_for("Glucose", &SubstringMatcher).abs() > 0.0);
    }

    #[test]
    fn test_explanations_are_reproducible_per_seed() {
        let (x, y, names) = training(200);
        let mut model = DecisionTreeClassifier::default();
        model.fit(&x.view(), &y.view()).unwrap();
        let explainer = LimeTabularExplainer::new(&x.view(), &names, small_config()).unwrap();

        let a = explainer.explain_instance(&x.row(1), &model, 3, 5).unwrap();
        let b = explainer.explain_instance(&x.row(1), &model, 3, 5).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_highest_weights_and_none_selection() {
        let (x, y, names) = training(200);
        let mut model = DecisionTreeClassifier::default();
        model.fit(&x.view(), &y.view()).unwrap();

        for selection in [FeatureSelection::HighestWeights, FeatureSelection::None] {
            let config = LimeConfig {
                feature_selection: selection,
                ..small_config()
            };
            let explainer = LimeTabularExplainer::new(&x.view(), &names, config).unwrap();
            let explanation = explainer.explain_instance(&x.row(2), &model, 2, 1).unwrap();
            let expected = if selection == FeatureSelection::None { 3 } else { 2 };
            assert_eq!(explanation.num_used_features(), expected);
        }
    }

    #[test]
    fn test_invalid_requests() {
        let (x, y, names) = training(50);
        let mut model = DecisionTreeClassifier::default();
        model.fit(&x.view(), &y.view()).unwrap();
        let explainer = LimeTabularExplainer::new(&x.view(), &names, small_config()).unwrap();

        assert!(explainer.explain_instance(&x.row(0), &model, 0, 1).is_err());
        let short = Array1::from_vec(vec![1.0, 2.0]);
        assert!(explainer.explain_instance(&short.view(), &model, 2, 1).is_err());
    }
}
