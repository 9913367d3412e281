//! Interpretability scoring of SHAP and LIME explanations.
//!
//! Each technique explains the same two instances. SHAP attributions are
//! read by feature position with [`attribution_vector`]; LIME tokens are
//! mapped onto the feature set with [`explanation_to_vector`]. Then both are
//! scored:
//!
//! - sparsity: `1 - used / total` over the first instance's explanation
//! - stability: cosine similarity of the two instances' vectors
//! - fidelity: `1 - MSE` between model probabilities and the technique's
//!   local predictions
//!
//! SHAP has no separate local prediction, so its fidelity compares the model
//! probabilities with themselves and is always 1. This asymmetry is part of
//! the measurement and is kept as is.

pub mod scores;
pub mod vectorize;

pub use scores::{
    composite_score, fidelity_score, sparsity_score, stability_score, InterpretabilityReport,
    TechniqueScores, Verdict,
};
pub use vectorize::{attribution_vector, explanation_to_vector, matcher_for, SubstringMatcher, TokenMatcher};

use crate::config::ScoringWeights;
use crate::core::error::{Result, XaiError};
use crate::core::traits::FeatureMatcher;
use crate::prediction::{LimeExplanation, ShapExplanation};

/// Everything shared by the SHAP and LIME scoring of one analysis.
#[derive(Debug, Clone, Copy)]
pub struct ScoringContext<'a> {
    /// The ordered feature set
    pub feature_names: &'a [String],
    /// Model class-1 probabilities of the two explained instances
    pub model_probs: &'a [f64],
    /// How tokens are matched to feature names
    pub matcher: &'a dyn FeatureMatcher,
    /// Composite score weights
    pub weights: &'a ScoringWeights,
}

impl<'a> ScoringContext<'a> {
    fn check_instances(&self) -> Result<()> {
        if self.model_probs.len() != 2 {
            return Err(XaiError::dimension_mismatch(
                "2 explained instances",
                format!("{} explained instances", self.model_probs.len()),
            ));
        }
        Ok(())
    }
}

/// Score two SHAP explanations. The first `top_k` features by |φ| count as
/// used.
pub fn score_shap(
    explanations: [&ShapExplanation; 2],
    top_k: usize,
    context: &ScoringContext<'_>,
) -> Result<TechniqueScores> {
    context.check_instances()?;

    let used = explanations[0].top_features(top_k).len();
    let sparsity = sparsity_score(used, context.feature_names.len())?;

    let first = attribution_vector(&explanations[0].entries, context.feature_names)?;
    let second = attribution_vector(&explanations[1].entries, context.feature_names)?;
    let stability = stability_score(&first, &second)?;

    let fidelity = fidelity_score(context.model_probs, context.model_probs)?;

    log::debug!(
        "SHAP scores: sparsity {:.4}, stability {:.4}, fidelity {:.4}",
        sparsity,
        stability,
        fidelity
    );
    Ok(TechniqueScores::new(sparsity, stability, fidelity, context.weights))
}

/// Score two LIME explanations. Every entry of the first explanation counts
/// as a used feature.
pub fn score_lime(explanations: [&LimeExplanation; 2], context: &ScoringContext<'_>) -> Result<TechniqueScores> {
    context.check_instances()?;

    let used = explanations[0].num_used_features();
    let sparsity = sparsity_score(used, context.feature_names.len())?;

    let first = explanation_to_vector(&explanations[0].entries, context.feature_names, context.matcher);
    let second = explanation_to_vector(&explanations[1].entries, context.feature_names, context.matcher);
    let stability = stability_score(&first, &second)?;

    let local = [explanations[0].local_pred, explanations[1].local_pred];
    let fidelity = fidelity_score(context.model_probs, &local)?;

    log::debug!(
        "LIME scores: sparsity {:.4}, stability {:.4}, fidelity {:.4}",
        sparsity,
        stability,
        fidelity
    );
    Ok(TechniqueScores::new(sparsity, stability, fidelity, context.weights))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn names() -> Vec<String> {
        ["Glucose", "BMI", "Age", "Insulin"].iter().map(|s| s.to_string()).collect()
    }

    fn shap(values: [f64; 4], prediction: f64) -> ShapExplanation {
        ShapExplanation {
            entries: names().into_iter().zip(values).collect(),
            expected_value: 0.35,
            prediction,
        }
    }

    fn lime(entries: &[(&str, f64)], local_pred: f64) -> LimeExplanation {
        LimeExplanation {
            entries: entries.iter().map(|(t, w)| (t.to_string(), *w)).collect(),
            feature_indices: (0..entries.len()).collect(),
            intercept: 0.3,
            local_pred,
            score: 0.5,
            predict_proba: [0.5, 0.5],
            instance: vec![0.0; 4],
            feature_names: names(),
            class_names: ["No Diabetes".to_string(), "Diabetes".to_string()],
        }
    }

    #[test]
    fn test_shap_fidelity_is_degenerate() {
        let features = names();
        let weights = ScoringWeights::default();
        let context = ScoringContext {
            feature_names: &features,
            model_probs: &[0.1, 0.9],
            matcher: &SubstringMatcher,
            weights: &weights,
        };

        let a = shap([0.3, -0.1, 0.0, 0.05], 0.6);
        let b = shap([0.3, -0.1, 0.0, 0.05], 0.6);
        let scores = score_shap([&a, &b], 2, &context).unwrap();

        assert_eq!(scores.fidelity, 1.0);
        assert_abs_diff_eq!(scores.stability, 1.0, epsilon = 1e-12);
        assert_abs_diff_eq!(scores.sparsity, 0.5);
        assert_abs_diff_eq!(scores.composite, 0.3 * 0.5 + 0.3 + 0.4, epsilon = 1e-12);
    }

    #[test]
    fn test_lime_scores() {
        let features = names();
        let weights = ScoringWeights::default();
        let context = ScoringContext {
            feature_names: &features,
            model_probs: &[0.2, 0.8],
            matcher: &SubstringMatcher,
            weights: &weights,
        };

        let a = lime(&[("Glucose > 140.25", 0.4)], 0.3);
        let b = lime(&[("BMI <= 27.30", 0.2)], 0.7);
        let scores = score_lime([&a, &b], &context).unwrap();

        assert_abs_diff_eq!(scores.sparsity, 0.75);
        assert_eq!(scores.stability, 0.0);
        assert_abs_diff_eq!(scores.fidelity, 0.99, epsilon = 1e-12);
    }

    #[test]
    fn test_requires_two_instances() {
        let features = names();
        let weights = ScoringWeights::default();
        let context = ScoringContext {
            feature_names: &features,
            model_probs: &[0.2],
            matcher: &SubstringMatcher,
            weights: &weights,
        };
        let a = lime(&[("Age > 3", 0.1)], 0.3);
        assert!(score_lime([&a, &a], &context).is_err());
    }

    #[test]
    fn test_shap_stability_ignores_overlapping_feature_names() {
        let features: Vec<String> = vec!["AverageAge".to_string(), "Age".to_string()];
        let weights = ScoringWeights::default();
        let context = ScoringContext {
            feature_names: &features,
            model_probs: &[0.4, 0.6],
            matcher: &SubstringMatcher,
            weights: &weights,
        };

        let explain = |values: [f64; 2]| ShapExplanation {
            entries: features.iter().cloned().zip(values).collect(),
            expected_value: 0.5,
            prediction: 0.5,
        };
        let a = explain([0.9, 0.1]);
        let b = explain([0.1, -0.9]);
        let scores = score_shap([&a, &b], 2, &context).unwrap();

        assert_abs_diff_eq!(scores.stability, 0.18 / 0.82, epsilon = 1e-12);
    }
}
