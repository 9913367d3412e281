//! Property and scenario tests for the interpretability scores.

use approx::assert_abs_diff_eq;
use proptest::prelude::*;
use xai_compare::interpretability::{matcher_for, score_lime, score_shap, ScoringContext};
use xai_compare::*;

fn names(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

#[test]
fn test_sparsity_scenario() {
    let features = names(&["A", "B", "C"]);
    let explanation = vec![("A".to_string(), 0.4), ("B".to_string(), -0.2)];
    let used = explanation.len();
    assert_abs_diff_eq!(sparsity_score(used, features.len()).unwrap(), 0.3333, epsilon = 1e-4);
}

#[test]
fn test_stability_scenarios() {
    assert_abs_diff_eq!(stability_score(&[1.0, 0.0, 0.0], &[1.0, 0.0, 0.0]).unwrap(), 1.0);
    assert_abs_diff_eq!(stability_score(&[1.0, 0.0, 0.0], &[0.0, 1.0, 0.0]).unwrap(), 0.0);
}

#[test]
fn test_fidelity_scenarios() {
    assert_eq!(fidelity_score(&[0.2, 0.8], &[0.2, 0.8]).unwrap(), 1.0);
    assert_abs_diff_eq!(fidelity_score(&[0.2, 0.8], &[0.3, 0.7]).unwrap(), 0.99, epsilon = 1e-12);
}

#[test]
fn test_verdict_scenario() {
    let verdict = Verdict::from_composites(0.7, 0.6);
    assert_eq!(verdict, Verdict::ShapMoreInterpretable);
    assert!(verdict.to_string().starts_with("SHAP is more interpretable than LIME"));
}

#[test]
fn test_configured_weights_change_the_verdict() {
    let fidelity_heavy = ScoringWeights::new(0.0, 0.0, 1.0);
    let stability_heavy = ScoringWeights::new(0.0, 1.0, 0.0);

    let shap = (0.5, 0.2, 1.0);
    let lime = (0.5, 0.9, 0.95);

    let by_fidelity = InterpretabilityReport::new(
        TechniqueScores::new(shap.0, shap.1, shap.2, &fidelity_heavy),
        TechniqueScores::new(lime.0, lime.1, lime.2, &fidelity_heavy),
    );
    let by_stability = InterpretabilityReport::new(
        TechniqueScores::new(shap.0, shap.1, shap.2, &stability_heavy),
        TechniqueScores::new(lime.0, lime.1, lime.2, &stability_heavy),
    );

    assert_eq!(by_fidelity.verdict, Verdict::ShapMoreInterpretable);
    assert_eq!(by_stability.verdict, Verdict::ShapNotMoreInterpretable);
}

#[test]
fn test_matching_strategy_is_pluggable() {
    let features = names(&["Age", "AverageAge"]);
    let explanation = vec![("AverageAge > 3.00".to_string(), -0.5)];

    let loose = explanation_to_vector(&explanation, &features, matcher_for(MatchStrategy::Substring).as_ref());
    let strict = explanation_to_vector(&explanation, &features, matcher_for(MatchStrategy::Token).as_ref());
    assert_eq!(loose, vec![0.5, 0.5]);
    assert_eq!(strict, vec![0.0, 0.5]);
}

#[test]
fn test_shap_attributions_keep_overlapping_names_apart() {
    let features = names(&["AverageAge", "Age"]);
    let attributions = vec![("AverageAge".to_string(), 0.9), ("Age".to_string(), 0.1)];

    assert_eq!(attribution_vector(&attributions, &features).unwrap(), vec![0.9, 0.1]);
    assert_eq!(
        explanation_to_vector(&attributions, &features, &SubstringMatcher),
        vec![0.9, 0.9]
    );
}

#[test]
fn test_technique_scoring_end_to_end() {
    let features = names(&["Glucose", "BMI", "Age", "Insulin"]);
    let weights = ScoringWeights::default();
    let context = ScoringContext {
        feature_names: &features,
        model_probs: &[0.2, 0.8],
        matcher: &SubstringMatcher,
        weights: &weights,
    };

    let shap = |values: [f64; 4]| ShapExplanation {
        entries: features.iter().cloned().zip(values).collect(),
        expected_value: 0.35,
        prediction: 0.5,
    };
    let first = shap([0.3, 0.1, 0.0, 0.0]);
    let second = shap([0.3, 0.1, 0.0, 0.0]);
    let shap_scores = score_shap([&first, &second], 5, &context).unwrap();

    // Four features, top five requested: every feature counts as used.
    assert_eq!(shap_scores.sparsity, 0.0);
    assert_abs_diff_eq!(shap_scores.stability, 1.0, epsilon = 1e-12);
    assert_eq!(shap_scores.fidelity, 1.0);

    let lime = |entries: Vec<(&str, f64)>, local_pred: f64| LimeExplanation {
        entries: entries.into_iter().map(|(t, w)| (t.to_string(), w)).collect(),
        feature_indices: vec![0, 1],
        intercept: 0.4,
        local_pred,
        score: 0.6,
        predict_proba: [0.8, 0.2],
        instance: vec![0.0; 4],
        feature_names: features.clone(),
        class_names: ["No Diabetes".to_string(), "Diabetes".to_string()],
    };
    let first = lime(vec![("Glucose > 140.25", 0.3), ("BMI <= 27.30", -0.1)], 0.3);
    let second = lime(vec![("Glucose <= 99.00", -0.3), ("BMI > 36.60", 0.1)], 0.7);
    let lime_scores = score_lime([&first, &second], &context).unwrap();

    assert_abs_diff_eq!(lime_scores.sparsity, 0.5);
    assert_abs_diff_eq!(lime_scores.stability, 1.0, epsilon = 1e-12);
    assert_abs_diff_eq!(lime_scores.fidelity, 0.99, epsilon = 1e-12);

    let report = InterpretabilityReport::new(shap_scores, lime_scores);
    assert_eq!(report.verdict, Verdict::ShapNotMoreInterpretable);
}

fn feature_names_strategy() -> impl Strategy<Value = Vec<String>> {
    prop::collection::vec("[A-Z][a-z]{2,8}", 1..10)
}

fn explanation_strategy() -> impl Strategy<Value = Vec<(String, f64)>> {
    prop::collection::vec(("[A-Za-z<>=. 0-9]{0,24}", -10.0..10.0_f64), 0..12)
}

proptest! {
    #[test]
    fn prop_vector_length_and_sign(
        features in feature_names_strategy(),
        explanation in explanation_strategy(),
    ) {
        for strategy in [MatchStrategy::Substring, MatchStrategy::Token] {
            let vector = explanation_to_vector(&explanation, &features, matcher_for(strategy).as_ref());
            prop_assert_eq!(vector.len(), features.len());
            prop_assert!(vector.iter().all(|&v| v >= 0.0));
        }
    }

    #[test]
    fn prop_sparsity_bounds(total in 1usize..100, used_fraction in 0.0..=1.0_f64) {
        let used = ((total as f64) * used_fraction).floor() as usize;
        let score = sparsity_score(used, total).unwrap();
        prop_assert!((0.0..=1.0).contains(&score));
        prop_assert_eq!(sparsity_score(total, total).unwrap(), 0.0);
        prop_assert_eq!(sparsity_score(0, total).unwrap(), 1.0);
    }

    #[test]
    fn prop_stability_reflexive_and_symmetric(
        (a, b) in (1usize..12).prop_flat_map(|n| (
            prop::collection::vec(0.01..10.0_f64, n),
            prop::collection::vec(0.0..10.0_f64, n),
        ))
    ) {
        prop_assert!((stability_score(&a, &a).unwrap() - 1.0).abs() < 1e-9);
        let ab = stability_score(&a, &b).unwrap();
        let ba = stability_score(&b, &a).unwrap();
        prop_assert!((ab - ba).abs() < 1e-12);
        prop_assert!((-1.0 - 1e-9..=1.0 + 1e-9).contains(&ab));
    }

    #[test]
    fn prop_fidelity_exact_match_is_one(probs in prop::collection::vec(0.0..=1.0_f64, 1..20)) {
        prop_assert_eq!(fidelity_score(&probs, &probs).unwrap(), 1.0);
    }

    #[test]
    fn prop_composite_is_linear(
        sparsity in 0.0..=1.0_f64,
        stability in -1.0..=1.0_f64,
        fidelity in 0.0..=1.0_f64,
    ) {
        let weights = ScoringWeights::default();
        let expected = 0.3 * sparsity + 0.3 * stability + 0.4 * fidelity;
        prop_assert!((composite_score(sparsity, stability, fidelity, &weights) - expected).abs() < 1e-12);
    }
}
