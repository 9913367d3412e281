//! Mapping local explanations onto the feature set.

use crate::core::error::{Result, XaiError};
use crate::core::traits::FeatureMatcher;
use crate::core::types::MatchStrategy;

/// A token refers to a feature when it contains the feature name.
///
/// `"25.00 < Age <= 29.00"` matches `Age`, but so would a token about
/// `AverageAge`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SubstringMatcher;

impl FeatureMatcher for SubstringMatcher {
    fn matches(&self, token: &str, feature: &str) -> bool {
        token.contains(feature)
    }

    fn name(&self) -> &'static str {
        "substring"
    }
}

/// A token refers to a feature when one of its parts, split on whitespace
/// and comparison operators, equals the feature name.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TokenMatcher;

impl TokenMatcher {
    fn is_separator(c: char) -> bool {
        c.is_whitespace() || matches!(c, '<' | '>' | '=' | '!')
    }
}

impl FeatureMatcher for TokenMatcher {
    fn matches(&self, token: &str, feature: &str) -> bool {
        token
            .split(Self::is_separator)
            .filter(|part| !part.is_empty())
            .any(|part| part == feature)
    }

    fn name(&self) -> &'static str {
        "token"
    }
}

/// The matcher implementing `strategy`.
pub fn matcher_for(strategy: MatchStrategy) -> Box<dyn FeatureMatcher> {
    match strategy {
        MatchStrategy::Substring => Box::new(SubstringMatcher),
        MatchStrategy::Token => Box::new(TokenMatcher),
    }
}

/// Dense explanation vector over `feature_names`.
///
/// Position `i` holds the absolute weight of the first entry, in explanation
/// order, whose token refers to feature `i`; features no entry refers to stay
/// zero. The result always has one component per feature.
pub fn explanation_to_vector(
    entries: &[(String, f64)],
    feature_names: &[String],
    matcher: &dyn FeatureMatcher,
) -> Vec<f64> {
    feature_names
        .iter()
        .map(|feature| {
            entries
                .iter()
                .find(|(token, _)| matcher.matches(token, feature))
                .map_or(0.0, |(_, weight)| weight.abs())
        })
        .collect()
}

/// Dense attribution vector of an explanation that already has one
/// `(feature name, value)` entry per feature, in feature order.
///
/// Position `i` holds `|value|` of entry `i`. Names are compared exactly, so
/// overlapping feature names never share a value.
pub fn attribution_vector(entries: &[(String, f64)], feature_names: &[String]) -> Result<Vec<f64>> {
    if entries.len() != feature_names.len() {
        return Err(XaiError::dimension_mismatch(
            format!("{} attributions", feature_names.len()),
            format!("{} attributions", entries.len()),
        ));
    }

    entries
        .iter()
        .zip(feature_names)
        .map(|((name, value), feature)| {
            if name == feature {
                Ok(value.abs())
            } else {
                Err(XaiError::explanation(format!(
                    "Attribution for '{}' found where '{}' was expected",
                    name, feature
                )))
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    fn entries(list: &[(&str, f64)]) -> Vec<(String, f64)> {
        list.iter().map(|(t, w)| (t.to_string(), *w)).collect()
    }

    #[test]
    fn test_vector_uses_absolute_weights_and_zero_fill() {
        let features = names(&["Glucose", "BMI", "Age"]);
        let explanation = entries(&[("Glucose > 140.25", -0.31), ("25.00 < Age <= 29.00", 0.07)]);
        let vector = explanation_to_vector(&explanation, &features, &SubstringMatcher);
        assert_eq!(vector, vec![0.31, 0.0, 0.07]);
    }

    #[test]
    fn test_first_matching_entry_wins() {
        let features = names(&["Age"]);
        let explanation = entries(&[("Age <= 24.00", 0.2), ("Age > 41.00", -0.9)]);
        let vector = explanation_to_vector(&explanation, &features, &SubstringMatcher);
        assert_eq!(vector, vec![0.2]);
    }

    #[test]
    fn test_substring_and_token_matchers_differ_on_overlapping_names() {
        let features = names(&["Age", "AverageAge"]);
        let explanation = entries(&[("AverageAge > 3.00", 0.5)]);

        let loose = explanation_to_vector(&explanation, &features, &SubstringMatcher);
        assert_eq!(loose, vec![0.5, 0.5]);

        let strict = explanation_to_vector(&explanation, &features, &TokenMatcher);
        assert_eq!(strict, vec![0.0, 0.5]);
    }

    #[test]
    fn test_token_matcher_splits_on_operators() {
        assert!(TokenMatcher.matches("25.00<Age<=29.00", "Age"));
        assert!(TokenMatcher.matches("BMI", "BMI"));
        assert!(!TokenMatcher.matches("BMI_z > 1", "BMI"));
    }

    #[test]
    fn test_matcher_for_strategy() {
        assert_eq!(matcher_for(MatchStrategy::Substring).name(), "substring");
        assert_eq!(matcher_for(MatchStrategy::Token).name(), "token");
    }

    #[test]
    fn test_attribution_vector_reads_by_position() {
        let features = names(&["AverageAge", "Age"]);
        let attributions = entries(&[("AverageAge", 0.9), ("Age", -0.1)]);
        assert_eq!(attribution_vector(&attributions, &features).unwrap(), vec![0.9, 0.1]);
    }

    #[test]
    fn test_attribution_vector_rejects_misaligned_entries() {
        let features = names(&["Glucose", "BMI"]);
        assert!(attribution_vector(&entries(&[("Glucose", 0.2)]), &features).is_err());
        assert!(attribution_vector(&entries(&[("BMI", 0.2), ("Glucose", 0.1)]), &features).is_err());
    }
}
