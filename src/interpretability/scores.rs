//! Sparsity, stability, fidelity and composite interpretability scores.

use crate::config::ScoringWeights;
use crate::core::error::{Result, XaiError};
use crate::core::types::Technique;
use crate::metrics_eval::{cosine_similarity, mean_squared_error};
use serde::{Deserialize, Serialize};
use std::fmt;

/// `1 - used / total`. Not clamped, so it leaves [0, 1] only when `used`
/// exceeds `total`.
pub fn sparsity_score(used: usize, total: usize) -> Result<f64> {
    if total == 0 {
        return Err(XaiError::invalid_parameter(
            "total_features",
            "0",
            "sparsity needs a non-empty feature set",
        ));
    }
    Ok(1.0 - used as f64 / total as f64)
}

/// Cosine similarity of the explanation vectors of two instances.
pub fn stability_score(first: &[f64], second: &[f64]) -> Result<f64> {
    cosine_similarity(first, second)
}

/// `1 - MSE(model_probs, technique_probs)`.
pub fn fidelity_score(model_probs: &[f64], technique_probs: &[f64]) -> Result<f64> {
    Ok(1.0 - mean_squared_error(model_probs, technique_probs)?)
}

/// Weighted sum of the three scores.
pub fn composite_score(sparsity: f64, stability: f64, fidelity: f64, weights: &ScoringWeights) -> f64 {
    weights.sparsity * sparsity + weights.stability * stability + weights.fidelity * fidelity
}

/// The four scores of one technique.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TechniqueScores {
    pub sparsity: f64,
    pub stability: f64,
    pub fidelity: f64,
    pub composite: f64,
}

impl TechniqueScores {
    /// Combine the three component scores with `weights`.
    pub fn new(sparsity: f64, stability: f64, fidelity: f64, weights: &ScoringWeights) -> Self {
        TechniqueScores {
            sparsity,
            stability,
            fidelity,
            composite: composite_score(sparsity, stability, fidelity, weights),
        }
    }
}

/// Outcome of comparing the SHAP and LIME composite scores.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Verdict {
    /// SHAP scored strictly higher
    ShapMoreInterpretable,
    /// SHAP scored lower or equal
    ShapNotMoreInterpretable,
}

impl Verdict {
    /// Compare two composite scores. Equal scores do not favour SHAP.
    pub fn from_composites(shap: f64, lime: f64) -> Self {
        if shap > lime {
            Verdict::ShapMoreInterpretable
        } else {
            Verdict::ShapNotMoreInterpretable
        }
    }

    /// The technique declared more interpretable, if SHAP won.
    pub fn winner(&self) -> Option<Technique> {
        match self {
            Verdict::ShapMoreInterpretable => Some(Technique::Shap),
            Verdict::ShapNotMoreInterpretable => None,
        }
    }

    /// Conclusion sentence printed in the report.
    pub fn conclusion(&self) -> &'static str {
        match self {
            Verdict::ShapMoreInterpretable => "SHAP is more interpretable than LIME (Reject H0, Accept H1)",
            Verdict::ShapNotMoreInterpretable => "SHAP is not more interpretable than LIME (Fail to reject H0)",
        }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.conclusion())
    }
}

/// Scores of both techniques and the resulting verdict.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct InterpretabilityReport {
    pub shap: TechniqueScores,
    pub lime: TechniqueScores,
    pub verdict: Verdict,
}

impl InterpretabilityReport {
    /// Pair the two score sets and decide the verdict.
    pub fn new(shap: TechniqueScores, lime: TechniqueScores) -> Self {
        InterpretabilityReport {
            shap,
            lime,
            verdict: Verdict::from_composites(shap.composite, lime.composite),
        }
    }

    /// Scores of one technique.
    pub fn scores(&self, technique: Technique) -> &TechniqueScores {
        match technique {
            Technique::Shap => &self.shap,
            Technique::Lime => &self.lime,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_sparsity() {
        assert_abs_diff_eq!(sparsity_score(2, 3).unwrap(), 1.0 / 3.0);
        assert_eq!(sparsity_score(3, 3).unwrap(), 0.0);
        assert_eq!(sparsity_score(0, 3).unwrap(), 1.0);
        assert!(sparsity_score(0, 0).is_err());
    }

    #[test]
    fn test_fidelity() {
        assert_eq!(fidelity_score(&[0.2, 0.8], &[0.2, 0.8]).unwrap(), 1.0);
        assert_abs_diff_eq!(fidelity_score(&[0.2, 0.8], &[0.3, 0.7]).unwrap(), 0.99, epsilon = 1e-12);
    }

    #[test]
    fn test_composite_uses_weights() {
        let weights = ScoringWeights::default();
        assert_abs_diff_eq!(composite_score(0.5, 1.0, 0.9, &weights), 0.15 + 0.3 + 0.36, epsilon = 1e-12);

        let custom = ScoringWeights::new(1.0, 0.0, 0.0);
        assert_eq!(composite_score(0.25, 1.0, 1.0, &custom), 0.25);
    }

    #[test]
    fn test_verdict() {
        assert_eq!(Verdict::from_composites(0.7, 0.6), Verdict::ShapMoreInterpretable);
        assert_eq!(Verdict::from_composites(0.6, 0.6), Verdict::ShapNotMoreInterpretable);
        assert_eq!(
            Verdict::from_composites(0.7, 0.6).to_string(),
            "SHAP is more interpretable than LIME (Reject H0, Accept H1)"
        );
        assert_eq!(Verdict::ShapMoreInterpretable.winner(), Some(Technique::Shap));
    }

    #[test]
    fn test_report_verdict_follows_composites() {
        let weights = ScoringWeights::default();
        let shap = TechniqueScores::new(0.375, 0.9, 1.0, &weights);
        let lime = TechniqueScores::new(0.375, 0.5, 0.98, &weights);
        let report = InterpretabilityReport::new(shap, lime);
        assert_eq!(report.verdict, Verdict::ShapMoreInterpretable);
        assert_eq!(report.scores(Technique::Lime).stability, 0.5);
    }
}
