//! Global feature importance ranking.

use crate::core::error::{Result, XaiError};
use crate::core::traits::Classifier;
use ndarray::Array1;
use serde::{Deserialize, Serialize};

/// One feature's global importance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureImportance {
    /// Column index in the feature set
    pub index: usize,
    /// Feature name
    pub name: String,
    /// Importance score
    pub importance: f64,
}

/// Pair importances with names and sort them, largest first. Ties keep
/// feature order.
pub fn importance_ranking(importance: &Array1<f64>, feature_names: &[String]) -> Result<Vec<FeatureImportance>> {
    if importance.len() != feature_names.len() {
        return Err(XaiError::dimension_mismatch(
            format!("{} importances", feature_names.len()),
            format!("{} importances", importance.len()),
        ));
    }

    let mut ranking: Vec<FeatureImportance> = importance
        .iter()
        .zip(feature_names)
        .enumerate()
        .map(|(index, (&importance, name))| FeatureImportance {
            index,
            name: name.clone(),
            importance,
        })
        .collect();

    ranking.sort_by(|a, b| b.importance.total_cmp(&a.importance));
    Ok(ranking)
}

/// Rank a fitted classifier's global importances.
pub fn rank_model_features<C: Classifier + ?Sized>(model: &C, feature_names: &[String]) -> Result<Vec<FeatureImportance>> {
    let importance = model.feature_importances()?;
    importance_ranking(&importance, feature_names)
}

/// Summary line of a ranking, e.g. `Glucose=0.2712, BMI=0.1650`.
pub fn ranking_summary(ranking: &[FeatureImportance], top: usize) -> String {
    ranking
        .iter()
        .take(top)
        .map(|f| format!("{}={:.4}", f.name, f.importance))
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_ranking_sorted_descending_with_stable_ties() {
        let names: Vec<String> = ["A", "B", "C", "D"].iter().map(|s| s.to_string()).collect();
        let ranking = importance_ranking(&array![0.1, 0.4, 0.1, 0.4], &names).unwrap();
        let order: Vec<&str> = ranking.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(order, vec!["B", "D", "A", "C"]);
        assert_eq!(ranking[0].index, 1);
        assert_eq!(ranking_summary(&ranking, 2), "B=0.4000, D=0.4000");
    }

    #[test]
    fn test_length_mismatch() {
        assert!(importance_ranking(&array![1.0], &[]).is_err());
    }
}
