//! Feature ranking by the forest's impurity-based importances.

use serde::{Deserialize, Serialize};

use super::random_forest::RandomForestModel;

/// One ranked feature and its share of the total importance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureImportance {
    pub feature: String,
    pub importance: f64,
}

/// Rank every feature by importance, descending.
///
/// Importances are read from the fitted trees on each call. Equal scores keep
/// their original feature order.
pub fn rank_feature_importances(
    model: &RandomForestModel,
    feature_names: &[String],
) -> Vec<FeatureImportance> {
    let mut ranked: Vec<FeatureImportance> = feature_names
        .iter()
        .zip(model.feature_importances())
        .map(|(name, importance)| FeatureImportance {
            feature: name.clone(),
            importance,
        })
        .collect();
    ranked.sort_by(|a, b| b.importance.total_cmp(&a.importance));
    ranked
}

/// Leading `n` entries of a ranked list.
pub fn top_n(ranked: &[FeatureImportance], n: usize) -> &[FeatureImportance] {
    &ranked[..n.min(ranked.len())]
}
