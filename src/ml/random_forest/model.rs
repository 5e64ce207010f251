use serde::{Deserialize, Serialize};

/// Node of a fitted decision tree, stored in a flat arena.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TreeNode {
    /// Internal node routing `feature <= threshold` left and everything else right.
    Split {
        feature: u16,
        threshold: f32,
        left: u32,
        right: u32,
        /// Gini impurity of the samples reaching this node.
        impurity: f64,
        /// Weighted sample count reaching this node.
        weight: f64,
    },
    /// Terminal node holding normalized class probabilities.
    Leaf {
        value: Vec<f32>,
        impurity: f64,
        weight: f64,
    },
}

impl TreeNode {
    fn impurity_mass(&self) -> f64 {
        match self {
            TreeNode::Split {
                impurity, weight, ..
            }
            | TreeNode::Leaf {
                impurity, weight, ..
            } => impurity * weight,
        }
    }

    fn weight(&self) -> f64 {
        match self {
            TreeNode::Split { weight, .. } | TreeNode::Leaf { weight, .. } => *weight,
        }
    }
}

/// Single CART tree. Node `0` is the root.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionTree {
    pub nodes: Vec<TreeNode>,
}

impl DecisionTree {
    /// Class probabilities of the leaf `features` lands in.
    pub fn predict_proba(&self, features: &[f32]) -> &[f32] {
        let mut idx = 0usize;
        loop {
            match &self.nodes[idx] {
                TreeNode::Leaf { value, .. } => return value,
                TreeNode::Split {
                    feature,
                    threshold,
                    left,
                    right,
                    ..
                } => {
                    let v = features.get(*feature as usize).copied().unwrap_or(0.0);
                    idx = if v <= *threshold {
                        *left as usize
                    } else {
                        *right as usize
                    };
                }
            }
        }
    }

    /// Mean decrease in impurity per feature, normalized to sum to one.
    ///
    /// A tree with no splits reports all zeros.
    pub fn feature_importances(&self, n_features: usize) -> Vec<f64> {
        let mut importances = vec![0.0f64; n_features];
        for node in &self.nodes {
            if let TreeNode::Split {
                feature,
                left,
                right,
                ..
            } = node
            {
                let decrease = node.impurity_mass()
                    - self.nodes[*left as usize].impurity_mass()
                    - self.nodes[*right as usize].impurity_mass();
                if let Some(slot) = importances.get_mut(*feature as usize) {
                    *slot += decrease;
                }
            }
        }
        let root_weight = self.nodes.first().map(TreeNode::weight).unwrap_or(0.0);
        if root_weight > 0.0 {
            for v in &mut importances {
                *v /= root_weight;
            }
        }
        normalize_in_place(&mut importances);
        importances
    }

    fn validate(&self, n_features: usize, n_classes: usize) -> Result<(), String> {
        if self.nodes.is_empty() {
            return Err("tree has no nodes".to_string());
        }
        let n_nodes = self.nodes.len();
        for (idx, node) in self.nodes.iter().enumerate() {
            match node {
                TreeNode::Split {
                    feature,
                    left,
                    right,
                    ..
                } => {
                    if *feature as usize >= n_features {
                        return Err(format!("node {idx} splits on unknown feature {feature}"));
                    }
                    // Children are always appended after their parent.
                    for child in [*left as usize, *right as usize] {
                        if child <= idx || child >= n_nodes {
                            return Err(format!("node {idx} has invalid child {child}"));
                        }
                    }
                }
                TreeNode::Leaf { value, .. } => {
                    if value.len() != n_classes {
                        return Err(format!(
                            "leaf {idx} has {} class values but expected {n_classes}",
                            value.len()
                        ));
                    }
                }
            }
        }
        Ok(())
    }
}

/// Bagged ensemble of CART trees whose probabilities are averaged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RandomForestModel {
    /// Model format version.
    pub model_version: i64,
    /// Width of the feature vectors the trees were grown on.
    pub n_features: usize,
    /// Number of label classes.
    pub n_classes: usize,
    pub trees: Vec<DecisionTree>,
}

impl RandomForestModel {
    /// Validate structural invariants of the model.
    pub fn validate(&self) -> Result<(), String> {
        if self.n_classes < 2 {
            return Err("Model must contain at least 2 classes".to_string());
        }
        if self.trees.is_empty() {
            return Err("Model has no trees".to_string());
        }
        for (tree_idx, tree) in self.trees.iter().enumerate() {
            tree.validate(self.n_features, self.n_classes)
                .map_err(|err| format!("Tree {tree_idx}: {err}"))?;
        }
        Ok(())
    }

    /// Average class probabilities over all trees.
    pub fn predict_proba(&self, features: &[f32]) -> Vec<f32> {
        let mut sums = vec![0.0f64; self.n_classes];
        for tree in &self.trees {
            for (slot, &p) in sums.iter_mut().zip(tree.predict_proba(features)) {
                *slot += p as f64;
            }
        }
        let n = self.trees.len().max(1) as f64;
        sums.into_iter().map(|s| (s / n) as f32).collect()
    }

    /// Predict the most probable class index; ties resolve to the lower index.
    pub fn predict_class_index(&self, features: &[f32]) -> usize {
        argmax(&self.predict_proba(features))
    }

    /// Forest-level importances: mean of per-tree importances over trees that split.
    pub fn feature_importances(&self) -> Vec<f64> {
        let mut sums = vec![0.0f64; self.n_features];
        let mut contributing = 0usize;
        for tree in &self.trees {
            if tree.nodes.len() <= 1 {
                continue;
            }
            contributing += 1;
            for (slot, v) in sums.iter_mut().zip(tree.feature_importances(self.n_features)) {
                *slot += v;
            }
        }
        if contributing == 0 {
            return sums;
        }
        for v in &mut sums {
            *v /= contributing as f64;
        }
        normalize_in_place(&mut sums);
        sums
    }
}

fn normalize_in_place(values: &mut [f64]) {
    let total: f64 = values.iter().sum();
    if total > 0.0 {
        for v in values.iter_mut() {
            *v /= total;
        }
    }
}

pub(crate) fn argmax(values: &[f32]) -> usize {
    let mut best_idx = 0usize;
    let mut best_val = f32::NEG_INFINITY;
    for (idx, &v) in values.iter().enumerate() {
        if v > best_val {
            best_val = v;
            best_idx = idx;
        }
    }
    best_idx
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stump(threshold: f32) -> DecisionTree {
        DecisionTree {
            nodes: vec![
                TreeNode::Split {
                    feature: 0,
                    threshold,
                    left: 1,
                    right: 2,
                    impurity: 0.5,
                    weight: 4.0,
                },
                TreeNode::Leaf {
                    value: vec![1.0, 0.0],
                    impurity: 0.0,
                    weight: 2.0,
                },
                TreeNode::Leaf {
                    value: vec![0.0, 1.0],
                    impurity: 0.0,
                    weight: 2.0,
                },
            ],
        }
    }

    #[test]
    fn tree_routes_on_threshold() {
        let tree = stump(0.5);
        assert_eq!(tree.predict_proba(&[0.5]), &[1.0, 0.0]);
        assert_eq!(tree.predict_proba(&[0.6]), &[0.0, 1.0]);
    }

    #[test]
    fn forest_averages_tree_probabilities() {
        let model = RandomForestModel {
            model_version: 1,
            n_features: 1,
            n_classes: 2,
            trees: vec![stump(0.0), stump(1.0)],
        };
        model.validate().unwrap();
        assert_eq!(model.predict_proba(&[0.5]), vec![0.5, 0.5]);
        assert_eq!(model.predict_class_index(&[0.5]), 0);
        assert_eq!(model.predict_class_index(&[2.0]), 1);
    }

    #[test]
    fn importances_ignore_single_node_trees() {
        let leaf_only = DecisionTree {
            nodes: vec![TreeNode::Leaf {
                value: vec![0.5, 0.5],
                impurity: 0.5,
                weight: 4.0,
            }],
        };
        let model = RandomForestModel {
            model_version: 1,
            n_features: 2,
            n_classes: 2,
            trees: vec![stump(0.5), leaf_only],
        };
        assert_eq!(model.feature_importances(), vec![1.0, 0.0]);
    }

    #[test]
    fn validate_rejects_dangling_children() {
        let mut tree = stump(0.5);
        if let TreeNode::Split { right, .. } = &mut tree.nodes[0] {
            *right = 9;
        }
        let model = RandomForestModel {
            model_version: 1,
            n_features: 1,
            n_classes: 2,
            trees: vec![tree],
        };
        assert!(model.validate().is_err());
    }
}
