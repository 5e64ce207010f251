//! Bagged CART random-forest classifier.
//!
//! - Gini impurity, depth/leaf-size limits and per-node feature sampling.
//! - Balanced class weighting applied on top of bootstrap counts.
//! - Seeded per tree, so a fixed seed reproduces the same JSON model.

mod model;
mod train;

pub(crate) use model::argmax;
pub use model::{DecisionTree, RandomForestModel, TreeNode};
pub use train::{ForestOptions, MaxFeatures, TrainDataset, TrainError, train_random_forest};
