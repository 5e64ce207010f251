//! Machine learning building blocks for the training pipeline and the service.

pub mod importance;
pub mod metrics;
pub mod random_forest;
pub mod scaler;
pub mod split;
pub mod trainer;

pub use importance::{FeatureImportance, rank_feature_importances};
pub use trainer::{EvaluationOptions, TrainedModel, TrainingMetrics, train_and_evaluate};
