//! End-to-end training: dataset to published artifact bundle.

use thiserror::Error;

mod artifact;
mod pipeline;
mod report;

pub use artifact::{
    ArtifactBundle, ArtifactError, BUNDLE_FILE_NAME, DESCRIPTION, FORMAT_VERSION, MODEL_TYPE,
    PersistSummary,
};
pub use pipeline::{TRAINING_LOG_FILE_NAME, TrainingSummary, run};
pub use report::{IMPORTANCE_FILE_NAME, importance_csv, write_importance_csv};

#[cfg(test)]
pub(crate) use artifact::tests::tiny_bundle;

/// Failure of a training run.
#[derive(Debug, Error)]
pub enum TrainingError {
    #[error(transparent)]
    Config(#[from] crate::config::ConfigError),
    #[error(transparent)]
    Dataset(#[from] crate::dataset::DatasetError),
    #[error("Training failed: {0}")]
    Train(#[from] crate::ml::random_forest::TrainError),
    #[error(transparent)]
    Artifact(#[from] ArtifactError),
    #[error("Failed to write report {path}: {source}")]
    Report {
        path: std::path::PathBuf,
        source: std::io::Error,
    },
}
