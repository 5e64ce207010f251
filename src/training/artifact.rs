//! The persisted artifact bundle: model, scaler, feature contract and metrics.

use std::io::Write;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

use crate::ml::TrainingMetrics;
use crate::ml::random_forest::RandomForestModel;
use crate::ml::scaler::StandardScaler;

/// File name the bundle is published under.
pub const BUNDLE_FILE_NAME: &str = "pre_release_rf_model.json";

/// Bundle layout version understood by [`ArtifactBundle::load`].
pub const FORMAT_VERSION: u32 = 1;

/// Value of the `model_type` field.
pub const MODEL_TYPE: &str = "pre_release";

pub const DESCRIPTION: &str =
    "Random forest over pre-release features only (no revenue, ratings or ROI)";

#[derive(Debug, Error)]
pub enum ArtifactError {
    #[error("Model artifact not found at {path}")]
    Missing { path: PathBuf },
    #[error("Failed to access artifact at {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to encode artifact: {0}")]
    Encode(serde_json::Error),
    #[error("Invalid artifact JSON at {path}: {source}")]
    Decode {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("Inconsistent artifact: {0}")]
    Invalid(String),
}

/// Everything the prediction service needs, written once per training run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArtifactBundle {
    pub format_version: u32,
    pub model_type: String,
    pub description: String,
    /// Ordered feature contract; inference vectors follow this order exactly.
    pub feature_names: Vec<String>,
    pub scaler: StandardScaler,
    pub model: RandomForestModel,
    pub metrics: TrainingMetrics,
}

/// Where a bundle landed and the BLAKE3 digest of its bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistSummary {
    pub path: PathBuf,
    pub digest: String,
}

impl ArtifactBundle {
    pub fn new(
        feature_names: Vec<String>,
        scaler: StandardScaler,
        model: RandomForestModel,
        metrics: TrainingMetrics,
    ) -> Self {
        Self {
            format_version: FORMAT_VERSION,
            model_type: MODEL_TYPE.to_string(),
            description: DESCRIPTION.to_string(),
            feature_names,
            scaler,
            model,
            metrics,
        }
    }

    /// Check that the feature contract, scaler and forest agree.
    pub fn validate(&self) -> Result<(), ArtifactError> {
        if self.format_version != FORMAT_VERSION {
            return Err(ArtifactError::Invalid(format!(
                "unsupported format version {} (expected {FORMAT_VERSION})",
                self.format_version
            )));
        }
        self.scaler.validate().map_err(ArtifactError::Invalid)?;
        self.model.validate().map_err(ArtifactError::Invalid)?;
        let width = self.feature_names.len();
        if width == 0 {
            return Err(ArtifactError::Invalid("no feature names".to_string()));
        }
        if self.scaler.width() != width || self.model.n_features != width {
            return Err(ArtifactError::Invalid(format!(
                "{width} feature names, scaler width {}, model width {}",
                self.scaler.width(),
                self.model.n_features
            )));
        }
        if self.model.n_classes != 2 {
            return Err(ArtifactError::Invalid(format!(
                "expected a binary model, found {} classes",
                self.model.n_classes
            )));
        }
        Ok(())
    }

    /// Serialized bytes; identical bundles encode identically.
    pub fn to_bytes(&self) -> Result<Vec<u8>, ArtifactError> {
        serde_json::to_vec_pretty(self).map_err(ArtifactError::Encode)
    }

    /// Atomically write the bundle to `path`, replacing any previous one.
    pub fn save(&self, path: &Path) -> Result<PersistSummary, ArtifactError> {
        let bytes = self.to_bytes()?;
        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        let io_err = |source: std::io::Error| ArtifactError::Io {
            path: path.to_path_buf(),
            source,
        };
        std::fs::create_dir_all(&dir).map_err(io_err)?;
        let mut temp = tempfile::Builder::new()
            .prefix(".bundle")
            .tempfile_in(&dir)
            .map_err(io_err)?;
        temp.write_all(&bytes).map_err(io_err)?;
        temp.as_file().sync_all().map_err(io_err)?;
        temp.persist(path).map_err(|err| io_err(err.error))?;
        let digest = blake3::hash(&bytes).to_hex().to_string();
        info!("Saved model bundle to {} (blake3 {})", path.display(), digest);
        Ok(PersistSummary {
            path: path.to_path_buf(),
            digest,
        })
    }

    /// Read and validate a bundle.
    pub fn load(path: &Path) -> Result<Self, ArtifactError> {
        let bytes = std::fs::read(path).map_err(|source| {
            if source.kind() == std::io::ErrorKind::NotFound {
                ArtifactError::Missing {
                    path: path.to_path_buf(),
                }
            } else {
                ArtifactError::Io {
                    path: path.to_path_buf(),
                    source,
                }
            }
        })?;
        let bundle: Self = serde_json::from_slice(&bytes).map_err(|source| ArtifactError::Decode {
            path: path.to_path_buf(),
            source,
        })?;
        bundle.validate()?;
        Ok(bundle)
    }
}
