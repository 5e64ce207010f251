//! Training configuration loaded from TOML.
//!
//! Every key is optional; missing keys take the defaults below. Example:
//!
//! ```toml
//! dataset = "data/clean_movies_features.csv"
//! output_dir = "output"
//! serving_dir = "data/models"
//! importance_top_n = 15
//!
//! [forest]
//! n_trees = 100
//! max_depth = 10
//! seed = 42
//!
//! [evaluation]
//! test_fraction = 0.2
//! cv_folds = 5
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::app_dirs;
use crate::ml::EvaluationOptions;
use crate::ml::random_forest::ForestOptions;

/// Errors that may occur while loading the training configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read the config file.
    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    /// Failed to parse TOML config.
    #[error("Invalid config at {path}: {source}")]
    ParseToml {
        path: PathBuf,
        source: toml::de::Error,
    },
    /// No usable directory for the shared serving location.
    #[error("No suitable serving directory: {0}")]
    ServingDir(#[from] app_dirs::AppDirError),
}

/// Settings for one training run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainingConfig {
    /// Labeled CSV dataset.
    pub dataset: PathBuf,
    /// Run directory for the log, importance table and archived bundle.
    pub output_dir: PathBuf,
    /// Shared directory the prediction service reads; defaults to the app models dir.
    pub serving_dir: Option<PathBuf>,
    /// Number of ranked features written to the run log.
    pub importance_top_n: usize,
    pub forest: ForestOptions,
    pub evaluation: EvaluationOptions,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            dataset: PathBuf::from("data/clean_movies_features.csv"),
            output_dir: PathBuf::from("output"),
            serving_dir: None,
            importance_top_n: 15,
            forest: ForestOptions::default(),
            evaluation: EvaluationOptions::default(),
        }
    }
}

impl TrainingConfig {
    /// Load a config file, clamping out-of-range values.
    pub fn load_from_path(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text).map_err(|source| ConfigError::ParseToml {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn from_toml_str(text: &str) -> Result<Self, toml::de::Error> {
        toml::from_str::<Self>(text).map(Self::normalized)
    }

    /// Clamp values that would make the run meaningless.
    pub fn normalized(mut self) -> Self {
        self.forest.n_trees = self.forest.n_trees.max(1);
        self.forest.min_samples_leaf = self.forest.min_samples_leaf.max(1);
        self.forest.min_samples_split = self.forest.min_samples_split.max(2);
        self.evaluation.cv_folds = self.evaluation.cv_folds.max(2);
        if !(self.evaluation.test_fraction > 0.0 && self.evaluation.test_fraction < 1.0) {
            self.evaluation.test_fraction = EvaluationOptions::default().test_fraction;
        }
        self
    }

    /// Resolve the shared serving directory.
    pub fn resolve_serving_dir(&self) -> Result<PathBuf, ConfigError> {
        match &self.serving_dir {
            Some(dir) => Ok(dir.clone()),
            None => Ok(app_dirs::models_dir()?),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ml::random_forest::MaxFeatures;
    use tempfile::tempdir;

    #[test]
    fn empty_file_yields_defaults() {
        let config = TrainingConfig::from_toml_str("").unwrap();
        assert_eq!(config, TrainingConfig::default());
        assert_eq!(config.forest.n_trees, 100);
        assert_eq!(config.forest.max_depth, 10);
        assert_eq!(config.evaluation.cv_folds, 5);
    }

    #[test]
    fn partial_tables_merge_with_defaults() {
        let config = TrainingConfig::from_toml_str(
            r#"
dataset = "movies.csv"
serving_dir = "serve"

[forest]
n_trees = 20
max_features = "all"

[evaluation]
cv_folds = 1
test_fraction = 3.0
"#,
        )
        .unwrap();
        assert_eq!(config.dataset, PathBuf::from("movies.csv"));
        assert_eq!(config.forest.n_trees, 20);
        assert_eq!(config.forest.max_features, MaxFeatures::All);
        assert_eq!(config.forest.min_samples_leaf, 2);
        assert_eq!(config.evaluation.cv_folds, 2);
        assert_eq!(config.evaluation.test_fraction, 0.2);
        assert_eq!(config.resolve_serving_dir().unwrap(), PathBuf::from("serve"));
    }

    #[test]
    fn load_reports_path_on_parse_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("train.toml");
        std::fs::write(&path, "forest = 3").unwrap();
        let err = TrainingConfig::load_from_path(&path).unwrap_err();
        assert!(matches!(err, ConfigError::ParseToml { .. }));
        let missing = TrainingConfig::load_from_path(&dir.path().join("nope.toml")).unwrap_err();
        assert!(matches!(missing, ConfigError::Read { .. }));
    }
}
