use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, OnceLock};

use movie_success::app_dirs::HOME_ENV_VAR;
use movie_success::config::TrainingConfig;
use movie_success::ml::random_forest::ForestOptions;
use movie_success::training::BUNDLE_FILE_NAME;
use tempfile::TempDir;

use super::movies::write_movies_csv;

static HOME_LOCK: OnceLock<Mutex<()>> = OnceLock::new();

/// Scratch workspace holding a synthetic `movies.csv`.
pub struct TrainingFixture {
    temp: TempDir,
}

impl TrainingFixture {
    pub fn with_movies(rows: usize) -> Self {
        let temp = tempfile::tempdir().expect("create tempdir");
        write_movies_csv(&temp.path().join("movies.csv"), rows);
        Self { temp }
    }

    pub fn root(&self) -> &Path {
        self.temp.path()
    }

    /// Small forest over the fixture dataset, writing to `<root>/<out>` and
    /// serving from `<root>/<out>-serving`.
    pub fn config(&self, out: &str) -> TrainingConfig {
        TrainingConfig {
            dataset: self.root().join("movies.csv"),
            output_dir: self.root().join(out),
            serving_dir: Some(self.root().join(format!("{out}-serving"))),
            forest: ForestOptions {
                n_trees: 25,
                threads: Some(2),
                ..ForestOptions::default()
            },
            ..TrainingConfig::default()
        }
    }

    /// Route the default serving directory into this workspace until the
    /// returned guard drops.
    pub fn claim_app_home(&self) -> AppHome<'_> {
        let lock = HOME_LOCK
            .get_or_init(|| Mutex::new(()))
            .lock()
            .unwrap_or_else(|err| err.into_inner());
        let previous = std::env::var(HOME_ENV_VAR).ok();
        let home = self.root().join("home");
        // SAFETY: HOME_LOCK serializes every test that touches the variable.
        unsafe {
            std::env::set_var(HOME_ENV_VAR, &home);
        }
        AppHome {
            home,
            previous,
            _fixture: self,
            _lock: lock,
        }
    }
}

/// Active `MOVIE_SUCCESS_HOME` override.
pub struct AppHome<'a> {
    home: PathBuf,
    previous: Option<String>,
    _fixture: &'a TrainingFixture,
    _lock: MutexGuard<'static, ()>,
}

impl AppHome<'_> {
    /// Where training publishes when no serving dir is configured.
    pub fn default_bundle_path(&self) -> PathBuf {
        self.home
            .join(movie_success::app_dirs::APP_DIR_NAME)
            .join("models")
            .join(BUNDLE_FILE_NAME)
    }
}

impl Drop for AppHome<'_> {
    fn drop(&mut self) {
        // SAFETY: HOME_LOCK is still held here.
        unsafe {
            match self.previous.take() {
                Some(value) => std::env::set_var(HOME_ENV_VAR, value),
                None => std::env::remove_var(HOME_ENV_VAR),
            }
        }
    }
}
