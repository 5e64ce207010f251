//! Pre-release movie success prediction.
//!
//! Training reads a labeled CSV, keeps only columns the schema marks as
//! pre-release features, fits a scaler and a random forest, and persists an
//! artifact bundle. The inference side loads that bundle into an immutable
//! [`inference::PredictionService`].

/// Application directory helpers.
pub mod app_dirs;
/// Training configuration loading.
pub mod config;
/// CSV loading, column schema and feature selection.
pub mod dataset;
/// Prediction requests, feature vectorization and the prediction service.
pub mod inference;
/// Tracing subscriber setup.
pub mod logging;
/// Scaler, random forest, splits, metrics and importances.
pub mod ml;
/// Training pipeline and artifact persistence.
pub mod training;
