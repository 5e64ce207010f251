//! Serving side: requests, vectorization, risk tiers and the prediction service.

use thiserror::Error;

pub mod request;
pub mod risk;
mod samples;
mod service;
pub mod vectorizer;

pub use request::{NumberLike, PredictionRequest, StringList};
pub use risk::{RiskTier, estimate_roi};
pub use samples::sample_requests;
pub use service::{
    FeatureScore, MODEL_DISPLAY_NAME, ModelInfo, ModelStatus, PredictionMetrics, PredictionResult,
    PredictionService,
};
pub use vectorizer::{FeatureVectorizer, ReferenceDate};

use crate::training::ArtifactError;

/// A request the service cannot turn into features.
#[derive(Debug, Error)]
pub enum RequestError {
    #[error("Missing required field: {0}")]
    MissingField(&'static str),
    #[error("Field '{field}' is not numeric: {value:?}")]
    NotNumeric { field: &'static str, value: String },
    #[error("Invalid request JSON: {0}")]
    Json(serde_json::Error),
}

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("Failed to load prediction model: {0}")]
    Artifact(#[from] ArtifactError),
    #[error(transparent)]
    Request(#[from] RequestError),
}
