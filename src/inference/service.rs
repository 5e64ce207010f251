use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::ServiceError;
use super::request::PredictionRequest;
use super::risk::{RiskTier, estimate_roi, round_to};
use super::vectorizer::{FeatureVectorizer, ReferenceDate};
use crate::ml::importance::top_n;
use crate::ml::{FeatureImportance, rank_feature_importances};
use crate::training::{ArtifactBundle, MODEL_TYPE};

/// Model name reported to clients.
pub const MODEL_DISPLAY_NAME: &str = "Pre-Release Random Forest";

const SERVICE_DESCRIPTION: &str = "Pre-release prediction with no data leakage";
const TOP_FEATURES: usize = 10;
const STATUS_FEATURES: usize = 10;

/// A feature's share of the model's importance, in percent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureScore {
    pub feature: String,
    pub importance: f64,
}

/// Training metrics echoed with every prediction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelInfo {
    pub model_type: String,
    pub accuracy: f64,
    pub f1_score: f64,
    pub cv_mean: f64,
    pub training_data_size: usize,
    pub features_count: usize,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionMetrics {
    /// Heuristic ROI multiple derived from the risk tier.
    pub estimated_roi: f64,
    pub risk_score: f64,
    pub success_score: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionResult {
    pub success: bool,
    pub success_probability: f64,
    /// Probability of the predicted class.
    pub confidence: f64,
    pub risk_level: RiskTier,
    pub risk_description: String,
    pub metrics: PredictionMetrics,
    pub feature_importance: Vec<FeatureScore>,
    pub model_info: ModelInfo,
    pub prediction_type: String,
}

/// Model status block for health checks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelStatus {
    pub model_loaded: bool,
    pub model_type: String,
    pub accuracy: f64,
    pub features_count: usize,
    /// Leading feature names of the contract.
    pub features: Vec<String>,
    pub status: String,
    pub prediction_type: String,
    pub description: String,
}

/// Loaded model ready to answer predictions. Immutable; share by reference or `Arc`.
#[derive(Debug, Clone)]
pub struct PredictionService {
    bundle: ArtifactBundle,
    vectorizer: FeatureVectorizer,
    ranked: Vec<FeatureImportance>,
    model_info: ModelInfo,
}

impl PredictionService {
    /// Load and validate a bundle from disk.
    pub fn load(path: &Path) -> Result<Self, ServiceError> {
        let bundle = ArtifactBundle::load(path)?;
        let service = Self::from_bundle(bundle);
        info!(
            "Prediction model loaded from {}: accuracy {:.2}%, {} features",
            path.display(),
            service.model_accuracy() * 100.0,
            service.feature_names().len()
        );
        Ok(service)
    }

    /// Build a service around an already validated bundle.
    pub fn from_bundle(bundle: ArtifactBundle) -> Self {
        let vectorizer = FeatureVectorizer::new(bundle.feature_names.clone());
        let ranked = rank_feature_importances(&bundle.model, &bundle.feature_names);
        let metrics = &bundle.metrics;
        let model_info = ModelInfo {
            model_type: MODEL_DISPLAY_NAME.to_string(),
            accuracy: f64::from(metrics.accuracy),
            f1_score: f64::from(metrics.f1_score),
            cv_mean: f64::from(metrics.cv_mean),
            training_data_size: metrics.train_size,
            features_count: bundle.feature_names.len(),
            description: SERVICE_DESCRIPTION.to_string(),
        };
        Self {
            bundle,
            vectorizer,
            ranked,
            model_info,
        }
    }

    /// Held-out accuracy recorded at training time.
    pub fn model_accuracy(&self) -> f64 {
        f64::from(self.bundle.metrics.accuracy)
    }

    pub fn feature_names(&self) -> &[String] {
        self.vectorizer.feature_names()
    }

    pub fn model_info(&self) -> &ModelInfo {
        &self.model_info
    }

    pub fn status(&self) -> ModelStatus {
        let names = self.feature_names();
        ModelStatus {
            model_loaded: true,
            model_type: MODEL_DISPLAY_NAME.to_string(),
            accuracy: self.model_accuracy(),
            features_count: names.len(),
            features: names[..STATUS_FEATURES.min(names.len())].to_vec(),
            status: "ready".to_string(),
            prediction_type: MODEL_TYPE.to_string(),
            description: SERVICE_DESCRIPTION.to_string(),
        }
    }

    /// Scaled feature vector for `request`, dated against today.
    pub fn prepare_features(&self, request: &PredictionRequest) -> Result<Vec<f32>, ServiceError> {
        self.prepare_features_at(request, ReferenceDate::today())
    }

    pub fn prepare_features_at(
        &self,
        request: &PredictionRequest,
        today: ReferenceDate,
    ) -> Result<Vec<f32>, ServiceError> {
        let raw = self.vectorizer.vectorize(request, today)?;
        Ok(self.bundle.scaler.transform_row(&raw))
    }

    pub fn predict(&self, request: &PredictionRequest) -> Result<PredictionResult, ServiceError> {
        self.predict_at(request, ReferenceDate::today())
    }

    /// Predict with an explicit date for missing release fields.
    pub fn predict_at(
        &self,
        request: &PredictionRequest,
        today: ReferenceDate,
    ) -> Result<PredictionResult, ServiceError> {
        let features = self.prepare_features_at(request, today)?;
        let proba = self.bundle.model.predict_proba(&features);
        let label = crate::ml::random_forest::argmax(&proba);
        let p = f64::from(proba.get(1).copied().unwrap_or(0.0));
        let confidence = proba.iter().copied().fold(0.0f32, f32::max);
        let tier = RiskTier::from_probability(p);
        let budget = match &request.budget {
            Some(value) => value.to_f64("budget")?,
            None => 0.0,
        };
        debug!(
            "Prediction for {:?}: p={:.4} tier={}",
            request.title,
            p,
            tier.as_str()
        );

        Ok(PredictionResult {
            success: label == 1,
            success_probability: round_to(p, 4),
            confidence: round_to(f64::from(confidence), 4),
            risk_level: tier,
            risk_description: tier.description().to_string(),
            metrics: PredictionMetrics {
                estimated_roi: estimate_roi(p, budget),
                risk_score: round_to((1.0 - p) * 100.0, 1),
                success_score: round_to(p * 100.0, 1),
            },
            feature_importance: self.top_features(TOP_FEATURES),
            model_info: self.model_info.clone(),
            prediction_type: MODEL_TYPE.to_string(),
        })
    }

    /// Leading features as percentages rounded to two decimals.
    pub fn top_features(&self, n: usize) -> Vec<FeatureScore> {
        top_n(&self.ranked, n)
            .iter()
            .map(|entry| FeatureScore {
                feature: entry.feature.clone(),
                importance: round_to(entry.importance * 100.0, 2),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inference::RequestError;
    use crate::inference::request::NumberLike;
    use crate::training::{BUNDLE_FILE_NAME, tiny_bundle};
    use tempfile::tempdir;

    const MAY_2025: ReferenceDate = ReferenceDate {
        year: 2025,
        month: 5,
    };

    fn request(budget: f64) -> PredictionRequest {
        PredictionRequest {
            title: Some("Test".to_string()),
            budget: Some(NumberLike::Number(budget)),
            ..PredictionRequest::default()
        }
    }

    #[test]
    fn predicts_low_risk_for_funded_movies() {
        let service = PredictionService::from_bundle(tiny_bundle());
        let result = service.predict_at(&request(1.0e8), MAY_2025).unwrap();
        assert!(result.success);
        assert_eq!(result.risk_level, RiskTier::Low);
        assert_eq!(result.success_probability, 0.9);
        assert_eq!(result.confidence, 0.9);
        assert_eq!(result.metrics.estimated_roi, 4.0);
        assert_eq!(result.metrics.risk_score, 10.0);
        assert_eq!(result.metrics.success_score, 90.0);
        assert_eq!(result.prediction_type, "pre_release");
        assert_eq!(result.model_info.model_type, MODEL_DISPLAY_NAME);
        assert_eq!(result.model_info.training_data_size, 64);
    }

    #[test]
    fn zero_budget_is_high_risk_with_no_roi() {
        let service = PredictionService::from_bundle(tiny_bundle());
        let result = service.predict_at(&request(0.0), MAY_2025).unwrap();
        assert!(!result.success);
        assert_eq!(result.risk_level, RiskTier::High);
        assert_eq!(result.confidence, 0.8);
        assert_eq!(result.metrics.estimated_roi, 0.0);
        assert_eq!(result.risk_description, RiskTier::High.description());
    }

    #[test]
    fn importance_is_reported_in_percent_descending() {
        let service = PredictionService::from_bundle(tiny_bundle());
        let top = service.top_features(10);
        assert_eq!(top.len(), 2);
        assert_eq!(top[0].feature, "budget");
        assert_eq!(top[0].importance, 100.0);
        assert_eq!(top[1].importance, 0.0);
    }

    #[test]
    fn status_and_info_come_from_the_bundle() {
        let service = PredictionService::from_bundle(tiny_bundle());
        let status = service.status();
        assert!(status.model_loaded);
        assert_eq!(status.status, "ready");
        assert_eq!(status.features, vec!["budget", "runtime"]);
        assert_eq!(status.accuracy, 0.8125);
        assert_eq!(service.model_accuracy(), 0.8125);
        assert_eq!(service.model_info().features_count, 2);
    }

    #[test]
    fn prepared_features_are_scaled_in_contract_order() {
        let mut bundle = tiny_bundle();
        bundle.scaler.mean = vec![100.0, 60.0];
        bundle.scaler.scale = vec![50.0, 30.0];
        let service = PredictionService::from_bundle(bundle);
        let mut req = request(200.0);
        req.runtime = Some(NumberLike::Number(90.0));
        let features = service.prepare_features_at(&req, MAY_2025).unwrap();
        assert_eq!(features, vec![2.0, 1.0]);
    }

    #[test]
    fn models_split_on_raw_budget_see_the_requested_budget() {
        let mut bundle = tiny_bundle();
        bundle.scaler.mean = vec![5.0e7, 0.0];
        bundle.scaler.scale = vec![1.0e7, 1.0];
        let service = PredictionService::from_bundle(bundle);
        let small = service.predict_at(&request(1.0e7), MAY_2025).unwrap();
        let large = service.predict_at(&request(1.0e8), MAY_2025).unwrap();
        assert_eq!(small.success_probability, 0.2);
        assert_eq!(large.success_probability, 0.9);
    }

    #[test]
    fn bad_numbers_surface_as_request_errors() {
        let service = PredictionService::from_bundle(tiny_bundle());
        let mut req = request(1.0);
        req.budget = Some(NumberLike::Text("a lot".to_string()));
        let err = service.predict_at(&req, MAY_2025).unwrap_err();
        assert!(matches!(
            err,
            ServiceError::Request(RequestError::NotNumeric { field: "budget", .. })
        ));
        req.budget = Some(NumberLike::Text("inf".to_string()));
        assert!(service.predict_at(&req, MAY_2025).is_err());
    }

    #[test]
    fn load_reads_a_saved_bundle() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(BUNDLE_FILE_NAME);
        assert!(matches!(
            PredictionService::load(&path),
            Err(ServiceError::Artifact(_))
        ));
        tiny_bundle().save(&path).unwrap();
        let service = PredictionService::load(&path).unwrap();
        assert_eq!(service.feature_names(), ["budget", "runtime"]);
    }

    #[test]
    fn service_is_shareable_across_threads() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<PredictionService>();
    }
}
