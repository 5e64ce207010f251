use std::path::PathBuf;

use tracing::{info, warn};

use super::TrainingError;
use super::artifact::{ArtifactBundle, BUNDLE_FILE_NAME, PersistSummary};
use super::report::{IMPORTANCE_FILE_NAME, write_importance_csv};
use crate::config::TrainingConfig;
use crate::dataset::{read_csv, select_features};
use crate::ml::importance::top_n;
use crate::ml::trainer::CLASS_NAMES;
use crate::ml::{FeatureImportance, TrainingMetrics, rank_feature_importances, train_and_evaluate};

/// Run log written into the output directory by the training binary.
pub const TRAINING_LOG_FILE_NAME: &str = "training_log.txt";

/// What a finished run produced.
#[derive(Debug, Clone)]
pub struct TrainingSummary {
    pub feature_names: Vec<String>,
    pub metrics: TrainingMetrics,
    /// Every feature, most important first.
    pub ranked_features: Vec<FeatureImportance>,
    pub importance_path: PathBuf,
    /// Bundle archived in the output directory.
    pub output_bundle: PersistSummary,
    /// Bundle published to the serving directory.
    pub serving_bundle: PersistSummary,
}

/// Train a model from `config.dataset` and publish the bundle.
///
/// The bundle lands in both the output directory and the serving directory;
/// the importance table goes to the output directory only.
pub fn run(config: &TrainingConfig) -> Result<TrainingSummary, TrainingError> {
    info!("{}", "=".repeat(60));
    info!("Pre-release movie success model training");
    info!("{}", "=".repeat(60));

    let serving_dir = config.resolve_serving_dir()?;

    info!("Loading dataset from {}", config.dataset.display());
    let table = read_csv(&config.dataset)?;
    info!(
        "Dataset: {} rows x {} columns",
        table.rows.len(),
        table.headers.len()
    );

    let selection = select_features(&table)?;
    selection.check_class_sizes(config.evaluation.cv_folds.max(2))?;
    let (successes, failures) = selection.label_counts();
    let total = selection.y.len() as f64;
    info!("Label distribution:");
    info!(
        "  Success (1): {} ({:.1}%)",
        successes,
        successes as f64 / total * 100.0
    );
    info!(
        "  Failure (0): {} ({:.1}%)",
        failures,
        failures as f64 / total * 100.0
    );

    info!(
        "Training random forest: {} trees, max depth {}, seed {}",
        config.forest.n_trees, config.forest.max_depth, config.forest.seed
    );
    let trained = train_and_evaluate(
        &selection.x,
        &selection.y,
        &config.forest,
        &config.evaluation,
    )?;
    log_metrics(&trained.metrics);
    info!("Classification report (held-out set):");
    for (name, stats) in CLASS_NAMES.iter().zip(&trained.per_class) {
        info!(
            "  {:<8} precision {:.4}  recall {:.4}  f1 {:.4}  support {}",
            name, stats.precision, stats.recall, stats.f1, stats.support
        );
    }

    let ranked = rank_feature_importances(&trained.model, &selection.feature_names);
    info!("Top {} features:", config.importance_top_n);
    for (rank, entry) in top_n(&ranked, config.importance_top_n).iter().enumerate() {
        info!("  {:>2}. {:<30} {:.4}", rank + 1, entry.feature, entry.importance);
    }
    let importance_path = config.output_dir.join(IMPORTANCE_FILE_NAME);
    write_importance_csv(&importance_path, &ranked).map_err(|source| TrainingError::Report {
        path: importance_path.clone(),
        source,
    })?;
    info!("Feature importances written to {}", importance_path.display());

    let bundle = ArtifactBundle::new(
        selection.feature_names.clone(),
        trained.scaler,
        trained.model,
        trained.metrics.clone(),
    );
    bundle.validate()?;
    let output_bundle = bundle.save(&config.output_dir.join(BUNDLE_FILE_NAME))?;
    let serving_bundle = bundle.save(&serving_dir.join(BUNDLE_FILE_NAME))?;
    if output_bundle.digest != serving_bundle.digest {
        warn!("Output and serving bundles differ; check the serving directory");
    }

    info!("{}", "=".repeat(60));
    info!("Training complete");
    info!("  Features:  {}", selection.feature_names.len());
    info!("  Accuracy:  {:.4}", trained.metrics.accuracy);
    info!("  F1-score:  {:.4}", trained.metrics.f1_score);
    info!(
        "  CV:        {:.4} (+/- {:.4})",
        trained.metrics.cv_mean,
        trained.metrics.cv_std * 2.0
    );
    info!("{}", "=".repeat(60));

    Ok(TrainingSummary {
        feature_names: selection.feature_names,
        metrics: trained.metrics,
        ranked_features: ranked,
        importance_path,
        output_bundle,
        serving_bundle,
    })
}

fn log_metrics(metrics: &TrainingMetrics) {
    info!(
        "Train set: {}, Test set: {}",
        metrics.train_size, metrics.test_size
    );
    info!("Accuracy:  {:.4}", metrics.accuracy);
    info!("Precision: {:.4}", metrics.precision);
    info!("Recall:    {:.4}", metrics.recall);
    info!("F1-score:  {:.4}", metrics.f1_score);
    let c = metrics.confusion;
    info!("Confusion matrix:");
    info!("  TN: {:>5}  FP: {:>5}", c.true_negative, c.false_positive);
    info!("  FN: {:>5}  TP: {:>5}", c.false_negative, c.true_positive);
    let scores: Vec<String> = metrics.cv_scores.iter().map(|s| format!("{s:.4}")).collect();
    info!("CV scores: [{}]", scores.join(", "));
    info!(
        "CV mean: {:.4} (+/- {:.4})",
        metrics.cv_mean,
        metrics.cv_std * 2.0
    );
}
