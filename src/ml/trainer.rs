//! Split, scale, fit and evaluate: the full model-fitting step of a training run.

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::metrics::{
    BinaryConfusion, ConfusionMatrix, PerClassStats, accuracy, mean_std,
    precision_recall_by_class,
};
use super::random_forest::{
    ForestOptions, RandomForestModel, TrainDataset, TrainError, train_random_forest,
};
use super::scaler::StandardScaler;
use super::split::{stratified_k_fold, stratified_train_test_split, take_rows};

/// Class names in label order; label `1` means the movie succeeded.
pub const CLASS_NAMES: [&str; 2] = ["failure", "success"];

/// Hold-out and cross-validation settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EvaluationOptions {
    /// Share of each class held out for testing.
    pub test_fraction: f64,
    pub split_seed: u64,
    /// Number of stratified cross-validation folds.
    pub cv_folds: usize,
    pub cv_seed: u64,
}

impl Default for EvaluationOptions {
    fn default() -> Self {
        Self {
            test_fraction: 0.2,
            split_seed: 42,
            cv_folds: 5,
            cv_seed: 42,
        }
    }
}

/// Metrics persisted with the model; the service reports these verbatim.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingMetrics {
    pub accuracy: f32,
    /// Precision of the success class.
    pub precision: f32,
    /// Recall of the success class.
    pub recall: f32,
    pub f1_score: f32,
    pub confusion: BinaryConfusion,
    /// Accuracy of each cross-validation fold, in fold order.
    pub cv_scores: Vec<f32>,
    pub cv_mean: f32,
    /// Population standard deviation of `cv_scores`.
    pub cv_std: f32,
    pub train_size: usize,
    pub test_size: usize,
    pub n_samples: usize,
    pub n_features: usize,
}

/// Output of [`train_and_evaluate`].
#[derive(Debug, Clone)]
pub struct TrainedModel {
    pub scaler: StandardScaler,
    pub model: RandomForestModel,
    pub metrics: TrainingMetrics,
    /// Per-class report on the held-out partition, in [`CLASS_NAMES`] order.
    pub per_class: Vec<PerClassStats>,
}

/// Fit the scaler and forest on a stratified training partition, score the
/// held-out partition, then cross-validate fresh forests over the full dataset.
///
/// The scaler only sees training rows; cross-validation reuses it on every row.
pub fn train_and_evaluate(
    x: &[Vec<f32>],
    y: &[usize],
    forest: &ForestOptions,
    evaluation: &EvaluationOptions,
) -> Result<TrainedModel, TrainError> {
    if x.len() != y.len() {
        return Err(TrainError::MismatchedLengths {
            rows: x.len(),
            labels: y.len(),
        });
    }
    let width = x.first().map(Vec::len).ok_or(TrainError::EmptyDataset)?;
    let classes: Vec<String> = CLASS_NAMES.iter().map(|c| c.to_string()).collect();

    let split = stratified_train_test_split(y, evaluation.test_fraction, evaluation.split_seed)
        .map_err(TrainError::Split)?;
    let (train_x, train_y) = take_rows(x, y, &split.train);
    let (test_x, test_y) = take_rows(x, y, &split.test);
    debug!("Train set: {}, Test set: {}", train_x.len(), test_x.len());

    let scaler = StandardScaler::fit(&train_x, width);
    let train = TrainDataset {
        classes: classes.clone(),
        x: scaler.transform(&train_x),
        y: train_y,
    };
    let model = train_random_forest(&train, forest)?;

    let test_scaled = scaler.transform(&test_x);
    let cm = confusion_for(&model, &test_scaled, &test_y);
    let per_class = precision_recall_by_class(&cm);
    let positive = &per_class[1];

    let cv_scores = cross_validate(&scaler.transform(x), y, &classes, forest, evaluation)?;
    let (cv_mean, cv_std) = mean_std(&cv_scores);

    let metrics = TrainingMetrics {
        accuracy: accuracy(&cm),
        precision: positive.precision,
        recall: positive.recall,
        f1_score: positive.f1,
        confusion: BinaryConfusion::from_matrix(&cm),
        cv_scores,
        cv_mean,
        cv_std,
        train_size: split.train.len(),
        test_size: split.test.len(),
        n_samples: x.len(),
        n_features: width,
    };
    Ok(TrainedModel {
        scaler,
        model,
        metrics,
        per_class,
    })
}

fn cross_validate(
    x_scaled: &[Vec<f32>],
    y: &[usize],
    classes: &[String],
    forest: &ForestOptions,
    evaluation: &EvaluationOptions,
) -> Result<Vec<f32>, TrainError> {
    let folds = stratified_k_fold(y, evaluation.cv_folds, evaluation.cv_seed)
        .map_err(TrainError::Split)?;
    let mut scores = Vec::with_capacity(folds.len());
    for (fold_idx, fold) in folds.iter().enumerate() {
        let (train_x, train_y) = take_rows(x_scaled, y, &fold.train);
        let (test_x, test_y) = take_rows(x_scaled, y, &fold.test);
        let model = train_random_forest(
            &TrainDataset {
                classes: classes.to_vec(),
                x: train_x,
                y: train_y,
            },
            forest,
        )?;
        let score = accuracy(&confusion_for(&model, &test_x, &test_y));
        debug!("CV fold {}: accuracy {:.4}", fold_idx + 1, score);
        scores.push(score);
    }
    Ok(scores)
}

fn confusion_for(model: &RandomForestModel, x: &[Vec<f32>], y: &[usize]) -> ConfusionMatrix {
    let predicted: Vec<usize> = x.iter().map(|row| model.predict_class_index(row)).collect();
    ConfusionMatrix::from_labels(model.n_classes, y, &predicted)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ml::random_forest::MaxFeatures;

    fn synthetic(n: usize) -> (Vec<Vec<f32>>, Vec<usize>) {
        let mut x = Vec::with_capacity(n);
        let mut y = Vec::with_capacity(n);
        for i in 0..n {
            let success = i % 3 == 0;
            let base: f32 = if success { 8.0 } else { 6.5 };
            let budget = base + (i % 11) as f32 * 0.05;
            x.push(vec![budget, 90.0 + (i % 40) as f32, (i % 4) as f32]);
            y.push(usize::from(success));
        }
        (x, y)
    }

    fn quick_forest() -> ForestOptions {
        ForestOptions {
            n_trees: 10,
            max_features: MaxFeatures::All,
            threads: Some(2),
            ..ForestOptions::default()
        }
    }

    #[test]
    fn reports_holdout_and_cv_metrics() {
        let (x, y) = synthetic(100);
        let trained =
            train_and_evaluate(&x, &y, &quick_forest(), &EvaluationOptions::default()).unwrap();
        let m = &trained.metrics;
        assert_eq!(m.n_samples, 100);
        assert_eq!(m.n_features, 3);
        assert_eq!(m.train_size + m.test_size, 100);
        assert_eq!(m.cv_scores.len(), 5);
        let c = m.confusion;
        let counted = c.true_negative + c.false_positive + c.false_negative + c.true_positive;
        assert_eq!(counted as usize, m.test_size);
        assert!(m.accuracy > 0.9, "accuracy {}", m.accuracy);
        assert!(m.cv_mean > 0.9, "cv mean {}", m.cv_mean);
        assert_eq!(trained.scaler.width(), 3);
    }

    #[test]
    fn identical_inputs_give_identical_results() {
        let (x, y) = synthetic(80);
        let a = train_and_evaluate(&x, &y, &quick_forest(), &EvaluationOptions::default()).unwrap();
        let b = train_and_evaluate(&x, &y, &quick_forest(), &EvaluationOptions::default()).unwrap();
        assert_eq!(a.metrics, b.metrics);
        assert_eq!(a.model, b.model);
        assert_eq!(a.scaler, b.scaler);
    }

    #[test]
    fn empty_input_is_rejected() {
        let err = train_and_evaluate(&[], &[], &quick_forest(), &EvaluationOptions::default())
            .unwrap_err();
        assert!(matches!(err, TrainError::EmptyDataset));
    }
}
