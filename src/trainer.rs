//! Cross-validated training of the calibrated ensemble.
use std::cmp::Ordering;

use chrono::Utc;
use log::info;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

use crate::calibration::IsotonicCalibrator;
use crate::config::TrainingConfig;
use crate::data_handling::TrainingSet;
use crate::error::PredictError;
use crate::features::{schema_names, FEATURE_NAMES, TARGET_NAME};
use crate::math::Array2;
use crate::models::gbdt::GbdtScorer;
use crate::stats::{self, ClassificationReport};

/// Sidecar record persisted next to every model blob.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelMetadata {
    pub version: String,
    pub trained_at: String,
    pub features: Vec<String>,
    pub target: String,
}

/// One fold's scorer together with the isotonic map fit on that fold's
/// validation slice.
#[derive(Debug, Serialize, Deserialize)]
pub struct CalibratedMember {
    pub scorer: GbdtScorer,
    pub calibrator: IsotonicCalibrator,
}

/// The persisted unit: an ensemble of per-fold (scorer, calibrator) pairs.
///
/// Inference calibrates each member's raw score with that member's own map
/// and averages the results. Members are never empty for a trained model;
/// the artifact store refuses to load a blob without members.
#[derive(Debug, Serialize, Deserialize)]
pub struct CalibratedModel {
    pub version: String,
    pub members: Vec<CalibratedMember>,
}

impl CalibratedModel {
    /// Averaged calibrated probability per row.
    pub fn predict_proba(&self, x: &Array2<f32>) -> Vec<f64> {
        let mut averaged = vec![0.0f64; x.nrows()];
        for member in &self.members {
            let raw = member.scorer.predict_proba(x);
            for (acc, score) in averaged.iter_mut().zip(raw.iter()) {
                *acc += member.calibrator.transform(*score);
            }
        }
        let count = self.members.len() as f64;
        for value in &mut averaged {
            *value /= count;
        }
        averaged
    }

    /// Calibrated probability for a single feature vector in schema order.
    pub fn predict_one(&self, features: &[f32]) -> Result<f64, PredictError> {
        if features.len() != self.feature_count() {
            return Err(PredictError::InvalidInput(format!(
                "feature vector has {} values, model expects {}",
                features.len(),
                self.feature_count()
            )));
        }
        if let Some(idx) = features.iter().position(|v| !v.is_finite()) {
            return Err(PredictError::InvalidInput(format!(
                "non-finite value for feature '{}'",
                FEATURE_NAMES.get(idx).unwrap_or(&"?")
            )));
        }
        let x = Array2::from_shape_vec((1, features.len()), features.to_vec())
            .map_err(|e| PredictError::InvalidInput(e.to_string()))?;
        Ok(self.predict_proba(&x)[0])
    }

    pub fn feature_count(&self) -> usize {
        self.members
            .first()
            .map(|member| member.scorer.feature_count())
            .unwrap_or(0)
    }
}

/// Diagnostics from one training run, for logging only.
#[derive(Debug, Clone)]
pub struct TrainingReport {
    pub brier: f64,
    pub classes: ClassificationReport,
    /// (feature, Brier increase when permuted), sorted most important first.
    pub importances: Vec<(String, f64)>,
    /// (training rows, validation rows) per fold.
    pub fold_rows: Vec<(usize, usize)>,
}

/// Runs the expanding-window training protocol.
pub struct ModelTrainer {
    config: TrainingConfig,
}

impl ModelTrainer {
    pub fn new(config: TrainingConfig) -> Self {
        ModelTrainer { config }
    }

    /// Train the calibrated ensemble on time-ordered examples.
    ///
    /// Each fold fits a fresh scorer on its training slice and an isotonic
    /// map on its validation slice. A separate full-data scorer is fit only
    /// for permutation importances and is never part of the returned model.
    pub fn train(
        &self,
        data: &TrainingSet,
    ) -> Result<(CalibratedModel, ModelMetadata, TrainingReport), PredictError> {
        data.log_summary();

        let folds = data.expanding_folds(self.config.folds)?;

        let positives = data.positives();
        if positives == 0 || positives == data.len() {
            return Err(PredictError::DegenerateLabels(format!(
                "{} of {} training labels are positive",
                positives,
                data.len()
            )));
        }

        let mut members = Vec::with_capacity(folds.len());
        let mut fold_rows = Vec::with_capacity(folds.len());
        for (fold_idx, fold) in folds.iter().enumerate() {
            let (train_x, train_y) = data.slice(fold.train.clone());
            let train_positives = train_y.iter().filter(|&&label| label == 1).count();
            if train_positives == 0 || train_positives == train_y.len() {
                return Err(PredictError::DegenerateLabels(format!(
                    "fold {} training slice has {} positives in {} rows",
                    fold_idx,
                    train_positives,
                    train_y.len()
                )));
            }

            info!(
                "fold {}/{}: fitting on {} rows, calibrating on {} rows",
                fold_idx + 1,
                folds.len(),
                train_y.len(),
                fold.validation.len()
            );
            let scorer = GbdtScorer::fit(&self.config.scorer, &train_x, train_y)?;

            let (validation_x, validation_y) = data.slice(fold.validation.clone());
            let raw = scorer.predict_proba(&validation_x);
            let calibrator = IsotonicCalibrator::fit(&raw, validation_y)?;

            fold_rows.push((train_y.len(), validation_y.len()));
            members.push(CalibratedMember { scorer, calibrator });
        }

        let model = CalibratedModel {
            version: self.config.model_version.clone(),
            members,
        };

        let probabilities = model.predict_proba(data.features());
        let brier = stats::brier_score(&probabilities, data.labels())?;
        let classes = stats::classification_report(&probabilities, data.labels())?;
        info!("brier score: {:.4}", brier);
        info!(
            "positive class: precision {:.3}, recall {:.3}, support {}",
            classes.positive.precision, classes.positive.recall, classes.positive.support
        );
        info!(
            "negative class: precision {:.3}, recall {:.3}, support {}",
            classes.negative.precision, classes.negative.recall, classes.negative.support
        );

        // Diagnostic scorer on the full data; never served.
        let full_scorer = GbdtScorer::fit(&self.config.scorer, data.features(), data.labels())?;
        let importances =
            permutation_importance(&full_scorer, data, self.config.importance_seed)?;
        info!("top features by permutation importance:");
        for (name, delta) in importances.iter().take(10) {
            info!("  {:<20} {:+.4}", name, delta);
        }

        let metadata = ModelMetadata {
            version: self.config.model_version.clone(),
            trained_at: Utc::now().to_rfc3339(),
            features: schema_names(),
            target: TARGET_NAME.to_string(),
        };

        let report = TrainingReport {
            brier,
            classes,
            importances,
            fold_rows,
        };
        Ok((model, metadata, report))
    }
}

/// Brier-score increase per feature when that column is shuffled.
fn permutation_importance(
    scorer: &GbdtScorer,
    data: &TrainingSet,
    seed: u64,
) -> Result<Vec<(String, f64)>, PredictError> {
    let x = data.features();
    let n = x.nrows();
    let baseline_probs: Vec<f64> = scorer
        .predict_proba(x)
        .iter()
        .map(|p| f64::from(*p))
        .collect();
    let baseline = stats::brier_score(&baseline_probs, data.labels())?;

    let mut rng = StdRng::seed_from_u64(seed);
    let mut importances = Vec::with_capacity(FEATURE_NAMES.len());
    for (col, name) in FEATURE_NAMES.iter().enumerate() {
        let mut permutation: Vec<usize> = (0..n).collect();
        permutation.shuffle(&mut rng);
        let mut shuffled = x.clone();
        for row in 0..n {
            shuffled[(row, col)] = x[(permutation[row], col)];
        }
        let probs: Vec<f64> = scorer
            .predict_proba(&shuffled)
            .iter()
            .map(|p| f64::from(*p))
            .collect();
        let delta = stats::brier_score(&probs, data.labels())? - baseline;
        importances.push((name.to_string(), delta));
    }
    importances.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal));
    Ok(importances)
}
