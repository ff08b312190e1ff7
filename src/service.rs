//! Stateful scoring service over the artifact store.
use std::cmp::Ordering;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use log::{info, warn};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::error::PredictError;
use crate::features::{schema_matches, FeatureRecord, FEATURE_COUNT};
use crate::io::model_store::ModelStore;
use crate::trainer::{CalibratedModel, ModelMetadata};

/// Confidence bucket derived from the rounded probability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    High,
    Medium,
    Low,
}

impl Confidence {
    pub fn from_probability(p: f64) -> Self {
        if p >= 0.7 {
            Confidence::High
        } else if p >= 0.55 {
            Confidence::Medium
        } else {
            Confidence::Low
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Confidence::High => "high",
            Confidence::Medium => "medium",
            Confidence::Low => "low",
        }
    }
}

/// One scoring request: a coin identifier plus its feature snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoreRequest {
    pub coin_id: String,
    #[serde(flatten)]
    pub features: FeatureRecord,
}

/// One scored coin.
#[derive(Debug, Clone, Serialize)]
pub struct PredictionResult {
    pub coin_id: String,
    pub probability: f64,
    pub confidence: Confidence,
    pub prediction: u8,
}

impl PredictionResult {
    /// Rounds the probability to four decimals first; the label and the
    /// bucket are derived from the rounded value so serialized output is
    /// self-consistent.
    pub fn new(coin_id: String, probability: f64) -> Self {
        let rounded = (probability * 1e4).round() / 1e4;
        PredictionResult {
            coin_id,
            probability: rounded,
            confidence: Confidence::from_probability(rounded),
            prediction: u8::from(rounded >= 0.5),
        }
    }
}

/// A request the batch path dropped, with the reason.
#[derive(Debug, Clone, Serialize)]
pub struct BatchError {
    pub coin_id: String,
    pub error: String,
}

/// Outcome of a batch call: scored coins ranked most-likely-first, plus the
/// requests that were dropped.
#[derive(Debug, Serialize)]
pub struct BatchOutcome {
    pub results: Vec<PredictionResult>,
    pub errors: Vec<BatchError>,
    pub model_version: String,
}

/// Service health snapshot.
#[derive(Debug, Clone, Serialize)]
pub struct Health {
    pub status: &'static str,
    pub model_version: Option<String>,
    pub features_count: usize,
}

struct ActiveModel {
    model: CalibratedModel,
    metadata: ModelMetadata,
}

/// Long-lived scoring state: an artifact store plus the currently active
/// model behind a read/write lock.
///
/// Scoring takes a cheap `Arc` snapshot of the active model and drops the
/// lock before predicting, so a concurrent [`PredictionService::load`] never
/// blocks behind in-flight scoring and in-flight scoring finishes on the
/// model it started with.
pub struct PredictionService {
    store: ModelStore,
    active: RwLock<Option<Arc<ActiveModel>>>,
}

impl PredictionService {
    pub fn new(store: ModelStore) -> Self {
        PredictionService {
            store,
            active: RwLock::new(None),
        }
    }

    fn read_lock(&self) -> RwLockReadGuard<'_, Option<Arc<ActiveModel>>> {
        self.active.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write_lock(&self) -> RwLockWriteGuard<'_, Option<Arc<ActiveModel>>> {
        self.active.write().unwrap_or_else(|e| e.into_inner())
    }

    fn snapshot(&self) -> Result<Arc<ActiveModel>, PredictError> {
        self.read_lock()
            .as_ref()
            .cloned()
            .ok_or(PredictError::ModelUnavailable)
    }

    /// Load (or replace) the active model from the store.
    ///
    /// The persisted feature list must match the compiled schema exactly,
    /// names and order both. On any failure the previously active model
    /// stays in service.
    pub fn load(&self, name: &str) -> Result<(), PredictError> {
        let (model, metadata) = self.store.load(name)?;
        if !schema_matches(&metadata.features) {
            return Err(PredictError::SchemaMismatch(format!(
                "persisted feature list ({} columns) does not match the compiled schema",
                metadata.features.len()
            )));
        }
        if model.feature_count() != FEATURE_COUNT {
            return Err(PredictError::SchemaMismatch(format!(
                "model expects {} features, schema has {}",
                model.feature_count(),
                FEATURE_COUNT
            )));
        }

        let version = metadata.version.clone();
        let mut guard = self.write_lock();
        *guard = Some(Arc::new(ActiveModel { model, metadata }));
        drop(guard);
        info!("service now scoring with model version {}", version);
        Ok(())
    }

    /// Hot-swap alias for [`PredictionService::load`], for use after a
    /// retraining run has written new artifacts under the same name.
    pub fn reload(&self, name: &str) -> Result<(), PredictError> {
        self.load(name)
    }

    /// Score a single coin snapshot.
    pub fn score_one(&self, request: &ScoreRequest) -> Result<PredictionResult, PredictError> {
        let active = self.snapshot()?;
        score_with(&active, request)
    }

    /// Score a batch in parallel and rank the outcomes.
    ///
    /// A request that fails to score is dropped into `errors` without
    /// affecting its neighbors; only an unavailable model fails the whole
    /// call. Ranking is most-likely-first with ties kept in request order.
    pub fn score_batch(&self, requests: &[ScoreRequest]) -> Result<BatchOutcome, PredictError> {
        let active = self.snapshot()?;
        let scored: Vec<Result<PredictionResult, BatchError>> = requests
            .par_iter()
            .map(|request| {
                score_with(&active, request).map_err(|e| BatchError {
                    coin_id: request.coin_id.clone(),
                    error: e.to_string(),
                })
            })
            .collect();

        let mut results = Vec::with_capacity(scored.len());
        let mut errors = Vec::new();
        for item in scored {
            match item {
                Ok(result) => results.push(result),
                Err(failure) => {
                    warn!("dropping '{}' from batch: {}", failure.coin_id, failure.error);
                    errors.push(failure);
                }
            }
        }
        rank_descending(&mut results);

        Ok(BatchOutcome {
            results,
            errors,
            model_version: active.metadata.version.clone(),
        })
    }

    pub fn health(&self) -> Health {
        match self.read_lock().as_ref() {
            Some(active) => Health {
                status: "healthy",
                model_version: Some(active.metadata.version.clone()),
                features_count: active.metadata.features.len(),
            },
            None => Health {
                status: "no_model",
                model_version: None,
                features_count: 0,
            },
        }
    }
}

fn score_with(
    active: &ActiveModel,
    request: &ScoreRequest,
) -> Result<PredictionResult, PredictError> {
    let vector = request.features.to_vector();
    let probability = active.model.predict_one(&vector)?;
    Ok(PredictionResult::new(request.coin_id.clone(), probability))
}

/// Stable sort by probability, most likely first.
pub fn rank_descending(results: &mut [PredictionResult]) {
    results.sort_by(|a, b| {
        b.probability
            .partial_cmp(&a.probability)
            .unwrap_or(Ordering::Equal)
    });
}
