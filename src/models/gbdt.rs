use std::fmt;

use gbdt::config::Config;
use gbdt::decision_tree::{Data, DataVec};
use gbdt::gradient_boost::GBDT;
use log::debug;
use serde::{Deserialize, Serialize};

use crate::config::ScorerParams;
use crate::error::PredictError;
use crate::math::Array2;

/// Boosted-tree binary base scorer.
///
/// Wraps the `gbdt` crate's gradient-boosted trees. The log-likelihood loss
/// expects labels in {-1, +1}; binary outcome labels {0, 1} are mapped here
/// so the rest of the pipeline never sees that convention. `predict_proba`
/// returns the positive-class probability (the crate applies the logistic
/// transform to the raw margin for this loss).
#[derive(Serialize, Deserialize)]
pub struct GbdtScorer {
    model: GBDT,
    feature_count: usize,
}

impl GbdtScorer {
    /// Fit a fresh scorer on time-ordered examples.
    ///
    /// Fails on empty or single-class input: with log-likelihood loss the
    /// initial bias is the atanh of the mean mapped label, which diverges
    /// when every label is the same.
    pub fn fit(params: &ScorerParams, x: &Array2<f32>, y: &[u8]) -> Result<Self, PredictError> {
        if x.nrows() != y.len() {
            return Err(PredictError::InvalidInput(format!(
                "{} feature rows but {} labels",
                x.nrows(),
                y.len()
            )));
        }
        if x.nrows() == 0 {
            return Err(PredictError::InsufficientData {
                rows: 0,
                required: 1,
            });
        }
        let positives = y.iter().filter(|&&label| label == 1).count();
        if positives == 0 || positives == y.len() {
            return Err(PredictError::DegenerateLabels(format!(
                "{} of {} examples are positive",
                positives,
                y.len()
            )));
        }

        let mut config = Config::new();
        config.set_feature_size(x.ncols());
        config.set_max_depth(params.max_depth);
        config.set_iterations(params.iterations);
        config.set_shrinkage(params.learning_rate);
        config.set_data_sample_ratio(params.data_sample_ratio);
        config.set_feature_sample_ratio(params.feature_sample_ratio);
        config.set_debug(params.debug);
        config.set_training_optimization_level(params.training_optimization_level);
        config.set_loss(&params.loss_type);

        debug!(
            "fitting scorer: {} rows, {} features, {} trees of depth {}",
            x.nrows(),
            x.ncols(),
            params.iterations,
            params.max_depth
        );

        let mut gbdt = GBDT::new(&config);
        let mut train = DataVec::with_capacity(x.nrows());
        for row in 0..x.nrows() {
            let features = x.row_slice(row).to_vec();
            let label = if y[row] == 1 { 1.0 } else { -1.0 };
            train.push(Data::new_training_data(features, 1.0, label, None));
        }
        gbdt.fit(&mut train);

        Ok(GbdtScorer {
            model: gbdt,
            feature_count: x.ncols(),
        })
    }

    /// Positive-class probability per row, uncalibrated.
    pub fn predict_proba(&self, x: &Array2<f32>) -> Vec<f32> {
        let mut test = DataVec::with_capacity(x.nrows());
        for row in 0..x.nrows() {
            test.push(Data::new_test_data(x.row_slice(row).to_vec(), None));
        }
        self.model.predict(&test)
    }

    pub fn feature_count(&self) -> usize {
        self.feature_count
    }
}

// The wrapped GBDT has no Debug impl, so the tree ensemble is elided.
impl fmt::Debug for GbdtScorer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GbdtScorer")
            .field("feature_count", &self.feature_count)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::{FeatureRecord, FEATURE_COUNT};

    fn deterministic_params() -> ScorerParams {
        ScorerParams {
            iterations: 20,
            max_depth: 3,
            data_sample_ratio: 1.0,
            feature_sample_ratio: 1.0,
            ..ScorerParams::default()
        }
    }

    fn rsi_rule_matrix(n: usize) -> (Array2<f32>, Vec<u8>) {
        let mut data = Vec::with_capacity(n * FEATURE_COUNT);
        let mut labels = Vec::with_capacity(n);
        for i in 0..n {
            let rsi = 20.0 + 60.0 * (i as f32 / (n - 1) as f32);
            let record = FeatureRecord {
                rsi,
                ..FeatureRecord::default()
            };
            data.extend_from_slice(&record.to_vector());
            labels.push(u8::from(rsi <= 70.0));
        }
        (
            Array2::from_shape_vec((n, FEATURE_COUNT), data).unwrap(),
            labels,
        )
    }

    #[test]
    fn learns_a_simple_threshold_rule() {
        let (x, y) = rsi_rule_matrix(200);
        let scorer = GbdtScorer::fit(&deterministic_params(), &x, &y).unwrap();
        let probs = scorer.predict_proba(&x);
        assert_eq!(probs.len(), 200);
        for (i, p) in probs.iter().enumerate() {
            assert!(*p >= 0.0 && *p <= 1.0, "probability {} out of range", p);
            if y[i] == 1 {
                assert!(*p > 0.5, "row {} (rsi below cutoff) scored {}", i, p);
            } else {
                assert!(*p < 0.5, "row {} (rsi above cutoff) scored {}", i, p);
            }
        }
    }

    #[test]
    fn single_class_input_is_degenerate() {
        let (x, _) = rsi_rule_matrix(50);
        let err = GbdtScorer::fit(&deterministic_params(), &x, &vec![1u8; 50]).unwrap_err();
        assert!(matches!(err, PredictError::DegenerateLabels(_)));
    }

    #[test]
    fn debug_output_reports_the_feature_count() {
        let (x, y) = rsi_rule_matrix(50);
        let scorer = GbdtScorer::fit(&deterministic_params(), &x, &y).unwrap();
        let rendered = format!("{:?}", scorer);
        assert!(
            rendered.contains(&format!("feature_count: {}", FEATURE_COUNT)),
            "{}",
            rendered
        );
    }

    #[test]
    fn survives_serde_round_trip() {
        let (x, y) = rsi_rule_matrix(120);
        let scorer = GbdtScorer::fit(&deterministic_params(), &x, &y).unwrap();
        let json = serde_json::to_string(&scorer).unwrap();
        let restored: GbdtScorer = serde_json::from_str(&json).unwrap();
        assert_eq!(restored.feature_count(), FEATURE_COUNT);
        let before = scorer.predict_proba(&x);
        let after = restored.predict_proba(&x);
        for (a, b) in before.iter().zip(after.iter()) {
            assert!((a - b).abs() < 1e-9);
        }
    }
}
