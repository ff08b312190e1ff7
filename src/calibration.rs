//! Isotonic score-to-probability calibration.
use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::error::PredictError;

/// Non-decreasing map from raw scores to calibrated probabilities, fit with
/// pool-adjacent-violators.
///
/// Knots are the pooled mean scores, values the pooled empirical outcome
/// frequencies. `transform` interpolates linearly between knots and clamps
/// outside the fitted range, so outputs always stay within the observed
/// frequencies.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IsotonicCalibrator {
    knots: Vec<f64>,
    values: Vec<f64>,
}

struct Block {
    score_sum: f64,
    outcome_sum: f64,
    weight: f64,
}

impl Block {
    fn mean_score(&self) -> f64 {
        self.score_sum / self.weight
    }

    fn mean_outcome(&self) -> f64 {
        self.outcome_sum / self.weight
    }
}

impl IsotonicCalibrator {
    /// Fit on (raw score, binary outcome) pairs from a validation slice.
    pub fn fit(scores: &[f32], outcomes: &[u8]) -> Result<Self, PredictError> {
        if scores.len() != outcomes.len() {
            return Err(PredictError::InvalidInput(format!(
                "{} scores but {} outcomes",
                scores.len(),
                outcomes.len()
            )));
        }
        if scores.is_empty() {
            return Err(PredictError::InvalidInput(
                "cannot calibrate on an empty validation slice".to_string(),
            ));
        }
        if scores.iter().any(|s| !s.is_finite()) {
            return Err(PredictError::InvalidInput(
                "non-finite score in calibration input".to_string(),
            ));
        }
        if outcomes.iter().any(|&o| o > 1) {
            return Err(PredictError::InvalidInput(
                "calibration outcomes must be 0 or 1".to_string(),
            ));
        }

        let mut order: Vec<usize> = (0..scores.len()).collect();
        order.sort_by(|&a, &b| {
            scores[a]
                .partial_cmp(&scores[b])
                .unwrap_or(Ordering::Equal)
        });

        // Pool adjacent violators: walk scores in ascending order, merging
        // any block whose mean outcome drops below its predecessor's.
        let mut blocks: Vec<Block> = Vec::with_capacity(scores.len());
        for &idx in &order {
            blocks.push(Block {
                score_sum: f64::from(scores[idx]),
                outcome_sum: f64::from(outcomes[idx]),
                weight: 1.0,
            });
            while blocks.len() >= 2 {
                let last = blocks.len() - 1;
                if blocks[last - 1].mean_outcome() <= blocks[last].mean_outcome() {
                    break;
                }
                let merged = blocks.remove(last);
                blocks[last - 1].score_sum += merged.score_sum;
                blocks[last - 1].outcome_sum += merged.outcome_sum;
                blocks[last - 1].weight += merged.weight;
            }
        }

        // Identical pooled scores collapse into one knot so interpolation
        // never divides by a zero-width interval.
        let mut knots: Vec<f64> = Vec::with_capacity(blocks.len());
        let mut values: Vec<f64> = Vec::with_capacity(blocks.len());
        let mut weights: Vec<f64> = Vec::with_capacity(blocks.len());
        for block in &blocks {
            let score = block.mean_score();
            match knots.last() {
                Some(previous) if (score - previous).abs() < f64::EPSILON => {
                    let last = values.len() - 1;
                    let total = weights[last] + block.weight;
                    values[last] =
                        (values[last] * weights[last] + block.mean_outcome() * block.weight)
                            / total;
                    weights[last] = total;
                }
                _ => {
                    knots.push(score);
                    values.push(block.mean_outcome());
                    weights.push(block.weight);
                }
            }
        }

        Ok(IsotonicCalibrator { knots, values })
    }

    /// Calibrated probability for a raw score.
    pub fn transform(&self, score: f32) -> f64 {
        let s = f64::from(score);
        let search = self
            .knots
            .binary_search_by(|knot| knot.partial_cmp(&s).unwrap_or(Ordering::Equal));
        match search {
            Ok(idx) => self.values[idx],
            Err(0) => self.values[0],
            Err(idx) if idx == self.knots.len() => self.values[self.values.len() - 1],
            Err(idx) => {
                let x0 = self.knots[idx - 1];
                let x1 = self.knots[idx];
                let y0 = self.values[idx - 1];
                let y1 = self.values[idx];
                y0 + (y1 - y0) * (s - x0) / (x1 - x0)
            }
        }
    }

    pub fn knot_count(&self) -> usize {
        self.knots.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fitted_map_is_non_decreasing() {
        let scores = vec![0.1, 0.4, 0.2, 0.8, 0.3, 0.9, 0.7, 0.6, 0.5, 0.85];
        let outcomes = vec![0, 1, 0, 1, 0, 1, 1, 0, 1, 1];
        let calibrator = IsotonicCalibrator::fit(&scores, &outcomes).unwrap();

        let mut previous = f64::NEG_INFINITY;
        for step in 0..=100 {
            let s = step as f32 / 100.0;
            let p = calibrator.transform(s);
            assert!(p >= previous - 1e-12, "map decreased at score {}", s);
            assert!((0.0..=1.0).contains(&p));
            previous = p;
        }
    }

    #[test]
    fn separable_scores_calibrate_to_extremes() {
        let scores = vec![0.1, 0.15, 0.2, 0.8, 0.85, 0.9];
        let outcomes = vec![0, 0, 0, 1, 1, 1];
        let calibrator = IsotonicCalibrator::fit(&scores, &outcomes).unwrap();
        assert!(calibrator.transform(0.05) < 1e-12);
        assert!(calibrator.transform(0.95) > 1.0 - 1e-12);
    }

    #[test]
    fn transform_clamps_outside_fitted_range() {
        let calibrator =
            IsotonicCalibrator::fit(&[0.2, 0.5, 0.8], &[0, 1, 1]).unwrap();
        assert_eq!(calibrator.transform(-10.0), calibrator.transform(0.2));
        assert_eq!(calibrator.transform(10.0), calibrator.transform(0.8));
    }

    #[test]
    fn violators_pool_to_the_weighted_mean() {
        // Outcome dips at the middle score, so the two upper points pool.
        let calibrator =
            IsotonicCalibrator::fit(&[0.1, 0.5, 0.9], &[0, 1, 0]).unwrap();
        assert_eq!(calibrator.knot_count(), 2);
        assert!((calibrator.transform(0.7) - 0.5).abs() < 1e-12);
    }

    #[test]
    fn duplicate_scores_share_one_knot() {
        let calibrator =
            IsotonicCalibrator::fit(&[0.4, 0.4, 0.4, 0.4], &[0, 1, 1, 1]).unwrap();
        assert_eq!(calibrator.knot_count(), 1);
        assert!((calibrator.transform(0.4) - 0.75).abs() < 1e-12);
    }

    #[test]
    fn mismatched_lengths_are_rejected() {
        let err = IsotonicCalibrator::fit(&[0.1, 0.2], &[1]).unwrap_err();
        assert!(matches!(err, PredictError::InvalidInput(_)));
    }

    #[test]
    fn empty_input_is_rejected() {
        let err = IsotonicCalibrator::fit(&[], &[]).unwrap_err();
        assert!(matches!(err, PredictError::InvalidInput(_)));
    }

    #[test]
    fn non_binary_outcomes_are_rejected() {
        let err = IsotonicCalibrator::fit(&[0.1, 0.9], &[0, 7]).unwrap_err();
        assert!(matches!(err, PredictError::InvalidInput(_)));
    }
}
