//! Classification diagnostics logged after a training run.
use crate::error::PredictError;

/// Precision and recall for one class at the 0.5 decision threshold.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClassReport {
    pub precision: f64,
    pub recall: f64,
    pub support: usize,
}

/// Per-class reports for the negative and positive class.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClassificationReport {
    pub negative: ClassReport,
    pub positive: ClassReport,
}

/// Mean squared difference between predicted probability and outcome.
///
/// 0.0 is a perfect probabilistic forecast; 0.25 is what a constant 0.5
/// forecast earns on balanced labels.
pub fn brier_score(probabilities: &[f64], outcomes: &[u8]) -> Result<f64, PredictError> {
    if probabilities.len() != outcomes.len() {
        return Err(PredictError::InvalidInput(format!(
            "{} probabilities but {} outcomes",
            probabilities.len(),
            outcomes.len()
        )));
    }
    if probabilities.is_empty() {
        return Err(PredictError::InvalidInput(
            "cannot score an empty prediction set".to_string(),
        ));
    }
    let sum: f64 = probabilities
        .iter()
        .zip(outcomes.iter())
        .map(|(p, &y)| {
            let diff = p - f64::from(y);
            diff * diff
        })
        .sum();
    Ok(sum / probabilities.len() as f64)
}

/// Per-class precision/recall with predictions thresholded at 0.5.
///
/// Empty denominators report 0.0 rather than failing, matching the usual
/// report convention for an absent class.
pub fn classification_report(
    probabilities: &[f64],
    outcomes: &[u8],
) -> Result<ClassificationReport, PredictError> {
    if probabilities.len() != outcomes.len() {
        return Err(PredictError::InvalidInput(format!(
            "{} probabilities but {} outcomes",
            probabilities.len(),
            outcomes.len()
        )));
    }
    if probabilities.is_empty() {
        return Err(PredictError::InvalidInput(
            "cannot report on an empty prediction set".to_string(),
        ));
    }

    let mut true_positive = 0usize;
    let mut false_positive = 0usize;
    let mut true_negative = 0usize;
    let mut false_negative = 0usize;
    for (p, &y) in probabilities.iter().zip(outcomes.iter()) {
        let predicted_positive = *p >= 0.5;
        match (predicted_positive, y == 1) {
            (true, true) => true_positive += 1,
            (true, false) => false_positive += 1,
            (false, false) => true_negative += 1,
            (false, true) => false_negative += 1,
        }
    }

    let ratio = |numerator: usize, denominator: usize| {
        if denominator == 0 {
            0.0
        } else {
            numerator as f64 / denominator as f64
        }
    };

    Ok(ClassificationReport {
        negative: ClassReport {
            precision: ratio(true_negative, true_negative + false_negative),
            recall: ratio(true_negative, true_negative + false_positive),
            support: true_negative + false_positive,
        },
        positive: ClassReport {
            precision: ratio(true_positive, true_positive + false_positive),
            recall: ratio(true_positive, true_positive + false_negative),
            support: true_positive + false_negative,
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn perfect_forecast_scores_zero() {
        let brier = brier_score(&[1.0, 0.0, 1.0], &[1, 0, 1]).unwrap();
        assert!(brier.abs() < 1e-12);
    }

    #[test]
    fn constant_half_forecast_scores_quarter() {
        let brier = brier_score(&[0.5, 0.5, 0.5, 0.5], &[1, 0, 1, 0]).unwrap();
        assert!((brier - 0.25).abs() < 1e-12);
    }

    #[test]
    fn report_counts_known_confusion() {
        // predictions: [1, 1, 0, 0], outcomes: [1, 0, 0, 1]
        let report =
            classification_report(&[0.9, 0.8, 0.2, 0.1], &[1, 0, 0, 1]).unwrap();
        assert!((report.positive.precision - 0.5).abs() < 1e-12);
        assert!((report.positive.recall - 0.5).abs() < 1e-12);
        assert_eq!(report.positive.support, 2);
        assert!((report.negative.precision - 0.5).abs() < 1e-12);
        assert!((report.negative.recall - 0.5).abs() < 1e-12);
        assert_eq!(report.negative.support, 2);
    }

    #[test]
    fn absent_class_reports_zero_not_error() {
        let report = classification_report(&[0.9, 0.8], &[1, 1]).unwrap();
        assert_eq!(report.negative.support, 0);
        assert_eq!(report.negative.precision, 0.0);
        assert!((report.positive.recall - 1.0).abs() < 1e-12);
    }

    #[test]
    fn length_mismatch_is_rejected() {
        assert!(matches!(
            brier_score(&[0.5], &[1, 0]).unwrap_err(),
            PredictError::InvalidInput(_)
        ));
        assert!(matches!(
            classification_report(&[0.5], &[]).unwrap_err(),
            PredictError::InvalidInput(_)
        ));
    }
}
