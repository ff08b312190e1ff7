//! Time-ordered training data and expanding-window fold construction.
use std::ops::Range;

use log::info;

use crate::error::PredictError;
use crate::features::FEATURE_COUNT;
use crate::math::Array2;

/// Labeled training examples, ordered by time.
///
/// Row order is the time order. Nothing here models the clock explicitly;
/// the expanding-window folds only rely on "earlier row means earlier
/// snapshot".
#[derive(Debug, Clone)]
pub struct TrainingSet {
    x: Array2<f32>,
    y: Vec<u8>,
}

/// One expanding-window fold: the validation rows are strictly later in
/// time than every training row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FoldSplit {
    pub train: Range<usize>,
    pub validation: Range<usize>,
}

impl TrainingSet {
    pub fn new(x: Array2<f32>, y: Vec<u8>) -> Result<Self, PredictError> {
        if x.nrows() != y.len() {
            return Err(PredictError::InvalidInput(format!(
                "{} feature rows but {} labels",
                x.nrows(),
                y.len()
            )));
        }
        if x.ncols() != FEATURE_COUNT {
            return Err(PredictError::SchemaMismatch(format!(
                "training matrix has {} columns, schema has {}",
                x.ncols(),
                FEATURE_COUNT
            )));
        }
        for row in 0..x.nrows() {
            if let Some(col) = x.row_slice(row).iter().position(|v| !v.is_finite()) {
                return Err(PredictError::InvalidInput(format!(
                    "non-finite feature value at row {}, column {}",
                    row, col
                )));
            }
        }
        if let Some(row) = y.iter().position(|&label| label > 1) {
            return Err(PredictError::InvalidInput(format!(
                "label at row {} is not 0 or 1",
                row
            )));
        }
        Ok(TrainingSet { x, y })
    }

    /// Build from per-example rows already in schema order.
    pub fn from_rows(rows: Vec<Vec<f32>>, labels: Vec<u8>) -> Result<Self, PredictError> {
        let mut data = Vec::with_capacity(rows.len() * FEATURE_COUNT);
        for (idx, row) in rows.iter().enumerate() {
            if row.len() != FEATURE_COUNT {
                return Err(PredictError::InvalidInput(format!(
                    "row {} has {} values, schema has {}",
                    idx,
                    row.len(),
                    FEATURE_COUNT
                )));
            }
            data.extend_from_slice(row);
        }
        let x = Array2::from_shape_vec((rows.len(), FEATURE_COUNT), data)
            .map_err(|e| PredictError::InvalidInput(e.to_string()))?;
        TrainingSet::new(x, labels)
    }

    pub fn len(&self) -> usize {
        self.y.len()
    }

    pub fn is_empty(&self) -> bool {
        self.y.is_empty()
    }

    pub fn features(&self) -> &Array2<f32> {
        &self.x
    }

    pub fn labels(&self) -> &[u8] {
        &self.y
    }

    pub fn positives(&self) -> usize {
        self.y.iter().filter(|&&label| label == 1).count()
    }

    /// Copy of a contiguous time slice, features and labels together.
    pub fn slice(&self, range: Range<usize>) -> (Array2<f32>, &[u8]) {
        let labels = &self.y[range.clone()];
        (self.x.slice_rows(range), labels)
    }

    pub fn log_summary(&self) {
        info!(
            "training set: {} rows, {} features, {} positive / {} negative",
            self.len(),
            self.x.ncols(),
            self.positives(),
            self.len() - self.positives()
        );
    }

    /// Time-respecting expanding-window folds.
    ///
    /// With `n` rows and `k` folds each validation slice gets
    /// `n / (k + 1)` rows; the first fold trains on the leading remainder
    /// and every later fold trains on strictly more history. Fails when the
    /// validation slices would be empty.
    pub fn expanding_folds(&self, folds: usize) -> Result<Vec<FoldSplit>, PredictError> {
        if folds < 2 {
            return Err(PredictError::InvalidInput(format!(
                "fold count must be at least 2, got {}",
                folds
            )));
        }
        let n = self.len();
        let validation_size = n / (folds + 1);
        if validation_size == 0 {
            return Err(PredictError::InsufficientData {
                rows: n,
                required: folds + 1,
            });
        }
        let first_validation_start = n - folds * validation_size;
        Ok((0..folds)
            .map(|fold| {
                let start = first_validation_start + fold * validation_size;
                FoldSplit {
                    train: 0..start,
                    validation: start..start + validation_size,
                }
            })
            .collect())
    }
}
