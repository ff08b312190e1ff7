//! CSV reader for labeled training snapshots.
use std::path::Path;

use anyhow::{anyhow, Context, Result};
use csv::StringRecord;

use crate::data_handling::TrainingSet;
use crate::features::{FEATURE_COUNT, FEATURE_NAMES};

/// Label column expected in training CSVs.
pub const TARGET_COLUMN: &str = "target";

/// Read a training CSV into a [`TrainingSet`].
///
/// The file must carry one column per schema feature plus a `target` column
/// of 0/1 labels; column order does not matter and extra columns are
/// ignored. Rows are taken in file order, which is expected to be time
/// order.
pub fn read_training_csv<P: AsRef<Path>>(path: P) -> Result<TrainingSet> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_path(&path)
        .with_context(|| format!("Failed to open training CSV: {}", path.as_ref().display()))?;

    let headers = reader
        .headers()
        .context("Failed to read training CSV header row")?
        .clone();

    let mut feature_indices = Vec::with_capacity(FEATURE_COUNT);
    let mut missing = Vec::new();
    for name in FEATURE_NAMES.iter() {
        match find_column(&headers, name) {
            Some(idx) => feature_indices.push(idx),
            None => missing.push(*name),
        }
    }
    if !missing.is_empty() {
        return Err(anyhow!(
            "Training CSV is missing feature columns: {}",
            missing.join(", ")
        ));
    }
    let target_idx = find_column(&headers, TARGET_COLUMN)
        .ok_or_else(|| anyhow!("Missing target column '{}'", TARGET_COLUMN))?;

    let mut rows = Vec::new();
    let mut labels = Vec::new();
    for (row_idx, result) in reader.records().enumerate() {
        let record = result.with_context(|| format!("Failed to read row {}", row_idx + 1))?;

        let mut row = Vec::with_capacity(FEATURE_COUNT);
        for (&idx, name) in feature_indices.iter().zip(FEATURE_NAMES.iter()) {
            let value = record
                .get(idx)
                .ok_or_else(|| anyhow!("Missing value for '{}' at row {}", name, row_idx + 1))?;
            let parsed = value
                .trim()
                .parse::<f32>()
                .with_context(|| format!("Invalid value for '{}' at row {}", name, row_idx + 1))?;
            row.push(parsed);
        }
        rows.push(row);

        let label = record
            .get(target_idx)
            .ok_or_else(|| anyhow!("Missing target value at row {}", row_idx + 1))?
            .trim()
            .parse::<u8>()
            .with_context(|| format!("Invalid target at row {}", row_idx + 1))?;
        labels.push(label);
    }

    TrainingSet::from_rows(rows, labels)
        .with_context(|| format!("Rejected training CSV: {}", path.as_ref().display()))
}

fn find_column(headers: &StringRecord, name: &str) -> Option<usize> {
    headers
        .iter()
        .position(|header| header.eq_ignore_ascii_case(name))
}
