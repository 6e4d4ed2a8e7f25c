use crate::error::{QualityError, Result};
use crate::types::AnomalyRecord;
use crate::utils::{column_f64_values, is_numeric_dtype, mean_and_population_std};
use polars::prelude::*;
use std::collections::BTreeSet;
use tracing::debug;

/// Standard deviations at or below this are treated as zero variance.
pub const MIN_STD: f64 = 1e-10;

/// Name of the column added by [`AnomalyDetector::anomalous_rows`].
pub const ANOMALY_COLUMN: &str = "anomaly_column";

/// Z-score outlier detection over the numeric columns of a table.
pub struct AnomalyDetector;

impl AnomalyDetector {
    /// Flag every numeric cell whose |z| exceeds `threshold`.
    ///
    /// One record per (row, column); records are ordered by column, then row.
    pub fn detect(df: &DataFrame, threshold: f64) -> Result<Vec<AnomalyRecord>> {
        validate_threshold(threshold)?;

        let mut records = Vec::new();
        for col in df.get_columns() {
            if !is_numeric_dtype(col.dtype()) {
                continue;
            }
            let found = Self::scan_column(df, col.name().as_str(), threshold)?;
            if !found.is_empty() {
                debug!("Column '{}': {} anomalies", col.name(), found.len());
            }
            records.extend(found);
        }

        debug!(
            "Detected {} anomalies at threshold {}",
            records.len(),
            threshold
        );
        Ok(records)
    }

    /// Flag anomalies in a single column.
    ///
    /// A non-numeric column has no anomalies.
    pub fn detect_column(df: &DataFrame, column: &str, threshold: f64) -> Result<Vec<AnomalyRecord>> {
        validate_threshold(threshold)?;
        let col = df
            .column(column)
            .map_err(|_| QualityError::ColumnNotFound(column.to_string()))?;
        if !is_numeric_dtype(col.dtype()) {
            return Ok(Vec::new());
        }
        Self::scan_column(df, column, threshold)
    }

    /// The offending rows taken from `df`, one per record, tagged with the
    /// triggering column in an extra `anomaly_column` string column.
    ///
    /// A row with two offending columns appears twice.
    pub fn anomalous_rows(df: &DataFrame, threshold: f64) -> Result<DataFrame> {
        let records = Self::detect(df, threshold)?;
        Self::rows_for(df, &records)
    }

    /// Materialise `records` as rows of `df`.
    pub fn rows_for(df: &DataFrame, records: &[AnomalyRecord]) -> Result<DataFrame> {
        let indices: Vec<IdxSize> = records.iter().map(|r| r.row_index as IdxSize).collect();
        let idx = IdxCa::from_vec("idx".into(), indices);
        let mut rows = df.take(&idx)?;

        let triggers: Vec<String> = records.iter().map(|r| r.column.clone()).collect();
        rows.with_column(Series::new(ANOMALY_COLUMN.into(), triggers))?;
        Ok(rows)
    }

    /// Distinct flagged row positions, ascending.
    ///
    /// This is the row-level view: a row counts once however many of its
    /// columns were flagged.
    pub fn flagged_row_indices(records: &[AnomalyRecord]) -> Vec<usize> {
        records
            .iter()
            .map(|r| r.row_index)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Number of anomalies per column, in first-seen order.
    pub fn counts_by_column(records: &[AnomalyRecord]) -> Vec<(String, usize)> {
        let mut counts: Vec<(String, usize)> = Vec::new();
        for record in records {
            match counts.iter_mut().find(|(name, _)| *name == record.column) {
                Some((_, n)) => *n += 1,
                None => counts.push((record.column.clone(), 1)),
            }
        }
        counts
    }

    fn scan_column(df: &DataFrame, column: &str, threshold: f64) -> Result<Vec<AnomalyRecord>> {
        let values = column_f64_values(df, column)?;
        let present: Vec<f64> = values.iter().flatten().copied().filter(|v| !v.is_nan()).collect();

        let Some((mean, std)) = mean_and_population_std(&present) else {
            return Ok(Vec::new());
        };
        if !std.is_finite() || std <= MIN_STD {
            debug!("Column '{}' has no spread; skipping", column);
            return Ok(Vec::new());
        }

        let records = values
            .into_iter()
            .enumerate()
            .filter_map(|(row_index, value)| {
                let value = value.filter(|v| !v.is_nan())?;
                let z_score = (value - mean) / std;
                (z_score.abs() > threshold).then(|| AnomalyRecord {
                    row_index,
                    column: column.to_string(),
                    value,
                    z_score,
                })
            })
            .collect();
        Ok(records)
    }
}

fn validate_threshold(threshold: f64) -> Result<()> {
    if threshold.is_finite() && threshold > 0.0 {
        Ok(())
    } else {
        Err(QualityError::InvalidConfig(format!(
            "z-score threshold must be a positive number, got {}",
            threshold
        )))
    }
}
