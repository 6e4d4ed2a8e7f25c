use crate::error::Result;
use crate::types::{ColumnKind, ColumnQuality, QualitySummary};
use crate::utils::{DtypeCategory, dtype_label, get_dtype_category, looks_like_date};
use polars::prelude::*;
use tracing::debug;

/// Pure schema and completeness checks over a loaded table.
pub struct QualityInspector;

impl QualityInspector {
    /// Null count of every column, in table order.
    pub fn missing_counts(df: &DataFrame) -> Vec<(String, usize)> {
        df.get_columns()
            .iter()
            .map(|col| (col.name().to_string(), col.null_count()))
            .collect()
    }

    /// Number of rows identical to a strictly earlier row.
    pub fn duplicate_count(df: &DataFrame) -> Result<usize> {
        if df.height() == 0 || df.width() == 0 {
            return Ok(0);
        }
        let unique_rows = df
            .unique::<&str, &str>(None, UniqueKeepStrategy::First, None)?
            .height();
        Ok(df.height() - unique_rows)
    }

    /// Declared type label of every column, in table order.
    pub fn schema(df: &DataFrame) -> Vec<(String, String)> {
        df.get_columns()
            .iter()
            .map(|col| (col.name().to_string(), dtype_label(col.dtype())))
            .collect()
    }

    /// Classify a column. Text columns whose values all look like dates are temporal.
    pub fn column_kind(series: &Series) -> ColumnKind {
        match get_dtype_category(series.dtype()) {
            DtypeCategory::Numeric => ColumnKind::Numeric,
            DtypeCategory::Datetime => ColumnKind::Temporal,
            DtypeCategory::Boolean => ColumnKind::Boolean,
            DtypeCategory::String => {
                if Self::is_date_like_text(series) {
                    ColumnKind::Temporal
                } else {
                    ColumnKind::Text
                }
            }
            DtypeCategory::Other => ColumnKind::Other,
        }
    }

    fn is_date_like_text(series: &Series) -> bool {
        let Ok(strings) = series.str() else {
            return false;
        };
        let mut seen = 0usize;
        for value in strings.into_iter().flatten() {
            if !looks_like_date(value) {
                return false;
            }
            seen += 1;
        }
        seen > 0
    }

    /// Compute the full quality summary of a table.
    pub fn summarize(df: &DataFrame) -> Result<QualitySummary> {
        let height = df.height();
        let columns: Vec<ColumnQuality> = df
            .get_columns()
            .iter()
            .map(|col| {
                let series = col.as_materialized_series();
                let null_count = series.null_count();
                ColumnQuality {
                    name: col.name().to_string(),
                    dtype: dtype_label(col.dtype()),
                    kind: Self::column_kind(series),
                    null_count,
                    non_null_count: height - null_count,
                }
            })
            .collect();

        let duplicate_count = Self::duplicate_count(df)?;
        debug!(
            "Summarized {} columns: {} duplicate rows, {} null cells",
            columns.len(),
            duplicate_count,
            columns.iter().map(|c| c.null_count).sum::<usize>()
        );

        Ok(QualitySummary {
            row_count: height,
            column_count: df.width(),
            duplicate_count,
            columns,
        })
    }
}
