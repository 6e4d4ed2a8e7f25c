use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// One flagged cell: a numeric value whose Z-score magnitude exceeded the threshold.
///
/// A row with several offending columns produces one record per column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnomalyRecord {
    /// Zero-based row position in the source table.
    pub row_index: usize,
    /// Name of the column whose deviation triggered the flag.
    pub column: String,
    /// The flagged value.
    pub value: f64,
    /// Signed Z-score of the value within its column.
    pub z_score: f64,
}

/// Coarse classification of a column used for statistics and charting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnKind {
    Numeric,
    Temporal,
    Boolean,
    Text,
    Other,
}

impl ColumnKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ColumnKind::Numeric => "numeric",
            ColumnKind::Temporal => "temporal",
            ColumnKind::Boolean => "boolean",
            ColumnKind::Text => "text",
            ColumnKind::Other => "other",
        }
    }
}

/// Per-column quality figures.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnQuality {
    pub name: String,
    /// Declared polars dtype, e.g. `Int64` or `String`.
    pub dtype: String,
    pub kind: ColumnKind,
    pub null_count: usize,
    pub non_null_count: usize,
}

/// Derived quality summary of a table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualitySummary {
    pub row_count: usize,
    pub column_count: usize,
    /// Rows identical to a strictly earlier row.
    pub duplicate_count: usize,
    /// One entry per column, in table order.
    pub columns: Vec<ColumnQuality>,
}

impl QualitySummary {
    /// Column name to null count.
    pub fn null_counts(&self) -> HashMap<String, usize> {
        self.columns
            .iter()
            .map(|c| (c.name.clone(), c.null_count))
            .collect()
    }

    /// Column name to declared type label.
    pub fn schema(&self) -> HashMap<String, String> {
        self.columns
            .iter()
            .map(|c| (c.name.clone(), c.dtype.clone()))
            .collect()
    }

    /// Total number of null cells across all columns.
    pub fn total_nulls(&self) -> usize {
        self.columns.iter().map(|c| c.null_count).sum()
    }

    pub fn numeric_columns(&self) -> Vec<&str> {
        self.columns
            .iter()
            .filter(|c| c.kind == ColumnKind::Numeric)
            .map(|c| c.name.as_str())
            .collect()
    }
}

/// Describe-style statistics of one column.
///
/// Entries that do not apply to the column's kind, or are undefined for its
/// data, are `None`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ColumnStatistics {
    pub name: String,
    pub count: usize,
    pub unique: Option<usize>,
    pub top: Option<String>,
    pub freq: Option<usize>,
    pub mean: Option<f64>,
    pub std: Option<f64>,
    pub min: Option<f64>,
    pub q25: Option<f64>,
    pub q50: Option<f64>,
    pub q75: Option<f64>,
    pub max: Option<f64>,
}
