//! Shared utilities for column classification and value extraction.

use once_cell::sync::Lazy;
use polars::prelude::*;
use regex::Regex;

// =============================================================================
// Data Type Utilities
// =============================================================================

/// Category of a data type for inspection and charting purposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DtypeCategory {
    /// Integer or floating point numbers
    Numeric,
    /// Date, datetime or time types
    Datetime,
    /// Boolean type
    Boolean,
    /// String/text type
    String,
    /// Other/unknown types
    Other,
}

/// Check if a DataType is numeric (integer or float).
#[inline]
pub fn is_numeric_dtype(dtype: &DataType) -> bool {
    matches!(
        dtype,
        DataType::Int8
            | DataType::Int16
            | DataType::Int32
            | DataType::Int64
            | DataType::UInt8
            | DataType::UInt16
            | DataType::UInt32
            | DataType::UInt64
            | DataType::Float32
            | DataType::Float64
    )
}

/// Check if a DataType is a datetime type.
#[inline]
pub fn is_datetime_dtype(dtype: &DataType) -> bool {
    matches!(
        dtype,
        DataType::Datetime(_, _) | DataType::Date | DataType::Time
    )
}

/// Get the category of a DataType.
pub fn get_dtype_category(dtype: &DataType) -> DtypeCategory {
    if is_numeric_dtype(dtype) {
        DtypeCategory::Numeric
    } else if is_datetime_dtype(dtype) {
        DtypeCategory::Datetime
    } else if matches!(dtype, DataType::Boolean) {
        DtypeCategory::Boolean
    } else if matches!(dtype, DataType::String | DataType::Categorical(_, _)) {
        DtypeCategory::String
    } else {
        DtypeCategory::Other
    }
}

/// Declared type label of a column, as shown in the schema table.
pub fn dtype_label(dtype: &DataType) -> String {
    format!("{:?}", dtype)
}

/// Names of all numeric columns, in table order.
pub fn numeric_column_names(df: &DataFrame) -> Vec<String> {
    df.get_columns()
        .iter()
        .filter(|col| is_numeric_dtype(col.dtype()))
        .map(|col| col.name().to_string())
        .collect()
}

/// Check whether `name` exists in `df` and is numeric.
pub fn is_numeric_column(df: &DataFrame, name: &str) -> bool {
    df.column(name)
        .map(|col| is_numeric_dtype(col.dtype()))
        .unwrap_or(false)
}

// =============================================================================
// Value Extraction Utilities
// =============================================================================

/// Read a column as nullable f64 values, one per row.
///
/// Non-numeric columns yield nulls wherever polars cannot cast.
pub fn column_f64_values(df: &DataFrame, name: &str) -> PolarsResult<Vec<Option<f64>>> {
    let col = df.column(name)?;
    let float_series = col.as_materialized_series().cast(&DataType::Float64)?;
    let values = float_series.f64()?.into_iter().collect();
    Ok(values)
}

/// Read a series as nullable display strings, one per row.
pub fn series_string_values(series: &Series) -> PolarsResult<Vec<Option<String>>> {
    let str_series = series.cast(&DataType::String)?;
    let values = str_series
        .str()?
        .into_iter()
        .map(|v| v.map(|s| s.to_string()))
        .collect();
    Ok(values)
}

// =============================================================================
// Statistics Utilities
// =============================================================================

/// Mean and population standard deviation (ddof = 0).
///
/// Returns `None` for an empty slice.
pub fn mean_and_population_std(values: &[f64]) -> Option<(f64, f64)> {
    if values.is_empty() {
        return None;
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
    Some((mean, variance.sqrt()))
}

/// Sample standard deviation (ddof = 1). `None` when fewer than two values.
pub fn sample_std(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1.0);
    Some(variance.sqrt())
}

/// Quantile with linear interpolation between closest ranks.
///
/// `sorted` must be ascending and free of NaN.
pub fn quantile_sorted(sorted: &[f64], q: f64) -> Option<f64> {
    if sorted.is_empty() {
        return None;
    }
    let pos = q.clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let lower = pos.floor() as usize;
    let upper = pos.ceil() as usize;
    let frac = pos - lower as f64;
    Some(sorted[lower] + (sorted[upper] - sorted[lower]) * frac)
}

/// Sort a vector of floats ascending, dropping NaN.
pub fn sorted_finite(values: impl IntoIterator<Item = f64>) -> Vec<f64> {
    let mut sorted: Vec<f64> = values.into_iter().filter(|v| !v.is_nan()).collect();
    sorted.sort_by(|a, b| a.total_cmp(b));
    sorted
}

// =============================================================================
// Date Detection Utilities
// =============================================================================

static DATE_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    vec![
        Regex::new(r"^\d{4}[-/]\d{1,2}[-/]\d{1,2}$").expect("Invalid regex: YYYY-MM-DD"),
        Regex::new(r"^\d{1,2}[-/]\d{1,2}[-/]\d{4}$").expect("Invalid regex: MM-DD-YYYY"),
        Regex::new(r"^\d{4}-\d{2}-\d{2}[T\s]\d{2}:\d{2}(:\d{2})?").expect("Invalid regex: datetime"),
    ]
});

/// Check if a string looks like a date or datetime.
pub fn looks_like_date(s: &str) -> bool {
    let trimmed = s.trim();
    !trimmed.is_empty() && DATE_PATTERNS.iter().any(|re| re.is_match(trimmed))
}

/// Format a float the way the report tables show it.
pub fn format_number(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{:.0}", value)
    } else {
        format!("{:.4}", value)
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_numeric_dtype() {
        assert!(is_numeric_dtype(&DataType::Int64));
        assert!(is_numeric_dtype(&DataType::Float64));
        assert!(!is_numeric_dtype(&DataType::String));
        assert!(!is_numeric_dtype(&DataType::Boolean));
    }

    #[test]
    fn test_dtype_category() {
        assert_eq!(get_dtype_category(&DataType::Int64), DtypeCategory::Numeric);
        assert_eq!(get_dtype_category(&DataType::Date), DtypeCategory::Datetime);
        assert_eq!(
            get_dtype_category(&DataType::Boolean),
            DtypeCategory::Boolean
        );
        assert_eq!(get_dtype_category(&DataType::String), DtypeCategory::String);
    }

    #[test]
    fn test_numeric_column_names_keeps_order() {
        let df = df![
            "b" => [1.0, 2.0],
            "name" => ["x", "y"],
            "a" => [1i64, 2],
        ]
        .unwrap();
        assert_eq!(numeric_column_names(&df), vec!["b", "a"]);
        assert!(is_numeric_column(&df, "a"));
        assert!(!is_numeric_column(&df, "name"));
        assert!(!is_numeric_column(&df, "missing"));
    }

    #[test]
    fn test_column_f64_values_preserves_nulls() {
        let df = df!["v" => [Some(1i64), None, Some(3)]].unwrap();
        let values = column_f64_values(&df, "v").unwrap();
        assert_eq!(values, vec![Some(1.0), None, Some(3.0)]);
    }

    #[test]
    fn test_mean_and_population_std() {
        let (mean, std) = mean_and_population_std(&[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]).unwrap();
        assert!((mean - 5.0).abs() < 1e-12);
        assert!((std - 2.0).abs() < 1e-12);
        assert!(mean_and_population_std(&[]).is_none());
    }

    #[test]
    fn test_sample_std() {
        let std = sample_std(&[1.0, 2.0, 3.0, 4.0, 5.0]).unwrap();
        assert!((std - 2.5f64.sqrt()).abs() < 1e-12);
        assert!(sample_std(&[1.0]).is_none());
    }

    #[test]
    fn test_quantile_sorted_interpolates() {
        let sorted = [1.0, 2.0, 3.0, 4.0];
        assert_eq!(quantile_sorted(&sorted, 0.0), Some(1.0));
        assert_eq!(quantile_sorted(&sorted, 0.5), Some(2.5));
        assert_eq!(quantile_sorted(&sorted, 0.25), Some(1.75));
        assert_eq!(quantile_sorted(&sorted, 1.0), Some(4.0));
        assert_eq!(quantile_sorted(&[], 0.5), None);
    }

    #[test]
    fn test_looks_like_date() {
        assert!(looks_like_date("2024-01-15"));
        assert!(looks_like_date("01/15/2024"));
        assert!(looks_like_date("2024-01-15 10:30:00"));
        assert!(!looks_like_date("hello"));
        assert!(!looks_like_date("42"));
        assert!(!looks_like_date(""));
    }

    #[test]
    fn test_format_number() {
        assert_eq!(format_number(3.0), "3");
        assert_eq!(format_number(2.5), "2.5000");
        assert_eq!(format_number(-10.0), "-10");
    }
}
