//! Configuration for inspection, anomaly detection and report layout.
//!
//! This module provides configuration options using the builder pattern,
//! with validation performed when the configuration is built.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Default Z-score magnitude above which a value is flagged.
pub const DEFAULT_Z_THRESHOLD: f64 = 3.0;

/// Default number of dataset columns per statistics table chunk.
pub const DEFAULT_MAX_COLUMNS_PER_CHUNK: usize = 10;

/// Default report file name.
pub const DEFAULT_REPORT_FILE: &str = "summary_report.pdf";

/// Configuration shared by the loader, the anomaly detector and the report builder.
///
/// Use [`QualityConfig::builder()`] to create a validated configuration.
///
/// # Example
///
/// ```rust,ignore
/// use lex_quality::config::QualityConfig;
///
/// let config = QualityConfig::builder()
///     .z_threshold(2.5)
///     .max_columns_per_chunk(8)
///     .output_path("reports/titanic.pdf")
///     .build()?;
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QualityConfig {
    /// Values with |z| strictly greater than this are anomalies.
    /// Default: 3.0
    pub z_threshold: f64,

    /// Maximum number of dataset columns in one statistics table.
    /// Default: 10
    pub max_columns_per_chunk: usize,

    /// Upper bound for a single statistics column width, in millimetres.
    /// Default: 30.0
    pub max_column_width_mm: f32,

    /// Width of rendered charts in pixels.
    /// Default: 900
    pub chart_width_px: u32,

    /// Height of rendered charts in pixels.
    /// Default: 600
    pub chart_height_px: u32,

    /// Number of leading bytes inspected when sniffing the delimiter.
    /// Default: 2048
    pub sniff_sample_bytes: usize,

    /// Number of rows used by polars to infer column types.
    /// Default: 100
    pub infer_schema_rows: usize,

    /// Title printed at the top of the report.
    pub report_title: String,

    /// Destination of the generated PDF.
    /// Default: "summary_report.pdf"
    pub output_path: PathBuf,
}

impl Default for QualityConfig {
    fn default() -> Self {
        Self {
            z_threshold: DEFAULT_Z_THRESHOLD,
            max_columns_per_chunk: DEFAULT_MAX_COLUMNS_PER_CHUNK,
            max_column_width_mm: 30.0,
            chart_width_px: 900,
            chart_height_px: 600,
            sniff_sample_bytes: 2048,
            infer_schema_rows: 100,
            report_title: "Data Quality Summary Report".to_string(),
            output_path: PathBuf::from(DEFAULT_REPORT_FILE),
        }
    }
}

impl QualityConfig {
    /// Create a new configuration builder.
    pub fn builder() -> QualityConfigBuilder {
        QualityConfigBuilder::default()
    }

    /// Validate the configuration and return errors if invalid.
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        if !self.z_threshold.is_finite() || self.z_threshold <= 0.0 {
            return Err(ConfigValidationError::InvalidThreshold(self.z_threshold));
        }

        if self.max_columns_per_chunk == 0 {
            return Err(ConfigValidationError::InvalidChunkSize(
                self.max_columns_per_chunk,
            ));
        }

        if !self.max_column_width_mm.is_finite() || self.max_column_width_mm <= 0.0 {
            return Err(ConfigValidationError::InvalidColumnWidth(
                self.max_column_width_mm,
            ));
        }

        if self.chart_width_px == 0 || self.chart_height_px == 0 {
            return Err(ConfigValidationError::InvalidChartSize {
                width: self.chart_width_px,
                height: self.chart_height_px,
            });
        }

        if self.sniff_sample_bytes == 0 {
            return Err(ConfigValidationError::InvalidSampleSize(
                self.sniff_sample_bytes,
            ));
        }

        Ok(())
    }
}

/// Errors that can occur during configuration validation.
#[derive(Debug, thiserror::Error)]
pub enum ConfigValidationError {
    #[error("Invalid z-score threshold: {0} (must be a positive finite number)")]
    InvalidThreshold(f64),

    #[error("Invalid columns per chunk: {0} (must be at least 1)")]
    InvalidChunkSize(usize),

    #[error("Invalid maximum column width: {0}mm (must be positive)")]
    InvalidColumnWidth(f32),

    #[error("Invalid chart size: {width}x{height} (both dimensions must be non-zero)")]
    InvalidChartSize { width: u32, height: u32 },

    #[error("Invalid sniff sample size: {0} (must be at least 1 byte)")]
    InvalidSampleSize(usize),
}

impl From<ConfigValidationError> for crate::error::QualityError {
    fn from(err: ConfigValidationError) -> Self {
        crate::error::QualityError::InvalidConfig(err.to_string())
    }
}

/// Builder for [`QualityConfig`] with fluent API.
#[derive(Debug, Default)]
pub struct QualityConfigBuilder {
    z_threshold: Option<f64>,
    max_columns_per_chunk: Option<usize>,
    max_column_width_mm: Option<f32>,
    chart_width_px: Option<u32>,
    chart_height_px: Option<u32>,
    sniff_sample_bytes: Option<usize>,
    infer_schema_rows: Option<usize>,
    report_title: Option<String>,
    output_path: Option<PathBuf>,
}

impl QualityConfigBuilder {
    /// Set the Z-score threshold used by the anomaly detector.
    pub fn z_threshold(mut self, threshold: f64) -> Self {
        self.z_threshold = Some(threshold);
        self
    }

    /// Set the maximum number of dataset columns per statistics table.
    ///
    /// Wider tables are split into several chunks separated by page breaks.
    pub fn max_columns_per_chunk(mut self, columns: usize) -> Self {
        self.max_columns_per_chunk = Some(columns);
        self
    }

    /// Set the maximum width of one statistics column in millimetres.
    pub fn max_column_width_mm(mut self, width: f32) -> Self {
        self.max_column_width_mm = Some(width);
        self
    }

    /// Set the pixel size of rendered charts.
    pub fn chart_size(mut self, width: u32, height: u32) -> Self {
        self.chart_width_px = Some(width);
        self.chart_height_px = Some(height);
        self
    }

    /// Set how many leading bytes are inspected when sniffing the delimiter.
    pub fn sniff_sample_bytes(mut self, bytes: usize) -> Self {
        self.sniff_sample_bytes = Some(bytes);
        self
    }

    /// Set how many rows polars uses to infer column types.
    pub fn infer_schema_rows(mut self, rows: usize) -> Self {
        self.infer_schema_rows = Some(rows);
        self
    }

    /// Set the report title.
    pub fn report_title(mut self, title: impl Into<String>) -> Self {
        self.report_title = Some(title.into());
        self
    }

    /// Set the report destination.
    pub fn output_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.output_path = Some(path.into());
        self
    }

    /// Build the configuration.
    ///
    /// Returns a validated `QualityConfig` or an error if validation fails.
    pub fn build(self) -> Result<QualityConfig, ConfigValidationError> {
        let defaults = QualityConfig::default();
        let config = QualityConfig {
            z_threshold: self.z_threshold.unwrap_or(defaults.z_threshold),
            max_columns_per_chunk: self
                .max_columns_per_chunk
                .unwrap_or(defaults.max_columns_per_chunk),
            max_column_width_mm: self
                .max_column_width_mm
                .unwrap_or(defaults.max_column_width_mm),
            chart_width_px: self.chart_width_px.unwrap_or(defaults.chart_width_px),
            chart_height_px: self.chart_height_px.unwrap_or(defaults.chart_height_px),
            sniff_sample_bytes: self
                .sniff_sample_bytes
                .unwrap_or(defaults.sniff_sample_bytes),
            infer_schema_rows: self
                .infer_schema_rows
                .unwrap_or(defaults.infer_schema_rows),
            report_title: self.report_title.unwrap_or(defaults.report_title),
            output_path: self.output_path.unwrap_or(defaults.output_path),
        };

        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = QualityConfig::default();
        assert_eq!(config.z_threshold, 3.0);
        assert_eq!(config.max_columns_per_chunk, 10);
        assert_eq!(config.sniff_sample_bytes, 2048);
        assert_eq!(config.output_path, PathBuf::from("summary_report.pdf"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_builder_custom_values() {
        let config = QualityConfig::builder()
            .z_threshold(2.5)
            .max_columns_per_chunk(4)
            .chart_size(640, 480)
            .output_path("out/report.pdf")
            .build()
            .unwrap();

        assert_eq!(config.z_threshold, 2.5);
        assert_eq!(config.max_columns_per_chunk, 4);
        assert_eq!(config.chart_width_px, 640);
        assert_eq!(config.chart_height_px, 480);
        assert_eq!(config.output_path, PathBuf::from("out/report.pdf"));
    }

    #[test]
    fn test_validation_invalid_threshold() {
        for bad in [0.0, -1.0, f64::NAN, f64::INFINITY] {
            let result = QualityConfig::builder().z_threshold(bad).build();
            assert!(matches!(
                result.unwrap_err(),
                ConfigValidationError::InvalidThreshold(_)
            ));
        }
    }

    #[test]
    fn test_validation_invalid_chunk_size() {
        let result = QualityConfig::builder().max_columns_per_chunk(0).build();
        assert!(matches!(
            result.unwrap_err(),
            ConfigValidationError::InvalidChunkSize(0)
        ));
    }

    #[test]
    fn test_validation_invalid_chart_size() {
        let result = QualityConfig::builder().chart_size(0, 400).build();
        assert!(matches!(
            result.unwrap_err(),
            ConfigValidationError::InvalidChartSize { .. }
        ));
    }

    #[test]
    fn test_config_from_json() {
        let json = r#"{
            "z_threshold": 2.0,
            "max_columns_per_chunk": 6,
            "max_column_width_mm": 25.0,
            "chart_width_px": 800,
            "chart_height_px": 500,
            "sniff_sample_bytes": 4096,
            "infer_schema_rows": 50,
            "report_title": "Weekly export",
            "output_path": "weekly.pdf"
        }"#;

        let config: QualityConfig = serde_json::from_str(json).expect("valid config JSON");
        assert_eq!(config.z_threshold, 2.0);
        assert_eq!(config.max_columns_per_chunk, 6);
        assert_eq!(config.report_title, "Weekly export");
        assert!(config.validate().is_ok());
    }
}
