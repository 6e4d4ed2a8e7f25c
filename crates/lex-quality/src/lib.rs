//! Data Quality Inspection Library
//!
//! Inspects a CSV dataset for missing values, duplicate rows, schema and
//! statistical outliers, renders the findings as charts and exports a PDF
//! summary report. Built on Polars.
//!
//! # Overview
//!
//! - **Loading**: encoding detection, delimiter sniffing and bad-row recovery
//! - **Quality Inspection**: null counts, duplicate rows, declared types and
//!   describe-style statistics
//! - **Anomaly Detection**: per-column Z-score flagging with a configurable
//!   threshold
//! - **Charts**: scatter and box plots with anomaly overlays, and a
//!   missing-value heatmap, rendered to SVG or raster
//! - **Reports**: paginated A4 PDF with chunked statistics tables and
//!   embedded charts, written atomically
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use lex_quality::{
//!     AnomalyDetector, ChartRenderer, QualityConfig, QualityInspector, ReportBuilder, loader,
//! };
//!
//! let config = QualityConfig::builder()
//!     .z_threshold(3.0)
//!     .max_columns_per_chunk(10)
//!     .output_path("summary_report.pdf")
//!     .build()?;
//!
//! let loaded = loader::load_csv_path("data.csv", &config)?;
//! let df = &loaded.frame;
//!
//! let summary = QualityInspector::summarize(df)?;
//! let anomalies = AnomalyDetector::detect(df, config.z_threshold)?;
//!
//! let charts = vec![(
//!     "Missing Values Heatmap".to_string(),
//!     ChartRenderer::missing_heatmap(df),
//! )];
//!
//! ReportBuilder::new(config.clone())
//!     .build(df, &summary, charts, &anomalies)?
//!     .write_pdf(&config.output_path)?;
//! ```
//!
//! # Anomaly Policy
//!
//! Detection reports one [`AnomalyRecord`] per offending cell. A row that is
//! extreme in two columns appears twice; use
//! [`AnomalyDetector::flagged_row_indices`] when a per-row view is needed.
//! Columns without spread never produce anomalies.

pub mod anomaly;
pub mod charts;
pub mod config;
pub mod error;
pub mod loader;
pub mod quality;
pub mod report;
pub mod types;
pub mod utils;

// Re-exports for convenient access
pub use anomaly::AnomalyDetector;
pub use charts::{Chart, ChartKind, ChartRenderer};
pub use config::{ConfigValidationError, QualityConfig, QualityConfigBuilder};
pub use error::{QualityError, Result as QualityResult, ResultExt};
pub use loader::{LoadReport, LoadedTable, load_csv_bytes, load_csv_path};
pub use quality::{QualityInspector, Statistic, describe};
pub use report::{AnalysisSummary, AnomalySummary, LayoutBlock, Report, ReportBuilder};
pub use types::{
    AnomalyRecord, ColumnKind, ColumnQuality, ColumnStatistics, QualitySummary,
};
pub use utils::{DtypeCategory, get_dtype_category, is_numeric_dtype, numeric_column_names};
