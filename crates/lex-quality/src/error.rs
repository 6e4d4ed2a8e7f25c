//! Error types for data quality inspection and report generation.
//!
//! Errors are serializable as `{code, message}` so the CLI can emit them in
//! `--json` mode alongside regular results.

use serde::Serialize;
use serde::ser::SerializeStruct;
use thiserror::Error;

/// The main error type for loading, inspection, charting and reporting.
#[derive(Error, Debug)]
pub enum QualityError {
    /// Column was not found in the dataset.
    #[error("Column '{0}' not found in dataset")]
    ColumnNotFound(String),

    /// Invalid configuration or argument.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// The input could not be turned into a table at all.
    #[error("Failed to load dataset: {0}")]
    LoadFailed(String),

    /// A chart could not be drawn by the plotting backend.
    #[error("Failed to render chart '{chart}': {reason}")]
    ChartRenderFailed { chart: String, reason: String },

    /// The report could not be serialized or written.
    #[error("Failed to write report: {0}")]
    ReportWriteFailed(String),

    /// IO error wrapper.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Polars error wrapper.
    #[error("Polars error: {0}")]
    Polars(#[from] polars::error::PolarsError),

    /// JSON serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic error with context.
    #[error("{context}: {source}")]
    WithContext {
        context: String,
        #[source]
        source: Box<QualityError>,
    },
}

impl QualityError {
    /// Add context to an error.
    pub fn with_context(self, context: impl Into<String>) -> Self {
        QualityError::WithContext {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// Stable error code for machine-readable output.
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::ColumnNotFound(_) => "COLUMN_NOT_FOUND",
            Self::InvalidConfig(_) => "INVALID_CONFIG",
            Self::LoadFailed(_) => "LOAD_FAILED",
            Self::ChartRenderFailed { .. } => "CHART_RENDER_FAILED",
            Self::ReportWriteFailed(_) => "REPORT_WRITE_FAILED",
            Self::Io(_) => "IO_ERROR",
            Self::Polars(_) => "POLARS_ERROR",
            Self::Json(_) => "JSON_ERROR",
            Self::WithContext { source, .. } => source.error_code(),
        }
    }

    /// Check if the user can fix this by changing the input or arguments.
    pub fn is_user_error(&self) -> bool {
        match self {
            Self::ColumnNotFound(_) | Self::InvalidConfig(_) | Self::LoadFailed(_) => true,
            Self::WithContext { source, .. } => source.is_user_error(),
            _ => false,
        }
    }
}

impl Serialize for QualityError {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let mut state = serializer.serialize_struct("QualityError", 2)?;
        state.serialize_field("code", &self.error_code())?;
        state.serialize_field("message", &self.to_string())?;
        state.end()
    }
}

/// Result type alias for quality operations.
pub type Result<T> = std::result::Result<T, QualityError>;

/// Extension trait for adding context to Results.
pub trait ResultExt<T> {
    /// Add context to an error result.
    fn context(self, context: impl Into<String>) -> Result<T>;
}

impl<T> ResultExt<T> for Result<T> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| e.with_context(context))
    }
}

impl<T> ResultExt<T> for std::result::Result<T, polars::error::PolarsError> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| QualityError::Polars(e).with_context(context))
    }
}
