use crate::anomaly::AnomalyDetector;
use crate::loader::LoadReport;
use crate::types::{AnomalyRecord, ColumnStatistics, QualitySummary};
use chrono::Local;
use serde::Serialize;

/// Machine-readable counterpart of the PDF, for `--json` output.
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisSummary {
    /// Timestamp when the summary was generated
    pub generated_at: String,
    pub input_file: String,
    /// Path of the written PDF, if one was written
    pub report_file: Option<String>,
    pub load: LoadReport,
    pub quality: QualitySummary,
    pub statistics: Vec<ColumnStatistics>,
    pub anomalies: AnomalySummary,
}

#[derive(Debug, Clone, Serialize)]
pub struct AnomalySummary {
    pub threshold: f64,
    pub total: usize,
    /// Distinct rows with at least one flagged value
    pub rows_flagged: usize,
    pub by_column: Vec<(String, usize)>,
    pub records: Vec<AnomalyRecord>,
}

impl AnomalySummary {
    pub fn new(threshold: f64, records: Vec<AnomalyRecord>) -> Self {
        Self {
            threshold,
            total: records.len(),
            rows_flagged: AnomalyDetector::flagged_row_indices(&records).len(),
            by_column: AnomalyDetector::counts_by_column(&records),
            records,
        }
    }
}

impl AnalysisSummary {
    pub fn new(
        input_file: impl Into<String>,
        report_file: Option<String>,
        load: LoadReport,
        quality: QualitySummary,
        statistics: Vec<ColumnStatistics>,
        anomalies: AnomalySummary,
    ) -> Self {
        Self {
            generated_at: Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
            input_file: input_file.into(),
            report_file,
            load,
            quality,
            statistics,
            anomalies,
        }
    }
}
