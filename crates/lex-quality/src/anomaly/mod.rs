//! Z-score anomaly detection.
//!
//! For every numeric column the mean and population standard deviation are
//! taken over the non-null values, and each value with `|z| > threshold` is
//! flagged. Columns without spread are never flagged.
//!
//! Results are per cell: a row that is extreme in two columns yields two
//! [`AnomalyRecord`](crate::types::AnomalyRecord)s. Use
//! [`AnomalyDetector::flagged_row_indices`] for the row-level view.
//!
//! # Example
//!
//! ```rust,ignore
//! use lex_quality::anomaly::AnomalyDetector;
//!
//! let records = AnomalyDetector::detect(&df, 3.0)?;
//! for r in &records {
//!     println!("row {} in '{}': {} (z = {:.2})", r.row_index, r.column, r.value, r.z_score);
//! }
//! ```

mod detector;

pub use detector::{ANOMALY_COLUMN, AnomalyDetector, MIN_STD};
