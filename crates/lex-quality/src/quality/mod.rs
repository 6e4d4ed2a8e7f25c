//! Data quality inspection module.
//!
//! Null counts, duplicate rows, declared types and describe-style statistics,
//! all computed without touching the input table.

mod inspector;
mod statistics;

pub use inspector::QualityInspector;
pub use statistics::{Statistic, applicable_statistics, describe, describe_series};
