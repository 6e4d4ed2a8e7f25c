//! Describe-style summary statistics for every column.

use crate::error::Result;
use crate::types::ColumnStatistics;
use crate::utils::{
    format_number, is_numeric_dtype, quantile_sorted, sample_std, series_string_values,
    sorted_finite,
};
use polars::prelude::*;
use std::collections::HashMap;

/// One row of the statistics table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Statistic {
    Count,
    Unique,
    Top,
    Freq,
    Mean,
    Std,
    Min,
    Q25,
    Q50,
    Q75,
    Max,
}

impl Statistic {
    pub const ALL: [Statistic; 11] = [
        Statistic::Count,
        Statistic::Unique,
        Statistic::Top,
        Statistic::Freq,
        Statistic::Mean,
        Statistic::Std,
        Statistic::Min,
        Statistic::Q25,
        Statistic::Q50,
        Statistic::Q75,
        Statistic::Max,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Statistic::Count => "count",
            Statistic::Unique => "unique",
            Statistic::Top => "top",
            Statistic::Freq => "freq",
            Statistic::Mean => "mean",
            Statistic::Std => "std",
            Statistic::Min => "min",
            Statistic::Q25 => "25%",
            Statistic::Q50 => "50%",
            Statistic::Q75 => "75%",
            Statistic::Max => "max",
        }
    }
}

impl ColumnStatistics {
    /// Display value of one statistic, `None` when it does not apply.
    pub fn value(&self, stat: Statistic) -> Option<String> {
        match stat {
            Statistic::Count => Some(self.count.to_string()),
            Statistic::Unique => self.unique.map(|u| u.to_string()),
            Statistic::Top => self.top.clone(),
            Statistic::Freq => self.freq.map(|f| f.to_string()),
            Statistic::Mean => self.mean.map(format_number),
            Statistic::Std => self.std.map(format_number),
            Statistic::Min => self.min.map(format_number),
            Statistic::Q25 => self.q25.map(format_number),
            Statistic::Q50 => self.q50.map(format_number),
            Statistic::Q75 => self.q75.map(format_number),
            Statistic::Max => self.max.map(format_number),
        }
    }

    /// Table cell text; missing statistics render blank.
    pub fn cell(&self, stat: Statistic) -> String {
        self.value(stat).unwrap_or_default()
    }
}

/// Statistics to show for a set of columns: `count` always, the rest only
/// when at least one column has a value for them.
pub fn applicable_statistics(stats: &[ColumnStatistics]) -> Vec<Statistic> {
    Statistic::ALL
        .into_iter()
        .filter(|&stat| {
            stat == Statistic::Count || stats.iter().any(|s| s.value(stat).is_some())
        })
        .collect()
}

/// Compute describe-style statistics for every column, in table order.
///
/// Numeric columns get mean, sample std, min, quartiles and max. Every other
/// column gets unique, top and freq over its display strings.
pub fn describe(df: &DataFrame) -> Result<Vec<ColumnStatistics>> {
    df.get_columns()
        .iter()
        .map(|col| describe_series(col.as_materialized_series()))
        .collect()
}

/// Compute statistics for a single series.
pub fn describe_series(series: &Series) -> Result<ColumnStatistics> {
    if is_numeric_dtype(series.dtype()) {
        describe_numeric(series)
    } else {
        describe_categorical(series)
    }
}

fn describe_numeric(series: &Series) -> Result<ColumnStatistics> {
    let floats = series.cast(&DataType::Float64)?;
    let sorted = sorted_finite(floats.f64()?.into_iter().flatten());

    let mean = if sorted.is_empty() {
        None
    } else {
        Some(sorted.iter().sum::<f64>() / sorted.len() as f64)
    };

    Ok(ColumnStatistics {
        name: series.name().to_string(),
        count: sorted.len(),
        mean,
        std: sample_std(&sorted),
        min: sorted.first().copied(),
        q25: quantile_sorted(&sorted, 0.25),
        q50: quantile_sorted(&sorted, 0.5),
        q75: quantile_sorted(&sorted, 0.75),
        max: sorted.last().copied(),
        ..Default::default()
    })
}

fn describe_categorical(series: &Series) -> Result<ColumnStatistics> {
    let values = series_string_values(series)?;

    // value -> (count, first position)
    let mut tally: HashMap<String, (usize, usize)> = HashMap::new();
    let mut count = 0;
    for (pos, value) in values.into_iter().enumerate() {
        if let Some(v) = value {
            count += 1;
            tally.entry(v).or_insert((0, pos)).0 += 1;
        }
    }

    // Most frequent; ties go to the value seen first.
    let top = tally
        .iter()
        .max_by(|a, b| a.1.0.cmp(&b.1.0).then(b.1.1.cmp(&a.1.1)))
        .map(|(value, (freq, _))| (value.clone(), *freq));

    Ok(ColumnStatistics {
        name: series.name().to_string(),
        count,
        unique: Some(tally.len()),
        top: top.as_ref().map(|(v, _)| v.clone()),
        freq: top.map(|(_, f)| f),
        ..Default::default()
    })
}
