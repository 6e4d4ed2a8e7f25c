//! Chart construction and rendering.
//!
//! [`ChartRenderer`] turns a table into backend-independent [`Chart`]
//! descriptions; [`Chart::to_svg`] and [`Chart::into_rgb`] draw them with
//! plotters. A chart asked for a missing or non-numeric column comes back as
//! a [`ChartKind::Placeholder`] carrying the reason.

mod render;

use crate::error::Result;
use crate::types::AnomalyRecord;
use crate::utils::{column_f64_values, is_numeric_column};
use polars::prelude::*;
use static_assertions::assert_impl_all;
use std::collections::HashSet;
use tracing::debug;

pub const HEATMAP_TITLE: &str = "Missing Values Percentage by Column";

/// An owned figure, ready to be rendered.
#[derive(Debug, Clone, PartialEq)]
pub struct Chart {
    pub title: String,
    pub kind: ChartKind,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ChartKind {
    Scatter {
        x_label: String,
        y_label: String,
        points: Vec<(f64, f64)>,
        /// Overlay drawn in red; empty means no overlay and no legend.
        anomalies: Vec<(f64, f64)>,
    },
    /// Horizontal box plot of one column.
    BoxPlot {
        column: String,
        values: Vec<f64>,
        anomalies: Vec<f64>,
    },
    /// Single-row grid of per-column missing percentages.
    Heatmap { cells: Vec<(String, f64)> },
    Placeholder { message: String },
}

assert_impl_all!(Chart: Send, Sync);

impl Chart {
    fn placeholder(title: String, message: String) -> Self {
        debug!("Placeholder chart '{}': {}", title, message);
        Self {
            title,
            kind: ChartKind::Placeholder { message },
        }
    }

    pub fn is_placeholder(&self) -> bool {
        matches!(self.kind, ChartKind::Placeholder { .. })
    }

    /// Whether an anomaly overlay will be drawn.
    pub fn has_overlay(&self) -> bool {
        match &self.kind {
            ChartKind::Scatter { anomalies, .. } => !anomalies.is_empty(),
            ChartKind::BoxPlot { anomalies, .. } => !anomalies.is_empty(),
            _ => false,
        }
    }
}

/// Builds charts from a table and an optional anomaly set.
pub struct ChartRenderer;

impl ChartRenderer {
    /// Scatter plot of `y` against `x`, overlaying rows flagged in either column.
    pub fn scatter(df: &DataFrame, x: &str, y: &str, anomalies: &[AnomalyRecord]) -> Result<Chart> {
        let base_title = format!("Scatter Plot ({} vs {})", x, y);
        for column in [x, y] {
            if !is_numeric_column(df, column) {
                return Ok(Chart::placeholder(
                    base_title,
                    non_numeric_message(df, column),
                ));
            }
        }

        let xs = column_f64_values(df, x)?;
        let ys = column_f64_values(df, y)?;
        let flagged: HashSet<usize> = anomalies
            .iter()
            .filter(|a| a.column == x || a.column == y)
            .map(|a| a.row_index)
            .collect();

        let mut points = Vec::with_capacity(xs.len());
        let mut overlay = Vec::new();
        for (row, (xv, yv)) in xs.into_iter().zip(ys).enumerate() {
            let (Some(xv), Some(yv)) = (xv, yv) else {
                continue;
            };
            if !xv.is_finite() || !yv.is_finite() {
                continue;
            }
            points.push((xv, yv));
            if flagged.contains(&row) {
                overlay.push((xv, yv));
            }
        }

        let title = if overlay.is_empty() {
            base_title
        } else {
            format!("Scatter Plot with Anomalies ({} vs {})", x, y)
        };
        Ok(Chart {
            title,
            kind: ChartKind::Scatter {
                x_label: x.to_string(),
                y_label: y.to_string(),
                points,
                anomalies: overlay,
            },
        })
    }

    /// Box plot of one column, overlaying that column's anomalies.
    pub fn box_plot(df: &DataFrame, column: &str, anomalies: &[AnomalyRecord]) -> Result<Chart> {
        let base_title = format!("Box Plot ({})", column);
        if !is_numeric_column(df, column) {
            return Ok(Chart::placeholder(
                base_title,
                non_numeric_message(df, column),
            ));
        }

        let values: Vec<f64> = column_f64_values(df, column)?
            .into_iter()
            .flatten()
            .filter(|v| v.is_finite())
            .collect();
        if values.is_empty() {
            return Ok(Chart::placeholder(
                base_title,
                format!("Column '{}' has no values", column),
            ));
        }

        let overlay: Vec<f64> = anomalies
            .iter()
            .filter(|a| a.column == column)
            .map(|a| a.value)
            .collect();

        let title = if overlay.is_empty() {
            base_title
        } else {
            format!("Box Plot with Anomalies ({})", column)
        };
        Ok(Chart {
            title,
            kind: ChartKind::BoxPlot {
                column: column.to_string(),
                values,
                anomalies: overlay,
            },
        })
    }

    /// Percentage of missing cells per column.
    pub fn missing_heatmap(df: &DataFrame) -> Chart {
        let height = df.height();
        let cells = df
            .get_columns()
            .iter()
            .map(|col| {
                let pct = if height == 0 {
                    0.0
                } else {
                    100.0 * col.null_count() as f64 / height as f64
                };
                (col.name().to_string(), pct)
            })
            .collect();

        Chart {
            title: HEATMAP_TITLE.to_string(),
            kind: ChartKind::Heatmap { cells },
        }
    }
}

fn non_numeric_message(df: &DataFrame, column: &str) -> String {
    match df.column(column) {
        Ok(col) => format!(
            "Column '{}' is {:?}, not numeric; nothing to plot",
            column,
            col.dtype()
        ),
        Err(_) => format!("Column '{}' does not exist", column),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn record(row: usize, column: &str, value: f64) -> AnomalyRecord {
        AnomalyRecord {
            row_index: row,
            column: column.to_string(),
            value,
            z_score: 4.0,
        }
    }

    fn sample_df() -> DataFrame {
        df![
            "x" => [Some(1.0), Some(2.0), Some(3.0), None, Some(50.0)],
            "y" => [Some(10.0), Some(20.0), Some(30.0), Some(40.0), Some(45.0)],
            "name" => ["a", "b", "c", "d", "e"],
        ]
        .unwrap()
    }

    // ==================== scatter tests ====================

    #[test]
    fn test_scatter_without_anomalies_has_no_overlay() {
        let chart = ChartRenderer::scatter(&sample_df(), "x", "y", &[]).unwrap();
        assert_eq!(chart.title, "Scatter Plot (x vs y)");
        assert!(!chart.has_overlay());
        match chart.kind {
            ChartKind::Scatter { points, .. } => assert_eq!(points.len(), 4),
            other => panic!("unexpected chart kind: {:?}", other),
        }
    }

    #[test]
    fn test_scatter_overlays_rows_flagged_in_either_axis() {
        let anomalies = vec![
            record(4, "x", 50.0),
            record(1, "y", 20.0),
            record(0, "other", 1.0),
            // row 3 has no x value, so it cannot be plotted
            record(3, "y", 40.0),
        ];
        let chart = ChartRenderer::scatter(&sample_df(), "x", "y", &anomalies).unwrap();
        assert_eq!(chart.title, "Scatter Plot with Anomalies (x vs y)");
        match chart.kind {
            ChartKind::Scatter { anomalies, .. } => {
                assert_eq!(anomalies, vec![(2.0, 20.0), (50.0, 45.0)]);
            }
            other => panic!("unexpected chart kind: {:?}", other),
        }
    }

    #[test]
    fn test_scatter_non_numeric_is_placeholder() {
        let chart = ChartRenderer::scatter(&sample_df(), "x", "name", &[]).unwrap();
        assert!(chart.is_placeholder());

        let chart = ChartRenderer::scatter(&sample_df(), "missing", "y", &[]).unwrap();
        match chart.kind {
            ChartKind::Placeholder { message } => assert!(message.contains("does not exist")),
            other => panic!("unexpected chart kind: {:?}", other),
        }
    }

    // ==================== box_plot tests ====================

    #[test]
    fn test_box_plot_overlay_only_for_its_column() {
        let anomalies = vec![record(4, "x", 50.0), record(1, "y", 20.0)];
        let chart = ChartRenderer::box_plot(&sample_df(), "x", &anomalies).unwrap();
        assert_eq!(chart.title, "Box Plot with Anomalies (x)");
        match chart.kind {
            ChartKind::BoxPlot {
                values, anomalies, ..
            } => {
                assert_eq!(values, vec![1.0, 2.0, 3.0, 50.0]);
                assert_eq!(anomalies, vec![50.0]);
            }
            other => panic!("unexpected chart kind: {:?}", other),
        }
    }

    #[test]
    fn test_box_plot_all_null_is_placeholder() {
        let df = df!["v" => [None::<f64>, None]].unwrap();
        let chart = ChartRenderer::box_plot(&df, "v", &[]).unwrap();
        assert!(chart.is_placeholder());
        assert_eq!(chart.title, "Box Plot (v)");
    }

    // ==================== missing_heatmap tests ====================

    #[test]
    fn test_missing_heatmap_percentages() {
        let df = df![
            "a" => [Some(1), None, None, Some(4)],
            "b" => [Some("x"), Some("y"), Some("z"), None],
        ]
        .unwrap();
        let chart = ChartRenderer::missing_heatmap(&df);
        assert_eq!(chart.title, HEATMAP_TITLE);
        assert_eq!(
            chart.kind,
            ChartKind::Heatmap {
                cells: vec![("a".to_string(), 50.0), ("b".to_string(), 25.0)]
            }
        );
    }

    #[test]
    fn test_missing_heatmap_empty_table() {
        let df = df!["a" => Vec::<i64>::new()].unwrap();
        let chart = ChartRenderer::missing_heatmap(&df);
        assert_eq!(
            chart.kind,
            ChartKind::Heatmap {
                cells: vec![("a".to_string(), 0.0)]
            }
        );
    }
}
