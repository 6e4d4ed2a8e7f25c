use super::Report;
use super::blocks::{ImageBlock, LayoutBlock, TableBlock, TableKind, available_width_mm};
use crate::anomaly::AnomalyDetector;
use crate::charts::{Chart, ChartRenderer};
use crate::config::QualityConfig;
use crate::error::{Result, ResultExt};
use crate::quality::{applicable_statistics, describe};
use crate::types::{AnomalyRecord, ColumnStatistics, QualitySummary};
use chrono::Local;
use polars::prelude::*;
use tracing::{debug, info};

pub const SCHEMA_HEADING: &str = "Data Schema";
pub const STATISTICS_HEADING: &str = "Summary Statistics";
pub const BOX_PLOTS_HEADING: &str = "Box Plots with Anomalies";

/// Widest an embedded chart may print.
const IMAGE_WIDTH_MM: f32 = 160.0;

/// Assembles the report flow from a table and its derived quality data.
pub struct ReportBuilder {
    config: QualityConfig,
}

impl ReportBuilder {
    pub fn new(config: QualityConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &QualityConfig {
        &self.config
    }

    /// Build the report.
    ///
    /// `charts` are named figures placed after the statistics; each is
    /// rasterised and dropped as soon as its image block exists. A box plot
    /// per numeric column follows them.
    pub fn build(
        &self,
        df: &DataFrame,
        summary: &QualitySummary,
        charts: Vec<(String, Chart)>,
        anomalies: &[AnomalyRecord],
    ) -> Result<Report> {
        // Configs deserialised or assembled field by field skip the builder.
        self.config.validate()?;
        let mut blocks = Vec::new();

        self.push_overview(&mut blocks, summary, anomalies);
        self.push_schema(&mut blocks, summary);

        let statistics = describe(df).context("Computing summary statistics")?;
        self.push_statistics(&mut blocks, &statistics);

        for (name, chart) in charts {
            blocks.push(LayoutBlock::Heading(name));
            blocks.push(LayoutBlock::Image(self.rasterize(chart)?));
        }

        let numeric = summary.numeric_columns();
        if numeric.is_empty() {
            debug!("No numeric columns; box plot section omitted");
        } else {
            blocks.push(LayoutBlock::Heading(BOX_PLOTS_HEADING.to_string()));
            for column in numeric {
                let chart = ChartRenderer::box_plot(df, column, anomalies)?;
                blocks.push(LayoutBlock::Heading(format!("Box plot: {}", column)));
                blocks.push(LayoutBlock::Image(self.rasterize(chart)?));
            }
        }

        info!("Report assembled: {} layout blocks", blocks.len());
        Ok(Report::new(self.config.report_title.clone(), blocks))
    }

    fn push_overview(
        &self,
        blocks: &mut Vec<LayoutBlock>,
        summary: &QualitySummary,
        anomalies: &[AnomalyRecord],
    ) {
        blocks.push(LayoutBlock::Title(self.config.report_title.clone()));
        blocks.push(LayoutBlock::Paragraph(format!(
            "Generated: {}",
            Local::now().format("%Y-%m-%d %H:%M:%S")
        )));
        blocks.push(LayoutBlock::Paragraph(format!(
            "Dataset shape: {} rows x {} columns",
            summary.row_count, summary.column_count
        )));
        blocks.push(LayoutBlock::Paragraph(format!(
            "Duplicate rows: {}",
            summary.duplicate_count
        )));
        blocks.push(LayoutBlock::Paragraph(format!(
            "Missing cells: {}",
            summary.total_nulls()
        )));
        blocks.push(LayoutBlock::Paragraph(format!(
            "Anomalies (|z| > {}): {} values in {} rows",
            self.config.z_threshold,
            anomalies.len(),
            AnomalyDetector::flagged_row_indices(anomalies).len()
        )));
        blocks.push(LayoutBlock::Spacer(6.0));
    }

    fn push_schema(&self, blocks: &mut Vec<LayoutBlock>, summary: &QualitySummary) {
        let available = available_width_mm();
        blocks.push(LayoutBlock::Heading(SCHEMA_HEADING.to_string()));
        blocks.push(LayoutBlock::Table(TableBlock {
            kind: TableKind::Schema,
            header: vec![
                "Column".to_string(),
                "Type".to_string(),
                "Non-null count".to_string(),
            ],
            rows: summary
                .columns
                .iter()
                .map(|c| vec![c.name.clone(), c.dtype.clone(), c.non_null_count.to_string()])
                .collect(),
            col_widths: vec![available * 0.45, available * 0.30, available * 0.25],
        }));
        blocks.push(LayoutBlock::Spacer(6.0));
    }

    /// One table per chunk of columns, with a page break between chunks.
    fn push_statistics(&self, blocks: &mut Vec<LayoutBlock>, statistics: &[ColumnStatistics]) {
        blocks.push(LayoutBlock::Heading(STATISTICS_HEADING.to_string()));
        if statistics.is_empty() {
            blocks.push(LayoutBlock::Paragraph("No columns to describe.".to_string()));
            return;
        }

        let rows = applicable_statistics(statistics);
        let chunks: Vec<&[ColumnStatistics]> = statistics
            .chunks(self.config.max_columns_per_chunk)
            .collect();
        debug!(
            "Statistics split into {} chunks of at most {} columns",
            chunks.len(),
            self.config.max_columns_per_chunk
        );

        for (i, chunk) in chunks.iter().enumerate() {
            if i > 0 {
                blocks.push(LayoutBlock::PageBreak);
            }
            let width = self.chunk_column_width(chunk.len());

            let mut header = Vec::with_capacity(chunk.len() + 1);
            header.push(String::new());
            header.extend(chunk.iter().map(|s| s.name.clone()));

            let body = rows
                .iter()
                .map(|&stat| {
                    let mut row = Vec::with_capacity(chunk.len() + 1);
                    row.push(stat.label().to_string());
                    row.extend(chunk.iter().map(|s| s.cell(stat)));
                    row
                })
                .collect();

            blocks.push(LayoutBlock::Table(TableBlock {
                kind: TableKind::Statistics,
                header,
                rows: body,
                col_widths: vec![width; chunk.len() + 1],
            }));
        }
        blocks.push(LayoutBlock::Spacer(6.0));
    }

    /// Column width for a chunk of `columns` data columns plus the label column.
    pub fn chunk_column_width(&self, columns: usize) -> f32 {
        let fit = available_width_mm() / (columns + 1) as f32;
        fit.min(self.config.max_column_width_mm)
    }

    fn rasterize(&self, chart: Chart) -> Result<ImageBlock> {
        let (width_px, height_px) = (self.config.chart_width_px, self.config.chart_height_px);
        let title = chart.title.clone();
        let rgb = chart.into_rgb(width_px, height_px)?;
        debug!("Rasterised chart '{}' at {}x{}", title, width_px, height_px);
        Ok(ImageBlock {
            width_px,
            height_px,
            rgb,
            width_mm: IMAGE_WIDTH_MM.min(available_width_mm()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::QualityError;
    use crate::quality::QualityInspector;
    use pretty_assertions::assert_eq;

    fn small_config() -> QualityConfig {
        QualityConfig::builder()
            .chart_size(120, 80)
            .build()
            .unwrap()
    }

    fn wide_numeric_df(columns: usize) -> DataFrame {
        let cols: Vec<Column> = (0..columns)
            .map(|i| {
                Column::new(
                    format!("c{}", i).into(),
                    &[i as f64, i as f64 + 1.0, i as f64 * 2.0],
                )
            })
            .collect();
        DataFrame::new(cols).unwrap()
    }

    fn build(df: &DataFrame, config: QualityConfig) -> Report {
        let summary = QualityInspector::summarize(df).unwrap();
        let anomalies = AnomalyDetector::detect(df, config.z_threshold).unwrap();
        ReportBuilder::new(config)
            .build(df, &summary, Vec::new(), &anomalies)
            .unwrap()
    }

    // ==================== config validation tests ====================

    #[test]
    fn test_zero_chunk_size_is_rejected() {
        let df = wide_numeric_df(3);
        let summary = QualityInspector::summarize(&df).unwrap();
        let config = QualityConfig {
            max_columns_per_chunk: 0,
            ..small_config()
        };

        let result = ReportBuilder::new(config).build(&df, &summary, Vec::new(), &[]);
        assert!(matches!(result, Err(QualityError::InvalidConfig(_))));
    }

    // ==================== statistics chunking tests ====================

    #[test]
    fn test_twenty_five_columns_make_three_chunks() {
        let config = QualityConfig::builder()
            .chart_size(120, 80)
            .max_columns_per_chunk(10)
            .build()
            .unwrap();
        let report = build(&wide_numeric_df(25), config);

        let tables = report.statistics_tables();
        assert_eq!(tables.len(), 3);
        assert_eq!(report.page_break_count(), 2);
        // label column plus data columns
        let widths: Vec<usize> = tables.iter().map(|t| t.header.len()).collect();
        assert_eq!(widths, vec![11, 11, 6]);
    }

    #[test]
    fn test_page_breaks_only_between_chunks() {
        let report = build(&wide_numeric_df(25), small_config());
        let blocks = report.blocks();
        for (i, block) in blocks.iter().enumerate() {
            if matches!(block, LayoutBlock::PageBreak) {
                assert!(matches!(blocks[i - 1], LayoutBlock::Table(_)));
                assert!(matches!(
                    &blocks[i + 1],
                    LayoutBlock::Table(t) if t.kind == TableKind::Statistics
                ));
            }
        }
    }

    #[test]
    fn test_single_chunk_has_no_page_break() {
        let report = build(&wide_numeric_df(3), small_config());
        assert_eq!(report.statistics_tables().len(), 1);
        assert_eq!(report.page_break_count(), 0);
    }

    #[test]
    fn test_chunk_column_width_is_capped() {
        let builder = ReportBuilder::new(QualityConfig::default());
        // 170mm / 3 would exceed the 30mm cap
        assert_eq!(builder.chunk_column_width(2), 30.0);
        // 170mm / 11
        assert!((builder.chunk_column_width(10) - 170.0 / 11.0).abs() < 1e-4);
    }

    #[test]
    fn test_statistics_rows_and_labels() {
        let df = df![
            "n" => [1.0, 2.0, 3.0],
            "s" => ["a", "a", "b"],
        ]
        .unwrap();
        let report = build(&df, small_config());
        let table = report.statistics_tables()[0];

        assert_eq!(table.header, vec!["", "n", "s"]);
        let labels: Vec<&str> = table.rows.iter().map(|r| r[0].as_str()).collect();
        assert_eq!(
            labels,
            vec!["count", "unique", "top", "freq", "mean", "std", "min", "25%", "50%", "75%", "max"]
        );
        // numeric column has no "top"; text column has no "mean"
        assert_eq!(table.rows[2], vec!["top", "", "a"]);
        assert_eq!(table.rows[4], vec!["mean", "2", ""]);
    }

    #[test]
    fn test_all_null_column_renders_blank_cells() {
        let df = df![
            "full" => [1.0, 2.0, 3.0],
            "empty" => [None::<f64>, None, None],
        ]
        .unwrap();
        let report = build(&df, small_config());
        let table = report.statistics_tables()[0];

        assert_eq!(table.header, vec!["", "full", "empty"]);
        assert_eq!(table.rows[0], vec!["count", "3", "0"]);
        for row in &table.rows[1..] {
            assert_eq!(row.len(), 3);
            assert_eq!(row[2], "");
        }
    }

    // ==================== section tests ====================

    #[test]
    fn test_zero_numeric_columns_omits_box_plots() {
        let df = df![
            "name" => ["a", "b", "a"],
            "city" => ["x", "y", "z"],
        ]
        .unwrap();
        let report = build(&df, small_config());

        assert!(!report.headings().contains(&BOX_PLOTS_HEADING));
        assert_eq!(report.image_count(), 0);
        assert_eq!(report.statistics_tables().len(), 1);
    }

    #[test]
    fn test_box_plot_per_numeric_column() {
        let df = df![
            "a" => [1.0, 2.0, 3.0],
            "b" => [4i64, 5, 6],
            "s" => ["x", "y", "z"],
        ]
        .unwrap();
        let report = build(&df, small_config());
        let headings = report.headings();

        assert!(headings.contains(&BOX_PLOTS_HEADING));
        assert!(headings.contains(&"Box plot: a"));
        assert!(headings.contains(&"Box plot: b"));
        assert!(!headings.contains(&"Box plot: s"));
        assert_eq!(report.image_count(), 2);
    }

    #[test]
    fn test_named_charts_become_titled_images() {
        let df = df!["a" => [1.0, 2.0], "b" => [3.0, 4.0]].unwrap();
        let summary = QualityInspector::summarize(&df).unwrap();
        let charts = vec![
            (
                "Missing Values Heatmap".to_string(),
                ChartRenderer::missing_heatmap(&df),
            ),
            (
                "Anomaly Scatter Plot".to_string(),
                ChartRenderer::scatter(&df, "a", "b", &[]).unwrap(),
            ),
        ];
        let report = ReportBuilder::new(small_config())
            .build(&df, &summary, charts, &[])
            .unwrap();

        let headings = report.headings();
        let heatmap = headings
            .iter()
            .position(|h| *h == "Missing Values Heatmap")
            .unwrap();
        let stats = headings
            .iter()
            .position(|h| *h == STATISTICS_HEADING)
            .unwrap();
        assert!(stats < heatmap);
        assert!(headings.contains(&"Anomaly Scatter Plot"));
        // two named charts plus two box plots
        assert_eq!(report.image_count(), 4);
    }

    #[test]
    fn test_schema_table_rows() {
        let df = df![
            "id" => [Some(1i64), None, Some(3)],
            "name" => ["a", "b", "c"],
        ]
        .unwrap();
        let report = build(&df, small_config());
        let schema = report
            .tables()
            .into_iter()
            .find(|t| t.kind == TableKind::Schema)
            .unwrap();

        assert_eq!(schema.header, vec!["Column", "Type", "Non-null count"]);
        assert_eq!(
            schema.rows,
            vec![
                vec!["id".to_string(), "Int64".to_string(), "2".to_string()],
                vec!["name".to_string(), "String".to_string(), "3".to_string()],
            ]
        );
    }

    #[test]
    fn test_overview_mentions_duplicates() {
        let df = df![
            "a" => [1i64, 1, 100],
            "b" => [2i64, 2, 2],
        ]
        .unwrap();
        let report = build(&df, small_config());
        let paragraphs: Vec<&str> = report
            .blocks()
            .iter()
            .filter_map(|b| match b {
                LayoutBlock::Paragraph(p) => Some(p.as_str()),
                _ => None,
            })
            .collect();
        assert!(paragraphs.contains(&"Duplicate rows: 1"));
        assert!(paragraphs.contains(&"Dataset shape: 3 rows x 2 columns"));
    }
}
