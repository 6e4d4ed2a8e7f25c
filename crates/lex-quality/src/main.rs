//! CLI entry point for data quality inspection and PDF reporting.

use anyhow::{Result, anyhow};
use clap::Parser;
use lex_quality::config::DEFAULT_REPORT_FILE;
use lex_quality::{
    AnalysisSummary, AnomalyDetector, AnomalySummary, Chart, ChartRenderer, QualityConfig,
    QualityError, QualityInspector, ReportBuilder, describe, load_csv_path, numeric_column_names,
};
use polars::prelude::DataFrame;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

#[derive(Parser, Debug)]
#[command(
    author = "Lex Machina Team",
    version,
    about = "Data Quality & Anomaly Detection Tool",
    long_about = "Inspects a CSV file for missing values, duplicate rows, schema and \
                  Z-score outliers, and writes a PDF summary report.\n\n\
                  EXAMPLES:\n  \
                  # Report with defaults (summary_report.pdf)\n  \
                  lex-quality -i data.csv\n\n  \
                  # Choose scatter axes and a stricter threshold\n  \
                  lex-quality -i data.csv --x-col age --y-col fare --threshold 2.5\n\n  \
                  # Also export every chart as SVG\n  \
                  lex-quality -i data.csv --charts-dir charts/\n\n  \
                  # Machine-readable summary\n  \
                  lex-quality -i data.csv --json | jq .quality.duplicate_count"
)]
struct Args {
    /// Path to the CSV file to inspect
    #[arg(short, long)]
    input: String,

    /// Path of the PDF report to write
    #[arg(short, long, default_value = DEFAULT_REPORT_FILE)]
    output: PathBuf,

    /// Z-score magnitude above which a value is flagged
    #[arg(short, long, default_value = "3.0")]
    threshold: f64,

    /// Maximum number of columns per statistics table
    #[arg(long, default_value = "10")]
    chunk_size: usize,

    /// Numeric column for the scatter plot X axis
    ///
    /// Defaults to the first numeric column
    #[arg(long)]
    x_col: Option<String>,

    /// Numeric column for the scatter plot Y axis
    ///
    /// Defaults to the next numeric column after the X axis
    #[arg(long)]
    y_col: Option<String>,

    /// Directory to write every chart to as SVG
    #[arg(long)]
    charts_dir: Option<PathBuf>,

    /// Title printed at the top of the report
    #[arg(long)]
    title: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// Suppress progress output (only show errors and final result)
    #[arg(short, long)]
    quiet: bool,

    /// Output JSON to stdout instead of human-readable summary
    ///
    /// Disables all progress logs; only outputs the final JSON summary.
    #[arg(long)]
    json: bool,
}

/// Initialize the tracing subscriber for logging.
///
/// When `json_output` is true, logging is completely disabled to ensure
/// only JSON is written to stdout.
fn init_logging(level: &str, quiet: bool, json_output: bool) {
    if json_output {
        return;
    }

    use tracing_subscriber::EnvFilter;

    let effective_level = if quiet { "warn" } else { level };

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(effective_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(&args.log_level, args.quiet, args.json);

    match run(&args) {
        Ok(()) => Ok(()),
        Err(e) if args.json => {
            // Keep stdout machine-readable on failure too
            let payload = match e.downcast_ref::<QualityError>() {
                Some(err) => serde_json::json!({ "error": err }),
                None => serde_json::json!({
                    "error": { "code": "ERROR", "message": e.to_string() }
                }),
            };
            println!("{}", serde_json::to_string_pretty(&payload)?);
            std::process::exit(1);
        }
        Err(e) => Err(e),
    }
}

fn run(args: &Args) -> Result<()> {
    if !Path::new(&args.input).exists() {
        return Err(anyhow!("Input file not found: {}", args.input));
    }

    let mut builder = QualityConfig::builder()
        .z_threshold(args.threshold)
        .max_columns_per_chunk(args.chunk_size)
        .output_path(&args.output);
    if let Some(ref title) = args.title {
        builder = builder.report_title(title);
    }
    let config = builder.build()?;

    info!("Loading dataset from: {}", args.input);
    let loaded = load_csv_path(&args.input, &config)?;
    let df = &loaded.frame;

    let summary = QualityInspector::summarize(df)?;
    let anomalies = AnomalyDetector::detect(df, config.z_threshold)?;
    info!(
        "{} duplicate rows, {} null cells, {} anomalies",
        summary.duplicate_count,
        summary.total_nulls(),
        anomalies.len()
    );

    let mut charts = vec![(
        "Missing Values Heatmap".to_string(),
        ChartRenderer::missing_heatmap(df),
    )];
    match scatter_axes(args, df) {
        Some((x, y)) => {
            info!("Scatter plot axes: {} vs {}", x, y);
            charts.push((
                "Anomaly Scatter Plot".to_string(),
                ChartRenderer::scatter(df, &x, &y, &anomalies)?,
            ));
        }
        None => debug!("Fewer than two numeric columns; scatter plot skipped"),
    }

    if let Some(ref dir) = args.charts_dir {
        write_svg_charts(dir, df, &charts, &anomalies, &config)?;
    }

    let report = ReportBuilder::new(config.clone()).build(df, &summary, charts, &anomalies)?;
    let written = report.write_pdf(&config.output_path)?;

    if args.json {
        let output = AnalysisSummary::new(
            args.input.clone(),
            Some(written.display().to_string()),
            loaded.report.clone(),
            summary,
            describe(df)?,
            AnomalySummary::new(config.z_threshold, anomalies),
        );
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else if !args.quiet {
        let anomaly_rows = AnomalyDetector::rows_for(df, &anomalies)?;
        let output = AnalysisSummary::new(
            args.input.clone(),
            Some(written.display().to_string()),
            loaded.report.clone(),
            summary,
            Vec::new(),
            AnomalySummary::new(config.z_threshold, anomalies),
        );
        print_human_readable_summary(&output, report.page_count());
        print!("{}", format_previews(df, &anomaly_rows));
        println!("Use --json for machine-readable output");
        println!("{}", "=".repeat(80));
    }

    Ok(())
}

/// Pick scatter axes: explicit flags first, else the first two numeric columns.
///
/// Returns `None` when the table has fewer than two numeric columns and the
/// axes were not both given explicitly.
fn scatter_axes(args: &Args, df: &DataFrame) -> Option<(String, String)> {
    if let (Some(x), Some(y)) = (&args.x_col, &args.y_col) {
        return Some((x.clone(), y.clone()));
    }

    let numeric = numeric_column_names(df);
    if numeric.len() < 2 {
        return None;
    }
    let x = args.x_col.clone().unwrap_or_else(|| numeric[0].clone());
    let y = match &args.y_col {
        Some(y) => y.clone(),
        None => numeric.iter().find(|c| **c != x)?.clone(),
    };
    Some((x, y))
}

fn write_svg_charts(
    dir: &Path,
    df: &DataFrame,
    charts: &[(String, Chart)],
    anomalies: &[lex_quality::AnomalyRecord],
    config: &QualityConfig,
) -> Result<()> {
    std::fs::create_dir_all(dir)?;
    let (width, height) = (config.chart_width_px, config.chart_height_px);

    let mut written = 0;
    for (name, chart) in charts {
        let path = dir.join(format!("{}.svg", file_stem(name)));
        std::fs::write(&path, chart.to_svg(width, height)?)?;
        written += 1;
    }
    for column in numeric_column_names(df) {
        let chart = ChartRenderer::box_plot(df, &column, anomalies)?;
        if chart.is_placeholder() {
            warn!("Column '{}' has no values to plot", column);
        }
        let path = dir.join(format!("box_plot_{}.svg", file_stem(&column)));
        std::fs::write(&path, chart.to_svg(width, height)?)?;
        written += 1;
    }

    info!("Wrote {} SVG charts to {}", written, dir.display());
    Ok(())
}

/// Lowercase file stem with anything but ASCII letters and digits replaced by `_`.
fn file_stem(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c.to_ascii_lowercase()
            } else {
                '_'
            }
        })
        .collect()
}

/// Truncate a string to max length with ellipsis
fn truncate_str(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let head: String = s.chars().take(max_len - 3).collect();
        format!("{}...", head)
    }
}

/// Print a human-readable summary of the inspection.
///
/// This is the default output when neither `--json` nor `--quiet` are specified.
fn print_human_readable_summary(output: &AnalysisSummary, pages: usize) {
    let quality = &output.quality;
    let load = &output.load;

    println!();
    println!("{}", "=".repeat(80));
    println!("DATA QUALITY SUMMARY");
    println!("{}", "=".repeat(80));
    println!();

    println!(
        "Input:  {} ({} rows x {} columns)",
        output.input_file, quality.row_count, quality.column_count
    );
    println!(
        "        encoding {}, delimiter {:?}",
        load.encoding, load.delimiter
    );
    if load.skipped_rows > 0 || load.padded_rows > 0 {
        println!(
            "        {} malformed rows skipped, {} short rows padded",
            load.skipped_rows, load.padded_rows
        );
    }
    if let Some(ref report) = output.report_file {
        println!("Report: {} ({} pages)", report, pages);
    }
    println!();

    println!("Duplicate rows: {}", quality.duplicate_count);
    println!();

    println!("SCHEMA");
    println!("{}", "-".repeat(40));
    println!(
        "{:<24} {:<16} {:<10} {:<10}",
        "Column", "Type", "Kind", "Missing"
    );
    println!("{}", "-".repeat(64));
    for col in &quality.columns {
        println!(
            "{:<24} {:<16} {:<10} {:<10}",
            truncate_str(&col.name, 23),
            truncate_str(&col.dtype, 15),
            col.kind.as_str(),
            col.null_count
        );
    }
    println!();

    let anomalies = &output.anomalies;
    println!("ANOMALIES (|z| > {})", anomalies.threshold);
    println!("{}", "-".repeat(40));
    if anomalies.total == 0 {
        println!("  No anomalies detected");
    } else {
        println!(
            "  {} values flagged in {} rows",
            anomalies.total, anomalies.rows_flagged
        );
        for (column, count) in &anomalies.by_column {
            println!("  - {}: {}", column, count);
        }
    }
    println!();
}

const PREVIEW_ROWS: usize = 5;

/// First rows of the table and of the anomalous rows.
fn format_previews(df: &DataFrame, anomaly_rows: &DataFrame) -> String {
    let mut out = String::new();

    out.push_str("DATA PREVIEW\n");
    out.push_str(&format!("{}\n", "-".repeat(40)));
    out.push_str(&format!("{}\n\n", df.head(Some(PREVIEW_ROWS))));

    out.push_str("ANOMALOUS ROWS\n");
    out.push_str(&format!("{}\n", "-".repeat(40)));
    if anomaly_rows.height() == 0 {
        out.push_str("  No anomalous rows\n");
    } else {
        out.push_str(&format!("{}\n", anomaly_rows.head(Some(PREVIEW_ROWS))));
        if anomaly_rows.height() > PREVIEW_ROWS {
            out.push_str(&format!(
                "  ... {} more rows\n",
                anomaly_rows.height() - PREVIEW_ROWS
            ));
        }
    }
    out.push('\n');
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use polars::prelude::*;

    fn readings() -> DataFrame {
        df![
            "id" => (0..10).collect::<Vec<i64>>(),
            "value" => [10.0, 11.0, 9.0, 10.0, 11.0, 9.0, 10.0, 11.0, 9.0, 500.0],
        ]
        .unwrap()
    }

    // ==================== format_previews tests ====================

    #[test]
    fn test_previews_show_head_and_anomalous_rows() {
        let df = readings();
        let anomalies = AnomalyDetector::detect(&df, 2.0).unwrap();
        assert_eq!(anomalies.len(), 1);
        let rows = AnomalyDetector::rows_for(&df, &anomalies).unwrap();

        let text = format_previews(&df, &rows);
        assert!(text.contains("DATA PREVIEW"));
        assert!(text.contains("shape: (5, 2)"));
        assert!(text.contains("ANOMALOUS ROWS"));
        assert!(text.contains("shape: (1, 3)"));
        assert!(text.contains("anomaly_column"));
        assert!(!text.contains("more rows"));
    }

    #[test]
    fn test_previews_without_anomalies() {
        let df = readings();
        let rows = AnomalyDetector::rows_for(&df, &[]).unwrap();

        let text = format_previews(&df, &rows);
        assert!(text.contains("No anomalous rows"));
    }

    // ==================== scatter_axes tests ====================

    #[test]
    fn test_scatter_axes_default_to_first_numeric_columns() {
        let args = Args::parse_from(["lex-quality", "-i", "data.csv"]);
        let df = readings();
        assert_eq!(
            scatter_axes(&args, &df),
            Some(("id".to_string(), "value".to_string()))
        );

        let single = df!["name" => ["a", "b"], "v" => [1.0, 2.0]].unwrap();
        assert_eq!(scatter_axes(&args, &single), None);
    }
}
