//! Report assembly and PDF export.
//!
//! [`ReportBuilder`] turns a table, its quality summary, a set of named
//! charts and the anomaly set into a [`Report`]: an immutable sequence of
//! [`LayoutBlock`]s. The report is then laid out on A4 pages and written as
//! a PDF in one go.
//!
//! Wide statistics tables are split into chunks of
//! `max_columns_per_chunk` columns with a page break between chunks. Tables
//! that run past the page foot continue on the next page with their header
//! repeated.
//!
//! # Example
//!
//! ```rust,ignore
//! use lex_quality::report::ReportBuilder;
//!
//! let report = ReportBuilder::new(config.clone()).build(&df, &summary, charts, &anomalies)?;
//! report.write_pdf(&config.output_path)?;
//! ```
//!
//! The written file only ever appears complete: bytes go to a temporary file
//! in the destination directory which is then renamed over the target.

mod blocks;
mod builder;
mod layout;
mod pdf;
mod summary;

pub use blocks::{
    ImageBlock, LayoutBlock, MARGIN_MM, PAGE_HEIGHT_MM, PAGE_WIDTH_MM, TableBlock, TableKind,
    available_height_mm, available_width_mm,
};
pub use builder::{BOX_PLOTS_HEADING, ReportBuilder, SCHEMA_HEADING, STATISTICS_HEADING};
pub use summary::{AnalysisSummary, AnomalySummary};

use crate::error::{QualityError, Result};
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::info;

/// An assembled report. Never changes after it is built.
#[derive(Debug, Clone, PartialEq)]
pub struct Report {
    title: String,
    blocks: Vec<LayoutBlock>,
}

impl Report {
    pub(crate) fn new(title: String, blocks: Vec<LayoutBlock>) -> Self {
        Self { title, blocks }
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn blocks(&self) -> &[LayoutBlock] {
        &self.blocks
    }

    pub fn tables(&self) -> Vec<&TableBlock> {
        self.blocks
            .iter()
            .filter_map(|b| match b {
                LayoutBlock::Table(t) => Some(t),
                _ => None,
            })
            .collect()
    }

    /// Statistics tables, one per column chunk.
    pub fn statistics_tables(&self) -> Vec<&TableBlock> {
        self.tables()
            .into_iter()
            .filter(|t| t.kind == TableKind::Statistics)
            .collect()
    }

    pub fn page_break_count(&self) -> usize {
        self.blocks
            .iter()
            .filter(|b| matches!(b, LayoutBlock::PageBreak))
            .count()
    }

    pub fn headings(&self) -> Vec<&str> {
        self.blocks
            .iter()
            .filter_map(|b| match b {
                LayoutBlock::Heading(h) => Some(h.as_str()),
                _ => None,
            })
            .collect()
    }

    pub fn image_count(&self) -> usize {
        self.blocks
            .iter()
            .filter(|b| matches!(b, LayoutBlock::Image(_)))
            .count()
    }

    /// Number of A4 pages the report lays out to.
    pub fn page_count(&self) -> usize {
        layout::paginate(&self.blocks).len()
    }

    /// Lay out and serialise the report.
    pub fn to_pdf_bytes(&self) -> Result<Vec<u8>> {
        let pages = layout::paginate(&self.blocks);
        pdf::render_pages(&self.title, &pages)
    }

    /// Write the PDF to `path`, replacing any existing file atomically.
    pub fn write_pdf(&self, path: impl AsRef<Path>) -> Result<PathBuf> {
        let path = path.as_ref();
        let bytes = self.to_pdf_bytes()?;

        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        let write_failed =
            |e: std::io::Error| QualityError::ReportWriteFailed(format!("{}: {}", path.display(), e));

        let mut tmp = NamedTempFile::new_in(&dir).map_err(write_failed)?;
        tmp.write_all(&bytes).map_err(write_failed)?;
        tmp.as_file().sync_all().map_err(write_failed)?;
        tmp.persist(path).map_err(|e| write_failed(e.error))?;

        info!("Report saved: {} ({} bytes)", path.display(), bytes.len());
        Ok(path.to_path_buf())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn tiny_report() -> Report {
        Report::new(
            "Test".to_string(),
            vec![
                LayoutBlock::Title("Test".to_string()),
                LayoutBlock::Paragraph("Rows: 3".to_string()),
            ],
        )
    }

    #[test]
    fn test_write_pdf_creates_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("out.pdf");

        let written = tiny_report().write_pdf(&path).unwrap();
        assert_eq!(written, path);
        let bytes = std::fs::read(&path).unwrap();
        assert!(bytes.starts_with(b"%PDF"));

        // only the report is left behind
        let entries: Vec<_> = std::fs::read_dir(dir.path()).unwrap().collect();
        assert_eq!(entries.len(), 1);
    }

    #[test]
    fn test_write_pdf_replaces_existing_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("out.pdf");
        std::fs::write(&path, b"stale").unwrap();

        tiny_report().write_pdf(&path).unwrap();
        assert!(std::fs::read(&path).unwrap().starts_with(b"%PDF"));
    }

    #[test]
    fn test_write_pdf_missing_directory_fails() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("no_such_dir").join("out.pdf");

        let result = tiny_report().write_pdf(&path);
        assert!(matches!(result, Err(QualityError::ReportWriteFailed(_))));
        assert!(!path.exists());
    }

    #[test]
    fn test_page_count() {
        assert_eq!(tiny_report().page_count(), 1);
    }
}
