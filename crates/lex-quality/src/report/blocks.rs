use serde::Serialize;
use std::fmt;

/// A4 portrait.
pub const PAGE_WIDTH_MM: f32 = 210.0;
pub const PAGE_HEIGHT_MM: f32 = 297.0;
pub const MARGIN_MM: f32 = 20.0;

/// Printable width between the side margins.
pub const fn available_width_mm() -> f32 {
    PAGE_WIDTH_MM - 2.0 * MARGIN_MM
}

/// Printable height between the top and bottom margins.
pub const fn available_height_mm() -> f32 {
    PAGE_HEIGHT_MM - 2.0 * MARGIN_MM
}

/// One element of the report flow.
#[derive(Debug, Clone, PartialEq)]
pub enum LayoutBlock {
    Title(String),
    Heading(String),
    Paragraph(String),
    /// Vertical gap in millimetres.
    Spacer(f32),
    Table(TableBlock),
    Image(ImageBlock),
    PageBreak,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TableKind {
    Schema,
    Statistics,
}

/// A table with a shaded, bold header row.
#[derive(Debug, Clone, PartialEq)]
pub struct TableBlock {
    pub kind: TableKind,
    pub header: Vec<String>,
    pub rows: Vec<Vec<String>>,
    /// Width of every column in millimetres, same length as `header`.
    pub col_widths: Vec<f32>,
}

impl TableBlock {
    pub fn width_mm(&self) -> f32 {
        self.col_widths.iter().sum()
    }
}

/// A rasterised chart.
#[derive(Clone, PartialEq)]
pub struct ImageBlock {
    pub width_px: u32,
    pub height_px: u32,
    /// Packed 8-bit RGB, `width_px * height_px * 3` bytes.
    pub rgb: Vec<u8>,
    /// Printed width; height follows the pixel aspect ratio.
    pub width_mm: f32,
}

impl ImageBlock {
    pub fn height_mm(&self) -> f32 {
        if self.width_px == 0 {
            return 0.0;
        }
        self.width_mm * self.height_px as f32 / self.width_px as f32
    }
}

impl fmt::Debug for ImageBlock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImageBlock")
            .field("width_px", &self.width_px)
            .field("height_px", &self.height_px)
            .field("rgb_bytes", &self.rgb.len())
            .field("width_mm", &self.width_mm)
            .finish()
    }
}
