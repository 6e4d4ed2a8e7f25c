//! Flow layout: places report blocks on A4 pages.
//!
//! Coordinates are millimetres from the bottom-left corner, as in PDF.

use super::blocks::{
    ImageBlock, LayoutBlock, MARGIN_MM, PAGE_HEIGHT_MM, TableBlock, available_height_mm,
    available_width_mm,
};

const PT_TO_MM: f32 = 0.3528;
/// Average Helvetica glyph width as a fraction of the font size.
const GLYPH_WIDTH_EM: f32 = 0.5;

pub(crate) const TITLE_PT: f32 = 20.0;
pub(crate) const HEADING_PT: f32 = 13.0;
pub(crate) const BODY_PT: f32 = 10.0;
pub(crate) const TABLE_PT: f32 = 8.0;

const TITLE_LINE_MM: f32 = 12.0;
const HEADING_LINE_MM: f32 = 9.0;
const BODY_LINE_MM: f32 = 5.5;
const ROW_HEIGHT_MM: f32 = 6.5;
const CELL_PADDING_MM: f32 = 1.5;
const BLOCK_GAP_MM: f32 = 3.0;

/// One drawing instruction.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Placed<'a> {
    Text {
        text: String,
        x: f32,
        /// Baseline.
        y: f32,
        size: f32,
        bold: bool,
    },
    /// Light grey fill behind a table header.
    Shade { x: f32, y: f32, width: f32, height: f32 },
    /// Horizontal rule under a table row.
    Rule { x1: f32, x2: f32, y: f32 },
    Image {
        image: &'a ImageBlock,
        x: f32,
        y: f32,
        width: f32,
        height: f32,
    },
}

#[derive(Debug, Default, Clone, PartialEq)]
pub(crate) struct Page<'a> {
    pub items: Vec<Placed<'a>>,
}

/// Lay out `blocks` top to bottom, starting new pages as needed.
///
/// Always yields at least one page.
pub(crate) fn paginate(blocks: &[LayoutBlock]) -> Vec<Page<'_>> {
    let mut flow = Flow::new();
    for (i, block) in blocks.iter().enumerate() {
        match block {
            LayoutBlock::Title(text) => flow.text_block(text, TITLE_PT, true, TITLE_LINE_MM),
            LayoutBlock::Heading(text) => {
                flow.ensure(HEADING_LINE_MM + keep_with_next(&blocks[i + 1..]));
                flow.text_block(text, HEADING_PT, true, HEADING_LINE_MM);
            }
            LayoutBlock::Paragraph(text) => flow.text_block(text, BODY_PT, false, BODY_LINE_MM),
            LayoutBlock::Spacer(mm) => flow.y -= *mm,
            LayoutBlock::Table(table) => flow.table(table),
            LayoutBlock::Image(image) => flow.image(image),
            LayoutBlock::PageBreak => flow.page_break(),
        }
    }
    flow.pages
}

/// Height a heading must share a page with: the start of whatever follows it.
///
/// Consecutive headings chain, so a section heading stays with the first
/// chart under its sub-heading.
fn keep_with_next(rest: &[LayoutBlock]) -> f32 {
    let keep = match rest.first() {
        Some(LayoutBlock::Heading(_)) => HEADING_LINE_MM + keep_with_next(&rest[1..]),
        Some(LayoutBlock::Image(image)) => fitted_size(image).1,
        Some(LayoutBlock::Table(_)) => ROW_HEIGHT_MM * 2.0,
        Some(LayoutBlock::Paragraph(_)) => BODY_LINE_MM,
        Some(LayoutBlock::Title(_)) => TITLE_LINE_MM,
        Some(LayoutBlock::Spacer(_)) | Some(LayoutBlock::PageBreak) | None => 0.0,
    };
    keep.min(available_height_mm() - HEADING_LINE_MM)
}

/// Printed size of an image: its requested width, shrunk to fit the page.
fn fitted_size(image: &ImageBlock) -> (f32, f32) {
    let mut width = image.width_mm.min(available_width_mm());
    let mut height = image.height_mm() * width / image.width_mm.max(f32::EPSILON);
    let max_height = available_height_mm();
    if height > max_height {
        width *= max_height / height;
        height = max_height;
    }
    (width, height)
}

/// Characters of `size_pt` text that fit in `width_mm`.
pub(crate) fn chars_fitting(width_mm: f32, size_pt: f32) -> usize {
    let glyph = size_pt * PT_TO_MM * GLYPH_WIDTH_EM;
    ((width_mm / glyph).floor() as usize).max(1)
}

/// Truncate `text` with a trailing "..." so it fits in `width_mm`.
pub(crate) fn fit_text(text: &str, width_mm: f32, size_pt: f32) -> String {
    let max = chars_fitting(width_mm, size_pt);
    if text.chars().count() <= max {
        return text.to_string();
    }
    if max <= 3 {
        return text.chars().take(max).collect();
    }
    let mut out: String = text.chars().take(max - 3).collect();
    out.push_str("...");
    out
}

/// Greedy word wrap to at most `max_chars` per line. Over-long words are split.
pub(crate) fn wrap_text(text: &str, max_chars: usize) -> Vec<String> {
    let max_chars = max_chars.max(1);
    let mut lines = Vec::new();
    let mut line = String::new();

    for word in text.split_whitespace() {
        let mut word: Vec<char> = word.chars().collect();
        while word.len() > max_chars {
            if !line.is_empty() {
                lines.push(std::mem::take(&mut line));
            }
            let rest = word.split_off(max_chars);
            lines.push(word.into_iter().collect());
            word = rest;
        }
        let word: String = word.into_iter().collect();
        let needed = if line.is_empty() {
            word.chars().count()
        } else {
            line.chars().count() + 1 + word.chars().count()
        };
        if needed > max_chars && !line.is_empty() {
            lines.push(std::mem::take(&mut line));
        }
        if !line.is_empty() {
            line.push(' ');
        }
        line.push_str(&word);
    }
    if !line.is_empty() || lines.is_empty() {
        lines.push(line);
    }
    lines
}

struct Flow<'a> {
    pages: Vec<Page<'a>>,
    /// Top of the free space on the current page.
    y: f32,
}

impl<'a> Flow<'a> {
    fn new() -> Self {
        Self {
            pages: vec![Page::default()],
            y: top(),
        }
    }

    fn current(&mut self) -> &mut Page<'a> {
        let last = self.pages.len() - 1;
        &mut self.pages[last]
    }

    fn new_page(&mut self) {
        self.pages.push(Page::default());
        self.y = top();
    }

    fn page_break(&mut self) {
        if !self.current().items.is_empty() {
            self.new_page();
        }
    }

    /// Start a new page unless `height` fits below the cursor.
    fn ensure(&mut self, height: f32) {
        if self.y - height < MARGIN_MM && !self.current().items.is_empty() {
            self.new_page();
        }
    }

    fn text_block(&mut self, text: &str, size: f32, bold: bool, line_height: f32) {
        for line in wrap_text(text, chars_fitting(available_width_mm(), size)) {
            self.ensure(line_height);
            self.y -= line_height;
            let y = self.y + (line_height - size * PT_TO_MM) / 2.0;
            self.current().items.push(Placed::Text {
                text: line,
                x: MARGIN_MM,
                y,
                size,
                bold,
            });
        }
    }

    fn table(&mut self, table: &TableBlock) {
        self.ensure(ROW_HEIGHT_MM * 2.0);
        self.table_row(table, &table.header, true);
        for row in &table.rows {
            if self.y - ROW_HEIGHT_MM < MARGIN_MM {
                self.new_page();
                self.table_row(table, &table.header, true);
            }
            self.table_row(table, row, false);
        }
        self.y -= BLOCK_GAP_MM;
    }

    fn table_row(&mut self, table: &TableBlock, cells: &[String], header: bool) {
        self.y -= ROW_HEIGHT_MM;
        let bottom = self.y;
        let width = table.width_mm();

        if header {
            self.current().items.push(Placed::Shade {
                x: MARGIN_MM,
                y: bottom,
                width,
                height: ROW_HEIGHT_MM,
            });
        }

        let mut x = MARGIN_MM;
        for (cell, col_width) in cells.iter().zip(&table.col_widths) {
            let text = fit_text(cell, col_width - 2.0 * CELL_PADDING_MM, TABLE_PT);
            if !text.is_empty() {
                self.current().items.push(Placed::Text {
                    text,
                    x: x + CELL_PADDING_MM,
                    y: bottom + 2.0,
                    size: TABLE_PT,
                    bold: header,
                });
            }
            x += col_width;
        }

        self.current().items.push(Placed::Rule {
            x1: MARGIN_MM,
            x2: MARGIN_MM + width,
            y: bottom,
        });
    }

    fn image(&mut self, image: &'a ImageBlock) {
        let (width, height) = fitted_size(image);
        self.ensure(height);
        self.y -= height;
        let x = MARGIN_MM + (available_width_mm() - width) / 2.0;
        let y = self.y;
        self.current().items.push(Placed::Image {
            image,
            x,
            y,
            width,
            height,
        });
        self.y -= BLOCK_GAP_MM;
    }
}

fn top() -> f32 {
    PAGE_HEIGHT_MM - MARGIN_MM
}
