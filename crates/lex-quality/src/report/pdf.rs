use super::blocks::{PAGE_HEIGHT_MM, PAGE_WIDTH_MM};
use super::layout::{Page, Placed};
use crate::error::{QualityError, Result};
use printpdf::image_crate::{DynamicImage, RgbImage};
use printpdf::{
    BuiltinFont, Color, Image, ImageTransform, IndirectFontRef, Line, Mm, PdfDocument,
    PdfLayerReference, Point, Rect, Rgb,
};
use std::fmt::Display;
use tracing::debug;

const HEADER_SHADE: f32 = 0.85;
const RULE_SHADE: f32 = 0.7;

fn pdf_error(e: impl Display) -> QualityError {
    QualityError::ReportWriteFailed(format!("PDF serialisation failed: {}", e))
}

fn gray(level: f32) -> Color {
    Color::Rgb(Rgb::new(level, level, level, None))
}

struct Fonts {
    regular: IndirectFontRef,
    bold: IndirectFontRef,
}

/// Serialise laid-out pages into PDF bytes.
pub(crate) fn render_pages(title: &str, pages: &[Page<'_>]) -> Result<Vec<u8>> {
    let (doc, first_page, first_layer) =
        PdfDocument::new(title, Mm(PAGE_WIDTH_MM), Mm(PAGE_HEIGHT_MM), "Layer 1");
    let fonts = Fonts {
        regular: doc
            .add_builtin_font(BuiltinFont::Helvetica)
            .map_err(pdf_error)?,
        bold: doc
            .add_builtin_font(BuiltinFont::HelveticaBold)
            .map_err(pdf_error)?,
    };

    for (i, page) in pages.iter().enumerate() {
        let layer = if i == 0 {
            doc.get_page(first_page).get_layer(first_layer)
        } else {
            let (page_index, layer_index) = doc.add_page(
                Mm(PAGE_WIDTH_MM),
                Mm(PAGE_HEIGHT_MM),
                format!("Layer {}", i + 1),
            );
            doc.get_page(page_index).get_layer(layer_index)
        };
        for item in &page.items {
            draw_item(&layer, item, &fonts)?;
        }
    }

    debug!("Serialising {} PDF pages", pages.len());
    doc.save_to_bytes().map_err(pdf_error)
}

fn draw_item(layer: &PdfLayerReference, item: &Placed<'_>, fonts: &Fonts) -> Result<()> {
    match item {
        Placed::Text {
            text,
            x,
            y,
            size,
            bold,
        } => {
            let font = if *bold { &fonts.bold } else { &fonts.regular };
            layer.set_fill_color(gray(0.0));
            layer.use_text(ascii_only(text), *size, Mm(*x), Mm(*y), font);
        }
        Placed::Shade {
            x,
            y,
            width,
            height,
        } => {
            layer.set_fill_color(gray(HEADER_SHADE));
            layer.add_rect(Rect::new(Mm(*x), Mm(*y), Mm(x + width), Mm(y + height)));
            layer.set_fill_color(gray(0.0));
        }
        Placed::Rule { x1, x2, y } => {
            layer.set_outline_color(gray(RULE_SHADE));
            layer.set_outline_thickness(0.3);
            layer.add_line(Line {
                points: vec![
                    (Point::new(Mm(*x1), Mm(*y)), false),
                    (Point::new(Mm(*x2), Mm(*y)), false),
                ],
                is_closed: false,
            });
        }
        Placed::Image {
            image,
            x,
            y,
            width,
            ..
        } => {
            let raster = RgbImage::from_raw(image.width_px, image.height_px, image.rgb.clone())
                .ok_or_else(|| {
                    pdf_error(format!(
                        "image buffer of {} bytes does not match {}x{}",
                        image.rgb.len(),
                        image.width_px,
                        image.height_px
                    ))
                })?;
            let dpi = image.width_px as f32 * 25.4 / width;
            Image::from_dynamic_image(&DynamicImage::ImageRgb8(raster)).add_to_layer(
                layer.clone(),
                ImageTransform {
                    translate_x: Some(Mm(*x)),
                    translate_y: Some(Mm(*y)),
                    dpi: Some(dpi),
                    ..Default::default()
                },
            );
        }
    }
    Ok(())
}

/// Builtin PDF fonts only cover a single-byte charset; replace anything else.
fn ascii_only(text: &str) -> String {
    text.chars()
        .map(|c| if c.is_ascii() && !c.is_ascii_control() { c } else { '?' })
        .collect()
}
