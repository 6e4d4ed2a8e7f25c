use super::{Chart, ChartKind};
use crate::error::{QualityError, Result};
use crate::utils::{quantile_sorted, sorted_finite};
use once_cell::sync::Lazy;
use plotters::coord::Shift;
use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};
use plotters::style::{FontStyle, register_font};
use std::fmt::Display;
use std::ops::Range;

type DrawResult<DB> = std::result::Result<(), DrawingAreaErrorKind<<DB as DrawingBackend>::ErrorType>>;

/// Family named by every text style; backed by the bundled DejaVu Sans.
const FONT_FAMILY: &str = "sans-serif";
const CAPTION_FONT: (&str, u32) = (FONT_FAMILY, 20);
const MEDIAN_COLOR: RGBColor = RGBColor(255, 127, 14);

static FONT_DATA: &[u8] = include_bytes!("../../assets/DejaVuSans.ttf");

static FONT_REGISTERED: Lazy<bool> =
    Lazy::new(|| register_font(FONT_FAMILY, FontStyle::Normal, FONT_DATA).is_ok());

/// Make the chart font available to plotters; must precede any text drawing.
fn ensure_font(chart: &str) -> Result<()> {
    if *FONT_REGISTERED {
        Ok(())
    } else {
        Err(render_failed(chart, "bundled chart font could not be loaded"))
    }
}

impl Chart {
    /// Render to an SVG document.
    pub fn to_svg(&self, width: u32, height: u32) -> Result<String> {
        ensure_font(&self.title)?;
        let mut svg = String::new();
        {
            let root = SVGBackend::with_string(&mut svg, (width, height)).into_drawing_area();
            draw_chart(self, &root).map_err(|e| render_failed(&self.title, e))?;
        }
        Ok(svg)
    }

    /// Rasterise to packed 8-bit RGB, consuming the chart.
    pub fn into_rgb(self, width: u32, height: u32) -> Result<Vec<u8>> {
        ensure_font(&self.title)?;
        let mut buffer = vec![0u8; width as usize * height as usize * 3];
        {
            let root = BitMapBackend::with_buffer(&mut buffer, (width, height)).into_drawing_area();
            draw_chart(&self, &root).map_err(|e| render_failed(&self.title, e))?;
        }
        Ok(buffer)
    }
}

fn render_failed(chart: &str, reason: impl Display) -> QualityError {
    QualityError::ChartRenderFailed {
        chart: chart.to_string(),
        reason: reason.to_string(),
    }
}

fn draw_chart<DB: DrawingBackend>(chart: &Chart, root: &DrawingArea<DB, Shift>) -> DrawResult<DB> {
    root.fill(&WHITE)?;
    match &chart.kind {
        ChartKind::Scatter {
            x_label,
            y_label,
            points,
            anomalies,
        } => draw_scatter(root, &chart.title, x_label, y_label, points, anomalies)?,
        ChartKind::BoxPlot {
            column,
            values,
            anomalies,
        } => draw_box_plot(root, &chart.title, column, values, anomalies)?,
        ChartKind::Heatmap { cells } => draw_heatmap(root, &chart.title, cells)?,
        ChartKind::Placeholder { message } => draw_placeholder(root, &chart.title, message)?,
    }
    root.present()?;
    Ok(())
}

fn draw_scatter<DB: DrawingBackend>(
    root: &DrawingArea<DB, Shift>,
    title: &str,
    x_label: &str,
    y_label: &str,
    points: &[(f64, f64)],
    anomalies: &[(f64, f64)],
) -> DrawResult<DB> {
    let x_range = padded_range(points.iter().chain(anomalies).map(|p| p.0));
    let y_range = padded_range(points.iter().chain(anomalies).map(|p| p.1));

    let mut chart = ChartBuilder::on(root)
        .caption(title, CAPTION_FONT)
        .margin(15)
        .x_label_area_size(40)
        .y_label_area_size(60)
        .build_cartesian_2d(x_range, y_range)?;
    chart
        .configure_mesh()
        .x_desc(x_label)
        .y_desc(y_label)
        .draw()?;

    chart
        .draw_series(
            points
                .iter()
                .map(|&(x, y)| Circle::new((x, y), 3, BLUE.mix(0.6).filled())),
        )?
        .label("Data")
        .legend(|(x, y)| Circle::new((x, y), 3, BLUE.mix(0.6).filled()));

    if !anomalies.is_empty() {
        chart
            .draw_series(
                anomalies
                    .iter()
                    .map(|&(x, y)| Circle::new((x, y), 4, RED.mix(0.8).filled())),
            )?
            .label("Anomalies")
            .legend(|(x, y)| Circle::new((x, y), 4, RED.filled()));
        chart
            .configure_series_labels()
            .background_style(WHITE.mix(0.8))
            .border_style(BLACK.stroke_width(1))
            .draw()?;
    }
    Ok(())
}

/// Box statistics with whiskers at the most extreme values within 1.5 IQR.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct BoxStats {
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
    pub lower_whisker: f64,
    pub upper_whisker: f64,
}

pub(crate) fn box_stats(sorted: &[f64]) -> Option<BoxStats> {
    let q1 = quantile_sorted(sorted, 0.25)?;
    let median = quantile_sorted(sorted, 0.5)?;
    let q3 = quantile_sorted(sorted, 0.75)?;
    let iqr = q3 - q1;
    let low_fence = q1 - 1.5 * iqr;
    let high_fence = q3 + 1.5 * iqr;

    let lower_whisker = sorted
        .iter()
        .copied()
        .find(|&v| v >= low_fence)
        .unwrap_or(q1);
    let upper_whisker = sorted
        .iter()
        .rev()
        .copied()
        .find(|&v| v <= high_fence)
        .unwrap_or(q3);

    Some(BoxStats {
        q1,
        median,
        q3,
        lower_whisker,
        upper_whisker,
    })
}

fn draw_box_plot<DB: DrawingBackend>(
    root: &DrawingArea<DB, Shift>,
    title: &str,
    column: &str,
    values: &[f64],
    anomalies: &[f64],
) -> DrawResult<DB> {
    let sorted = sorted_finite(values.iter().copied());
    let Some(stats) = box_stats(&sorted) else {
        return draw_placeholder(root, title, "No values to plot");
    };

    let x_range = padded_range(sorted.iter().chain(anomalies).copied());
    let mut chart = ChartBuilder::on(root)
        .caption(title, CAPTION_FONT)
        .margin(15)
        .x_label_area_size(40)
        .y_label_area_size(20)
        .build_cartesian_2d(x_range, 0f64..2f64)?;
    chart
        .configure_mesh()
        .disable_y_mesh()
        .disable_y_axis()
        .x_desc(column)
        .draw()?;

    let (lo, hi) = (0.75, 1.25);
    chart.draw_series(std::iter::once(Rectangle::new(
        [(stats.q1, lo), (stats.q3, hi)],
        BLUE.mix(0.2).filled(),
    )))?;
    chart.draw_series(std::iter::once(Rectangle::new(
        [(stats.q1, lo), (stats.q3, hi)],
        BLUE.stroke_width(2),
    )))?;

    let segments = vec![
        vec![(stats.lower_whisker, 1.0), (stats.q1, 1.0)],
        vec![(stats.q3, 1.0), (stats.upper_whisker, 1.0)],
        vec![(stats.lower_whisker, 0.9), (stats.lower_whisker, 1.1)],
        vec![(stats.upper_whisker, 0.9), (stats.upper_whisker, 1.1)],
    ];
    chart.draw_series(
        segments
            .into_iter()
            .map(|points| PathElement::new(points, BLACK.stroke_width(1))),
    )?;
    chart.draw_series(std::iter::once(PathElement::new(
        vec![(stats.median, lo), (stats.median, hi)],
        MEDIAN_COLOR.stroke_width(2),
    )))?;

    // Fliers outside the whiskers, as a plain box plot would show them.
    chart.draw_series(
        sorted
            .iter()
            .filter(|&&v| v < stats.lower_whisker || v > stats.upper_whisker)
            .map(|&v| Circle::new((v, 1.0), 3, BLACK.stroke_width(1))),
    )?;

    if !anomalies.is_empty() {
        chart
            .draw_series(
                anomalies
                    .iter()
                    .map(|&v| Circle::new((v, 1.0), 4, RED.filled())),
            )?
            .label("Anomalies")
            .legend(|(x, y)| Circle::new((x, y), 4, RED.filled()));
        chart
            .configure_series_labels()
            .background_style(WHITE.mix(0.8))
            .border_style(BLACK.stroke_width(1))
            .draw()?;
    }
    Ok(())
}

/// White at 0% through to pure red at 100%.
fn heat_color(pct: f64) -> RGBColor {
    let fade = (255.0 * (1.0 - pct.clamp(0.0, 100.0) / 100.0)).round() as u8;
    RGBColor(255, fade, fade)
}

fn draw_heatmap<DB: DrawingBackend>(
    root: &DrawingArea<DB, Shift>,
    title: &str,
    cells: &[(String, f64)],
) -> DrawResult<DB> {
    if cells.is_empty() {
        return draw_placeholder(root, title, "Table has no columns");
    }

    let n = cells.len() as f64;
    let mut chart = ChartBuilder::on(root)
        .caption(title, CAPTION_FONT)
        .margin(15)
        .build_cartesian_2d(0f64..n, 0f64..1f64)?;

    chart.draw_series(cells.iter().enumerate().map(|(i, (_, pct))| {
        let x = i as f64;
        Rectangle::new([(x, 0.0), (x + 1.0, 1.0)], heat_color(*pct).filled())
    }))?;
    chart.draw_series(cells.iter().enumerate().map(|(i, _)| {
        let x = i as f64;
        Rectangle::new([(x, 0.0), (x + 1.0, 1.0)], WHITE.stroke_width(1))
    }))?;

    let centered = TextStyle::from((FONT_FAMILY, 14).into_font())
        .pos(Pos::new(HPos::Center, VPos::Center));
    chart.draw_series(cells.iter().enumerate().map(|(i, (name, _))| {
        Text::new(name.clone(), (i as f64 + 0.5, 0.7), centered.clone())
    }))?;
    chart.draw_series(cells.iter().enumerate().map(|(i, (_, pct))| {
        Text::new(format!("{:.1}", pct), (i as f64 + 0.5, 0.4), centered.clone())
    }))?;
    Ok(())
}

fn draw_placeholder<DB: DrawingBackend>(
    root: &DrawingArea<DB, Shift>,
    title: &str,
    message: &str,
) -> DrawResult<DB> {
    let area = root.titled(title, CAPTION_FONT)?;
    let (width, height) = area.dim_in_pixel();
    let style = TextStyle::from((FONT_FAMILY, 16).into_font())
        .pos(Pos::new(HPos::Center, VPos::Center));
    area.draw(&Text::new(
        message,
        ((width / 2) as i32, (height / 2) as i32),
        style,
    ))?;
    Ok(())
}

/// Value range with a 5% margin; degenerate input still gets a usable span.
fn padded_range(values: impl Iterator<Item = f64>) -> Range<f64> {
    let (lo, hi) = values
        .filter(|v| v.is_finite())
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
            (lo.min(v), hi.max(v))
        });
    if !lo.is_finite() || !hi.is_finite() {
        return 0.0..1.0;
    }
    let span = hi - lo;
    let pad = if span > 0.0 {
        span * 0.05
    } else {
        lo.abs().max(1.0) * 0.5
    };
    (lo - pad)..(hi + pad)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn scatter(anomalies: Vec<(f64, f64)>) -> Chart {
        Chart {
            title: "Scatter Plot (a vs b)".to_string(),
            kind: ChartKind::Scatter {
                x_label: "a".to_string(),
                y_label: "b".to_string(),
                points: vec![(1.0, 2.0), (2.0, 4.0), (3.0, 5.0)],
                anomalies,
            },
        }
    }

    // ==================== box_stats tests ====================

    #[test]
    fn test_box_stats_whiskers_stop_at_fences() {
        let sorted = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 100.0];
        let stats = box_stats(&sorted).unwrap();
        assert_eq!(stats.q1, 3.0);
        assert_eq!(stats.median, 5.0);
        assert_eq!(stats.q3, 7.0);
        // fences at -3 and 13
        assert_eq!(stats.lower_whisker, 1.0);
        assert_eq!(stats.upper_whisker, 8.0);
        assert!(box_stats(&[]).is_none());
    }

    #[test]
    fn test_heat_color_scale() {
        assert_eq!(heat_color(0.0), RGBColor(255, 255, 255));
        assert_eq!(heat_color(100.0), RGBColor(255, 0, 0));
        assert_eq!(heat_color(250.0), RGBColor(255, 0, 0));
    }

    #[test]
    fn test_padded_range() {
        assert_eq!(padded_range([0.0, 10.0].into_iter()), -0.5..10.5);
        assert_eq!(padded_range([4.0, 4.0].into_iter()), 2.0..6.0);
        assert_eq!(padded_range(std::iter::empty()), 0.0..1.0);
    }

    // ==================== render tests ====================

    #[test]
    fn test_scatter_svg_has_legend_only_with_overlay() {
        let plain = scatter(vec![]).to_svg(400, 300).unwrap();
        assert!(plain.starts_with("<svg"));
        assert!(!plain.contains("Anomalies"));

        let overlaid = scatter(vec![(3.0, 5.0)]).to_svg(400, 300).unwrap();
        assert!(overlaid.contains("Anomalies"));
    }

    #[test]
    fn test_heatmap_svg_annotates_percentages() {
        let chart = Chart {
            title: "Missing".to_string(),
            kind: ChartKind::Heatmap {
                cells: vec![("a".to_string(), 12.5), ("b".to_string(), 0.0)],
            },
        };
        let svg = chart.to_svg(400, 200).unwrap();
        assert!(svg.contains("12.5"));
        assert!(svg.contains("0.0"));
    }

    #[test]
    fn test_placeholder_svg_shows_message() {
        let chart = Chart {
            title: "Box Plot (name)".to_string(),
            kind: ChartKind::Placeholder {
                message: "nothing to plot".to_string(),
            },
        };
        assert!(chart.to_svg(300, 200).unwrap().contains("nothing to plot"));
    }

    #[test]
    fn test_into_rgb_buffer_size_and_content() {
        let chart = Chart {
            title: "Box Plot (v)".to_string(),
            kind: ChartKind::BoxPlot {
                column: "v".to_string(),
                values: vec![1.0, 2.0, 3.0, 4.0, 50.0],
                anomalies: vec![50.0],
            },
        };
        let rgb = chart.into_rgb(320, 240).unwrap();
        assert_eq!(rgb.len(), 320 * 240 * 3);
        // red overlay pixels are present
        assert!(rgb.chunks(3).any(|px| px[0] > 200 && px[1] < 60 && px[2] < 60));
    }

    fn has_dark_pixels(rgb: &[u8]) -> bool {
        rgb.chunks(3).any(|px| px.iter().all(|&c| c < 80))
    }

    #[test]
    fn test_heatmap_rasterises_with_labels() {
        let chart = Chart {
            title: "Missing Values Percentage by Column".to_string(),
            kind: ChartKind::Heatmap {
                cells: vec![("a".to_string(), 100.0), ("b".to_string(), 100.0)],
            },
        };
        let rgb = chart.into_rgb(320, 240).unwrap();
        assert_eq!(rgb.len(), 320 * 240 * 3);
        // cells are pure red and borders white; only text is dark
        assert!(has_dark_pixels(&rgb));
    }

    #[test]
    fn test_scatter_rasterises_with_caption_and_axes() {
        let rgb = scatter(vec![(3.0, 5.0)]).into_rgb(400, 300).unwrap();
        assert_eq!(rgb.len(), 400 * 300 * 3);
        assert!(has_dark_pixels(&rgb));
        assert!(rgb.chunks(3).any(|px| px[0] > 200 && px[1] < 60 && px[2] < 60));
    }

    #[test]
    fn test_placeholder_rasterises() {
        let chart = Chart {
            title: "Box Plot (name)".to_string(),
            kind: ChartKind::Placeholder {
                message: "nothing to plot".to_string(),
            },
        };
        assert!(has_dark_pixels(&chart.into_rgb(300, 200).unwrap()));
    }
}
