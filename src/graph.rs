// Plotters backend that executes plot instructions

use crate::aggregate::GroupedResult;
use crate::eligibility::ChartType;
use crate::ir::{PlotInstruction, Series};
use crate::{OutputFormat, RenderOptions};
use anyhow::{bail, Context, Result};
use image::ImageEncoder;
use plotters::coord::Shift;
use plotters::prelude::*;
use std::f64::consts::PI;
use std::ops::Range;

/// Category10 colors, cycled across pie slices
const PALETTE: [RGBColor; 10] = [
    RGBColor(31, 119, 180),
    RGBColor(255, 127, 14),
    RGBColor(44, 160, 44),
    RGBColor(214, 39, 40),
    RGBColor(148, 103, 189),
    RGBColor(140, 86, 75),
    RGBColor(227, 119, 194),
    RGBColor(127, 127, 127),
    RGBColor(188, 189, 34),
    RGBColor(23, 190, 207),
];

/// Render a plot instruction to encoded image bytes (PNG or SVG)
pub fn render(instruction: &PlotInstruction, options: &RenderOptions) -> Result<Vec<u8>> {
    if instruction.series.is_empty() {
        bail!("Cannot render {} with no data", instruction.kind);
    }
    options.validate()?;

    tracing::debug!(
        chart = %instruction.kind,
        width = options.width,
        height = options.height,
        format = ?options.format,
        "Rendering plot"
    );

    match options.format {
        OutputFormat::Png => render_png(instruction, options.width, options.height),
        OutputFormat::Svg => render_svg(instruction, options.width, options.height),
    }
}

fn render_png(instruction: &PlotInstruction, width: u32, height: u32) -> Result<Vec<u8>> {
    let len = (width as usize)
        .checked_mul(height as usize)
        .and_then(|pixels| pixels.checked_mul(3))
        .context("Image dimensions overflow")?;
    let mut buffer = vec![0u8; len];
    {
        let root = BitMapBackend::with_buffer(&mut buffer, (width, height)).into_drawing_area();
        draw(&root, instruction)?;
        root.present().context("Failed to present drawing")?;
    }

    let mut png_bytes = Vec::new();
    {
        let encoder = image::codecs::png::PngEncoder::new(&mut png_bytes);
        encoder
            .write_image(&buffer, width, height, image::ColorType::Rgb8)
            .context("Failed to encode PNG")?;
    }

    Ok(png_bytes)
}

fn render_svg(instruction: &PlotInstruction, width: u32, height: u32) -> Result<Vec<u8>> {
    let mut svg = String::new();
    {
        let root = SVGBackend::with_string(&mut svg, (width, height)).into_drawing_area();
        draw(&root, instruction)?;
        root.present().context("Failed to present drawing")?;
    }
    Ok(svg.into_bytes())
}

fn draw<DB: DrawingBackend>(root: &DrawingArea<DB, Shift>, instruction: &PlotInstruction) -> Result<()>
where
    DB::ErrorType: 'static,
{
    root.fill(&WHITE).context("Failed to fill background")?;

    match (instruction.kind, &instruction.series) {
        (ChartType::Bar, Series::Grouped(groups)) => draw_bars(root, instruction, groups),
        (ChartType::Line, Series::Grouped(groups)) => draw_line(root, instruction, groups),
        (ChartType::Pie, Series::Frequency(counts)) => draw_pie(root, instruction, counts),
        (ChartType::Histogram, Series::Raw(values)) => draw_histogram(root, instruction, values),
        (kind, _) => bail!("Series does not match chart kind {}", kind),
    }
}

fn draw_bars<DB: DrawingBackend>(
    root: &DrawingArea<DB, Shift>,
    instruction: &PlotInstruction,
    groups: &GroupedResult,
) -> Result<()>
where
    DB::ErrorType: 'static,
{
    let categories: Vec<&str> = groups.keys().collect();
    let values: Vec<f64> = groups.values().collect();
    let x_range = category_range(categories.len());

    let mut chart = ChartBuilder::on(root)
        .margin(10)
        .caption(&instruction.title, ("sans-serif", 20))
        .x_label_area_size(50)
        .y_label_area_size(60)
        .build_cartesian_2d(x_range, value_range(&values))
        .context("Failed to build chart")?;

    chart
        .configure_mesh()
        .disable_x_mesh()
        .x_labels(categories.len())
        .x_label_formatter(&|x| category_label(&categories, *x))
        .x_desc(instruction.x_label.as_str())
        .y_desc(instruction.y_label.as_deref().unwrap_or(""))
        .draw()
        .context("Failed to draw mesh")?;

    let bar_width = 0.8;
    chart
        .draw_series(
            values
                .iter()
                .enumerate()
                .filter(|(_, v)| v.is_finite())
                .map(|(idx, &v)| {
                    let x = idx as f64;
                    Rectangle::new(
                        [(x - bar_width / 2.0, 0.0), (x + bar_width / 2.0, v)],
                        PALETTE[0].filled(),
                    )
                }),
        )
        .context("Failed to draw bars")?;

    Ok(())
}

fn draw_line<DB: DrawingBackend>(
    root: &DrawingArea<DB, Shift>,
    instruction: &PlotInstruction,
    groups: &GroupedResult,
) -> Result<()>
where
    DB::ErrorType: 'static,
{
    let categories: Vec<&str> = groups.keys().collect();
    let values: Vec<f64> = groups.values().collect();

    let mut chart = ChartBuilder::on(root)
        .margin(10)
        .caption(&instruction.title, ("sans-serif", 20))
        .x_label_area_size(50)
        .y_label_area_size(60)
        .build_cartesian_2d(category_range(categories.len()), value_range(&values))
        .context("Failed to build chart")?;

    chart
        .configure_mesh()
        .x_labels(categories.len())
        .x_label_formatter(&|x| category_label(&categories, *x))
        .x_desc(instruction.x_label.as_str())
        .y_desc(instruction.y_label.as_deref().unwrap_or(""))
        .draw()
        .context("Failed to draw mesh")?;

    let points: Vec<(f64, f64)> = values
        .iter()
        .enumerate()
        .filter(|(_, v)| v.is_finite())
        .map(|(idx, &v)| (idx as f64, v))
        .collect();

    chart
        .draw_series(LineSeries::new(points.clone(), PALETTE[0].stroke_width(2)))
        .context("Failed to draw line series")?;
    chart
        .draw_series(points.iter().map(|&p| Circle::new(p, 3, PALETTE[0].filled())))
        .context("Failed to draw point series")?;

    Ok(())
}

fn draw_pie<DB: DrawingBackend>(
    root: &DrawingArea<DB, Shift>,
    instruction: &PlotInstruction,
    counts: &GroupedResult,
) -> Result<()>
where
    DB::ErrorType: 'static,
{
    let area = root
        .titled(&instruction.title, ("sans-serif", 20).into_font())
        .context("Failed to draw title")?;

    let (width, height) = area.dim_in_pixel();
    let center = (width as f64 / 2.0, height as f64 / 2.0);
    let radius = width.min(height) as f64 * 0.35;
    let total: f64 = counts.values().sum();

    // Slices run clockwise from twelve o'clock
    let mut start = -PI / 2.0;
    for (idx, row) in counts.rows().iter().enumerate() {
        let fraction = row.value / total;
        let sweep = fraction * 2.0 * PI;
        let color = PALETTE[idx % PALETTE.len()];

        area.draw(&Polygon::new(
            sector_points(center, radius, start, start + sweep),
            color.filled(),
        ))
        .context("Failed to draw pie slice")?;

        let mid = start + sweep / 2.0;
        area.draw(&Text::new(
            row.key.clone(),
            polar(center, radius * 1.12, mid),
            ("sans-serif", 14).into_font(),
        ))
        .context("Failed to draw slice label")?;
        area.draw(&Text::new(
            format!("{:.1}%", fraction * 100.0),
            polar(center, radius * 0.6, mid),
            ("sans-serif", 12).into_font().color(&WHITE),
        ))
        .context("Failed to draw slice percentage")?;

        start += sweep;
    }

    Ok(())
}

fn draw_histogram<DB: DrawingBackend>(
    root: &DrawingArea<DB, Shift>,
    instruction: &PlotInstruction,
    values: &[f64],
) -> Result<()>
where
    DB::ErrorType: 'static,
{
    let bins = histogram_bins(values);
    let max_count = bins.iter().map(|b| b.count).max().unwrap_or(0) as f64;
    let x_range = match (bins.first(), bins.last()) {
        (Some(first), Some(last)) => pad_range(first.start, last.end),
        _ => bail!("Cannot create histogram with no data"),
    };

    let mut chart = ChartBuilder::on(root)
        .margin(10)
        .caption(&instruction.title, ("sans-serif", 20))
        .x_label_area_size(50)
        .y_label_area_size(60)
        .build_cartesian_2d(x_range, 0.0..(max_count * 1.05).max(1.0))
        .context("Failed to build chart")?;

    chart
        .configure_mesh()
        .disable_x_mesh()
        .x_desc(instruction.x_label.as_str())
        .y_desc(instruction.y_label.as_deref().unwrap_or("Count"))
        .draw()
        .context("Failed to draw mesh")?;

    chart
        .draw_series(bins.iter().map(|b| {
            Rectangle::new([(b.start, 0.0), (b.end, b.count as f64)], PALETTE[0].mix(0.8).filled())
        }))
        .context("Failed to draw histogram bars")?;

    Ok(())
}

/// One histogram bar
#[derive(Debug, Clone, PartialEq)]
pub struct Bin {
    pub start: f64,
    pub end: f64,
    pub count: usize,
}

/// Upper bound on histogram bars
pub const MAX_BINS: usize = 1000;

/// Automatic bin count: the larger of the Sturges and Freedman-Diaconis estimates,
/// falling back to Sturges when Freedman-Diaconis exceeds [`MAX_BINS`]
pub fn auto_bin_count(values: &[f64]) -> usize {
    let n = values.len();
    if n < 2 {
        return 1;
    }

    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    let range = sorted[n - 1] - sorted[0];
    if range <= 0.0 {
        return 1;
    }

    let sturges_width = range / ((n as f64).log2() + 1.0);
    let iqr = percentile(&sorted, 0.75) - percentile(&sorted, 0.25);
    let fd_width = 2.0 * iqr / (n as f64).cbrt();

    let sturges_bins = (range / sturges_width).ceil();
    let fd_bins = if fd_width > 0.0 { (range / fd_width).ceil() } else { 0.0 };

    // A tight cluster plus an outlier drives the FD width towards zero
    let bins = if fd_bins > MAX_BINS as f64 {
        sturges_bins
    } else {
        sturges_bins.max(fd_bins)
    };
    (bins as usize).clamp(1, MAX_BINS)
}

/// Equal-width bins spanning the data, sized by [`auto_bin_count`]
pub fn histogram_bins(values: &[f64]) -> Vec<Bin> {
    let finite: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
    if finite.is_empty() {
        return Vec::new();
    }

    let min = finite.iter().cloned().fold(f64::INFINITY, f64::min);
    let max = finite.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    let count = auto_bin_count(&finite);

    let (min, width) = if max > min {
        (min, (max - min) / count as f64)
    } else {
        (min - 0.5, 1.0)
    };

    let mut bins: Vec<Bin> = (0..count)
        .map(|i| Bin {
            start: min + i as f64 * width,
            end: min + (i + 1) as f64 * width,
            count: 0,
        })
        .collect();

    for v in finite {
        // The last bin is closed on the right
        let idx = (((v - min) / width).floor() as usize).min(count - 1);
        bins[idx].count += 1;
    }
    bins
}

fn percentile(sorted_data: &[f64], p: f64) -> f64 {
    let n = sorted_data.len();
    if n == 0 {
        return 0.0;
    }
    if n == 1 {
        return sorted_data[0];
    }

    let rank = p * (n - 1) as f64;
    let lower_idx = rank.floor() as usize;
    let upper_idx = rank.ceil() as usize;

    if lower_idx == upper_idx {
        sorted_data[lower_idx]
    } else {
        let weight = rank - lower_idx as f64;
        sorted_data[lower_idx] * (1.0 - weight) + sorted_data[upper_idx] * weight
    }
}

/// Category i sits at x = i
fn category_range(n: usize) -> Range<f64> {
    -0.5..(n as f64 - 0.5)
}

fn category_label(categories: &[&str], x: f64) -> String {
    let idx = x.round();
    if (x - idx).abs() > 1e-6 || idx < 0.0 {
        return String::new();
    }
    categories
        .get(idx as usize)
        .map(|c| c.to_string())
        .unwrap_or_default()
}

/// Value axis range that always includes zero, padded by 5%
fn value_range(values: &[f64]) -> Range<f64> {
    let finite = values.iter().copied().filter(|v| v.is_finite());
    let min = finite.clone().fold(0.0, f64::min);
    let max = finite.fold(0.0, f64::max);
    pad_range(min, max)
}

fn pad_range(min: f64, max: f64) -> Range<f64> {
    if min == max {
        (min - 1.0)..(max + 1.0)
    } else {
        let padding = (max - min) * 0.05;
        (min - padding)..(max + padding)
    }
}

fn polar(center: (f64, f64), radius: f64, angle: f64) -> (i32, i32) {
    (
        (center.0 + radius * angle.cos()).round() as i32,
        (center.1 + radius * angle.sin()).round() as i32,
    )
}

fn sector_points(center: (f64, f64), radius: f64, start: f64, end: f64) -> Vec<(i32, i32)> {
    let steps = (((end - start) / (PI / 90.0)).ceil() as usize).max(1);
    let mut points = Vec::with_capacity(steps + 2);
    points.push((center.0.round() as i32, center.1.round() as i32));
    for i in 0..=steps {
        let angle = start + (end - start) * i as f64 / steps as f64;
        points.push(polar(center, radius, angle));
    }
    points
}
