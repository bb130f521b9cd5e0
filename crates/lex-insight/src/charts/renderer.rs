//! PNG chart rendering.
//!
//! [`ChartRenderer`] resolves a [`ChartSpec`] to [`ChartData`], draws it with
//! `plotters` into an RGB buffer and encodes the buffer as PNG. Text uses the
//! DejaVu Sans face embedded in the crate, registered with plotters'
//! `ab_glyph` backend, so output does not depend on system fonts.
//!
//! A chart that cannot be drawn is never fatal: [`render`] logs the reason
//! and returns `None`, and batches keep going.
//!
//! [`render`]: ChartRenderer::render

use crate::charts::data::{self, ChartData, DataSeries, HistogramBin};
use crate::charts::palette::{
    AXIS, BACKGROUND, GRID, TEXT, TITLE, WHITE, color, contrast_text, diverging,
};
use crate::charts::{ChartKind, ChartSource, ChartSpec};
use crate::config::InsightConfig;
use crate::error::{InsightError, Result};
use crate::ingest::Dataset;
use crate::utils::{format_value, truncate_label};
use anyhow::anyhow;
use image::{ImageFormat, RgbImage};
use once_cell::sync::Lazy;
use plotters::coord::Shift;
use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};
use plotters::style::{FontStyle, register_font};
use rayon::prelude::*;
use std::f64::consts::{FRAC_PI_2, TAU};
use std::io::Cursor;
use tracing::{debug, warn};

type Area<'a> = DrawingArea<BitMapBackend<'a>, Shift>;

const FONT_FAMILY: &str = "sans-serif";
static FONT_DATA: &[u8] = include_bytes!("../../assets/fonts/DejaVuSans.ttf");

/// The `ab_glyph` text backend only knows registered faces.
static FONT: Lazy<std::result::Result<(), String>> = Lazy::new(|| {
    register_font(FONT_FAMILY, FontStyle::Normal, FONT_DATA)
        .map_err(|_| "embedded font rejected".to_string())
});

const TITLE_SIZE: f64 = 26.0;
const LABEL_SIZE: f64 = 15.0;
const SMALL_SIZE: f64 = 12.0;
/// Average glyph advance at `SMALL_SIZE`, for truncating axis labels.
const SMALL_CHAR_WIDTH: f64 = 7.0;

const MARGIN: u32 = 16;
const X_LABEL_AREA: u32 = 56;
const Y_LABEL_AREA: u32 = 72;
const TICKS: usize = 6;

const LEGEND_SWATCH: i32 = 12;
const LEGEND_ROW: i32 = 22;
const LEGEND_MAX_CHARS: usize = 22;

/// Share of a category slot taken by its bar or bar group.
const BAR_FILL: f64 = 0.65;
const GROUP_FILL: f64 = 0.7;
/// Headroom above the largest value, so value labels stay inside the plot.
const VALUE_PAD: f64 = 0.125;
const POINT_PAD: f64 = 0.0625;

/// Row height for horizontal bars; the canvas grows to fit long lists.
const BAR_H_ROW: u32 = 26;
const BAR_H_LABEL_CHARS: usize = 24;
/// Height ceiling for charts that grow with their data.
pub const MAX_CHART_HEIGHT: u32 = 4000;

const ARC_STEPS: usize = 180;
/// Slices narrower than this (radians) get no percentage label.
const MIN_LABELLED_SWEEP: f64 = 0.2;
const HEATMAP_KEY_WIDTH: u32 = 70;
const MIN_ANNOTATED_CELL: i32 = 40;

/// Renders chart specs to PNG bytes.
///
/// Sheet-sourced specs need a dataset (see [`with_dataset`]); table-sourced
/// specs carry their own data.
///
/// [`with_dataset`]: ChartRenderer::with_dataset
#[derive(Clone, Copy)]
pub struct ChartRenderer<'a> {
    config: &'a InsightConfig,
    dataset: Option<&'a Dataset>,
}

impl<'a> ChartRenderer<'a> {
    pub fn new(config: &'a InsightConfig) -> Self {
        Self {
            config,
            dataset: None,
        }
    }

    pub fn with_dataset(mut self, dataset: &'a Dataset) -> Self {
        self.dataset = Some(dataset);
        self
    }

    /// Resolve the data a chart would draw. `Ok(None)` means the chart
    /// selects no rows.
    pub fn prepare(&self, spec: &ChartSpec) -> Result<Option<ChartData>> {
        let prepared = match &spec.source {
            ChartSource::Table(table) => data::from_extracted(spec.kind, table, self.config),
            ChartSource::Sheet(sheet) => {
                let table = self
                    .dataset
                    .and_then(|d| d.table(sheet))
                    .ok_or_else(|| InsightError::SheetNotFound(sheet.clone()))?;
                data::from_sheet(spec, table, self.config)
            }
        }
        .map_err(|e| render_error(spec, e))?;
        Ok(prepared.filter(|d| !is_blank(d)))
    }

    /// Render one chart. `Ok(None)` means the chart selects no rows.
    pub fn try_render(&self, spec: &ChartSpec) -> Result<Option<Vec<u8>>> {
        let Some(chart) = self.prepare(spec)? else {
            return Ok(None);
        };
        let (width, height) = canvas_size(spec.kind, &chart, self.config);
        let pixels = draw(spec, &chart, width, height).map_err(|e| render_error(spec, e))?;
        encode_png(pixels, width, height).map(Some)
    }

    /// Render one chart, logging and swallowing anything that prevents it.
    pub fn render(&self, spec: &ChartSpec) -> Option<Vec<u8>> {
        match self.try_render(spec) {
            Ok(Some(png)) => {
                debug!("Rendered {} chart '{}' ({} bytes)", spec.kind, spec.title, png.len());
                Some(png)
            }
            Ok(None) => {
                debug!("No data for {} chart '{}', skipped", spec.kind, spec.title);
                None
            }
            Err(e) => {
                warn!("Chart '{}' not rendered: {}", spec.title, e);
                None
            }
        }
    }

    /// Render several charts; results line up with `specs`.
    pub fn render_batch(&self, specs: &[ChartSpec]) -> Vec<Option<Vec<u8>>> {
        if self.config.parallel_rendering {
            specs.par_iter().map(|spec| self.render(spec)).collect()
        } else {
            specs.iter().map(|spec| self.render(spec)).collect()
        }
    }
}

fn render_error(spec: &ChartSpec, e: anyhow::Error) -> InsightError {
    InsightError::Render {
        title: spec.title.clone(),
        reason: format!("{:#}", e),
    }
}

fn is_blank(chart: &ChartData) -> bool {
    match chart {
        ChartData::Categories { labels, series, .. } => {
            labels.is_empty() || series.iter().all(|s| s.values.is_empty())
        }
        ChartData::Slices { values, .. } => values.is_empty(),
        ChartData::Points { points, .. } => points.is_empty(),
        ChartData::Histogram { bins, .. } => bins.is_empty(),
        ChartData::Matrix { labels, .. } => labels.len() < 2,
    }
}

/// Output size in pixels. Horizontal bars grow downwards with their row
/// count, up to [`MAX_CHART_HEIGHT`].
fn canvas_size(kind: ChartKind, chart: &ChartData, config: &InsightConfig) -> (u32, u32) {
    let height = match (kind, chart) {
        (ChartKind::BarH, ChartData::Categories { labels, .. }) => {
            let rows = u32::try_from(labels.len()).unwrap_or(u32::MAX);
            let chrome = 2 * MARGIN + X_LABEL_AREA + 2 * TITLE_SIZE as u32;
            let needed = rows.saturating_mul(BAR_H_ROW).saturating_add(chrome);
            needed.clamp(config.chart_height, MAX_CHART_HEIGHT.max(config.chart_height))
        }
        _ => config.chart_height,
    };
    (config.chart_width, height)
}

fn draw(spec: &ChartSpec, chart: &ChartData, width: u32, height: u32) -> anyhow::Result<Vec<u8>> {
    if let Err(e) = &*FONT {
        return Err(anyhow!(e.clone()));
    }

    let mut pixels = vec![0u8; width as usize * height as usize * 3];
    {
        let root = BitMapBackend::with_buffer(&mut pixels, (width, height)).into_drawing_area();
        root.fill(&BACKGROUND)?;

        let title = spec.title.as_str();
        let offset = spec.palette_offset;
        match chart {
            ChartData::Categories {
                labels,
                series,
                value_axis,
            } => {
                if spec.kind == ChartKind::BarH {
                    draw_bar_h(&root, title, labels, &series[0], value_axis, offset)?;
                } else {
                    draw_columns(&root, title, labels, series, value_axis, offset)?;
                }
            }
            ChartData::Slices { labels, values } => {
                draw_pie(&root, title, labels, values, offset)?;
            }
            ChartData::Points {
                x_name,
                y_name,
                points,
                x_ticks,
            } => draw_points(
                &root,
                title,
                points,
                x_ticks,
                (x_name.as_str(), y_name.as_str()),
                spec.kind == ChartKind::Line,
                offset,
            )?,
            ChartData::Histogram { column, bins } => {
                draw_histogram(&root, title, column, bins, offset)?;
            }
            ChartData::Matrix { labels, values } => draw_heatmap(&root, title, labels, values)?,
        }
        root.present()?;
    }
    Ok(pixels)
}

fn encode_png(pixels: Vec<u8>, width: u32, height: u32) -> Result<Vec<u8>> {
    let image = RgbImage::from_raw(width, height, pixels)
        .ok_or_else(|| InsightError::Internal("chart buffer does not match its size".to_string()))?;
    let mut bytes = Vec::new();
    image.write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)?;
    Ok(bytes)
}

// =============================================================================
// Layout helpers
// =============================================================================

fn font(size: f64) -> TextStyle<'static> {
    (FONT_FAMILY, size).into_font().color(&TEXT)
}

fn title_style() -> TextStyle<'static> {
    (FONT_FAMILY, TITLE_SIZE).into_font().color(&TITLE)
}

/// Value axis range: always includes zero, with headroom on the side(s)
/// values extend to.
fn value_bounds(values: impl Iterator<Item = f64>) -> (f64, f64) {
    let (lo, hi) = values
        .filter(|v| v.is_finite())
        .fold((0.0f64, 0.0f64), |(lo, hi), v| (lo.min(v), hi.max(v)));
    if lo == hi {
        return (0.0, 1.0);
    }
    let pad = (hi - lo) * VALUE_PAD;
    (
        if lo < 0.0 { lo - pad } else { lo },
        if hi > 0.0 { hi + pad } else { hi },
    )
}

/// Data range padded on both ends; a single value gets a unit window.
fn padded_range(values: impl Iterator<Item = f64>) -> (f64, f64) {
    let (lo, hi) = values
        .filter(|v| v.is_finite())
        .fold(None, |acc: Option<(f64, f64)>, v| match acc {
            None => Some((v, v)),
            Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
        })
        .unwrap_or((0.0, 1.0));
    if lo == hi {
        return (lo - 1.0, hi + 1.0);
    }
    let pad = (hi - lo) * POINT_PAD;
    (lo - pad, hi + pad)
}

/// Labels that fit a slot of `width` pixels at `SMALL_SIZE`.
fn chars_for(width: i32) -> usize {
    ((width as f64 / SMALL_CHAR_WIDTH).floor() as usize).max(3)
}

/// Polygon outline of a pie wedge: the center, then points along the arc,
/// counterclockwise from `start` (radians, 0 = three o'clock).
fn wedge_points(center: (i32, i32), radius: f64, start: f64, sweep: f64) -> Vec<(i32, i32)> {
    let steps = ((sweep / TAU) * ARC_STEPS as f64).ceil().max(1.0) as usize;
    let mut points = Vec::with_capacity(steps + 2);
    points.push(center);
    for k in 0..=steps {
        let angle = start + sweep * k as f64 / steps as f64;
        points.push((
            center.0 + (angle.cos() * radius).round() as i32,
            center.1 - (angle.sin() * radius).round() as i32,
        ));
    }
    points
}

fn draw_texts(
    root: &Area,
    texts: impl IntoIterator<Item = ((i32, i32), String)>,
    style: &TextStyle,
) -> anyhow::Result<()> {
    for (at, text) in texts {
        root.draw(&Text::new(text, at, style.clone()))?;
    }
    Ok(())
}

fn draw_title(root: &Area, title: &str) -> anyhow::Result<()> {
    let (width, _) = root.dim_in_pixel();
    let style = title_style().pos(Pos::new(HPos::Center, VPos::Top));
    root.draw(&Text::new(title.to_string(), (width as i32 / 2, MARGIN as i32), style))?;
    Ok(())
}

fn legend_width(root: &Area, names: &[String]) -> anyhow::Result<i32> {
    let style = font(LABEL_SIZE);
    let mut widest = 0;
    for name in names {
        widest = widest.max(root.estimate_text_size(name, &style)?.0);
    }
    Ok(LEGEND_SWATCH + 8 + widest as i32 + 16)
}

fn draw_legend(root: &Area, (left, top): (i32, i32), names: &[String], offset: usize) -> anyhow::Result<()> {
    let style = font(LABEL_SIZE).pos(Pos::new(HPos::Left, VPos::Center));
    for (i, name) in names.iter().enumerate() {
        let y = top + i as i32 * LEGEND_ROW;
        root.draw(&Rectangle::new(
            [(left, y), (left + LEGEND_SWATCH, y + LEGEND_SWATCH)],
            color(offset, i).filled(),
        ))?;
        root.draw(&Text::new(
            name.clone(),
            (left + LEGEND_SWATCH + 8, y + LEGEND_SWATCH / 2),
            style.clone(),
        ))?;
    }
    Ok(())
}

// =============================================================================
// Chart kinds
// =============================================================================

/// Vertical bars: one bar per category, or one sub-bar per series.
fn draw_columns(
    root: &Area,
    title: &str,
    labels: &[String],
    series: &[DataSeries],
    value_axis: &str,
    offset: usize,
) -> anyhow::Result<()> {
    let grouped = series.len() > 1;
    let n = labels.len();
    let (lo, hi) = value_bounds(series.iter().flat_map(|s| s.values.iter().copied()));

    let mut chart = ChartBuilder::on(root)
        .caption(title, title_style())
        .margin(MARGIN)
        .x_label_area_size(X_LABEL_AREA)
        .y_label_area_size(Y_LABEL_AREA)
        .build_cartesian_2d(-0.5..(n as f64 - 0.5), lo..hi)?;

    chart
        .configure_mesh()
        .disable_x_mesh()
        .x_labels(0)
        .y_labels(TICKS)
        .y_label_formatter(&|v| format_value(*v))
        .y_desc(if grouped { "" } else { value_axis })
        .axis_style(&AXIS)
        .bold_line_style(&GRID)
        .light_line_style(&BACKGROUND)
        .label_style(font(SMALL_SIZE))
        .axis_desc_style(font(LABEL_SIZE))
        .draw()?;

    let group = if grouped { GROUP_FILL } else { BAR_FILL };
    let width = group / series.len() as f64;
    for (s, data) in series.iter().enumerate() {
        let bars = data.values.iter().take(n).enumerate().map(|(i, value)| {
            let left = i as f64 - group / 2.0 + width * s as f64;
            let fill = if grouped { color(offset, s) } else { color(offset, i) };
            Rectangle::new([(left, 0.0), (left + width, *value)], fill.filled())
        });
        let drawn = chart.draw_series(bars)?;
        if grouped {
            let swatch = color(offset, s);
            drawn
                .label(truncate_label(&data.name, LEGEND_MAX_CHARS))
                .legend(move |(x, y)| Rectangle::new([(x, y - 5), (x + 10, y + 5)], swatch.filled()));
        }
    }

    if grouped {
        chart
            .configure_series_labels()
            .position(SeriesLabelPosition::UpperRight)
            .background_style(&WHITE.mix(0.85))
            .border_style(&AXIS)
            .label_font(font(SMALL_SIZE))
            .draw()?;
    } else {
        chart.draw_series(series[0].values.iter().take(n).enumerate().map(|(i, value)| {
            let (anchor, dy) = if *value >= 0.0 { (VPos::Bottom, -4) } else { (VPos::Top, 4) };
            EmptyElement::at((i as f64, *value))
                + Text::new(
                    format_value(*value),
                    (0, dy),
                    font(SMALL_SIZE).pos(Pos::new(HPos::Center, anchor)),
                )
        }))?;
    }

    let slot = chart.backend_coord(&(1.0, lo)).0 - chart.backend_coord(&(0.0, lo)).0;
    let max_chars = chars_for(slot);
    let style = font(SMALL_SIZE).pos(Pos::new(HPos::Center, VPos::Top));
    draw_texts(
        root,
        labels.iter().enumerate().map(|(i, label)| {
            let (x, y) = chart.backend_coord(&(i as f64, lo));
            ((x, y + 6), truncate_label(label, max_chars))
        }),
        &style,
    )
}

/// Horizontal bars in the given order, top to bottom.
fn draw_bar_h(
    root: &Area,
    title: &str,
    labels: &[String],
    series: &DataSeries,
    value_axis: &str,
    offset: usize,
) -> anyhow::Result<()> {
    let n = labels.len();
    let (lo, hi) = value_bounds(series.values.iter().copied());
    let widest = labels
        .iter()
        .map(|l| l.chars().count())
        .max()
        .unwrap_or(0)
        .min(BAR_H_LABEL_CHARS);
    let label_area = ((widest as f64 * SMALL_CHAR_WIDTH) as u32 + 16).max(Y_LABEL_AREA);

    let mut chart = ChartBuilder::on(root)
        .caption(title, title_style())
        .margin(MARGIN)
        .x_label_area_size(X_LABEL_AREA)
        .y_label_area_size(label_area)
        .build_cartesian_2d(lo..hi, -0.5..(n as f64 - 0.5))?;

    chart
        .configure_mesh()
        .disable_y_mesh()
        .y_labels(0)
        .x_labels(TICKS)
        .x_label_formatter(&|v| format_value(*v))
        .x_desc(value_axis)
        .axis_style(&AXIS)
        .bold_line_style(&GRID)
        .light_line_style(&BACKGROUND)
        .label_style(font(SMALL_SIZE))
        .axis_desc_style(font(LABEL_SIZE))
        .draw()?;

    // First label on top.
    let row = |i: usize| (n - 1 - i) as f64;
    chart.draw_series(series.values.iter().take(n).enumerate().map(|(i, value)| {
        Rectangle::new(
            [(0.0, row(i) - BAR_FILL / 2.0), (*value, row(i) + BAR_FILL / 2.0)],
            color(offset, i).filled(),
        )
    }))?;
    chart.draw_series(series.values.iter().take(n).enumerate().map(|(i, value)| {
        let (anchor, dx) = if *value >= 0.0 { (HPos::Left, 6) } else { (HPos::Right, -6) };
        EmptyElement::at((*value, row(i)))
            + Text::new(
                format_value(*value),
                (dx, 0),
                font(SMALL_SIZE).pos(Pos::new(anchor, VPos::Center)),
            )
    }))?;

    let style = font(SMALL_SIZE).pos(Pos::new(HPos::Right, VPos::Center));
    draw_texts(
        root,
        labels.iter().enumerate().map(|(i, label)| {
            let (x, y) = chart.backend_coord(&(lo, row(i)));
            ((x - 8, y), truncate_label(label, BAR_H_LABEL_CHARS))
        }),
        &style,
    )
}

/// Pie starting at twelve o'clock, counterclockwise, with a legend.
fn draw_pie(root: &Area, title: &str, labels: &[String], values: &[f64], offset: usize) -> anyhow::Result<()> {
    draw_title(root, title)?;
    let total: f64 = values.iter().filter(|v| **v > 0.0).sum();
    if total <= 0.0 {
        return Ok(());
    }

    let names: Vec<String> = labels
        .iter()
        .map(|l| truncate_label(l, LEGEND_MAX_CHARS))
        .collect();
    let (width, height) = root.dim_in_pixel();
    let left = MARGIN as i32;
    let top = MARGIN as i32 + 2 * TITLE_SIZE as i32;
    let right = width as i32 - MARGIN as i32 - legend_width(root, &names)?;
    let bottom = height as i32 - MARGIN as i32;
    let radius = ((right - left).min(bottom - top) / 2 - 8).max(10) as f64;
    let center = ((left + right) / 2, (top + bottom) / 2);

    let mut start = FRAC_PI_2;
    for (i, value) in values.iter().enumerate() {
        let sweep = value.max(0.0) / total * TAU;
        if sweep <= 0.0 {
            continue;
        }
        let fill = color(offset, i);
        root.draw(&Polygon::new(wedge_points(center, radius, start, sweep), fill.filled()))?;

        if sweep > MIN_LABELLED_SWEEP {
            let mid = start + sweep / 2.0;
            let at = (
                center.0 + (mid.cos() * radius * 0.65).round() as i32,
                center.1 - (mid.sin() * radius * 0.65).round() as i32,
            );
            let style = (FONT_FAMILY, LABEL_SIZE)
                .into_font()
                .color(&contrast_text(fill))
                .pos(Pos::new(HPos::Center, VPos::Center));
            root.draw(&Text::new(format!("{:.1}%", value / total * 100.0), at, style))?;
        }
        start += sweep;
    }
    draw_legend(root, (right + 16, top), &names, offset)
}

/// Line (connected, with markers) or scatter chart.
fn draw_points(
    root: &Area,
    title: &str,
    points: &[(f64, f64)],
    x_ticks: &[(f64, String)],
    (x_name, y_name): (&str, &str),
    connect: bool,
    offset: usize,
) -> anyhow::Result<()> {
    let (x_lo, x_hi) = padded_range(points.iter().map(|p| p.0));
    let (y_lo, y_hi) = padded_range(points.iter().map(|p| p.1));

    let mut chart = ChartBuilder::on(root)
        .caption(title, title_style())
        .margin(MARGIN)
        .x_label_area_size(X_LABEL_AREA)
        .y_label_area_size(Y_LABEL_AREA)
        .build_cartesian_2d(x_lo..x_hi, y_lo..y_hi)?;

    // Named ticks (dates, text positions) are drawn below instead.
    chart
        .configure_mesh()
        .x_labels(if x_ticks.is_empty() { TICKS } else { 0 })
        .y_labels(TICKS)
        .x_label_formatter(&|v| format_value(*v))
        .y_label_formatter(&|v| format_value(*v))
        .x_desc(x_name)
        .y_desc(y_name)
        .axis_style(&AXIS)
        .bold_line_style(&GRID)
        .light_line_style(&BACKGROUND)
        .label_style(font(SMALL_SIZE))
        .axis_desc_style(font(LABEL_SIZE))
        .draw()?;

    let fill = color(offset, 0);
    if connect {
        chart.draw_series(LineSeries::new(points.iter().copied(), fill.stroke_width(3)))?;
    }
    let radius = if connect { 4 } else { 3 };
    chart.draw_series(points.iter().map(|p| Circle::new(*p, radius, fill.filled())))?;

    if !x_ticks.is_empty() {
        let plot_width = chart.backend_coord(&(x_hi, y_lo)).0 - chart.backend_coord(&(x_lo, y_lo)).0;
        let max_chars = chars_for(plot_width / x_ticks.len() as i32);
        let style = font(SMALL_SIZE).pos(Pos::new(HPos::Center, VPos::Top));
        draw_texts(
            root,
            x_ticks.iter().map(|(x, label)| {
                let (px, py) = chart.backend_coord(&(*x, y_lo));
                ((px, py + 6), truncate_label(label, max_chars))
            }),
            &style,
        )?;
    }
    Ok(())
}

/// Contiguous bars over the value range.
fn draw_histogram(
    root: &Area,
    title: &str,
    column: &str,
    bins: &[HistogramBin],
    offset: usize,
) -> anyhow::Result<()> {
    let (first, last) = (bins[0].start, bins[bins.len() - 1].end);
    let max_count = bins.iter().map(|b| b.count).max().unwrap_or(0).max(1) as f64;

    let mut chart = ChartBuilder::on(root)
        .caption(title, title_style())
        .margin(MARGIN)
        .x_label_area_size(X_LABEL_AREA)
        .y_label_area_size(Y_LABEL_AREA)
        .build_cartesian_2d(first..last, 0.0..max_count * (1.0 + VALUE_PAD))?;

    chart
        .configure_mesh()
        .disable_x_mesh()
        .x_labels(TICKS)
        .y_labels(TICKS)
        .x_label_formatter(&|v| format_value(*v))
        .y_label_formatter(&|v| format_value(*v))
        .x_desc(column)
        .y_desc("Frequency")
        .axis_style(&AXIS)
        .bold_line_style(&GRID)
        .light_line_style(&BACKGROUND)
        .label_style(font(SMALL_SIZE))
        .axis_desc_style(font(LABEL_SIZE))
        .draw()?;

    let fill = color(offset, 0);
    chart.draw_series(bins.iter().filter(|b| b.count > 0).map(|bin| {
        let mut bar = Rectangle::new([(bin.start, 0.0), (bin.end, bin.count as f64)], fill.filled());
        bar.set_margin(0, 0, 0, 1);
        bar
    }))?;
    Ok(())
}

/// Annotated correlation matrix with a -1..1 color key on the right.
fn draw_heatmap(
    root: &Area,
    title: &str,
    labels: &[String],
    values: &[Vec<Option<f64>>],
) -> anyhow::Result<()> {
    let n = labels.len();
    let (width, _) = root.dim_in_pixel();
    let widest = labels.iter().map(|l| l.chars().count()).max().unwrap_or(0);
    let label_area = ((widest as f64 * SMALL_CHAR_WIDTH) as u32 + 16).clamp(60, width / 4);

    let mut chart = ChartBuilder::on(root)
        .caption(title, title_style())
        .margin(MARGIN)
        .margin_right(HEATMAP_KEY_WIDTH)
        .x_label_area_size(X_LABEL_AREA)
        .y_label_area_size(label_area)
        .build_cartesian_2d(0.0..n as f64, 0.0..n as f64)?;

    chart
        .configure_mesh()
        .disable_mesh()
        .x_labels(0)
        .y_labels(0)
        .axis_style(&AXIS)
        .draw()?;

    // Row 0 on top.
    let row = |i: usize| (n - 1 - i) as f64;
    let cells = values.iter().enumerate().flat_map(|(i, line)| {
        line.iter().enumerate().map(move |(j, value)| (i, j, *value))
    });
    chart.draw_series(cells.clone().map(|(i, j, value)| {
        let y = row(i);
        let mut cell = Rectangle::new([(j as f64, y), (j as f64 + 1.0, y + 1.0)], diverging(value).filled());
        cell.set_margin(1, 1, 1, 1);
        cell
    }))?;

    let cell_px = chart.backend_coord(&(1.0, 0.0)).0 - chart.backend_coord(&(0.0, 0.0)).0;
    if cell_px >= MIN_ANNOTATED_CELL {
        chart.draw_series(cells.filter_map(|(i, j, value)| {
            let v = value?;
            let style = (FONT_FAMILY, SMALL_SIZE)
                .into_font()
                .color(&contrast_text(diverging(value)))
                .pos(Pos::new(HPos::Center, VPos::Center));
            Some(Text::new(format!("{:.2}", v), (j as f64 + 0.5, row(i) + 0.5), style))
        }))?;
    }

    let max_chars = chars_for(cell_px);
    draw_texts(
        root,
        labels.iter().enumerate().map(|(i, label)| {
            let (x, y) = chart.backend_coord(&(0.0, row(i) + 0.5));
            ((x - 6, y), truncate_label(label, max_chars.max(widest)))
        }),
        &font(SMALL_SIZE).pos(Pos::new(HPos::Right, VPos::Center)),
    )?;
    draw_texts(
        root,
        labels.iter().enumerate().map(|(j, label)| {
            let (x, y) = chart.backend_coord(&(j as f64 + 0.5, 0.0));
            ((x, y + 6), truncate_label(label, max_chars))
        }),
        &font(SMALL_SIZE).pos(Pos::new(HPos::Center, VPos::Top)),
    )?;

    let (_, key_top) = chart.backend_coord(&(0.0, n as f64));
    let (right, key_bottom) = chart.backend_coord(&(n as f64, 0.0));
    let key_left = right + 24;
    let key_height = (key_bottom - key_top).max(1);
    for step in 0..key_height {
        let v = 1.0 - 2.0 * step as f64 / key_height as f64;
        let y = key_top + step;
        root.draw(&Rectangle::new([(key_left, y), (key_left + 14, y + 1)], diverging(Some(v)).filled()))?;
    }
    let style = font(SMALL_SIZE).pos(Pos::new(HPos::Left, VPos::Center));
    draw_texts(
        root,
        [
            ((key_left + 20, key_top), "1".to_string()),
            ((key_left + 20, key_top + key_height / 2), "0".to_string()),
            ((key_left + 20, key_bottom), "-1".to_string()),
        ],
        &style,
    )
}
