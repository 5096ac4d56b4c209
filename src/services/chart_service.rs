use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use plotters::prelude::*;
use thiserror::Error;
use tracing::debug;

use crate::models::{
    parse_hex_color, AxisWindow, ChartConfig, ChartState, DatasetConfig, Interpolation,
    PlotPoint, Series,
};
use crate::services::window_service::axis_window;

/// Interpolated samples drawn between two neighbouring points
const SAMPLES_PER_SEGMENT: usize = 12;

/// Rendering failures
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("Drawing failed: {0}")]
    Drawing(String),
    #[error("Axis window {0}..{1} is not representable")]
    InvalidWindow(i64, i64),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// A surface that can draw the chart
pub trait ChartRenderer: Send {
    fn render(&mut self, config: &ChartConfig, state: &ChartState) -> Result<(), RenderError>;
}

/// The dashboard chart: fixed configuration plus the data currently shown
#[derive(Debug, Clone)]
pub struct Chart {
    config: ChartConfig,
    state: ChartState,
    padding_ms: i64,
}

impl Chart {
    /// Build a chart with empty series and a window ending at `now_ms`
    pub fn new(config: ChartConfig, padding_ms: i64, now_ms: i64) -> Self {
        Self {
            config,
            state: ChartState::new(axis_window(now_ms, padding_ms)),
            padding_ms,
        }
    }

    pub fn state(&self) -> &ChartState {
        &self.state
    }

    /// Swap in new series and a fresh window without drawing
    fn replace_data(&mut self, low: Series, high: Series, now_ms: i64) {
        self.state.low = low;
        self.state.high = high;
        self.state.window = axis_window(now_ms, self.padding_ms);
    }
}

/// Replace both datasets and the axis window, then redraw.
///
/// Data is replaced, never appended, so repeating a call with the same
/// inputs leaves the same state behind.
pub fn update_chart(
    chart: &mut Chart,
    low: Series,
    high: Series,
    now_ms: i64,
    renderer: &mut dyn ChartRenderer,
) -> Result<(), RenderError> {
    chart.replace_data(low, high, now_ms);
    debug!(
        "Chart updated: {} low, {} high, window {}..{}",
        chart.state.low.len(),
        chart.state.high.len(),
        chart.state.window.min,
        chart.state.window.max
    );
    renderer.render(&chart.config, &chart.state)
}

/// Renders the chart to a PNG file
pub struct PngRenderer {
    output: PathBuf,
}

impl PngRenderer {
    pub fn new(output: PathBuf) -> Self {
        Self { output }
    }

    pub fn output(&self) -> &Path {
        &self.output
    }

    /// Sibling path the frame is drawn to before it replaces the output.
    /// Keeps a `.png` extension so the encoder picks the right format.
    fn partial_path(&self) -> PathBuf {
        let stem = self
            .output
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "chart".to_string());
        self.output.with_file_name(format!(".{}.partial.png", stem))
    }
}

impl ChartRenderer for PngRenderer {
    fn render(&mut self, config: &ChartConfig, state: &ChartState) -> Result<(), RenderError> {
        let partial = self.partial_path();
        draw_chart(&partial, config, state)?;
        std::fs::rename(&partial, &self.output)?;
        Ok(())
    }
}

fn to_datetime(ms: i64) -> Option<DateTime<Utc>> {
    DateTime::<Utc>::from_timestamp_millis(ms)
}

fn dataset_color(dataset: &DatasetConfig) -> RGBColor {
    parse_hex_color(&dataset.color)
        .map(|(r, g, b)| RGBColor(r, g, b))
        .unwrap_or(BLACK)
}

/// Bounds of the count axis, with headroom above the largest sample
fn count_range(state: &ChartState) -> (f64, f64) {
    let max_count = state
        .low
        .iter()
        .chain(state.high.iter())
        .map(|p| p.y)
        .fold(f64::NEG_INFINITY, f64::max);
    let min_count = state
        .low
        .iter()
        .chain(state.high.iter())
        .map(|p| p.y)
        .fold(f64::INFINITY, f64::min);

    let floor = if min_count.is_finite() { min_count.min(0.0) } else { 0.0 };
    if !max_count.is_finite() || max_count <= 0.0 {
        return (floor, 1.0);
    }
    (floor, max_count * 1.1)
}

/// Points actually drawn for a dataset, clipped to the axis window
fn line_samples(
    series: &Series,
    dataset: &DatasetConfig,
    window: AxisWindow,
) -> Vec<(DateTime<Utc>, f64)> {
    let samples = match dataset.interpolation {
        Interpolation::Monotone => monotone_cubic(series, SAMPLES_PER_SEGMENT),
        Interpolation::Linear => series.iter().map(|p| (p.x as f64, p.y)).collect(),
    };

    samples
        .into_iter()
        .filter(|(x, _)| *x >= window.min as f64 && *x <= window.max as f64)
        .filter_map(|(x, y)| to_datetime(x.round() as i64).map(|t| (t, y)))
        .collect()
}

fn draw_chart(path: &Path, config: &ChartConfig, state: &ChartState) -> Result<(), RenderError> {
    let window = state.window;
    let x_min = to_datetime(window.min).ok_or(RenderError::InvalidWindow(window.min, window.max))?;
    let x_max = to_datetime(window.max).ok_or(RenderError::InvalidWindow(window.min, window.max))?;
    if x_min >= x_max {
        return Err(RenderError::InvalidWindow(window.min, window.max));
    }
    let (y_min, y_max) = count_range(state);

    let root = BitMapBackend::new(path, (config.width, config.height)).into_drawing_area();
    root.fill(&WHITE)
        .map_err(|e| RenderError::Drawing(format!("Failed to fill canvas: {}", e)))?;

    let mut chart = ChartBuilder::on(&root)
        .margin(15)
        .x_label_area_size(40)
        .y_label_area_size(60)
        .build_cartesian_2d(x_min..x_max, y_min..y_max)
        .map_err(|e| RenderError::Drawing(format!("Failed to build chart: {}", e)))?;

    chart
        .configure_mesh()
        .x_desc("Time")
        .y_desc("Count")
        .x_label_formatter(&|t| t.format("%H:%M:%S").to_string())
        .draw()
        .map_err(|e| RenderError::Drawing(format!("Failed to draw mesh: {}", e)))?;

    for (series, dataset) in [(&state.low, &config.low), (&state.high, &config.high)] {
        let color = dataset_color(dataset);
        let line = line_samples(series, dataset, window);

        chart
            .draw_series(LineSeries::new(line, color.stroke_width(2)))
            .map_err(|e| RenderError::Drawing(format!("Failed to draw {} line: {}", dataset.label, e)))?
            .label(dataset.label.as_str())
            .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], color.stroke_width(2)));

        let knots: Vec<(DateTime<Utc>, f64)> = series
            .iter()
            .filter(|p| p.x >= window.min && p.x <= window.max)
            .filter_map(|p| to_datetime(p.x).map(|t| (t, p.y)))
            .collect();
        chart
            .draw_series(knots.into_iter().map(|pos| Circle::new(pos, 3, color.filled())))
            .map_err(|e| RenderError::Drawing(format!("Failed to draw {} points: {}", dataset.label, e)))?;
    }

    chart
        .configure_series_labels()
        .position(SeriesLabelPosition::UpperLeft)
        .margin(10)
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK)
        .draw()
        .map_err(|e| RenderError::Drawing(format!("Failed to draw legend: {}", e)))?;

    root.present()
        .map_err(|e| RenderError::Drawing(format!("Failed to render chart: {}", e)))?;

    Ok(())
}

/// Monotone cubic (Fritsch–Carlson) interpolation of `points`.
///
/// Returns every knot plus `steps - 1` samples between each pair of
/// knots. Falls back to the knots alone when x is not strictly
/// increasing or there are too few points to curve.
pub fn monotone_cubic(points: &[PlotPoint], steps: usize) -> Vec<(f64, f64)> {
    let knots: Vec<(f64, f64)> = points.iter().map(|p| (p.x as f64, p.y)).collect();
    let n = knots.len();
    if n < 3 || steps < 2 || points.windows(2).any(|w| w[1].x <= w[0].x) {
        return knots;
    }

    let h: Vec<f64> = knots.windows(2).map(|w| w[1].0 - w[0].0).collect();
    let delta: Vec<f64> = knots
        .windows(2)
        .zip(&h)
        .map(|(w, h)| (w[1].1 - w[0].1) / h)
        .collect();

    let mut m = vec![0.0; n];
    m[0] = delta[0];
    m[n - 1] = delta[n - 2];
    for i in 1..n - 1 {
        m[i] = if delta[i - 1] * delta[i] <= 0.0 {
            0.0
        } else {
            (delta[i - 1] + delta[i]) / 2.0
        };
    }

    for i in 0..n - 1 {
        if delta[i] == 0.0 {
            m[i] = 0.0;
            m[i + 1] = 0.0;
            continue;
        }
        let a = m[i] / delta[i];
        let b = m[i + 1] / delta[i];
        let s = a * a + b * b;
        if s > 9.0 {
            let t = 3.0 / s.sqrt();
            m[i] = t * a * delta[i];
            m[i + 1] = t * b * delta[i];
        }
    }

    let mut out = Vec::with_capacity((n - 1) * steps + 1);
    out.push(knots[0]);
    for i in 0..n - 1 {
        let (x0, y0) = knots[i];
        let (_, y1) = knots[i + 1];
        for k in 1..=steps {
            let t = k as f64 / steps as f64;
            let t2 = t * t;
            let t3 = t2 * t;
            let h00 = 2.0 * t3 - 3.0 * t2 + 1.0;
            let h10 = t3 - 2.0 * t2 + t;
            let h01 = -2.0 * t3 + 3.0 * t2;
            let h11 = t3 - t2;
            let y = h00 * y0 + h10 * h[i] * m[i] + h01 * y1 + h11 * h[i] * m[i + 1];
            out.push((x0 + t * h[i], y));
        }
    }
    out
}
