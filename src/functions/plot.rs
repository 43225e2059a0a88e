use plotters::prelude::*;

use crate::CalcError;
use crate::evaluator::CompiledExpr;
use crate::utils::round_to;

pub const DEFAULT_POINT_COUNT: usize = 100;
pub const DEFAULT_RANGE: (f64, f64) = (-10.0, 10.0);

/// Message shown in place of a chart when nothing can be drawn.
pub const PLACEHOLDER_MESSAGE: &str =
  "Grafik tidak dapat ditampilkan untuk fungsi ini.";

const DEFAULT_WIDTH: u32 = 360;
const DEFAULT_HEIGHT: u32 = 225;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlotMode {
  #[default]
  Normal,
  /// Also records the mirrored curve of a solid of revolution.
  Volume,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SamplePoint {
  pub x: f64,
  pub y: f64,
  /// `-y`, present in volume mode only.
  pub negated_y: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SampleSeries {
  pub points: Vec<SamplePoint>,
  pub mode: PlotMode,
}

impl SampleSeries {
  /// An empty series has nothing to draw.
  pub fn is_plottable(&self) -> bool {
    !self.points.is_empty()
  }

  pub fn len(&self) -> usize {
    self.points.len()
  }

  pub fn is_empty(&self) -> bool {
    self.points.is_empty()
  }
}

/// Options for sampling a function over an interval.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SamplerOptions {
  pub start: f64,
  pub end: f64,
  pub point_count: usize,
  pub mode: PlotMode,
}

impl Default for SamplerOptions {
  fn default() -> Self {
    Self {
      start: DEFAULT_RANGE.0,
      end: DEFAULT_RANGE.1,
      point_count: DEFAULT_POINT_COUNT,
      mode: PlotMode::Normal,
    }
  }
}

impl SamplerOptions {
  pub fn range(start: f64, end: f64) -> Self {
    Self {
      start,
      end,
      ..Default::default()
    }
  }
}

/// Sample `expression` at `point_count + 1` evenly spaced points of
/// `[start, end]`, rounding both coordinates to two decimals.
///
/// Points where the function is undefined are left out. An unparseable
/// expression or an unusable range gives an empty series.
pub fn sample_function(expression: &str, options: &SamplerOptions) -> SampleSeries {
  let empty = SampleSeries {
    points: Vec::new(),
    mode: options.mode,
  };

  let SamplerOptions {
    start,
    end,
    point_count,
    mode,
  } = *options;
  if !start.is_finite() || !end.is_finite() || start > end || point_count == 0
  {
    log::debug!("sampler: unusable range [{start}, {end}] n={point_count}");
    return empty;
  }

  let compiled = match CompiledExpr::compile(expression) {
    Ok(compiled) => compiled,
    Err(err) => {
      log::debug!("sampler: cannot compile {expression:?}: {err}");
      return empty;
    }
  };

  let step = (end - start) / point_count as f64;
  let points: Vec<SamplePoint> = (0..=point_count)
    .filter_map(|i| {
      let x = start + i as f64 * step;
      let y = compiled.evaluate(x).ok()?;
      let y = Some(round_to(y, 2)).filter(|y| y.is_finite())?;
      Some(SamplePoint {
        x: round_to(x, 2),
        y,
        negated_y: (mode == PlotMode::Volume).then_some(-y),
      })
    })
    .collect();

  log::debug!(
    "sampled {} of {} points of {expression:?}",
    points.len(),
    point_count + 1
  );
  SampleSeries { points, mode }
}

/// What the graph area shows.
#[derive(Debug, Clone, PartialEq)]
pub enum GraphView {
  Chart(String),
  Placeholder(String),
}

impl GraphView {
  pub fn is_chart(&self) -> bool {
    matches!(self, GraphView::Chart(_))
  }
}

/// Rendering options for the SVG chart.
#[derive(Debug, Clone, PartialEq)]
pub struct GraphOptions {
  pub width: u32,
  pub height: u32,
  pub color: (u8, u8, u8),
}

impl Default for GraphOptions {
  fn default() -> Self {
    Self {
      width: DEFAULT_WIDTH,
      height: DEFAULT_HEIGHT,
      color: (0x4F, 0x46, 0xE5),
    }
  }
}

/// Render a series, falling back to the placeholder when it is empty or the
/// chart cannot be drawn.
pub fn render_graph(series: &SampleSeries, options: &GraphOptions) -> GraphView {
  if !series.is_plottable() {
    return GraphView::Placeholder(PLACEHOLDER_MESSAGE.to_string());
  }
  match generate_svg(series, options) {
    Ok(svg) => GraphView::Chart(svg),
    Err(err) => {
      log::warn!("graph rendering failed: {err}");
      GraphView::Placeholder(PLACEHOLDER_MESSAGE.to_string())
    }
  }
}

/// Split points into runs of consecutive samples so gaps are not bridged.
fn split_into_segments(points: &[(f64, f64)], step: f64) -> Vec<Vec<(f64, f64)>> {
  let mut segments: Vec<Vec<(f64, f64)>> = Vec::new();
  let mut current: Vec<(f64, f64)> = Vec::new();

  for &(x, y) in points {
    if let Some(&(last_x, _)) = current.last() {
      if x - last_x > step * 1.5 {
        segments.push(std::mem::take(&mut current));
      }
    }
    current.push((x, y));
  }
  if !current.is_empty() {
    segments.push(current);
  }
  segments
}

/// Axis range padded so flat lines still get a visible band.
fn padded_range(min: f64, max: f64) -> (f64, f64) {
  if (max - min).abs() < 1e-9 {
    (min - 1.0, max + 1.0)
  } else {
    let pad = (max - min) * 0.05;
    (min - pad, max + pad)
  }
}

fn plot_error(e: impl std::fmt::Display) -> CalcError {
  CalcError::EvaluationError(format!("Plot: {e}"))
}

/// Draw the series as an SVG line chart with origin reference lines.
pub fn generate_svg(
  series: &SampleSeries,
  options: &GraphOptions,
) -> Result<String, CalcError> {
  let main: Vec<(f64, f64)> = series.points.iter().map(|p| (p.x, p.y)).collect();
  let mirror: Vec<(f64, f64)> = series
    .points
    .iter()
    .filter_map(|p| p.negated_y.map(|ny| (p.x, ny)))
    .collect();

  let xs = main.iter().map(|p| p.0);
  let ys = main.iter().chain(mirror.iter()).map(|p| p.1);
  let (x_min, x_max) = padded_range(
    xs.clone().fold(f64::INFINITY, f64::min),
    xs.fold(f64::NEG_INFINITY, f64::max),
  );
  let (y_min, y_max) = padded_range(
    ys.clone().fold(f64::INFINITY, f64::min),
    ys.fold(f64::NEG_INFINITY, f64::max),
  );

  // Smallest gap between successive samples is the sampling step
  let step = main
    .windows(2)
    .map(|w| w[1].0 - w[0].0)
    .fold(f64::INFINITY, f64::min);

  let mut buf = String::new();
  {
    let root = SVGBackend::with_string(&mut buf, (options.width, options.height))
      .into_drawing_area();
    root.fill(&WHITE).map_err(plot_error)?;

    let dark_gray = RGBColor(0x66, 0x66, 0x66);
    let light_gray = RGBColor(0xCC, 0xCC, 0xCC);

    let mut chart = ChartBuilder::on(&root)
      .margin(10)
      .x_label_area_size(25)
      .y_label_area_size(40)
      .build_cartesian_2d(x_min..x_max, y_min..y_max)
      .map_err(plot_error)?;

    chart
      .configure_mesh()
      .disable_mesh()
      .axis_style(dark_gray.stroke_width(1))
      .label_style(("sans-serif", 11).into_font().color(&dark_gray))
      .draw()
      .map_err(plot_error)?;

    // Lighter origin lines through x=0 and y=0 if visible
    if y_min < 0.0 && y_max > 0.0 {
      chart
        .draw_series(std::iter::once(PathElement::new(
          vec![(x_min, 0.0), (x_max, 0.0)],
          light_gray.stroke_width(1),
        )))
        .map_err(plot_error)?;
    }
    if x_min < 0.0 && x_max > 0.0 {
      chart
        .draw_series(std::iter::once(PathElement::new(
          vec![(0.0, y_min), (0.0, y_max)],
          light_gray.stroke_width(1),
        )))
        .map_err(plot_error)?;
    }

    let (r, g, b) = options.color;
    let color = RGBColor(r, g, b);
    for segment in split_into_segments(&main, step) {
      chart
        .draw_series(LineSeries::new(segment, color.stroke_width(2)))
        .map_err(plot_error)?;
    }
    for segment in split_into_segments(&mirror, step) {
      chart
        .draw_series(LineSeries::new(segment, color.mix(0.6).stroke_width(2)))
        .map_err(plot_error)?;
    }

    root.present().map_err(plot_error)?;
  }

  Ok(buf)
}
