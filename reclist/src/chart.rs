//! Chart rendering for bars and bins results.
//!
//! Charts are plain SVG documents so they can be written through any
//! artifact store or uploaded to a tracking service as-is.

use crate::annotation::ChartType;
use crate::record::{TestOutcome, TestRecord};
use std::fmt::Write as _;
use thiserror::Error;

/// Number of equal-width bins in a histogram.
pub const HISTOGRAM_BINS: usize = 10;

const WIDTH: f64 = 640.0;
const HEIGHT: f64 = 480.0;
const MARGIN_LEFT: f64 = 70.0;
const MARGIN_RIGHT: f64 = 30.0;
const MARGIN_TOP: f64 = 50.0;
const MARGIN_BOTTOM: f64 = 60.0;

const BAR_FILL: &str = "#1f77b4";
const BIN_FILL: &str = "lightgreen";
const BIN_EDGE: &str = "black";

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ChartError {
    #[error("Chart '{test}' declared as {chart} but the result is a {shape}")]
    ShapeMismatch {
        test: String,
        chart: ChartType,
        shape: &'static str,
    },
}

pub type ChartResult<T> = Result<T, ChartError>;

#[derive(Debug, Clone, PartialEq)]
pub struct HistogramBin {
    pub start: f64,
    pub end: f64,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ChartData {
    Bars(Vec<(String, f64)>),
    Histogram(Vec<HistogramBin>),
}

/// A rendered-on-demand chart for one test result.
#[derive(Debug, Clone, PartialEq)]
pub struct Chart {
    /// Test identifier; charts are saved and uploaded under this name
    pub name: String,
    /// Title drawn on the chart (the test's display label)
    pub title: String,
    pub data: ChartData,
}

impl Chart {
    /// Build the chart declared by a record.
    ///
    /// Scalar and undeclared chart kinds are not plotted and give `None`.
    pub fn from_record(record: &TestRecord) -> ChartResult<Option<Chart>> {
        let data = match (record.display_type, &record.result) {
            (None, _) | (Some(ChartType::Scalar), _) => return Ok(None),
            (Some(ChartType::Bars), TestOutcome::Categories(map)) => ChartData::Bars(
                map.iter()
                    .map(|(category, value)| (category.clone(), *value))
                    .collect(),
            ),
            (Some(ChartType::Bins), TestOutcome::Distribution(values)) => {
                ChartData::Histogram(histogram(values))
            }
            (Some(chart), other) => {
                return Err(ChartError::ShapeMismatch {
                    test: record.test.clone(),
                    chart,
                    shape: other.shape(),
                })
            }
        };

        Ok(Some(Chart {
            name: record.test.clone(),
            title: record.name.clone(),
            data,
        }))
    }

    pub fn kind(&self) -> ChartType {
        match self.data {
            ChartData::Bars(_) => ChartType::Bars,
            ChartData::Histogram(_) => ChartType::Bins,
        }
    }

    /// File name used when the chart is persisted.
    pub fn file_name(&self) -> String {
        format!("{}.svg", self.name)
    }

    pub fn to_svg(&self) -> String {
        let mut svg = String::new();
        let _ = write!(
            svg,
            r#"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" viewBox="0 0 {w} {h}">"#,
            w = WIDTH,
            h = HEIGHT
        );
        svg.push('\n');
        let _ = writeln!(
            svg,
            r#"<rect x="0" y="0" width="{}" height="{}" fill="white"/>"#,
            WIDTH, HEIGHT
        );
        let _ = writeln!(
            svg,
            r#"<text x="{}" y="{}" text-anchor="middle" font-family="sans-serif" font-size="16">{}</text>"#,
            WIDTH / 2.0,
            MARGIN_TOP / 2.0 + 6.0,
            escape(&self.title)
        );

        match &self.data {
            ChartData::Bars(bars) => render_bars(&mut svg, bars),
            ChartData::Histogram(bins) => render_bins(&mut svg, bins),
        }

        render_axes(&mut svg);
        svg.push_str("</svg>\n");
        svg
    }
}

/// Split values into [`HISTOGRAM_BINS`] equal-width bins.
///
/// The range is `[min, max]` of the finite values; a single repeated value
/// spans `value ± 0.5` (widened for large magnitudes so the bins never
/// collapse) and no data spans `[0, 1]`. The last bin includes its
/// right edge.
pub fn histogram(values: &[f64]) -> Vec<HistogramBin> {
    let finite: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();

    let (low, high) = match finite.iter().copied().fold(None, |acc, v| match acc {
        None => Some((v, v)),
        Some((lo, hi)) => Some((f64::min(lo, v), f64::max(hi, v))),
    }) {
        None => (0.0, 1.0),
        Some((lo, hi)) if lo == hi => {
            let half = f64::max(0.5, lo.abs() * 1e-9);
            (lo - half, hi + half)
        }
        Some(range) => range,
    };

    let width = (high - low) / HISTOGRAM_BINS as f64;
    let mut bins: Vec<HistogramBin> = (0..HISTOGRAM_BINS)
        .map(|i| HistogramBin {
            start: low + width * i as f64,
            end: if i + 1 == HISTOGRAM_BINS {
                high
            } else {
                low + width * (i + 1) as f64
            },
            count: 0,
        })
        .collect();

    for value in finite {
        let index = (((value - low) / width).floor() as usize).min(HISTOGRAM_BINS - 1);
        bins[index].count += 1;
    }

    bins
}

fn plot_width() -> f64 {
    WIDTH - MARGIN_LEFT - MARGIN_RIGHT
}

fn plot_height() -> f64 {
    HEIGHT - MARGIN_TOP - MARGIN_BOTTOM
}

fn render_axes(svg: &mut String) {
    let bottom = HEIGHT - MARGIN_BOTTOM;
    let right = WIDTH - MARGIN_RIGHT;
    let _ = writeln!(
        svg,
        r#"<line x1="{l}" y1="{b}" x2="{r}" y2="{b}" stroke="black"/>"#,
        l = MARGIN_LEFT,
        b = bottom,
        r = right
    );
    let _ = writeln!(
        svg,
        r#"<line x1="{l}" y1="{t}" x2="{l}" y2="{b}" stroke="black"/>"#,
        l = MARGIN_LEFT,
        t = MARGIN_TOP,
        b = bottom
    );
    let _ = writeln!(
        svg,
        r#"<text x="{}" y="{}" text-anchor="middle" font-family="sans-serif" font-size="12">x</text>"#,
        MARGIN_LEFT + plot_width() / 2.0,
        HEIGHT - 15.0
    );
    let _ = writeln!(
        svg,
        r#"<text x="20" y="{}" text-anchor="middle" font-family="sans-serif" font-size="12">y</text>"#,
        MARGIN_TOP + plot_height() / 2.0
    );
}

fn render_bars(svg: &mut String, bars: &[(String, f64)]) {
    if bars.is_empty() {
        return;
    }

    let top = bars.iter().map(|(_, v)| *v).fold(0.0, f64::max);
    let bottom = bars.iter().map(|(_, v)| *v).fold(0.0, f64::min);
    let span = if top - bottom > 0.0 { top - bottom } else { 1.0 };
    let scale = plot_height() / span;
    let baseline = MARGIN_TOP + top * scale;

    let slot = plot_width() / bars.len() as f64;
    let bar_width = slot * 0.8;

    for (i, (category, value)) in bars.iter().enumerate() {
        let x = MARGIN_LEFT + slot * i as f64 + (slot - bar_width) / 2.0;
        let height = value.abs() * scale;
        let y = if *value >= 0.0 { baseline - height } else { baseline };
        let _ = writeln!(
            svg,
            r#"<rect x="{:.2}" y="{:.2}" width="{:.2}" height="{:.2}" fill="{}"><title>{}: {}</title></rect>"#,
            x,
            y,
            bar_width,
            height,
            BAR_FILL,
            escape(category),
            value
        );
        let _ = writeln!(
            svg,
            r#"<text x="{:.2}" y="{:.2}" text-anchor="middle" font-family="sans-serif" font-size="11">{}</text>"#,
            x + bar_width / 2.0,
            HEIGHT - MARGIN_BOTTOM + 16.0,
            escape(category)
        );
    }
}

fn render_bins(svg: &mut String, bins: &[HistogramBin]) {
    let Some(first) = bins.first() else {
        return;
    };
    let last = &bins[bins.len() - 1];

    let max_count = bins.iter().map(|b| b.count).max().unwrap_or(0).max(1) as f64;
    let x_span = last.end - first.start;
    let x_span = if x_span.is_finite() && x_span > 0.0 { x_span } else { 1.0 };
    let x_scale = plot_width() / x_span;
    let y_scale = plot_height() / max_count;
    let bottom = HEIGHT - MARGIN_BOTTOM;

    for bin in bins {
        let x = MARGIN_LEFT + (bin.start - first.start) * x_scale;
        let width = (bin.end - bin.start) * x_scale;
        let height = bin.count as f64 * y_scale;
        let _ = writeln!(
            svg,
            r#"<rect x="{:.2}" y="{:.2}" width="{:.2}" height="{:.2}" fill="{}" stroke="{}"><title>[{}, {}): {}</title></rect>"#,
            x,
            bottom - height,
            width,
            height,
            BIN_FILL,
            BIN_EDGE,
            bin.start,
            bin.end,
            bin.count
        );
    }

    for value in [first.start, last.end] {
        let _ = writeln!(
            svg,
            r#"<text x="{:.2}" y="{:.2}" text-anchor="middle" font-family="sans-serif" font-size="11">{:.3}</text>"#,
            MARGIN_LEFT + (value - first.start) * x_scale,
            bottom + 16.0,
            value
        );
    }
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
