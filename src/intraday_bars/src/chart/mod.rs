//! Candlestick charts of a [`BarTable`], rendered to PNG with `plotters`.
//!
//! The x axis is the bar index rather than wall time, so overnight and
//! weekend gaps collapse and every candle gets the same width. Prices take the
//! upper five sixths of the canvas, volume the bottom sixth. Moving averages
//! and VWAP are drawn over the candles.
//!
//! Text needs a font (see [`ensure_font`]); without one the chart still
//! renders, just unlabeled.

mod fonts;
mod frame;
mod naming;

use std::{fmt::Display, fs, path::Path};

use plotters::{
    prelude::*,
    style::text_anchor::{HPos, Pos, VPos},
};
use thiserror::Error;
use tracing::debug;

use crate::{
    config::ChartConfig,
    indicators::{MovingAverage, vwap},
    models::bar_table::BarTable,
};

use fonts::FAMILY;
pub use fonts::ensure_font;
pub use frame::chart_time_frame;
pub use naming::{ChartNaming, chart_file_name};

#[derive(Debug, Error)]
pub enum ChartError {
    #[error("No bars to chart for {0}")]
    NoData(String),

    #[error("Failed to prepare {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("Drawing failed: {0}")]
    Draw(String),
}

fn drawing<E: Display>(e: E) -> ChartError {
    ChartError::Draw(e.to_string())
}

const GAIN: RGBColor = RGBColor(38, 166, 91);
const LOSS: RGBColor = RGBColor(214, 69, 65);
const VOLUME: RGBColor = RGBColor(120, 144, 156);
const AVERAGES: [RGBColor; 4] = [
    RGBColor(33, 150, 243),
    RGBColor(255, 152, 0),
    RGBColor(156, 39, 176),
    RGBColor(0, 150, 136),
];
const VWAP: RGBColor = RGBColor(233, 30, 99);

/// At most this many moving averages are drawn.
pub const MAX_AVERAGES: usize = 4;

#[derive(Debug, Clone)]
pub struct ChartOptions {
    pub width: u32,
    pub height: u32,
    /// Defaults to the table's symbol and interval.
    pub title: Option<String>,
    /// strftime format for x axis labels.
    pub label_format: String,
    /// How many x labels to aim for.
    pub x_labels: usize,
    pub moving_averages: Vec<MovingAverage>,
    pub vwap: bool,
    pub font_path: Option<String>,
}

impl Default for ChartOptions {
    fn default() -> Self {
        Self {
            width: 1200,
            height: 800,
            title: None,
            label_format: "%H:%M".to_string(),
            x_labels: 10,
            moving_averages: ChartConfig::default().moving_averages,
            vwap: true,
            font_path: None,
        }
    }
}

impl ChartOptions {
    pub fn from_config(config: &ChartConfig) -> Self {
        Self {
            width: config.width,
            height: config.height,
            moving_averages: config.moving_averages.clone(),
            vwap: config.vwap,
            font_path: config.font_path.clone(),
            ..Self::default()
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }
}

/// One line over the candles, index aligned with the table's bars.
#[derive(Debug, Clone, PartialEq)]
pub struct Overlay {
    pub label: String,
    pub values: Vec<Option<f64>>,
}

/// The configured moving averages (the first [`MAX_AVERAGES`]) and VWAP, in
/// drawing order.
pub fn overlays(table: &BarTable, options: &ChartOptions) -> Vec<Overlay> {
    let closes: Vec<f64> = table.iter().map(|b| b.close).collect();
    let mut lines: Vec<Overlay> = options
        .moving_averages
        .iter()
        .take(MAX_AVERAGES)
        .map(|ma| Overlay {
            label: ma.label(),
            values: ma.compute(&closes),
        })
        .collect();
    if options.vwap {
        lines.push(Overlay {
            label: "VWAP".to_string(),
            values: vwap(table.bars()),
        });
    }
    lines
}

/// Writes `table` as a candlestick chart with a volume pane to `path`,
/// creating the parent directory if needed.
pub fn render_candlestick(
    table: &BarTable,
    options: &ChartOptions,
    path: &Path,
) -> Result<(), ChartError> {
    if table.is_empty() {
        return Err(ChartError::NoData(table.symbol().to_string()));
    }
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|source| ChartError::Io {
            path: parent.display().to_string(),
            source,
        })?;
    }

    let bars = table.bars();
    let n = bars.len();
    let x_range = -0.5..(n as f64 - 0.5);

    let low = bars.iter().map(|b| b.low).fold(f64::INFINITY, f64::min);
    let high = bars.iter().map(|b| b.high).fold(f64::NEG_INFINITY, f64::max);
    let pad = if high > low { (high - low) * 0.02 } else { 1.0 };
    let max_volume = bars.iter().map(|b| b.volume).max().unwrap_or(0).max(1) as f64;

    let title = options
        .title
        .clone()
        .unwrap_or_else(|| format!("{} {}", table.symbol(), table.interval()));
    let label_at = |x: &f64| {
        let i = x.round();
        if i < 0.0 {
            return String::new();
        }
        bars.get(i as usize)
            .map(|b| b.timestamp.format(&options.label_format).to_string())
            .unwrap_or_default()
    };

    let text = ensure_font(options.font_path.as_deref());

    let root = BitMapBackend::new(path, (options.width, options.height)).into_drawing_area();
    root.fill(&WHITE).map_err(drawing)?;
    let (upper, lower) = root.split_vertically(options.height * 5 / 6);

    let mut builder = ChartBuilder::on(&upper);
    builder.margin(10);
    if text {
        builder
            .caption(title, (FAMILY, 24))
            .set_label_area_size(LabelAreaPosition::Left, 60)
            .set_label_area_size(LabelAreaPosition::Bottom, 30);
    }
    let mut prices = builder
        .build_cartesian_2d(x_range.clone(), (low - pad)..(high + pad))
        .map_err(drawing)?;
    let mut mesh = prices.configure_mesh();
    if text {
        mesh.x_labels(options.x_labels)
            .x_label_formatter(&label_at)
            .label_style((FAMILY, 12))
            .y_desc("Price")
            .axis_desc_style((FAMILY, 14));
    } else {
        mesh.x_labels(0).y_labels(0);
    }
    mesh.draw().map_err(drawing)?;

    let plot_width = options.width.saturating_sub(80);
    let candle_width = ((plot_width as f64 / n as f64) * 0.6).max(1.0) as u32;
    prices
        .draw_series(bars.iter().enumerate().map(|(i, b)| {
            CandleStick::new(
                i as f64,
                b.open,
                b.high,
                b.low,
                b.close,
                GAIN.filled(),
                LOSS.filled(),
                candle_width,
            )
        }))
        .map_err(drawing)?;

    let lines = overlays(table, options);
    let mut averages = AVERAGES.iter();
    for line in &lines {
        let color = if line.label == "VWAP" {
            VWAP
        } else {
            averages.next().copied().unwrap_or(BLACK)
        };
        let points = line
            .values
            .iter()
            .enumerate()
            .filter_map(|(i, v)| v.map(|v| (i as f64, v)));
        let series = prices
            .draw_series(LineSeries::new(points, color.stroke_width(2)))
            .map_err(drawing)?;
        if text {
            series
                .label(line.label.as_str())
                .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], color.stroke_width(2)));
        }
    }

    if let Some(last) = bars.last() {
        prices
            .draw_series(std::iter::once(PathElement::new(
                vec![(-0.5, last.close), (n as f64 - 0.5, last.close)],
                BLACK.mix(0.4),
            )))
            .map_err(drawing)?;
        if text {
            let style = TextStyle::from((FAMILY, 14).into_font())
                .color(&BLACK)
                .pos(Pos::new(HPos::Right, VPos::Bottom));
            prices
                .draw_series(std::iter::once(Text::new(
                    format!("{:.2}", last.close),
                    (n as f64 - 0.5, last.close),
                    style,
                )))
                .map_err(drawing)?;
        }
    }

    if text && !lines.is_empty() {
        prices
            .configure_series_labels()
            .position(SeriesLabelPosition::UpperLeft)
            .label_font((FAMILY, 12))
            .background_style(WHITE.mix(0.8))
            .border_style(BLACK.mix(0.3))
            .draw()
            .map_err(drawing)?;
    }

    let mut builder = ChartBuilder::on(&lower);
    builder.margin(10);
    if text {
        builder.set_label_area_size(LabelAreaPosition::Left, 60);
    }
    let mut volume = builder
        .build_cartesian_2d(x_range, 0.0..max_volume)
        .map_err(drawing)?;
    let mut mesh = volume.configure_mesh();
    mesh.disable_x_mesh().x_labels(0);
    if text {
        mesh.y_labels(3)
            .label_style((FAMILY, 12))
            .y_desc("Volume")
            .axis_desc_style((FAMILY, 14));
    } else {
        mesh.y_labels(0);
    }
    mesh.draw().map_err(drawing)?;
    volume
        .draw_series(bars.iter().enumerate().map(|(i, b)| {
            let x = i as f64;
            Rectangle::new([(x - 0.3, 0.0), (x + 0.3, b.volume as f64)], VOLUME.filled())
        }))
        .map_err(drawing)?;

    root.present().map_err(drawing)?;
    debug!(path = %path.display(), bars = n, overlays = lines.len(), text, "chart written");
    Ok(())
}
