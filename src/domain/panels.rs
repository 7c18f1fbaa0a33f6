//! Chart assembly for the dashboard panels.
//!
//! Every builder takes an already-filtered subset in row order and returns
//! declarative figures; no builder filters or reorders rows itself.

use chrono::NaiveDate;
use serde::Serialize;
use std::fmt;
use std::str::FromStr;

use super::chart::{Axis, Figure, Heatmap, Trace, TraceKind};
use super::correlation::correlation;
use super::dataset::Dataset;
use super::observation::Observation;
use super::schema::IndicatorGroup;
use super::smoothing::{SmoothingWindow, rolling_mean, rolling_mean_sparse, trend_line};

/// Indicator values are expected to be normalised upstream to roughly [-1, 1].
pub const INDICATOR_RANGE: (f64, f64) = (-1.25, 1.25);
pub const INDICATOR_HEIGHT: u32 = 300;
pub const HOLDING_MARGIN: f64 = 0.1;

const RAW_COLOR: &str = "rgba(150,150,150,0.4)";
const TREND_COLOR: &str = "rgba(255,0,0,0.5)";
const BAR_COLOR: &str = "lightblue";
const HOLDING_COLOR: &str = "green";

/// Which overlays indicator charts carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DisplayMode {
    Trend,
    Holding,
    #[default]
    All,
}

impl DisplayMode {
    pub const ALL: [DisplayMode; 3] = [DisplayMode::Trend, DisplayMode::Holding, DisplayMode::All];

    pub fn shows_trend(self) -> bool {
        matches!(self, DisplayMode::Trend | DisplayMode::All)
    }

    pub fn shows_holding(self) -> bool {
        matches!(self, DisplayMode::Holding | DisplayMode::All)
    }

    pub fn key(self) -> &'static str {
        match self {
            DisplayMode::Trend => "trend",
            DisplayMode::Holding => "holding",
            DisplayMode::All => "all",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            DisplayMode::Trend => "Show trend line",
            DisplayMode::Holding => "Show holding curve",
            DisplayMode::All => "Show all",
        }
    }
}

impl FromStr for DisplayMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        DisplayMode::ALL
            .into_iter()
            .find(|m| m.key().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown display mode '{s}'"))
    }
}

impl fmt::Display for DisplayMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IndicatorPanel {
    pub group: IndicatorGroup,
    pub title: String,
    pub figures: Vec<Figure>,
}

fn dates(rows: &[&Observation]) -> Vec<NaiveDate> {
    rows.iter().map(|r| r.date).collect()
}

fn pct(value: Option<f64>) -> String {
    match value {
        Some(v) => format!("{:.2}%", v * 100.0),
        None => "n/a".to_string(),
    }
}

fn position_hover(rows: &[&Observation]) -> Vec<String> {
    rows.iter()
        .map(|r| format!("{} | {} | {}", r.date, r.side.label(), r.action.label()))
        .collect()
}

pub fn holding_chart(rows: &[&Observation]) -> Figure {
    Figure::new("Holding size")
        .y_axis(Axis::new("Holding"))
        .trace(
            Trace::new(
                "Holding",
                TraceKind::LineMarkers,
                dates(rows),
                rows.iter().map(|r| Some(r.holding)).collect(),
            )
            .hover(position_hover(rows)),
        )
}

pub fn price_chart(rows: &[&Observation]) -> Figure {
    Figure::new("Price")
        .y_axis(Axis::new("Price"))
        .trace(
            Trace::new(
                "Price",
                TraceKind::LineMarkers,
                dates(rows),
                rows.iter().map(|r| Some(r.price)).collect(),
            )
            .hover(position_hover(rows)),
        )
}

/// Raw series plus its trailing mean, shared by both change-rate charts.
fn smoothed_rate_chart(
    rows: &[&Observation],
    title: &str,
    raw_name: &str,
    raw: Vec<Option<f64>>,
    smoothed: Vec<Option<f64>>,
    window: SmoothingWindow,
    color: &str,
) -> Figure {
    let x = dates(rows);
    let raw_hover = x
        .iter()
        .zip(raw.iter().zip(&smoothed))
        .map(|(d, (r, s))| format!("Date: {d} | {raw_name}: {} | Smoothed: {}", pct(*r), pct(*s)))
        .collect();
    let smooth_hover = x
        .iter()
        .zip(&smoothed)
        .map(|(d, s)| format!("Date: {d} | Smoothed: {}", pct(*s)))
        .collect();
    let days = window.get();

    Figure::new(format!("{title} ({days}-day smoothing)"))
        .y_axis(Axis::new(title).percent())
        .trace(
            Trace::new(raw_name, TraceKind::LineMarkers, x.clone(), raw)
                .color(RAW_COLOR)
                .width(1.0)
                .hover(raw_hover),
        )
        .trace(
            Trace::new(format!("{days}-day smoothing"), TraceKind::Line, x, smoothed)
                .color(color)
                .hover(smooth_hover),
        )
}

pub fn change_rate_chart(rows: &[&Observation], window: SmoothingWindow) -> Figure {
    let raw: Vec<f64> = rows.iter().map(|r| r.change_rate).collect();
    let smoothed = rolling_mean(&raw, window.get()).into_iter().map(Some).collect();
    smoothed_rate_chart(
        rows,
        "Holding change rate",
        "Raw change rate",
        raw.into_iter().map(Some).collect(),
        smoothed,
        window,
        "red",
    )
}

pub fn price_change_chart(rows: &[&Observation], window: SmoothingWindow) -> Figure {
    let raw: Vec<Option<f64>> = rows.iter().map(|r| r.price_change_rate).collect();
    let smoothed = rolling_mean_sparse(&raw, window.get(), 1);
    smoothed_rate_chart(
        rows,
        "Price change rate",
        "Raw price change rate",
        raw,
        smoothed,
        window,
        "blue",
    )
}

/// Secondary-axis range for the holding overlay.
///
/// The observed span is widened by 10% on each side. A zero span falls back
/// to the single value ±10% of its magnitude. Returns `None` for no rows.
pub fn holding_axis_range(rows: &[&Observation]) -> Option<(f64, f64)> {
    let min = rows.iter().map(|r| r.holding).reduce(f64::min)?;
    let max = rows.iter().map(|r| r.holding).reduce(f64::max)?;
    let span = max - min;

    if span > 0.0 {
        Some((min - HOLDING_MARGIN * span, max + HOLDING_MARGIN * span))
    } else if min != 0.0 {
        let pad = HOLDING_MARGIN * min.abs();
        Some((min - pad, max + pad))
    } else {
        Some((-1.0, 1.0))
    }
}

pub fn indicator_chart(
    rows: &[&Observation],
    name: &str,
    index: usize,
    mode: DisplayMode,
    holding_range: Option<(f64, f64)>,
) -> Figure {
    let x = dates(rows);
    let values: Vec<Option<f64>> = rows.iter().map(|r| r.indicator(index)).collect();

    let mut secondary = Axis::new("Holding");
    if let Some((lo, hi)) = holding_range {
        secondary = secondary.with_range(lo, hi);
    }

    let mut fig = Figure::new(name)
        .height(INDICATOR_HEIGHT)
        .y_axis(Axis::new("Indicator value").with_range(INDICATOR_RANGE.0, INDICATOR_RANGE.1))
        .y_axis2(secondary);

    let trend = mode.shows_trend().then(|| trend_line(&values));

    fig = fig.trace(
        Trace::new(name, TraceKind::Bar, x.clone(), values)
            .color(BAR_COLOR)
            .hover(rows.iter().map(|r| r.position_label()).collect()),
    );

    if let Some(trend) = trend {
        fig = fig.trace(
            Trace::new(format!("{name} trend"), TraceKind::Line, x.clone(), trend)
                .color(TREND_COLOR)
                .width(1.0),
        );
    }

    if mode.shows_holding() {
        fig = fig.trace(
            Trace::new(
                "Holding",
                TraceKind::Line,
                x,
                rows.iter().map(|r| Some(r.holding)).collect(),
            )
            .color(HOLDING_COLOR)
            .on_secondary(),
        );
    }

    fig
}

/// One panel per non-empty indicator group, one figure per indicator in the
/// group.
pub fn indicator_panels(
    dataset: &Dataset,
    rows: &[&Observation],
    mode: DisplayMode,
) -> Vec<IndicatorPanel> {
    let holding_range = holding_axis_range(rows);

    dataset
        .indicator_groups()
        .iter()
        .map(|(group, columns)| IndicatorPanel {
            group,
            title: group.title().to_string(),
            figures: columns
                .iter()
                .filter_map(|name| {
                    let index = dataset.indicator_index(name)?;
                    Some(indicator_chart(rows, name, index, mode, holding_range))
                })
                .collect(),
        })
        .filter(|panel| !panel.figures.is_empty())
        .collect()
}

/// Correlation of every indicator column over the subset.
pub fn correlation_heatmap(dataset: &Dataset, rows: &[&Observation]) -> Heatmap {
    let columns: Vec<(String, Vec<Option<f64>>)> = dataset
        .indicator_names()
        .iter()
        .enumerate()
        .map(|(i, name)| (name.clone(), rows.iter().map(|r| r.indicator(i)).collect()))
        .collect();
    let matrix = correlation(&columns);

    Heatmap {
        title: "Indicator correlation".to_string(),
        labels: matrix.labels,
        z: matrix.values,
        zmin: -1.0,
        zmax: 1.0,
    }
}
