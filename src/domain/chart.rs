//! Declarative chart descriptions.
//!
//! Figures carry data and layout only; rendering (SVG, JSON) is left to the
//! adapters.

use chrono::NaiveDate;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TraceKind {
    Line,
    LineMarkers,
    Bar,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AxisSide {
    Primary,
    Secondary,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TickFormat {
    Number,
    Percent,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Axis {
    pub title: String,
    pub range: Option<(f64, f64)>,
    pub tick_format: TickFormat,
}

impl Axis {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            range: None,
            tick_format: TickFormat::Number,
        }
    }

    pub fn with_range(mut self, min: f64, max: f64) -> Self {
        self.range = Some((min, max));
        self
    }

    pub fn percent(mut self) -> Self {
        self.tick_format = TickFormat::Percent;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Trace {
    pub name: String,
    pub kind: TraceKind,
    pub axis: AxisSide,
    /// CSS colour.
    pub color: String,
    pub width: f64,
    pub x: Vec<NaiveDate>,
    pub y: Vec<Option<f64>>,
    /// Per-point hover text; empty when the trace has none.
    pub hover: Vec<String>,
}

impl Trace {
    pub fn new(
        name: impl Into<String>,
        kind: TraceKind,
        x: Vec<NaiveDate>,
        y: Vec<Option<f64>>,
    ) -> Self {
        Self {
            name: name.into(),
            kind,
            axis: AxisSide::Primary,
            color: "#2563eb".to_string(),
            width: 2.0,
            x,
            y,
            hover: Vec::new(),
        }
    }

    pub fn color(mut self, color: impl Into<String>) -> Self {
        self.color = color.into();
        self
    }

    pub fn width(mut self, width: f64) -> Self {
        self.width = width;
        self
    }

    pub fn on_secondary(mut self) -> Self {
        self.axis = AxisSide::Secondary;
        self
    }

    pub fn hover(mut self, hover: Vec<String>) -> Self {
        self.hover = hover;
        self
    }

    pub fn present_values(&self) -> impl Iterator<Item = f64> + '_ {
        self.y.iter().flatten().copied()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Figure {
    pub title: String,
    pub traces: Vec<Trace>,
    pub y_axis: Axis,
    pub y_axis2: Option<Axis>,
    pub height: u32,
}

pub const DEFAULT_HEIGHT: u32 = 450;

impl Figure {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            traces: Vec::new(),
            y_axis: Axis::new(""),
            y_axis2: None,
            height: DEFAULT_HEIGHT,
        }
    }

    /// A figure with no title and no traces, shown when nothing is selected.
    pub fn empty() -> Self {
        Self::new("")
    }

    pub fn is_empty(&self) -> bool {
        self.traces.iter().all(|t| t.x.is_empty())
    }

    pub fn trace(mut self, trace: Trace) -> Self {
        self.traces.push(trace);
        self
    }

    pub fn y_axis(mut self, axis: Axis) -> Self {
        self.y_axis = axis;
        self
    }

    pub fn y_axis2(mut self, axis: Axis) -> Self {
        self.y_axis2 = Some(axis);
        self
    }

    pub fn height(mut self, height: u32) -> Self {
        self.height = height;
        self
    }

    pub fn find_trace(&self, name: &str) -> Option<&Trace> {
        self.traces.iter().find(|t| t.name == name)
    }
}

/// Correlation heatmap; cells outside `[zmin, zmax]` are clamped when drawn.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Heatmap {
    pub title: String,
    pub labels: Vec<String>,
    pub z: Vec<Vec<Option<f64>>>,
    pub zmin: f64,
    pub zmax: f64,
}

impl Heatmap {
    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, d).unwrap()
    }

    #[test]
    fn empty_figure_has_no_traces() {
        let fig = Figure::empty();
        assert!(fig.is_empty());
        assert!(fig.traces.is_empty());
        assert!(fig.y_axis2.is_none());
    }

    #[test]
    fn figure_with_data_is_not_empty() {
        let fig = Figure::new("Holding").trace(Trace::new(
            "holding",
            TraceKind::LineMarkers,
            vec![day(1), day(2)],
            vec![Some(1.0), Some(2.0)],
        ));
        assert!(!fig.is_empty());
        assert!(fig.find_trace("holding").is_some());
        assert!(fig.find_trace("price").is_none());
    }

    #[test]
    fn trace_builders() {
        let trace = Trace::new("h", TraceKind::Line, vec![day(1)], vec![None])
            .color("green")
            .width(1.0)
            .on_secondary();
        assert_eq!(trace.axis, AxisSide::Secondary);
        assert_eq!(trace.color, "green");
        assert_eq!(trace.present_values().count(), 0);
    }

    #[test]
    fn serializes_kinds_in_snake_case() {
        let fig = Figure::new("t")
            .y_axis(Axis::new("rate").percent())
            .trace(Trace::new("r", TraceKind::LineMarkers, vec![day(1)], vec![Some(0.1)]));
        let json = serde_json::to_value(&fig).unwrap();
        assert_eq!(json["traces"][0]["kind"], "line_markers");
        assert_eq!(json["y_axis"]["tick_format"], "percent");
        assert_eq!(json["traces"][0]["x"][0], "2024-01-01");
    }
}
