//! Static SVG rendering of [`Figure`] and [`Heatmap`] descriptions.
//!
//! Used by the web dashboard (inlined into the page) and by the `chart`
//! command. Values outside an axis range are pinned to the plot edge.

use crate::domain::chart::{Axis, AxisSide, Figure, Heatmap, TickFormat, Trace, TraceKind};
use chrono::NaiveDate;

const CHART_WIDTH: f64 = 960.0;
const MARGIN_LEFT: f64 = 72.0;
const MARGIN_RIGHT: f64 = 72.0;
const MARGIN_TOP: f64 = 56.0;
const MARGIN_BOTTOM: f64 = 36.0;
const Y_TICKS: usize = 5;

const HEATMAP_CELL: f64 = 44.0;
const HEATMAP_LABEL_WIDTH: f64 = 170.0;
const MISSING_CELL: &str = "#e5e7eb";
const PLACEHOLDER_HEIGHT: f64 = 160.0;

const AXIS_COLOR: &str = "#ccc";
const GRID_COLOR: &str = "#f0f0f0";
const TEXT_COLOR: &str = "#666";

/// Maps values onto a vertical pixel interval.
struct Scale {
    min: f64,
    max: f64,
    top: f64,
    bottom: f64,
}

impl Scale {
    fn new((min, max): (f64, f64), top: f64, bottom: f64) -> Self {
        Self {
            min,
            max,
            top,
            bottom,
        }
    }

    fn y(&self, value: f64) -> f64 {
        let t = (value - self.min) / (self.max - self.min);
        (self.bottom - t * (self.bottom - self.top)).clamp(self.top, self.bottom)
    }

    fn ticks(&self) -> impl Iterator<Item = f64> + '_ {
        let step = (self.max - self.min) / (Y_TICKS - 1) as f64;
        (0..Y_TICKS).map(move |i| self.min + step * i as f64)
    }
}

struct TimeScale {
    start: NaiveDate,
    span_days: f64,
    left: f64,
    width: f64,
}

impl TimeScale {
    fn x(&self, date: NaiveDate) -> f64 {
        if self.span_days == 0.0 {
            return self.left + self.width / 2.0;
        }
        self.left + (date - self.start).num_days() as f64 / self.span_days * self.width
    }
}

pub fn render_figure(figure: &Figure) -> String {
    let height = f64::from(figure.height);
    let dates: Vec<NaiveDate> = figure
        .traces
        .iter()
        .flat_map(|t| t.x.iter().copied())
        .collect();
    let (Some(start), Some(end)) = (dates.iter().min().copied(), dates.iter().max().copied())
    else {
        return placeholder(&figure.title, CHART_WIDTH, height.min(PLACEHOLDER_HEIGHT));
    };

    let plot_width = CHART_WIDTH - MARGIN_LEFT - MARGIN_RIGHT;
    let bottom = height - MARGIN_BOTTOM;
    let time = TimeScale {
        start,
        span_days: (end - start).num_days() as f64,
        left: MARGIN_LEFT,
        width: plot_width,
    };

    let on_side = |side: AxisSide| -> Vec<&Trace> {
        figure.traces.iter().filter(|t| t.axis == side).collect()
    };
    let primary = Scale::new(
        axis_range(&figure.y_axis, &on_side(AxisSide::Primary)),
        MARGIN_TOP,
        bottom,
    );
    let secondary_axis = figure.y_axis2.clone().unwrap_or_else(|| Axis::new(""));
    let secondary = Scale::new(
        axis_range(&secondary_axis, &on_side(AxisSide::Secondary)),
        MARGIN_TOP,
        bottom,
    );

    let mut svg = open_svg(CHART_WIDTH, height);
    push_title(&mut svg, &figure.title);

    for tick in primary.ticks() {
        let y = primary.y(tick);
        svg.push_str(&format!(
            "  <line x1=\"{:.1}\" y1=\"{:.1}\" x2=\"{:.1}\" y2=\"{:.1}\" stroke=\"{}\" stroke-width=\"1\"/>\n",
            MARGIN_LEFT,
            y,
            CHART_WIDTH - MARGIN_RIGHT,
            y,
            GRID_COLOR
        ));
        svg.push_str(&format!(
            "  <text x=\"{:.1}\" y=\"{:.1}\" text-anchor=\"end\" font-size=\"10\" fill=\"{}\">{}</text>\n",
            MARGIN_LEFT - 5.0,
            y + 3.0,
            TEXT_COLOR,
            format_tick(tick, figure.y_axis.tick_format)
        ));
    }
    push_axis_line(&mut svg, MARGIN_LEFT, MARGIN_TOP, MARGIN_LEFT, bottom);
    push_axis_line(&mut svg, MARGIN_LEFT, bottom, CHART_WIDTH - MARGIN_RIGHT, bottom);
    push_axis_title(&mut svg, &figure.y_axis.title, 14.0, (MARGIN_TOP + bottom) / 2.0);

    if let Some(axis2) = &figure.y_axis2 {
        let right = CHART_WIDTH - MARGIN_RIGHT;
        for tick in secondary.ticks() {
            svg.push_str(&format!(
                "  <text x=\"{:.1}\" y=\"{:.1}\" text-anchor=\"start\" font-size=\"10\" fill=\"{}\">{}</text>\n",
                right + 5.0,
                secondary.y(tick) + 3.0,
                TEXT_COLOR,
                format_tick(tick, axis2.tick_format)
            ));
        }
        push_axis_line(&mut svg, right, MARGIN_TOP, right, bottom);
        push_axis_title(&mut svg, &axis2.title, CHART_WIDTH - 10.0, (MARGIN_TOP + bottom) / 2.0);
    }

    let mid = start + (end - start) / 2;
    for date in [start, mid, end] {
        svg.push_str(&format!(
            "  <text x=\"{:.1}\" y=\"{:.1}\" text-anchor=\"middle\" font-size=\"10\" fill=\"{}\">{}</text>\n",
            time.x(date),
            bottom + 16.0,
            TEXT_COLOR,
            date
        ));
    }

    push_legend(&mut svg, &figure.traces);

    for trace in &figure.traces {
        let scale = match trace.axis {
            AxisSide::Primary => &primary,
            AxisSide::Secondary => &secondary,
        };
        match trace.kind {
            TraceKind::Bar => push_bars(&mut svg, trace, &time, scale),
            TraceKind::Line => push_line(&mut svg, trace, &time, scale),
            TraceKind::LineMarkers => {
                push_line(&mut svg, trace, &time, scale);
                push_markers(&mut svg, trace, &time, scale);
            }
        }
    }

    svg.push_str("</svg>\n");
    svg
}

pub fn render_heatmap(heatmap: &Heatmap) -> String {
    if heatmap.is_empty() {
        return placeholder(&heatmap.title, CHART_WIDTH, PLACEHOLDER_HEIGHT);
    }

    let n = heatmap.labels.len() as f64;
    let grid = n * HEATMAP_CELL;
    let width = HEATMAP_LABEL_WIDTH + grid + MARGIN_RIGHT;
    let height = MARGIN_TOP + grid + HEATMAP_LABEL_WIDTH;

    let mut svg = open_svg(width, height);
    push_title(&mut svg, &heatmap.title);

    for (i, row) in heatmap.z.iter().enumerate() {
        let y = MARGIN_TOP + i as f64 * HEATMAP_CELL;
        for (j, cell) in row.iter().enumerate() {
            let x = HEATMAP_LABEL_WIDTH + j as f64 * HEATMAP_CELL;
            let fill = cell
                .map(|v| heat_color(v, heatmap.zmin, heatmap.zmax))
                .unwrap_or_else(|| MISSING_CELL.to_string());
            let value = cell.map(|v| format!("{v:.2}")).unwrap_or_default();
            let row_label = heatmap.labels.get(i).map(String::as_str).unwrap_or("");
            let col_label = heatmap.labels.get(j).map(String::as_str).unwrap_or("");

            svg.push_str(&format!(
                "  <rect x=\"{:.1}\" y=\"{:.1}\" width=\"{:.1}\" height=\"{:.1}\" fill=\"{}\" stroke=\"white\"><title>{} / {}: {}</title></rect>\n",
                x,
                y,
                HEATMAP_CELL,
                HEATMAP_CELL,
                fill,
                escape(row_label),
                escape(col_label),
                if value.is_empty() { "n/a" } else { value.as_str() }
            ));
            if !value.is_empty() {
                svg.push_str(&format!(
                    "  <text x=\"{:.1}\" y=\"{:.1}\" text-anchor=\"middle\" font-size=\"10\" fill=\"#111\">{}</text>\n",
                    x + HEATMAP_CELL / 2.0,
                    y + HEATMAP_CELL / 2.0 + 3.0,
                    value
                ));
            }
        }
    }

    for (i, label) in heatmap.labels.iter().enumerate() {
        let offset = i as f64 * HEATMAP_CELL + HEATMAP_CELL / 2.0;
        svg.push_str(&format!(
            "  <text x=\"{:.1}\" y=\"{:.1}\" text-anchor=\"end\" font-size=\"10\" fill=\"{}\">{}</text>\n",
            HEATMAP_LABEL_WIDTH - 6.0,
            MARGIN_TOP + offset + 3.0,
            TEXT_COLOR,
            escape(label)
        ));
        let x = HEATMAP_LABEL_WIDTH + offset;
        let y = MARGIN_TOP + grid + 12.0;
        svg.push_str(&format!(
            "  <text x=\"{x:.1}\" y=\"{y:.1}\" transform=\"rotate(-45 {x:.1} {y:.1})\" text-anchor=\"end\" font-size=\"10\" fill=\"{}\">{}</text>\n",
            TEXT_COLOR,
            escape(label)
        ));
    }

    svg.push_str("</svg>\n");
    svg
}

/// Explicit axis range when set, otherwise the span of the data. Bars always
/// include zero so they grow from a visible baseline.
fn axis_range(axis: &Axis, traces: &[&Trace]) -> (f64, f64) {
    if let Some((min, max)) = axis.range {
        if max > min {
            return (min, max);
        }
    }

    let (mut min, mut max) = traces
        .iter()
        .flat_map(|t| t.present_values())
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
            (lo.min(v), hi.max(v))
        });
    if !min.is_finite() {
        return (0.0, 1.0);
    }
    if traces.iter().any(|t| t.kind == TraceKind::Bar) {
        min = min.min(0.0);
        max = max.max(0.0);
    }
    if min == max {
        let pad = if min == 0.0 { 1.0 } else { min.abs() * 0.1 };
        return (min - pad, max + pad);
    }
    (min, max)
}

fn format_tick(value: f64, format: TickFormat) -> String {
    match format {
        TickFormat::Percent => format!("{:.1}%", value * 100.0),
        TickFormat::Number if value.abs() >= 1000.0 => format!("{value:.0}"),
        TickFormat::Number => format!("{value:.2}"),
    }
}

/// Diverging blue-white-red scale over `[zmin, zmax]`.
fn heat_color(value: f64, zmin: f64, zmax: f64) -> String {
    const LOW: [f64; 3] = [37.0, 99.0, 235.0];
    const MID: [f64; 3] = [255.0, 255.0, 255.0];
    const HIGH: [f64; 3] = [220.0, 38.0, 38.0];

    let t = if zmax > zmin {
        (value.clamp(zmin, zmax) - zmin) / (zmax - zmin)
    } else {
        0.5
    };
    let (from, to, s) = if t < 0.5 {
        (LOW, MID, t * 2.0)
    } else {
        (MID, HIGH, (t - 0.5) * 2.0)
    };
    let mix = |k: usize| (from[k] + (to[k] - from[k]) * s).round() as u8;
    format!("#{:02x}{:02x}{:02x}", mix(0), mix(1), mix(2))
}

fn push_line(svg: &mut String, trace: &Trace, time: &TimeScale, scale: &Scale) {
    let mut path_data = String::new();
    let mut pen_down = false;
    for (date, value) in trace.x.iter().zip(&trace.y) {
        match value {
            Some(v) => {
                let cmd = if pen_down { " L" } else { " M" };
                path_data.push_str(&format!("{} {:.1} {:.1}", cmd, time.x(*date), scale.y(*v)));
                pen_down = true;
            }
            None => pen_down = false,
        }
    }
    if path_data.is_empty() {
        return;
    }
    svg.push_str(&format!(
        "  <path d=\"{}\" fill=\"none\" stroke=\"{}\" stroke-width=\"{}\"/>\n",
        path_data.trim_start(),
        escape(&trace.color),
        trace.width
    ));
}

fn push_markers(svg: &mut String, trace: &Trace, time: &TimeScale, scale: &Scale) {
    for (i, (date, value)) in trace.x.iter().zip(&trace.y).enumerate() {
        let Some(v) = value else { continue };
        svg.push_str(&format!(
            "  <circle cx=\"{:.1}\" cy=\"{:.1}\" r=\"3\" fill=\"{}\"><title>{}</title></circle>\n",
            time.x(*date),
            scale.y(*v),
            escape(&trace.color),
            escape(&hover_text(trace, i, *date, *v))
        ));
    }
}

fn push_bars(svg: &mut String, trace: &Trace, time: &TimeScale, scale: &Scale) {
    let slots = trace.x.len().max(1) as f64;
    let bar_width = (time.width / slots * 0.7).clamp(1.0, 40.0);
    let baseline = scale.y(0.0_f64.clamp(scale.min, scale.max));

    for (i, (date, value)) in trace.x.iter().zip(&trace.y).enumerate() {
        let Some(v) = value else { continue };
        let y = scale.y(*v);
        svg.push_str(&format!(
            "  <rect x=\"{:.1}\" y=\"{:.1}\" width=\"{:.1}\" height=\"{:.1}\" fill=\"{}\"><title>{}</title></rect>\n",
            time.x(*date) - bar_width / 2.0,
            y.min(baseline),
            bar_width,
            (baseline - y).abs(),
            escape(&trace.color),
            escape(&hover_text(trace, i, *date, *v))
        ));
    }
}

fn hover_text(trace: &Trace, index: usize, date: NaiveDate, value: f64) -> String {
    match trace.hover.get(index) {
        Some(text) => format!("{date}: {value:.4} ({text})"),
        None => format!("{} {date}: {value:.4}", trace.name),
    }
}

fn push_legend(svg: &mut String, traces: &[Trace]) {
    let mut x = MARGIN_LEFT;
    for trace in traces {
        svg.push_str(&format!(
            "  <rect x=\"{:.1}\" y=\"30\" width=\"12\" height=\"4\" fill=\"{}\"/>\n",
            x,
            escape(&trace.color)
        ));
        svg.push_str(&format!(
            "  <text x=\"{:.1}\" y=\"35\" font-size=\"11\" fill=\"#333\">{}</text>\n",
            x + 16.0,
            escape(&trace.name)
        ));
        x += 28.0 + trace.name.chars().count() as f64 * 6.5;
    }
}

fn push_axis_line(svg: &mut String, x1: f64, y1: f64, x2: f64, y2: f64) {
    svg.push_str(&format!(
        "  <line x1=\"{:.1}\" y1=\"{:.1}\" x2=\"{:.1}\" y2=\"{:.1}\" stroke=\"{}\" stroke-width=\"1\"/>\n",
        x1, y1, x2, y2, AXIS_COLOR
    ));
}

fn push_axis_title(svg: &mut String, title: &str, x: f64, y: f64) {
    if title.is_empty() {
        return;
    }
    svg.push_str(&format!(
        "  <text x=\"{x:.1}\" y=\"{y:.1}\" transform=\"rotate(-90 {x:.1} {y:.1})\" text-anchor=\"middle\" font-size=\"11\" fill=\"{}\">{}</text>\n",
        TEXT_COLOR,
        escape(title)
    ));
}

fn push_title(svg: &mut String, title: &str) {
    if title.is_empty() {
        return;
    }
    svg.push_str(&format!(
        "  <text x=\"{}\" y=\"20\" font-size=\"14\" font-weight=\"bold\" fill=\"#111\">{}</text>\n",
        MARGIN_LEFT,
        escape(title)
    ));
}

fn open_svg(width: f64, height: f64) -> String {
    let mut svg = format!(
        r##"<svg width="{width}" height="{height}" viewBox="0 0 {width} {height}" xmlns="http://www.w3.org/2000/svg">"##
    );
    svg.push_str("\n  <rect width=\"100%\" height=\"100%\" fill=\"white\"/>\n");
    svg
}

fn placeholder(title: &str, width: f64, height: f64) -> String {
    let mut svg = open_svg(width, height);
    push_title(&mut svg, title);
    svg.push_str(&format!(
        "  <text x=\"{:.1}\" y=\"{:.1}\" text-anchor=\"middle\" font-size=\"12\" fill=\"#999\">No data for the current selection</text>\n",
        width / 2.0,
        height / 2.0
    ));
    svg.push_str("</svg>\n");
    svg
}

fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, d).unwrap()
    }

    fn line(y: Vec<Option<f64>>) -> Trace {
        let x = (1..=y.len() as u32).map(day).collect();
        Trace::new("holding", TraceKind::Line, x, y)
    }

    #[test]
    fn empty_figure_renders_placeholder() {
        let svg = render_figure(&Figure::empty());
        assert!(svg.starts_with("<svg"));
        assert!(svg.contains("No data for the current selection"));
        assert!(!svg.contains("<path"));
    }

    #[test]
    fn line_trace_renders_path() {
        let fig = Figure::new("Holding").trace(line(vec![Some(1.0), Some(3.0), Some(2.0)]));
        let svg = render_figure(&fig);
        assert!(svg.contains("<path d=\"M "));
        assert_eq!(svg.matches(" L ").count(), 2);
        assert!(svg.contains("stroke=\"#2563eb\""));
        assert!(svg.contains("2024-03-01"));
        assert!(svg.contains("2024-03-03"));
    }

    #[test]
    fn missing_values_break_the_line() {
        let fig = Figure::new("t").trace(line(vec![Some(1.0), None, Some(2.0), Some(4.0)]));
        let svg = render_figure(&fig);
        let path = svg.lines().find(|l| l.contains("<path")).unwrap();
        assert_eq!(path.matches('M').count(), 2);
        assert_eq!(path.matches('L').count(), 1);
    }

    #[test]
    fn markers_carry_hover_text() {
        let trace = Trace::new(
            "rate",
            TraceKind::LineMarkers,
            vec![day(1), day(2)],
            vec![Some(0.1), Some(0.2)],
        )
        .hover(vec!["Long, Increase".into(), "Short, Decrease".into()]);
        let svg = render_figure(&Figure::new("t").trace(trace));
        assert_eq!(svg.matches("<circle").count(), 2);
        assert!(svg.contains("Short, Decrease"));
    }

    #[test]
    fn bars_and_secondary_axis() {
        let bars = Trace::new(
            "ind",
            TraceKind::Bar,
            vec![day(1), day(2)],
            vec![Some(0.5), Some(-0.5)],
        );
        let holding = line(vec![Some(100.0), Some(200.0)]).on_secondary();
        let fig = Figure::new("ind")
            .y_axis(Axis::new("value").with_range(-1.25, 1.25))
            .y_axis2(Axis::new("holding").with_range(90.0, 210.0))
            .trace(bars)
            .trace(holding);
        let svg = render_figure(&fig);
        assert_eq!(svg.matches("<rect x=").count(), 2 + fig.traces.len());
        assert!(svg.contains(">-1.25<"));
        assert!(svg.contains(">210.00<"));
        assert!(svg.contains(">holding<"));
    }

    #[test]
    fn percent_axis_ticks() {
        let fig = Figure::new("rate")
            .y_axis(Axis::new("rate").percent().with_range(0.0, 0.4))
            .trace(line(vec![Some(0.1), Some(0.2)]));
        let svg = render_figure(&fig);
        assert!(svg.contains(">40.0%<"));
        assert!(svg.contains(">0.0%<"));
    }

    #[test]
    fn out_of_range_values_are_pinned() {
        let scale = Scale::new((-1.0, 1.0), 10.0, 110.0);
        assert_eq!(scale.y(5.0), 10.0);
        assert_eq!(scale.y(-5.0), 110.0);
        assert_eq!(scale.y(0.0), 60.0);
    }

    #[test]
    fn axis_range_pads_flat_series() {
        let t = line(vec![Some(5.0), Some(5.0)]);
        assert_eq!(axis_range(&Axis::new(""), &[&t]), (4.5, 5.5));
        let z = line(vec![Some(0.0)]);
        assert_eq!(axis_range(&Axis::new(""), &[&z]), (-1.0, 1.0));
        assert_eq!(axis_range(&Axis::new(""), &[]), (0.0, 1.0));
    }

    #[test]
    fn text_is_escaped() {
        let fig = Figure::new("A & B <x>").trace(line(vec![Some(1.0)]));
        let svg = render_figure(&fig);
        assert!(svg.contains("A &amp; B &lt;x&gt;"));
    }

    #[test]
    fn heatmap_cells_and_labels() {
        let heatmap = Heatmap {
            title: "Indicator correlation".into(),
            labels: vec!["cci".into(), "trix".into()],
            z: vec![vec![Some(1.0), None], vec![None, Some(-0.25)]],
            zmin: -1.0,
            zmax: 1.0,
        };
        let svg = render_heatmap(&heatmap);
        assert_eq!(svg.matches("<rect x=").count(), 4);
        assert!(svg.contains(">1.00<"));
        assert!(svg.contains(">-0.25<"));
        assert!(svg.contains(MISSING_CELL));
        assert!(svg.contains("cci / trix: n/a"));
    }

    #[test]
    fn empty_heatmap_renders_placeholder() {
        let heatmap = Heatmap {
            title: "Indicator correlation".into(),
            labels: vec![],
            z: vec![],
            zmin: -1.0,
            zmax: 1.0,
        };
        assert!(render_heatmap(&heatmap).contains("No data"));
    }

    #[test]
    fn heat_color_endpoints() {
        assert_eq!(heat_color(-1.0, -1.0, 1.0), "#2563eb");
        assert_eq!(heat_color(0.0, -1.0, 1.0), "#ffffff");
        assert_eq!(heat_color(1.0, -1.0, 1.0), "#dc2626");
        assert_eq!(heat_color(7.0, -1.0, 1.0), "#dc2626");
    }
}
