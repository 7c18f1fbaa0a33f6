//! HTML templates using Askama, plus the view models they read.

use askama::Template;

use crate::adapters::svg_chart::{render_figure, render_heatmap};
use crate::domain::controller::{DashboardView, OptionItem, Selection, SelectionOptions};
use crate::domain::panels::DisplayMode;
use crate::domain::smoothing::{MAX_WINDOW, MIN_WINDOW};

/// One `<option>` or radio button.
#[derive(Debug, Clone, PartialEq)]
pub struct Choice {
    pub value: String,
    pub label: String,
    pub selected: bool,
}

/// Every control on the selection form, with the current selection marked.
#[derive(Debug, Clone, PartialEq)]
pub struct Controls {
    pub brokers: Vec<Choice>,
    pub years: Vec<Choice>,
    pub sides: Vec<Choice>,
    pub actions: Vec<Choice>,
    pub contracts: Vec<Choice>,
    pub modes: Vec<Choice>,
    pub window: usize,
    pub window_min: usize,
    pub window_max: usize,
}

fn choices(items: &[OptionItem], is_selected: impl Fn(&str) -> bool) -> Vec<Choice> {
    items
        .iter()
        .map(|item| Choice {
            value: item.value.clone(),
            label: item.label.clone(),
            selected: is_selected(&item.value),
        })
        .collect()
}

impl Controls {
    pub fn new(options: &SelectionOptions, selection: &Selection) -> Self {
        Self {
            brokers: choices(&options.brokers, |v| selection.brokers.iter().any(|b| b == v)),
            years: choices(&options.years, |v| {
                selection.year.is_some_and(|y| y.to_string() == v)
            }),
            sides: choices(&options.sides, |v| selection.sides.iter().any(|s| s.key() == v)),
            actions: choices(&options.actions, |v| {
                selection.actions.iter().any(|a| a.key() == v)
            }),
            contracts: choices(&options.contracts, |v| {
                selection.contract.as_deref() == Some(v)
            }),
            modes: DisplayMode::ALL
                .into_iter()
                .map(|m| Choice {
                    value: m.key().to_string(),
                    label: m.label().to_string(),
                    selected: m == selection.mode,
                })
                .collect(),
            window: selection.window.get(),
            window_min: MIN_WINDOW,
            window_max: MAX_WINDOW,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PanelView {
    pub title: String,
    pub charts: Vec<String>,
}

/// Rendered SVG for every chart in a [`DashboardView`].
#[derive(Debug, Clone, PartialEq)]
pub struct ChartsView {
    pub row_count: usize,
    /// Shown instead of the indicator panels when nothing is drawn.
    pub hint: String,
    pub overview: Vec<String>,
    pub panels: Vec<PanelView>,
    /// Empty when there is no correlation matrix to show.
    pub correlation: String,
}

impl ChartsView {
    pub fn new(view: &DashboardView, selection: &Selection) -> Self {
        let hint = if !selection.is_complete() {
            "Select at least one broker, a year and a contract to draw the charts."
        } else if view.is_empty() {
            "No rows match the current selection."
        } else {
            ""
        };

        Self {
            row_count: view.row_count,
            hint: hint.to_string(),
            overview: [&view.holding, &view.change_rate, &view.price, &view.price_change]
                .into_iter()
                .map(render_figure)
                .collect(),
            panels: view
                .indicator_panels
                .iter()
                .map(|panel| PanelView {
                    title: panel.title.clone(),
                    charts: panel.figures.iter().map(render_figure).collect(),
                })
                .collect(),
            correlation: view
                .correlation
                .as_ref()
                .map(render_heatmap)
                .unwrap_or_default(),
        }
    }
}

#[derive(Template)]
#[template(path = "dashboard.html")]
pub struct DashboardTemplate<'a> {
    pub source: &'a str,
    pub dataset_rows: usize,
    pub controls: &'a Controls,
    pub charts: &'a ChartsView,
}

/// Body of the dashboard, swapped in place on every control change.
#[derive(Template)]
#[template(path = "dashboard_fragment.html")]
pub struct DashboardFragmentTemplate<'a> {
    pub controls: &'a Controls,
    pub charts: &'a ChartsView,
}

#[derive(Template)]
#[template(path = "options.html")]
pub struct OptionsTemplate<'a> {
    pub controls: &'a Controls,
}

#[derive(Template)]
#[template(path = "charts.html")]
pub struct ChartsTemplate<'a> {
    pub charts: &'a ChartsView,
}

#[derive(Template)]
#[template(path = "error.html")]
pub struct ErrorTemplate<'a> {
    pub message: &'a str,
    pub status: u16,
}
