//! Selection state and everything derived from it.
//!
//! The dashboard holds no state besides the current [`Selection`]. Events
//! produce a new selection through [`Selection::apply`]; option lists and the
//! chart view are pure functions of `(dataset, selection)` and are recomputed
//! in full on every change.

use serde::Serialize;

use super::chart::{Figure, Heatmap};
use super::dataset::Dataset;
use super::filter::RowFilter;
use super::observation::{Action, Observation, Side};
use super::panels::{
    DisplayMode, IndicatorPanel, change_rate_chart, correlation_heatmap, holding_chart,
    indicator_panels, price_chart, price_change_chart,
};
use super::smoothing::SmoothingWindow;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Selection {
    pub brokers: Vec<String>,
    pub year: Option<i32>,
    pub sides: Vec<Side>,
    pub actions: Vec<Action>,
    pub contract: Option<String>,
    pub window: SmoothingWindow,
    pub mode: DisplayMode,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SelectionEvent {
    Brokers(Vec<String>),
    Year(Option<i32>),
    Sides(Vec<Side>),
    Actions(Vec<Action>),
    Contract(Option<String>),
    Window(SmoothingWindow),
    Mode(DisplayMode),
}

impl Selection {
    pub fn apply(mut self, event: SelectionEvent) -> Self {
        match event {
            SelectionEvent::Brokers(brokers) => self.brokers = brokers,
            SelectionEvent::Year(year) => self.year = year,
            SelectionEvent::Sides(sides) => self.sides = sides,
            SelectionEvent::Actions(actions) => self.actions = actions,
            SelectionEvent::Contract(contract) => self.contract = contract,
            SelectionEvent::Window(window) => self.window = window,
            SelectionEvent::Mode(mode) => self.mode = mode,
        }
        self
    }

    /// Brokers and year are both chosen; dependent options can be offered.
    pub fn has_scope(&self) -> bool {
        !self.brokers.is_empty() && self.year.is_some()
    }

    /// Brokers, year and contract are all chosen; charts can be drawn.
    pub fn is_complete(&self) -> bool {
        self.has_scope() && self.contract.is_some()
    }

    /// Filter for the option lists: everything except the contract.
    pub fn scope_filter(&self) -> RowFilter {
        RowFilter {
            brokers: Some(self.brokers.clone()),
            year: self.year,
            sides: Some(self.sides.clone()),
            actions: Some(self.actions.clone()),
            contract: None,
        }
    }

    pub fn row_filter(&self) -> RowFilter {
        RowFilter {
            contract: self.contract.clone(),
            ..self.scope_filter()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OptionItem {
    pub value: String,
    pub label: String,
}

impl OptionItem {
    fn new(value: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            label: label.into(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SelectionOptions {
    pub brokers: Vec<OptionItem>,
    pub years: Vec<OptionItem>,
    pub sides: Vec<OptionItem>,
    pub actions: Vec<OptionItem>,
    pub contracts: Vec<OptionItem>,
}

pub fn side_options(selection: &Selection) -> Vec<OptionItem> {
    if !selection.has_scope() {
        return Vec::new();
    }
    Side::ALL
        .into_iter()
        .map(|s| OptionItem::new(s.key(), s.label()))
        .collect()
}

pub fn action_options(selection: &Selection) -> Vec<OptionItem> {
    if !selection.has_scope() {
        return Vec::new();
    }
    Action::ALL
        .into_iter()
        .map(|a| OptionItem::new(a.key(), a.label()))
        .collect()
}

/// Contracts present under the current brokers/year/side/action scope, in
/// canonical order.
pub fn contract_options(dataset: &Dataset, selection: &Selection) -> Vec<OptionItem> {
    if !selection.has_scope() {
        return Vec::new();
    }
    let rows = selection.scope_filter().apply(dataset.rows());
    dataset
        .sort_contracts(rows.iter().map(|r| r.contract.as_str()))
        .into_iter()
        .map(|c| OptionItem::new(c.clone(), c))
        .collect()
}

pub fn options(dataset: &Dataset, selection: &Selection) -> SelectionOptions {
    SelectionOptions {
        brokers: dataset
            .brokers()
            .into_iter()
            .map(|b| OptionItem::new(b.clone(), b))
            .collect(),
        years: dataset
            .years()
            .into_iter()
            .map(|y| OptionItem::new(y.to_string(), y.to_string()))
            .collect(),
        sides: side_options(selection),
        actions: action_options(selection),
        contracts: contract_options(dataset, selection),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardView {
    pub holding: Figure,
    pub change_rate: Figure,
    pub price: Figure,
    pub price_change: Figure,
    pub indicator_panels: Vec<IndicatorPanel>,
    pub correlation: Option<Heatmap>,
    pub row_count: usize,
}

impl DashboardView {
    pub fn empty() -> Self {
        Self {
            holding: Figure::empty(),
            change_rate: Figure::empty(),
            price: Figure::empty(),
            price_change: Figure::empty(),
            indicator_panels: Vec::new(),
            correlation: None,
            row_count: 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.row_count == 0
    }
}

/// Rows the charts are drawn from; empty unless the selection is complete.
pub fn selected_rows<'a>(dataset: &'a Dataset, selection: &Selection) -> Vec<&'a Observation> {
    if !selection.is_complete() {
        return Vec::new();
    }
    selection.row_filter().apply(dataset.rows())
}

pub fn render(dataset: &Dataset, selection: &Selection) -> DashboardView {
    let rows = selected_rows(dataset, selection);
    if rows.is_empty() {
        return DashboardView::empty();
    }

    let heatmap = correlation_heatmap(dataset, &rows);
    DashboardView {
        holding: holding_chart(&rows),
        change_rate: change_rate_chart(&rows, selection.window),
        price: price_chart(&rows),
        price_change: price_change_chart(&rows, selection.window),
        indicator_panels: indicator_panels(dataset, &rows, selection.mode),
        correlation: (!heatmap.is_empty()).then_some(heatmap),
        row_count: rows.len(),
    }
}
