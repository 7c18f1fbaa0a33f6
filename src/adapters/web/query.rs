//! Query-string decoding into a [`Selection`].
//!
//! Multi-selects arrive as repeated keys (`broker=a&broker=b`). Blank values
//! are what an untouched `<select>` submits and count as "not chosen".

use crate::domain::controller::{Selection, SelectionEvent};
use crate::domain::error::DashboardError;
use crate::domain::observation::{Action, Side};
use crate::domain::settings::DashboardSettings;
use crate::domain::smoothing::SmoothingWindow;

pub fn parse_selection(
    pairs: &[(String, String)],
    defaults: &DashboardSettings,
) -> Result<Selection, DashboardError> {
    let mut selection = Selection {
        window: defaults.default_window,
        mode: defaults.default_mode,
        ..Selection::default()
    };
    let mut brokers: Vec<String> = Vec::new();
    let mut sides: Vec<Side> = Vec::new();
    let mut actions: Vec<Action> = Vec::new();

    for (key, raw) in pairs {
        let value = raw.trim();
        if value.is_empty() {
            continue;
        }
        let event = match key.as_str() {
            "broker" => {
                if !brokers.iter().any(|b| b == value) {
                    brokers.push(value.to_string());
                }
                continue;
            }
            "side" => {
                let side: Side = value
                    .parse()
                    .map_err(|reason: String| DashboardError::invalid_selection("side", reason))?;
                if !sides.contains(&side) {
                    sides.push(side);
                }
                continue;
            }
            "action" => {
                let action: Action = value
                    .parse()
                    .map_err(|reason: String| DashboardError::invalid_selection("action", reason))?;
                if !actions.contains(&action) {
                    actions.push(action);
                }
                continue;
            }
            "year" => {
                let year = value.parse::<i32>().map_err(|_| {
                    DashboardError::invalid_selection("year", format!("'{value}' is not a year"))
                })?;
                SelectionEvent::Year(Some(year))
            }
            "contract" => SelectionEvent::Contract(Some(value.to_string())),
            "window" => {
                let days = value.parse::<usize>().map_err(|_| {
                    DashboardError::invalid_selection(
                        "window",
                        format!("'{value}' is not a day count"),
                    )
                })?;
                SelectionEvent::Window(SmoothingWindow::new(days)?)
            }
            "mode" => SelectionEvent::Mode(
                value
                    .parse()
                    .map_err(|reason: String| DashboardError::invalid_selection("mode", reason))?,
            ),
            other => {
                tracing::debug!(key = other, "ignoring unknown query parameter");
                continue;
            }
        };
        selection = selection.apply(event);
    }

    Ok(selection
        .apply(SelectionEvent::Brokers(brokers))
        .apply(SelectionEvent::Sides(sides))
        .apply(SelectionEvent::Actions(actions)))
}
