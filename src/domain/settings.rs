//! Dashboard settings assembled from configuration.
//!
//! ```ini
//! [data]
//! path = positions.csv
//!
//! [columns]
//! holding = open_interest
//!
//! [indicators]
//! trend = dual_ma, trix
//!
//! [dashboard]
//! default_window = 7
//! default_mode = all
//!
//! [web]
//! listen = 127.0.0.1:3000
//! ```

use std::path::PathBuf;

use super::error::DashboardError;
use super::panels::DisplayMode;
use super::schema::{ColumnNames, DatasetSchema, IndicatorGroup, IndicatorGroups};
use super::smoothing::{DEFAULT_WINDOW, SmoothingWindow};
use crate::ports::config_port::ConfigPort;

pub const DEFAULT_LISTEN: &str = "127.0.0.1:3000";

#[derive(Debug, Clone, PartialEq)]
pub struct DashboardSettings {
    pub data_path: PathBuf,
    pub schema: DatasetSchema,
    pub listen: String,
    pub default_window: SmoothingWindow,
    pub default_mode: DisplayMode,
}

impl DashboardSettings {
    pub fn from_config(config: &dyn ConfigPort) -> Result<Self, DashboardError> {
        let data_path = config
            .get_string("data", "path")
            .map(|p| p.trim().to_string())
            .filter(|p| !p.is_empty())
            .ok_or_else(|| DashboardError::ConfigMissing {
                section: "data".into(),
                key: "path".into(),
            })?;

        let window_raw = config.get_int("dashboard", "default_window", DEFAULT_WINDOW as i64);
        let default_window = usize::try_from(window_raw)
            .ok()
            .and_then(|w| SmoothingWindow::new(w).ok())
            .ok_or_else(|| DashboardError::ConfigInvalid {
                section: "dashboard".into(),
                key: "default_window".into(),
                reason: format!("{window_raw} is outside 1..=30"),
            })?;

        let default_mode = match config.get_string("dashboard", "default_mode") {
            Some(raw) => raw.parse().map_err(|reason| DashboardError::ConfigInvalid {
                section: "dashboard".into(),
                key: "default_mode".into(),
                reason,
            })?,
            None => DisplayMode::default(),
        };

        Ok(Self {
            data_path: PathBuf::from(data_path),
            schema: build_schema(config),
            listen: config
                .get_string("web", "listen")
                .unwrap_or_else(|| DEFAULT_LISTEN.to_string()),
            default_window,
            default_mode,
        })
    }
}

/// Column overrides from `[columns]`, indicator lists from `[indicators]`.
pub fn build_schema(config: &dyn ConfigPort) -> DatasetSchema {
    let mut columns = ColumnNames::default();
    for key in ColumnNames::KEYS {
        let Some(header) = config.get_string("columns", key) else {
            continue;
        };
        let header = header.trim();
        if header.is_empty() {
            continue;
        }
        if let Some(field) = columns.field_mut(key) {
            *field = header.to_string();
        }
    }

    let mut indicators = IndicatorGroups::standard();
    for group in IndicatorGroup::ALL {
        if let Some(list) = config.get_list("indicators", group.key()) {
            indicators.set(group, list);
        }
    }

    DatasetSchema {
        columns,
        indicators,
    }
}
