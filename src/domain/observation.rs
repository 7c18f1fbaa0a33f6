//! Observation rows and the coded enumerations they carry.
//!
//! Side and action codes arrive as short codes in the source table
//! (`l`/`s`, `1`/`-1`/`0`). They are parsed once at load time into [`Side`]
//! and [`Action`], and every display label comes from their `label()`.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Long,
    Short,
}

impl Side {
    pub const ALL: [Side; 2] = [Side::Long, Side::Short];

    /// Parse a source code (`l` or `s`, case-insensitive).
    pub fn from_code(code: &str) -> Option<Self> {
        match code.trim().to_ascii_lowercase().as_str() {
            "l" => Some(Side::Long),
            "s" => Some(Side::Short),
            _ => None,
        }
    }

    pub fn code(self) -> &'static str {
        match self {
            Side::Long => "l",
            Side::Short => "s",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Side::Long => "Long",
            Side::Short => "Short",
        }
    }

    pub fn key(self) -> &'static str {
        match self {
            Side::Long => "long",
            Side::Short => "short",
        }
    }
}

impl FromStr for Side {
    type Err = String;

    /// Accepts either the query key (`long`/`short`) or the source code.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "long" => Ok(Side::Long),
            "short" => Ok(Side::Short),
            other => Side::from_code(other).ok_or_else(|| format!("unknown side '{s}'")),
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    Increase,
    Decrease,
    Unchanged,
}

impl Action {
    pub const ALL: [Action; 3] = [Action::Increase, Action::Decrease, Action::Unchanged];

    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            1 => Some(Action::Increase),
            -1 => Some(Action::Decrease),
            0 => Some(Action::Unchanged),
            _ => None,
        }
    }

    /// Parse the textual cell value. Spreadsheet exports often write the
    /// integer codes as floats (`1.0`), so those are accepted too.
    pub fn from_cell(cell: &str) -> Option<Self> {
        let trimmed = cell.trim();
        if let Ok(code) = trimmed.parse::<i64>() {
            return Self::from_code(code);
        }
        let value = trimmed.parse::<f64>().ok()?;
        if value.fract() != 0.0 {
            return None;
        }
        Self::from_code(value as i64)
    }

    pub fn code(self) -> i64 {
        match self {
            Action::Increase => 1,
            Action::Decrease => -1,
            Action::Unchanged => 0,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Action::Increase => "Increase",
            Action::Decrease => "Decrease",
            Action::Unchanged => "Unchanged",
        }
    }

    pub fn key(self) -> &'static str {
        match self {
            Action::Increase => "increase",
            Action::Decrease => "decrease",
            Action::Unchanged => "unchanged",
        }
    }
}

impl FromStr for Action {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "increase" => Ok(Action::Increase),
            "decrease" => Ok(Action::Decrease),
            "unchanged" => Ok(Action::Unchanged),
            other => Action::from_cell(other).ok_or_else(|| format!("unknown action '{s}'")),
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One row of the source table: a broker's position in one contract on one date.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Observation {
    pub broker: String,
    pub contract: String,
    pub date: NaiveDate,
    pub holding: f64,
    pub change_rate: f64,
    pub price: f64,
    pub price_change_rate: Option<f64>,
    pub side: Side,
    pub action: Action,
    /// Indicator values, positionally matching `Dataset::indicator_names`.
    pub indicators: Vec<Option<f64>>,
}

impl Observation {
    pub fn year(&self) -> i32 {
        self.date.year()
    }

    pub fn indicator(&self, index: usize) -> Option<f64> {
        self.indicators.get(index).copied().flatten()
    }

    /// Hover text shared by indicator bars: `"Long, Increase"`.
    pub fn position_label(&self) -> String {
        format!("{}, {}", self.side.label(), self.action.label())
    }
}
