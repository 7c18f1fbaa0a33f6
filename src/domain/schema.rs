//! Source table layout: column headers and indicator grouping.

use serde::Serialize;
use std::fmt;
use std::str::FromStr;

/// Header names of the fixed columns in the source table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnNames {
    pub broker: String,
    pub contract: String,
    pub date: String,
    pub holding: String,
    pub change_rate: String,
    pub price: String,
    pub price_change_rate: String,
    pub side: String,
    pub action: String,
}

impl ColumnNames {
    /// Config keys accepted in the `[columns]` section, in field order.
    pub const KEYS: [&'static str; 9] = [
        "broker",
        "contract",
        "date",
        "holding",
        "change_rate",
        "price",
        "price_change_rate",
        "side",
        "action",
    ];

    pub fn field_mut(&mut self, key: &str) -> Option<&mut String> {
        match key {
            "broker" => Some(&mut self.broker),
            "contract" => Some(&mut self.contract),
            "date" => Some(&mut self.date),
            "holding" => Some(&mut self.holding),
            "change_rate" => Some(&mut self.change_rate),
            "price" => Some(&mut self.price),
            "price_change_rate" => Some(&mut self.price_change_rate),
            "side" => Some(&mut self.side),
            "action" => Some(&mut self.action),
            _ => None,
        }
    }
}

impl Default for ColumnNames {
    fn default() -> Self {
        Self {
            broker: "broker".into(),
            contract: "contract".into(),
            date: "date".into(),
            holding: "holding".into(),
            change_rate: "change_rate".into(),
            price: "price".into(),
            price_change_rate: "price_change_rate".into(),
            side: "side".into(),
            action: "action".into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum IndicatorGroup {
    Fundamental,
    Trend,
    Oscillator,
    Volume,
}

impl IndicatorGroup {
    pub const ALL: [IndicatorGroup; 4] = [
        IndicatorGroup::Fundamental,
        IndicatorGroup::Trend,
        IndicatorGroup::Oscillator,
        IndicatorGroup::Volume,
    ];

    pub fn key(self) -> &'static str {
        match self {
            IndicatorGroup::Fundamental => "fundamental",
            IndicatorGroup::Trend => "trend",
            IndicatorGroup::Oscillator => "oscillator",
            IndicatorGroup::Volume => "volume",
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            IndicatorGroup::Fundamental => "Fundamental signals",
            IndicatorGroup::Trend => "Trend indicators",
            IndicatorGroup::Oscillator => "Oscillators",
            IndicatorGroup::Volume => "Volume indicators",
        }
    }

    fn default_columns(self) -> &'static [&'static str] {
        match self {
            IndicatorGroup::Fundamental => &[
                "crusher_soybean_stock",
                "port_soybean_stock",
                "spot_crush_margin",
                "futures_crush_margin",
                "meal_basis",
                "meal_warehouse_receipts",
                "meal_inventory",
                "meal_rapeseed_spread",
                "hog_inventory",
            ],
            IndicatorGroup::Trend => &["dual_ma", "median_dual_ma", "kaufman_ma", "trix"],
            IndicatorGroup::Oscillator => &["cci", "bollinger", "intraday_momentum"],
            IndicatorGroup::Volume => &["chaikin", "volatility_trend"],
        }
    }
}

impl FromStr for IndicatorGroup {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        IndicatorGroup::ALL
            .into_iter()
            .find(|g| g.key().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown indicator group '{s}'"))
    }
}

impl fmt::Display for IndicatorGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.title())
    }
}

/// Indicator columns per group, in display order. Empty until groups are added.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IndicatorGroups {
    groups: Vec<(IndicatorGroup, Vec<String>)>,
}

impl IndicatorGroups {
    pub fn new() -> Self {
        Self { groups: Vec::new() }
    }

    pub fn with_group(mut self, group: IndicatorGroup, columns: Vec<String>) -> Self {
        self.set(group, columns);
        self
    }

    pub fn set(&mut self, group: IndicatorGroup, columns: Vec<String>) {
        match self.groups.iter_mut().find(|(g, _)| *g == group) {
            Some((_, existing)) => *existing = columns,
            None => {
                self.groups.push((group, columns));
                self.groups.sort_by_key(|(g, _)| *g as u8);
            }
        }
    }

    pub fn columns(&self, group: IndicatorGroup) -> &[String] {
        self.groups
            .iter()
            .find(|(g, _)| *g == group)
            .map(|(_, cols)| cols.as_slice())
            .unwrap_or(&[])
    }

    pub fn iter(&self) -> impl Iterator<Item = (IndicatorGroup, &[String])> {
        self.groups.iter().map(|(g, cols)| (*g, cols.as_slice()))
    }

    /// Every indicator column once, groups in order.
    pub fn all_columns(&self) -> Vec<String> {
        let mut out: Vec<String> = Vec::new();
        for (_, cols) in &self.groups {
            for col in cols {
                if !out.contains(col) {
                    out.push(col.clone());
                }
            }
        }
        out
    }
}

impl IndicatorGroups {
    /// The stock layout of the positions export: every group with its usual columns.
    pub fn standard() -> Self {
        IndicatorGroup::ALL
            .into_iter()
            .fold(IndicatorGroups::new(), |groups, group| {
                let cols = group.default_columns().iter().map(|c| c.to_string()).collect();
                groups.with_group(group, cols)
            })
    }
}

/// Everything the loader needs to know about the source table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatasetSchema {
    pub columns: ColumnNames,
    pub indicators: IndicatorGroups,
}

impl Default for DatasetSchema {
    fn default() -> Self {
        Self {
            columns: ColumnNames::default(),
            indicators: IndicatorGroups::standard(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_groups_cover_all_indicators() {
        let groups = IndicatorGroups::standard();
        assert_eq!(groups.columns(IndicatorGroup::Fundamental).len(), 9);
        assert_eq!(groups.columns(IndicatorGroup::Trend).len(), 4);
        assert_eq!(groups.columns(IndicatorGroup::Oscillator).len(), 3);
        assert_eq!(groups.columns(IndicatorGroup::Volume).len(), 2);
        assert_eq!(groups.all_columns().len(), 18);
    }

    #[test]
    fn new_groups_are_empty() {
        let groups = IndicatorGroups::new();
        assert!(groups.all_columns().is_empty());
        assert_eq!(groups.iter().count(), 0);
        assert_eq!(IndicatorGroups::default(), groups);
        assert_eq!(DatasetSchema::default().indicators, IndicatorGroups::standard());
    }

    #[test]
    fn set_replaces_group_and_keeps_order() {
        let groups = IndicatorGroups::new()
            .with_group(IndicatorGroup::Volume, vec!["obv".into()])
            .with_group(IndicatorGroup::Trend, vec!["ma".into()])
            .with_group(IndicatorGroup::Volume, vec!["chaikin".into()]);

        let order: Vec<IndicatorGroup> = groups.iter().map(|(g, _)| g).collect();
        assert_eq!(order, vec![IndicatorGroup::Trend, IndicatorGroup::Volume]);
        assert_eq!(groups.columns(IndicatorGroup::Volume), ["chaikin".to_string()]);
        assert!(groups.columns(IndicatorGroup::Oscillator).is_empty());
    }

    #[test]
    fn all_columns_deduplicates() {
        let groups = IndicatorGroups::new()
            .with_group(IndicatorGroup::Trend, vec!["a".into(), "b".into()])
            .with_group(IndicatorGroup::Oscillator, vec!["b".into(), "c".into()]);
        assert_eq!(groups.all_columns(), vec!["a", "b", "c"]);
    }

    #[test]
    fn group_parses_from_key() {
        assert_eq!("Trend".parse::<IndicatorGroup>(), Ok(IndicatorGroup::Trend));
        assert!("momentum".parse::<IndicatorGroup>().is_err());
    }

    #[test]
    fn column_names_field_mut() {
        let mut cols = ColumnNames::default();
        *cols.field_mut("holding").unwrap() = "open_interest".into();
        assert_eq!(cols.holding, "open_interest");
        assert!(cols.field_mut("unknown").is_none());
    }
}
