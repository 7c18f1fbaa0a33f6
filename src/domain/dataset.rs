//! The loaded observation table and its snapshot holder.
//!
//! A [`Dataset`] is built once from loaded rows and never mutated. The
//! canonical contract order (each contract ranked by its earliest observed
//! date) is computed at construction so option lists can be sorted without
//! rescanning the table.

use chrono::NaiveDate;
use std::collections::{BTreeSet, HashMap, HashSet};
use std::sync::{Arc, RwLock};

use super::observation::Observation;
use super::schema::IndicatorGroups;

#[derive(Debug, Clone)]
pub struct Dataset {
    rows: Vec<Observation>,
    indicator_names: Vec<String>,
    indicator_groups: IndicatorGroups,
    contract_order: Vec<String>,
    contract_rank: HashMap<String, usize>,
}

impl Dataset {
    pub fn new(rows: Vec<Observation>, indicator_groups: IndicatorGroups) -> Self {
        let indicator_names = indicator_groups.all_columns();
        let contract_order = contract_order(&rows);
        let contract_rank = contract_order
            .iter()
            .enumerate()
            .map(|(i, c)| (c.clone(), i))
            .collect();

        Self {
            rows,
            indicator_names,
            indicator_groups,
            contract_order,
            contract_rank,
        }
    }

    pub fn rows(&self) -> &[Observation] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Indicator column names; `Observation::indicators` is indexed by this list.
    pub fn indicator_names(&self) -> &[String] {
        &self.indicator_names
    }

    pub fn indicator_index(&self, name: &str) -> Option<usize> {
        self.indicator_names.iter().position(|n| n == name)
    }

    pub fn indicator_groups(&self) -> &IndicatorGroups {
        &self.indicator_groups
    }

    /// Contract identifiers sorted by first observed date.
    pub fn contract_order(&self) -> &[String] {
        &self.contract_order
    }

    pub fn contract_rank(&self, contract: &str) -> Option<usize> {
        self.contract_rank.get(contract).copied()
    }

    /// Distinct brokers in first-appearance order.
    pub fn brokers(&self) -> Vec<String> {
        let mut seen = HashSet::new();
        self.rows
            .iter()
            .filter(|r| seen.insert(r.broker.as_str()))
            .map(|r| r.broker.clone())
            .collect()
    }

    /// Distinct years, ascending.
    pub fn years(&self) -> Vec<i32> {
        self.rows
            .iter()
            .map(|r| r.year())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Sort contract identifiers into canonical order; unknown ones go last.
    pub fn sort_contracts<'a, I>(&self, contracts: I) -> Vec<String>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut unique: Vec<&str> = contracts
            .into_iter()
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        unique.sort_by_key(|c| self.contract_rank(c).unwrap_or(usize::MAX));
        unique.into_iter().map(str::to_string).collect()
    }
}

/// Contracts ranked by minimum date, ties broken by identifier.
fn contract_order(rows: &[Observation]) -> Vec<String> {
    let mut first_seen: HashMap<&str, NaiveDate> = HashMap::new();
    for row in rows {
        first_seen
            .entry(row.contract.as_str())
            .and_modify(|d| *d = (*d).min(row.date))
            .or_insert(row.date);
    }

    let mut ordered: Vec<(&str, NaiveDate)> = first_seen.into_iter().collect();
    ordered.sort_by(|a, b| a.1.cmp(&b.1).then_with(|| a.0.cmp(b.0)));
    ordered.into_iter().map(|(c, _)| c.to_string()).collect()
}

/// Process-wide holder of the current dataset snapshot.
///
/// Readers clone the inner `Arc` and work on an immutable view; `replace`
/// swaps the whole snapshot at once.
#[derive(Debug)]
pub struct DatasetStore {
    current: RwLock<Arc<Dataset>>,
}

impl DatasetStore {
    pub fn new(dataset: Dataset) -> Self {
        Self {
            current: RwLock::new(Arc::new(dataset)),
        }
    }

    pub fn snapshot(&self) -> Arc<Dataset> {
        match self.current.read() {
            Ok(guard) => Arc::clone(&guard),
            Err(poisoned) => Arc::clone(&poisoned.into_inner()),
        }
    }

    /// Swap in a new snapshot, returning the previous one.
    pub fn replace(&self, dataset: Dataset) -> Arc<Dataset> {
        let next = Arc::new(dataset);
        let mut guard = match self.current.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        std::mem::replace(&mut *guard, next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::observation::{Action, Side};

    fn obs(broker: &str, contract: &str, date: &str) -> Observation {
        Observation {
            broker: broker.into(),
            contract: contract.into(),
            date: NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap(),
            holding: 100.0,
            change_rate: 0.0,
            price: 3000.0,
            price_change_rate: Some(0.0),
            side: Side::Long,
            action: Action::Unchanged,
            indicators: Vec::new(),
        }
    }

    #[test]
    fn contract_order_by_first_seen_date() {
        let rows = vec![
            obs("Alpha", "A", "2020-01-01"),
            obs("Alpha", "B", "2019-06-01"),
            obs("Alpha", "A", "2020-02-01"),
        ];
        let ds = Dataset::new(rows, IndicatorGroups::new());
        assert_eq!(ds.contract_order(), ["B".to_string(), "A".to_string()]);
        assert_eq!(ds.contract_rank("B"), Some(0));
        assert_eq!(ds.contract_rank("A"), Some(1));
    }

    #[test]
    fn contract_order_uses_minimum_not_first_row() {
        let rows = vec![
            obs("Alpha", "A", "2021-05-01"),
            obs("Alpha", "B", "2021-01-01"),
            obs("Beta", "A", "2020-12-01"),
        ];
        let ds = Dataset::new(rows, IndicatorGroups::new());
        assert_eq!(ds.contract_order(), ["A".to_string(), "B".to_string()]);
    }

    #[test]
    fn contract_order_ties_break_by_identifier() {
        let rows = vec![
            obs("Alpha", "M2409", "2024-01-02"),
            obs("Alpha", "M2405", "2024-01-02"),
        ];
        let ds = Dataset::new(rows, IndicatorGroups::new());
        assert_eq!(
            ds.contract_order(),
            ["M2405".to_string(), "M2409".to_string()]
        );
    }

    #[test]
    fn brokers_in_first_appearance_order() {
        let rows = vec![
            obs("Gamma", "A", "2020-01-01"),
            obs("Alpha", "A", "2020-01-02"),
            obs("Gamma", "A", "2020-01-03"),
        ];
        let ds = Dataset::new(rows, IndicatorGroups::new());
        assert_eq!(ds.brokers(), vec!["Gamma", "Alpha"]);
    }

    #[test]
    fn years_sorted_and_distinct() {
        let rows = vec![
            obs("Alpha", "A", "2022-01-01"),
            obs("Alpha", "A", "2020-01-02"),
            obs("Alpha", "A", "2022-03-03"),
        ];
        let ds = Dataset::new(rows, IndicatorGroups::new());
        assert_eq!(ds.years(), vec![2020, 2022]);
    }

    #[test]
    fn sort_contracts_deduplicates_and_orders() {
        let rows = vec![
            obs("Alpha", "A", "2020-01-01"),
            obs("Alpha", "B", "2019-06-01"),
        ];
        let ds = Dataset::new(rows, IndicatorGroups::new());
        let sorted = ds.sort_contracts(["A", "B", "A", "Z"]);
        assert_eq!(sorted, vec!["B", "A", "Z"]);
    }

    #[test]
    fn store_replace_swaps_snapshot() {
        let store = DatasetStore::new(Dataset::new(
            vec![obs("Alpha", "A", "2020-01-01")],
            IndicatorGroups::new(),
        ));
        let before = store.snapshot();
        let previous = store.replace(Dataset::new(Vec::new(), IndicatorGroups::new()));

        assert_eq!(before.len(), 1);
        assert_eq!(previous.len(), 1);
        assert!(store.snapshot().is_empty());
    }
}
