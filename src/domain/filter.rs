//! Row selection by broker, year, side, action and contract.
//!
//! Every predicate is optional. An absent predicate, or an empty inclusion
//! set, leaves that dimension unfiltered; present predicates are combined by
//! conjunction. Results keep the input order.

use super::observation::{Action, Observation, Side};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RowFilter {
    pub brokers: Option<Vec<String>>,
    pub year: Option<i32>,
    pub sides: Option<Vec<Side>>,
    pub actions: Option<Vec<Action>>,
    pub contract: Option<String>,
}

impl RowFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn brokers<I, S>(mut self, brokers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.brokers = Some(brokers.into_iter().map(Into::into).collect());
        self
    }

    pub fn year(mut self, year: i32) -> Self {
        self.year = Some(year);
        self
    }

    pub fn sides(mut self, sides: impl IntoIterator<Item = Side>) -> Self {
        self.sides = Some(sides.into_iter().collect());
        self
    }

    pub fn actions(mut self, actions: impl IntoIterator<Item = Action>) -> Self {
        self.actions = Some(actions.into_iter().collect());
        self
    }

    pub fn contract(mut self, contract: impl Into<String>) -> Self {
        self.contract = Some(contract.into());
        self
    }

    pub fn matches(&self, row: &Observation) -> bool {
        included(&self.brokers, |b| *b == row.broker)
            && self.year.is_none_or(|y| row.year() == y)
            && included(&self.sides, |s| *s == row.side)
            && included(&self.actions, |a| *a == row.action)
            && self.contract.as_ref().is_none_or(|c| *c == row.contract)
    }

    /// Matching rows, in input order. Accepts the full table or a prior result.
    pub fn apply<'a, I>(&self, rows: I) -> Vec<&'a Observation>
    where
        I: IntoIterator<Item = &'a Observation>,
    {
        rows.into_iter().filter(|row| self.matches(row)).collect()
    }
}

fn included<T>(set: &Option<Vec<T>>, pred: impl FnMut(&T) -> bool) -> bool {
    match set {
        Some(values) if !values.is_empty() => values.iter().any(pred),
        _ => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn obs(broker: &str, date: &str, side: Side, action: Action, contract: &str) -> Observation {
        Observation {
            broker: broker.into(),
            contract: contract.into(),
            date: NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap(),
            holding: 1.0,
            change_rate: 0.0,
            price: 1.0,
            price_change_rate: None,
            side,
            action,
            indicators: Vec::new(),
        }
    }

    fn rows() -> Vec<Observation> {
        vec![
            obs("Alpha", "2023-01-02", Side::Long, Action::Increase, "M2305"),
            obs("Beta", "2023-01-02", Side::Short, Action::Decrease, "M2305"),
            obs("Alpha", "2024-01-03", Side::Short, Action::Unchanged, "M2405"),
            obs("Gamma", "2024-01-03", Side::Long, Action::Increase, "M2405"),
            obs("Alpha", "2024-02-01", Side::Long, Action::Decrease, "M2405"),
        ]
    }

    #[test]
    fn no_predicates_returns_everything() {
        let rows = rows();
        assert_eq!(RowFilter::new().apply(&rows).len(), rows.len());
    }

    #[test]
    fn empty_sets_do_not_filter() {
        let rows = rows();
        let filter = RowFilter::new()
            .brokers(Vec::<String>::new())
            .sides([])
            .actions([]);
        assert_eq!(filter.apply(&rows).len(), rows.len());
    }

    #[test]
    fn conjunction_of_predicates() {
        let rows = rows();
        let filter = RowFilter::new()
            .brokers(["Alpha"])
            .year(2024)
            .contract("M2405");
        let out = filter.apply(&rows);
        assert_eq!(out.len(), 2);
        assert!(out.iter().all(|r| r.broker == "Alpha" && r.year() == 2024));
    }

    #[test]
    fn side_long_only_returns_long_rows() {
        let rows = rows();
        let out = RowFilter::new().sides([Side::Long]).apply(&rows);
        assert_eq!(out.len(), 3);
        assert!(out.iter().all(|r| r.side.label() == "Long"));
    }

    #[test]
    fn action_inclusion_set() {
        let rows = rows();
        let out = RowFilter::new()
            .actions([Action::Increase, Action::Unchanged])
            .apply(&rows);
        let actions: Vec<Action> = out.iter().map(|r| r.action).collect();
        assert_eq!(
            actions,
            vec![Action::Increase, Action::Unchanged, Action::Increase]
        );
    }

    #[test]
    fn preserves_input_order() {
        let rows = rows();
        let out = RowFilter::new().brokers(["Gamma", "Alpha"]).apply(&rows);
        let dates: Vec<String> = out.iter().map(|r| r.date.to_string()).collect();
        assert_eq!(
            dates,
            vec!["2023-01-02", "2024-01-03", "2024-01-03", "2024-02-01"]
        );
    }

    #[test]
    fn no_match_is_empty_not_error() {
        let rows = rows();
        let out = RowFilter::new().brokers(["Delta"]).year(2023).apply(&rows);
        assert!(out.is_empty());
    }

    #[test]
    fn idempotent_on_filtered_subset() {
        let rows = rows();
        let filter = RowFilter::new().year(2024).sides([Side::Long]);
        let once = filter.apply(&rows);
        let twice = filter.apply(once.iter().copied());
        assert_eq!(once, twice);
    }
}
