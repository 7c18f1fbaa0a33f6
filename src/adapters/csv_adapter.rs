//! CSV file data adapter.
//!
//! Reads the whole position table from one CSV file with a header row.
//! Columns are located by header name through the [`DatasetSchema`], so the
//! file may carry extra columns in any order.

use crate::domain::dataset::Dataset;
use crate::domain::error::DashboardError;
use crate::domain::observation::{Action, Observation, Side};
use crate::domain::schema::DatasetSchema;
use crate::ports::data_port::DataPort;
use chrono::NaiveDate;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

const DATE_FORMATS: [&str; 2] = ["%Y-%m-%d", "%Y/%m/%d"];

pub struct CsvAdapter {
    path: PathBuf,
}

impl CsvAdapter {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn parse_str(
        &self,
        content: &str,
        schema: &DatasetSchema,
    ) -> Result<Dataset, DashboardError> {
        let mut rdr = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(content.as_bytes());

        let headers = rdr.headers()?.clone();
        let index: HashMap<&str, usize> = headers.iter().enumerate().map(|(i, h)| (h, i)).collect();
        let layout = Layout::resolve(&index, schema, &self.path)?;

        let mut rows = Vec::new();
        let mut dropped = 0usize;

        for result in rdr.records() {
            let record = result?;
            let line = record.position().map(|p| p.line()).unwrap_or(0);
            match layout.parse(&record, line)? {
                Some(obs) => rows.push(obs),
                None => dropped += 1,
            }
        }

        if dropped > 0 {
            tracing::warn!(
                dropped,
                path = %self.path.display(),
                "dropped rows missing holding, change rate or price"
            );
        }

        Ok(Dataset::new(rows, schema.indicators.clone()))
    }
}

impl DataPort for CsvAdapter {
    fn load_dataset(&self, schema: &DatasetSchema) -> Result<Dataset, DashboardError> {
        let content =
            fs::read_to_string(&self.path).map_err(|e| DashboardError::SourceUnreadable {
                path: self.path.display().to_string(),
                reason: e.to_string(),
            })?;

        let dataset = self.parse_str(&content, schema)?;
        tracing::info!(
            rows = dataset.len(),
            contracts = dataset.contract_order().len(),
            path = %self.path.display(),
            "dataset loaded"
        );
        Ok(dataset)
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

/// Column positions resolved against the header row.
struct Layout {
    broker: usize,
    contract: usize,
    date: usize,
    holding: usize,
    change_rate: usize,
    price: usize,
    price_change_rate: Option<usize>,
    side: usize,
    action: usize,
    indicators: Vec<Option<usize>>,
}

impl Layout {
    fn resolve(
        index: &HashMap<&str, usize>,
        schema: &DatasetSchema,
        path: &Path,
    ) -> Result<Self, DashboardError> {
        let required = |column: &str| -> Result<usize, DashboardError> {
            index
                .get(column)
                .copied()
                .ok_or_else(|| DashboardError::MissingColumn {
                    path: path.display().to_string(),
                    column: column.to_string(),
                })
        };
        let cols = &schema.columns;

        let indicators: Vec<Option<usize>> = schema
            .indicators
            .all_columns()
            .iter()
            .map(|name| index.get(name.as_str()).copied())
            .collect();
        let missing = indicators.iter().filter(|i| i.is_none()).count();
        if missing > 0 {
            tracing::warn!(missing, "indicator columns absent from source, treated as empty");
        }

        Ok(Self {
            broker: required(&cols.broker)?,
            contract: required(&cols.contract)?,
            date: required(&cols.date)?,
            holding: required(&cols.holding)?,
            change_rate: required(&cols.change_rate)?,
            price: required(&cols.price)?,
            price_change_rate: index.get(cols.price_change_rate.as_str()).copied(),
            side: required(&cols.side)?,
            action: required(&cols.action)?,
            indicators,
        })
    }

    /// `Ok(None)` when the row lacks holding, change rate or price.
    fn parse(
        &self,
        record: &csv::StringRecord,
        line: u64,
    ) -> Result<Option<Observation>, DashboardError> {
        let cell = |i: usize| record.get(i).unwrap_or("");
        let number = |i: usize| parse_number(cell(i));

        let (Some(holding), Some(change_rate), Some(price)) =
            (number(self.holding), number(self.change_rate), number(self.price))
        else {
            return Ok(None);
        };

        let invalid = |reason: String| DashboardError::InvalidRow { line, reason };

        let date = parse_date(cell(self.date))
            .ok_or_else(|| invalid(format!("unparsable date '{}'", cell(self.date))))?;
        let side = Side::from_code(cell(self.side))
            .ok_or_else(|| invalid(format!("unknown side code '{}'", cell(self.side))))?;
        let action = Action::from_cell(cell(self.action))
            .ok_or_else(|| invalid(format!("unknown action code '{}'", cell(self.action))))?;

        Ok(Some(Observation {
            broker: cell(self.broker).to_string(),
            contract: cell(self.contract).to_string(),
            date,
            holding,
            change_rate,
            price,
            price_change_rate: self.price_change_rate.and_then(number),
            side,
            action,
            indicators: self
                .indicators
                .iter()
                .map(|i| i.and_then(number))
                .collect(),
        }))
    }
}

/// Empty, `NaN` and unparsable cells are missing.
fn parse_number(cell: &str) -> Option<f64> {
    let value: f64 = cell.trim().parse().ok()?;
    value.is_finite().then_some(value)
}

/// Accepts `YYYY-MM-DD` or `YYYY/MM/DD`, optionally followed by a time of day.
fn parse_date(cell: &str) -> Option<NaiveDate> {
    let day = cell.trim().split([' ', 'T']).next()?;
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(day, fmt).ok())
}
