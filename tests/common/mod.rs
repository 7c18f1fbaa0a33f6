#![allow(dead_code)]

use brokerdash::adapters::csv_adapter::CsvAdapter;
use brokerdash::domain::dataset::Dataset;
use brokerdash::domain::error::DashboardError;
use brokerdash::domain::observation::{Action, Observation, Side};
use brokerdash::domain::schema::{DatasetSchema, IndicatorGroup, IndicatorGroups};
use brokerdash::ports::data_port::DataPort;
use chrono::NaiveDate;
use std::fs;
use std::path::PathBuf;
use std::sync::RwLock;
use tempfile::TempDir;

pub const POSITIONS_HEADER: &str =
    "broker,contract,date,holding,change_rate,price,price_change_rate,side,action,ma,cci";

/// Two brokers, four contracts. Canonical contract order is
/// M2309, M2405, M2409, M2501.
pub const POSITIONS_ROWS: &str = "\
Alpha,M2409,2024-03-01,1000,0.01,3100,0.002,l,1,0.4,0.1
Alpha,M2409,2024-03-04,1100,0.10,3120,0.006,l,1,0.5,-0.2
Alpha,M2409,2024-03-05,1050,-0.045,3090,-0.01,s,-1,0.3,0.3
Alpha,M2405,2024-01-02,800,0.02,3000,0.001,s,-1,0.1,0.0
Beta,M2409,2024-03-01,500,0.0,3100,0.002,l,0,-0.2,0.5
Beta,M2501,2024-06-03,600,0.05,3200,0.004,l,1,0.2,0.4
Alpha,M2309,2023-04-01,700,0.01,2900,0.003,l,1,0.1,0.2
";

pub const DASHBOARD_INI: &str = "\
[data]
path = positions.csv

[indicators]
fundamental =
trend = ma
oscillator = cci
volume =

[dashboard]
default_window = 7
default_mode = all

[web]
listen = 127.0.0.1:0
";

pub fn positions_csv() -> String {
    format!("{POSITIONS_HEADER}\n{POSITIONS_ROWS}")
}

pub fn schema() -> DatasetSchema {
    DatasetSchema {
        indicators: IndicatorGroups::new()
            .with_group(IndicatorGroup::Trend, vec!["ma".into()])
            .with_group(IndicatorGroup::Oscillator, vec!["cci".into()]),
        ..DatasetSchema::default()
    }
}

pub fn dataset() -> Dataset {
    CsvAdapter::new(PathBuf::from("positions.csv"))
        .parse_str(&positions_csv(), &schema())
        .unwrap()
}

pub fn date(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

pub fn obs(broker: &str, contract: &str, day: &str, holding: f64) -> Observation {
    Observation {
        broker: broker.into(),
        contract: contract.into(),
        date: date(day),
        holding,
        change_rate: 0.0,
        price: 3000.0,
        price_change_rate: None,
        side: Side::Long,
        action: Action::Unchanged,
        indicators: vec![],
    }
}

/// Config and data written side by side in a temporary directory.
pub struct Fixture {
    pub dir: TempDir,
    pub config: PathBuf,
    pub data: PathBuf,
}

pub fn write_fixture(csv: &str, ini: &str) -> Fixture {
    let dir = TempDir::new().unwrap();
    let config = dir.path().join("dashboard.ini");
    let data = dir.path().join("positions.csv");
    fs::write(&config, ini).unwrap();
    fs::write(&data, csv).unwrap();
    Fixture { dir, config, data }
}

/// Data port serving CSV text from memory; the text can be swapped or made
/// to fail between loads.
pub struct MockDataPort {
    pub csv: RwLock<Result<String, String>>,
}

impl MockDataPort {
    pub fn new(csv: impl Into<String>) -> Self {
        Self {
            csv: RwLock::new(Ok(csv.into())),
        }
    }

    pub fn set_csv(&self, csv: impl Into<String>) {
        *self.csv.write().unwrap() = Ok(csv.into());
    }

    pub fn set_error(&self, reason: &str) {
        *self.csv.write().unwrap() = Err(reason.to_string());
    }
}

impl DataPort for MockDataPort {
    fn load_dataset(&self, schema: &DatasetSchema) -> Result<Dataset, DashboardError> {
        match &*self.csv.read().unwrap() {
            Ok(csv) => CsvAdapter::new(PathBuf::from("mock.csv")).parse_str(csv, schema),
            Err(reason) => Err(DashboardError::SourceUnreadable {
                path: "mock.csv".into(),
                reason: reason.clone(),
            }),
        }
    }

    fn describe(&self) -> String {
        "mock.csv".to_string()
    }
}
