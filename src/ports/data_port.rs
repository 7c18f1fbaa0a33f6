//! Data source port trait.

use crate::domain::dataset::Dataset;
use crate::domain::error::DashboardError;
use crate::domain::schema::DatasetSchema;

/// A source the whole observation table can be (re)loaded from.
pub trait DataPort {
    fn load_dataset(&self, schema: &DatasetSchema) -> Result<Dataset, DashboardError>;

    /// Human-readable location, used in log lines.
    fn describe(&self) -> String;
}
