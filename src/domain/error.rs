//! Domain error types.

/// Top-level error type for brokerdash.
#[derive(Debug, thiserror::Error)]
pub enum DashboardError {
    #[error("failed to read data source {path}: {reason}")]
    SourceUnreadable { path: String, reason: String },

    #[error("CSV parse error: {reason}")]
    CsvParse { reason: String },

    #[error("required column '{column}' is missing from {path}")]
    MissingColumn { path: String, column: String },

    #[error("invalid row at line {line}: {reason}")]
    InvalidRow { line: u64, reason: String },

    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("missing config key [{section}] {key}")]
    ConfigMissing { section: String, key: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error("invalid selection {field}: {reason}")]
    InvalidSelection { field: String, reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl DashboardError {
    pub fn invalid_selection(field: &str, reason: impl Into<String>) -> Self {
        Self::InvalidSelection {
            field: field.to_string(),
            reason: reason.into(),
        }
    }
}

impl From<csv::Error> for DashboardError {
    fn from(err: csv::Error) -> Self {
        Self::CsvParse {
            reason: err.to_string(),
        }
    }
}

impl From<&DashboardError> for std::process::ExitCode {
    fn from(err: &DashboardError) -> Self {
        let code: u8 = match err {
            DashboardError::Io(_) => 1,
            DashboardError::ConfigParse { .. }
            | DashboardError::ConfigMissing { .. }
            | DashboardError::ConfigInvalid { .. } => 2,
            DashboardError::SourceUnreadable { .. }
            | DashboardError::CsvParse { .. }
            | DashboardError::MissingColumn { .. }
            | DashboardError::InvalidRow { .. } => 3,
            DashboardError::InvalidSelection { .. } => 4,
        };
        std::process::ExitCode::from(code)
    }
}
