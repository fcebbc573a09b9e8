// Error types for the aggregation and chart pipeline

use thiserror::Error;

pub type Result<T> = std::result::Result<T, ChartError>;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ChartError {
    /// A required logical column matched neither of its accepted names
    #[error("Missing required {logical} column: expected '{primary}' or '{alias}'")]
    Schema {
        logical: String,
        primary: String,
        alias: String,
    },

    /// No record survived filtering and year-range selection
    #[error("No data in range {start}-{end}")]
    EmptyRange { start: i32, end: i32 },

    #[error("Failed to parse '{value}' as number in column '{column}' at row {row}")]
    ValueParse {
        row: usize,
        column: String,
        value: String,
    },

    #[error("Column '{0}' not found")]
    ColumnNotFound(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Failed to read input: {0}")]
    Input(String),

    #[error("Render failed: {0}")]
    Render(String),
}

impl From<csv::Error> for ChartError {
    fn from(e: csv::Error) -> Self {
        ChartError::Input(e.to_string())
    }
}

impl From<serde_json::Error> for ChartError {
    fn from(e: serde_json::Error) -> Self {
        ChartError::Input(e.to_string())
    }
}
