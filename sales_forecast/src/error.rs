//! Error types for the sales_forecast crate

use polars::prelude::PolarsError;
use std::path::PathBuf;
use thiserror::Error;

/// Custom error types for the sales_forecast crate
#[derive(Debug, Error)]
pub enum ForecastError {
    /// A per-horizon model artifact is absent
    #[error("Missing model artifact for horizon day {horizon}: {}", .path.display())]
    MissingArtifact { horizon: usize, path: PathBuf },

    /// Required columns are absent from an input table
    #[error("Schema mismatch in {table}: missing columns {missing:?}")]
    SchemaMismatch { table: String, missing: Vec<String> },

    /// Cached results were requested before any prediction was persisted
    #[error("No cached results found at {}", .path.display())]
    StaleCache { path: PathBuf },

    /// Error related to data validation or processing
    #[error("Data error: {0}")]
    DataError(String),

    /// Error related to parameter validation
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// Error from invalid parameters
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// A model asked for a feature the table does not carry
    #[error("Feature mismatch: {0}")]
    FeatureMismatch(String),

    /// Two row-aligned containers disagree on their row keys
    #[error("Row mismatch: {0}")]
    RowMismatch(String),

    /// Error from IO operations
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// Error from Polars operations
    #[error("Polars error: {0}")]
    PolarsError(String),

    /// Error from CSV reading or writing
    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),

    /// Error from JSON (de)serialization of artifacts
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// Error parsing a date value
    #[error("Date parsing error: {0}")]
    DateParseError(#[from] chrono::ParseError),

    /// Error from the numeric kernels
    #[error("Math error: {0}")]
    MathError(#[from] sales_math::MathError),

    /// A temp file could not be moved over its destination
    #[error("Persist error: {0}")]
    PersistError(String),
}

/// Result type with our custom error
pub type Result<T> = std::result::Result<T, ForecastError>;

impl From<PolarsError> for ForecastError {
    fn from(err: PolarsError) -> Self {
        ForecastError::PolarsError(err.to_string())
    }
}

impl From<tempfile::PersistError> for ForecastError {
    fn from(err: tempfile::PersistError) -> Self {
        ForecastError::PersistError(err.to_string())
    }
}

impl ForecastError {
    /// Whether this error means "nothing to serve yet" rather than a failure
    pub fn is_not_found(&self) -> bool {
        matches!(self, ForecastError::StaleCache { .. })
    }
}
