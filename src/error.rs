//! Error types for the shelfcast service.

use sales_forecast::error::ForecastError;
use thiserror::Error;

/// Errors surfaced by the train, predict and cached-read triggers
#[derive(Error, Debug)]
pub enum ServiceError {
    #[error(transparent)]
    Forecast(#[from] ForecastError),

    #[error("Invalid configuration: {0}")]
    ConfigError(String),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("JSON serialization error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Result type for service operations
pub type Result<T> = std::result::Result<T, ServiceError>;

impl ServiceError {
    /// Cached results were asked for before any prediction ran
    pub fn is_not_found(&self) -> bool {
        matches!(self, ServiceError::Forecast(err) if err.is_not_found())
    }
}
