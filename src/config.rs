//! Configuration file support.
//!
//! Every section of `shelfcast.toml` falls back to its defaults, so an empty
//! file is a valid configuration.
//!
//! # Example
//!
//! ```toml
//! [data]
//! history = "data/train.csv"
//! schedule = "data/test.csv"
//! history_start = "2017-01-01"
//!
//! [forecast]
//! top_n = 10
//! normalization = "batch_min_max"
//!
//! [model]
//! kind = "ridge"
//! lambda = 1.0
//! dir = "models"
//!
//! [training]
//! weeks = 6
//! ```

use crate::error::{Result, ServiceError};
use chrono::NaiveDate;
use sales_forecast::features::{FeatureConfig, Normalization};
use sales_forecast::models::ModelKind;
use sales_forecast::HORIZON;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

/// Default configuration file name
pub const DEFAULT_CONFIG_FILE: &str = "shelfcast.toml";

/// Complete service configuration
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub data: DataConfig,
    pub forecast: ForecastConfig,
    pub features: FeatureConfig,
    pub model: ModelConfig,
    pub training: TrainingConfig,
    pub output: OutputConfig,
}

/// Input table locations
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DataConfig {
    /// Sales history CSV
    pub history: PathBuf,
    /// Future promo schedule CSV, also the output skeleton
    pub schedule: PathBuf,
    pub items: PathBuf,
    pub stores: PathBuf,
    /// Drop history records before this date
    #[serde(skip_serializing_if = "Option::is_none")]
    pub history_start: Option<NaiveDate>,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            history: PathBuf::from("data/train.csv"),
            schedule: PathBuf::from("data/test.csv"),
            items: PathBuf::from("data/items.csv"),
            stores: PathBuf::from("data/stores.csv"),
            history_start: None,
        }
    }
}

/// Prediction settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ForecastConfig {
    /// First forecast day; derived from the schedule when unset
    #[serde(skip_serializing_if = "Option::is_none")]
    pub anchor: Option<NaiveDate>,
    #[serde(default = "default_horizon")]
    pub horizon: usize,
    #[serde(default = "default_top_n")]
    pub top_n: usize,
    pub normalization: Normalization,
}

fn default_horizon() -> usize {
    HORIZON
}

fn default_top_n() -> usize {
    sales_forecast::aggregate::DEFAULT_TOP_N
}

impl Default for ForecastConfig {
    fn default() -> Self {
        Self {
            anchor: None,
            horizon: default_horizon(),
            top_n: default_top_n(),
            normalization: Normalization::default(),
        }
    }
}

/// Which regression technique backs the per-horizon models
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelChoice {
    #[default]
    Ridge,
    MovingAverage,
}

/// Model technique and artifact location
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    pub kind: ModelChoice,
    /// Ridge penalty
    #[serde(default = "default_lambda")]
    pub lambda: f64,
    /// Feature echoed by the moving-average model
    #[serde(default = "default_feature")]
    pub feature: String,
    /// Directory holding `model_{h}.json`
    #[serde(default = "default_model_dir")]
    pub dir: PathBuf,
}

fn default_lambda() -> f64 {
    1.0
}

fn default_feature() -> String {
    "item_store_mean_30".to_string()
}

fn default_model_dir() -> PathBuf {
    PathBuf::from("models")
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            kind: ModelChoice::default(),
            lambda: default_lambda(),
            feature: default_feature(),
            dir: default_model_dir(),
        }
    }
}

impl ModelConfig {
    /// Trainer selected by this section
    pub fn to_kind(&self) -> ModelKind {
        match self.kind {
            ModelChoice::Ridge => ModelKind::Ridge {
                lambda: self.lambda,
            },
            ModelChoice::MovingAverage => ModelKind::MovingAverage {
                feature: self.feature.clone(),
            },
        }
    }
}

/// Training window settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainingConfig {
    /// Latest training anchor; defaults to 15 days before the last history date
    #[serde(skip_serializing_if = "Option::is_none")]
    pub anchor: Option<NaiveDate>,
    /// Number of weekly anchors
    #[serde(default = "default_weeks")]
    pub weeks: usize,
}

fn default_weeks() -> usize {
    6
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            anchor: None,
            weeks: default_weeks(),
        }
    }
}

/// Where prediction results land
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    #[serde(default = "default_output_dir")]
    pub dir: PathBuf,
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("output")
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: default_output_dir(),
        }
    }
}

impl Config {
    /// Load and validate configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        info!("Loading configuration from: {}", path.display());

        let content = fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Parse and validate configuration from TOML text.
    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to a TOML file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        fs::write(path, self.to_toml()?)?;
        Ok(())
    }

    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| ServiceError::ConfigError(e.to_string()))
    }

    /// Reject settings the pipeline cannot honor.
    pub fn validate(&self) -> Result<()> {
        if self.forecast.horizon != HORIZON {
            return Err(ServiceError::ConfigError(format!(
                "forecast.horizon must be {}, got {}",
                HORIZON, self.forecast.horizon
            )));
        }
        if self.forecast.top_n == 0 {
            return Err(ServiceError::ConfigError(
                "forecast.top_n must be positive".to_string(),
            ));
        }
        if self.training.weeks == 0 {
            return Err(ServiceError::ConfigError(
                "training.weeks must be positive".to_string(),
            ));
        }
        if self.model.kind == ModelChoice::Ridge
            && !(self.model.lambda.is_finite() && self.model.lambda > 0.0)
        {
            return Err(ServiceError::ConfigError(format!(
                "model.lambda must be positive, got {}",
                self.model.lambda
            )));
        }
        if self.model.kind == ModelChoice::MovingAverage && self.model.feature.is_empty() {
            return Err(ServiceError::ConfigError(
                "model.feature must name a feature column".to_string(),
            ));
        }
        Ok(())
    }
}
