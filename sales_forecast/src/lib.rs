//! # Sales Forecast
//!
//! Per-store, per-item unit sales forecasting over a 16-day horizon.
//!
//! ## Pipeline
//!
//! - Transaction logs and catalogs are loaded with schema checks ([`data`])
//! - The long log is pivoted into wide sales and promo matrices ([`reshape`])
//! - Rows get group ids along every categorical axis ([`encoding`])
//! - Window statistics and promo counts are computed at an anchor date ([`features`])
//! - One regression model per horizon day scores the batch ([`engine`], [`models`])
//! - Forecasts are joined onto the schedule and summarised ([`aggregate`])
//!
//! Training runs the same feature path at historical anchors ([`training`]).
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use sales_forecast::data::DataLoader;
//! use sales_forecast::features::{FeatureConfig, FeaturePlan, Normalization};
//! use sales_forecast::models::ModelStore;
//! use sales_forecast::pipeline::ForecastPipeline;
//!
//! # fn main() -> sales_forecast::error::Result<()> {
//! let history = DataLoader::transactions_from_csv("data/train.csv")?;
//! let schedule = DataLoader::schedule_from_csv("data/test.csv")?;
//! let items = DataLoader::items_from_csv("data/items.csv")?;
//! let stores = DataLoader::stores_from_csv("data/stores.csv")?;
//!
//! let plan = FeaturePlan::from_config(&FeatureConfig::default())?;
//! let pipeline = ForecastPipeline::new(plan, Normalization::BatchMinMax);
//! let models = ModelStore::new("models").load_all()?;
//!
//! let prediction = pipeline.predict(&history, &schedule, &items, &stores, &models, None)?;
//! println!("{} rows forecast", prediction.rows.len());
//! # Ok(())
//! # }
//! ```

pub mod aggregate;
pub mod data;
pub mod encoding;
pub mod engine;
pub mod error;
pub mod features;
pub mod metrics;
pub mod models;
pub mod output;
pub mod pipeline;
pub mod reshape;
pub mod training;
pub mod utils;

// Re-export commonly used types
pub use crate::aggregate::{Domain, ForecastRow, Summaries, SummaryEntry};
pub use crate::data::{DataLoader, ItemCatalog, PromoSchedule, StoreCatalog, TransactionLog};
pub use crate::engine::{ForecastEngine, HorizonForecast};
pub use crate::error::ForecastError;
pub use crate::features::{FeatureConfig, FeaturePlan, FeatureTable, Granularity, Normalization};
pub use crate::models::{ModelKind, ModelSet, ModelStore, RegressionModel, TrainedRegressionModel};
pub use crate::reshape::{DateMatrix, ReshapedData, RowKey};

/// Number of days forecast from each anchor
pub const HORIZON: usize = 16;

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");
