//! Train, predict and cached-read triggers.
//!
//! Each trigger is a single synchronous run against the paths in [`Config`].
//! Callers serialize them; nothing here locks.

use crate::config::Config;
use crate::error::Result;
use chrono::NaiveDate;
use sales_forecast::aggregate::Summaries;
use sales_forecast::data::{DataLoader, TransactionLog};
use sales_forecast::features::FeaturePlan;
use sales_forecast::models::ModelStore;
use sales_forecast::output::OutputStore;
use sales_forecast::pipeline::ForecastPipeline;
use sales_forecast::training::FitReport;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::info;

/// Outcome of a training run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainReport {
    #[serde(flatten)]
    pub fit: FitReport,
    /// Written artifacts, one per horizon day
    pub artifacts: Vec<PathBuf>,
}

fn pipeline(config: &Config) -> Result<ForecastPipeline> {
    let plan = FeaturePlan::from_config(&config.features)?;
    info!("Feature plan holds {} definitions", plan.len());
    Ok(ForecastPipeline::new(plan, config.forecast.normalization))
}

fn load_history(config: &Config) -> Result<TransactionLog> {
    let history = DataLoader::transactions_from_csv(&config.data.history)?;
    Ok(match config.data.history_start {
        Some(start) => history.since(start),
        None => history,
    })
}

/// Fit and persist the 16 per-horizon models.
pub fn train(config: &Config) -> Result<TrainReport> {
    config.validate()?;
    let pipeline = pipeline(config)?;
    let history = load_history(config)?;
    let items = DataLoader::items_from_csv(&config.data.items)?;
    let stores = DataLoader::stores_from_csv(&config.data.stores)?;
    info!("Loaded {} history records", history.len());

    let (models, fit) = pipeline.train(
        &history,
        &items,
        &stores,
        &config.model.to_kind(),
        config.training.anchor,
        config.training.weeks,
    )?;

    let artifacts = ModelStore::new(&config.model.dir).save_all(&models)?;
    info!(
        "Saved {} models to {}",
        artifacts.len(),
        config.model.dir.display()
    );

    Ok(TrainReport { fit, artifacts })
}

/// Forecast the scheduled rows, persist results and return the summaries.
///
/// `anchor` and `top_n` override the configured values. Models load before
/// any input is read, so a missing artifact leaves no partial output.
pub fn predict(config: &Config, anchor: Option<NaiveDate>, top_n: Option<usize>) -> Result<Summaries> {
    config.validate()?;
    let models = ModelStore::new(&config.model.dir).load_all()?;
    let pipeline = pipeline(config)?;

    let history = load_history(config)?;
    let schedule = DataLoader::schedule_from_csv(&config.data.schedule)?;
    let items = DataLoader::items_from_csv(&config.data.items)?;
    let stores = DataLoader::stores_from_csv(&config.data.stores)?;

    let prediction = pipeline.predict(
        &history,
        &schedule,
        &items,
        &stores,
        &models,
        anchor.or(config.forecast.anchor),
    )?;

    let top_n = top_n.unwrap_or(config.forecast.top_n);
    let summaries = Summaries::build(&prediction.rows, &items, &stores, top_n);

    let output = OutputStore::new(&config.output.dir);
    let path = output.write_forecast(&prediction.rows)?;
    output.write_summaries(&summaries)?;
    info!(
        "Wrote {} forecast rows to {}",
        prediction.rows.len(),
        path.display()
    );

    Ok(summaries)
}

/// Summaries persisted by the most recent prediction.
pub fn quick_predict(config: &Config) -> Result<Summaries> {
    Ok(OutputStore::new(&config.output.dir).read_summaries()?)
}
