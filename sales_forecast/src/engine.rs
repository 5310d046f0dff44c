//! Horizon forecasting over a feature table
//!
//! The engine normalizes the batch, runs model `h` for horizon day `h` over
//! every row and converts the log-space predictions back to unit sales.

use crate::error::{ForecastError, Result};
use crate::features::{FeatureTable, Normalization};
use crate::models::{ModelSet, ModelStore, TrainedRegressionModel};
use crate::reshape::RowKey;
use crate::HORIZON;
use chrono::{Duration, NaiveDate};
use std::collections::HashMap;
use sales_math::from_log_sales;
use tracing::{debug, info};

/// Unit-sales forecast for every row over the 16 horizon days
#[derive(Debug, Clone, PartialEq)]
pub struct HorizonForecast {
    rows: Vec<RowKey>,
    index: HashMap<RowKey, usize>,
    dates: [NaiveDate; HORIZON],
    /// Row-major, `HORIZON` values per row
    values: Vec<f64>,
}

impl HorizonForecast {
    /// Build from one prediction vector per horizon day
    pub fn new(rows: Vec<RowKey>, anchor: NaiveDate, per_horizon: Vec<Vec<f64>>) -> Result<Self> {
        if per_horizon.len() != HORIZON {
            return Err(ForecastError::ValidationError(format!(
                "Expected {} horizon predictions, got {}",
                HORIZON,
                per_horizon.len()
            )));
        }
        if let Some(h) = per_horizon.iter().position(|p| p.len() != rows.len()) {
            return Err(ForecastError::ValidationError(format!(
                "Horizon {} has {} predictions for {} rows",
                h,
                per_horizon[h].len(),
                rows.len()
            )));
        }

        let mut values = vec![0.0; rows.len() * HORIZON];
        for (h, predictions) in per_horizon.iter().enumerate() {
            for (row, value) in predictions.iter().enumerate() {
                values[row * HORIZON + h] = *value;
            }
        }

        let index = rows.iter().enumerate().map(|(i, key)| (*key, i)).collect();

        Ok(Self {
            rows,
            index,
            dates: horizon_dates(anchor),
            values,
        })
    }

    pub fn rows(&self) -> &[RowKey] {
        &self.rows
    }

    /// Calendar day of every horizon offset
    pub fn dates(&self) -> &[NaiveDate; HORIZON] {
        &self.dates
    }

    pub fn anchor(&self) -> NaiveDate {
        self.dates[0]
    }

    /// Position of a row key
    pub fn row_index(&self, key: &RowKey) -> Option<usize> {
        self.index.get(key).copied()
    }

    /// The 16 forecasts of one row
    pub fn row_values(&self, row: usize) -> &[f64] {
        &self.values[row * HORIZON..(row + 1) * HORIZON]
    }

    /// Forecast for one row on one calendar day
    pub fn value(&self, key: &RowKey, date: NaiveDate) -> Option<f64> {
        let row = self.row_index(key)?;
        let h = (date - self.dates[0]).num_days();
        if (0..HORIZON as i64).contains(&h) {
            Some(self.values[row * HORIZON + h as usize])
        } else {
            None
        }
    }

    /// Long format: one `(row, date, unit_sales)` triple per row and day
    pub fn to_long(&self) -> Vec<(RowKey, NaiveDate, f64)> {
        self.rows
            .iter()
            .enumerate()
            .flat_map(|(row, key)| {
                self.dates
                    .iter()
                    .zip(self.row_values(row))
                    .map(move |(date, value)| (*key, *date, *value))
            })
            .collect()
    }
}

/// The horizon days starting at `anchor`
pub fn horizon_dates(anchor: NaiveDate) -> [NaiveDate; HORIZON] {
    std::array::from_fn(|h| anchor + Duration::days(h as i64))
}

/// Runs the horizon models over feature tables
#[derive(Debug, Clone)]
pub struct ForecastEngine {
    models: ModelSet,
    normalization: Normalization,
}

impl ForecastEngine {
    pub fn new(models: ModelSet, normalization: Normalization) -> Self {
        Self {
            models,
            normalization,
        }
    }

    /// Load every horizon artifact before anything is scored
    pub fn from_store(store: &ModelStore, normalization: Normalization) -> Result<Self> {
        Ok(Self::new(store.load_all()?, normalization))
    }

    pub fn normalization(&self) -> Normalization {
        self.normalization
    }

    /// Merge sales and promo features, then forecast
    pub fn forecast(
        &self,
        sales: FeatureTable,
        promo: FeatureTable,
        anchor: NaiveDate,
    ) -> Result<HorizonForecast> {
        self.forecast_table(sales.merge(promo)?, anchor)
    }

    /// Forecast from an already merged feature table
    pub fn forecast_table(&self, mut features: FeatureTable, anchor: NaiveDate) -> Result<HorizonForecast> {
        let rescaled = features.normalize(self.normalization);
        info!(
            "Forecasting {} rows with {} features ({} rescaled)",
            features.n_rows(),
            features.n_features(),
            rescaled
        );

        let mut per_horizon = Vec::with_capacity(HORIZON);
        for (h, model) in self.models.models().iter().enumerate() {
            debug!("Predicting horizon day {} with {}", h, model.name());
            let predictions = model.predict(&features)?;
            per_horizon.push(predictions.into_iter().map(from_log_sales).collect());
        }

        HorizonForecast::new(features.rows().to_vec(), anchor, per_horizon)
    }
}
