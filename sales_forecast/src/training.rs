//! Fitting the horizon models on historical anchors
//!
//! Each training anchor reuses the forecasting features, computed from the
//! history-only matrices, and pairs them with the log sales realized on the
//! 16 days that follow. Tables from every anchor are stacked and normalized
//! together before one model per horizon day is fitted.

use crate::data::ItemCatalog;
use crate::encoding::CategoricalGroupings;
use crate::error::{ForecastError, Result};
use crate::features::{FeatureExtractor, FeatureTable, Normalization};
use crate::metrics::{evaluate_forecast, weighted_rmse, PERISHABLE_WEIGHT};
use crate::models::{ModelKind, ModelSet, TrainedRegressionModel};
use crate::reshape::ReshapedData;
use crate::HORIZON;
use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Anchors stepping back one week at a time from `anchor`.
///
/// Without an explicit anchor the latest one with 16 realized days is used.
/// Every anchor must leave 16 realized days before `last_date`.
pub fn training_anchors(
    last_date: NaiveDate,
    anchor: Option<NaiveDate>,
    weeks: usize,
) -> Result<Vec<NaiveDate>> {
    if weeks == 0 {
        return Err(ForecastError::InvalidParameter(
            "Training needs at least one anchor week".to_string(),
        ));
    }

    let latest = last_date - Duration::days(HORIZON as i64 - 1);
    let first = anchor.unwrap_or(latest);
    if first > latest {
        return Err(ForecastError::InvalidParameter(format!(
            "Training anchor {} has fewer than {} realized days before {}",
            first, HORIZON, last_date
        )));
    }

    Ok((0..weeks)
        .map(|week| first - Duration::days(7 * week as i64))
        .collect())
}

/// Stacked features and per-horizon targets
#[derive(Debug, Clone)]
pub struct TrainingSet {
    pub features: FeatureTable,
    /// `targets[h][i]` is the log sales of row `i` on its anchor + `h`
    pub targets: Vec<Vec<f64>>,
    /// Per-row weight of the evaluation metric
    pub weights: Vec<f64>,
}

impl TrainingSet {
    /// Extract, stack and normalize features for every anchor
    pub fn build(
        data: &ReshapedData,
        groupings: &CategoricalGroupings,
        extractor: &FeatureExtractor,
        items: &ItemCatalog,
        anchors: &[NaiveDate],
        normalization: Normalization,
    ) -> Result<Self> {
        let mut tables = Vec::with_capacity(anchors.len());
        let mut targets = vec![Vec::new(); HORIZON];

        for &anchor in anchors {
            let table = extractor.extract(data, groupings, anchor)?;
            for (h, target) in targets.iter_mut().enumerate() {
                let date = anchor + Duration::days(h as i64);
                target.extend(table.rows().iter().map(|key| data.sales.get(key, date)));
            }
            tables.push(table);
        }

        let mut features = FeatureTable::stack(tables)?;
        features.normalize(normalization);

        let weights = features
            .rows()
            .iter()
            .map(|key| match items.get(key.item) {
                Some(item) if item.perishable => PERISHABLE_WEIGHT,
                _ => 1.0,
            })
            .collect();

        info!(
            "Training set has {} rows from {} anchors",
            features.n_rows(),
            anchors.len()
        );
        Ok(Self {
            features,
            targets,
            weights,
        })
    }
}

/// In-sample fit of one horizon model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HorizonFit {
    pub horizon: usize,
    pub model: String,
    /// Mean absolute error in log space
    pub mae: f64,
    /// Median absolute error in log space
    pub median_ae: f64,
    /// RMSE in log space
    pub rmse: f64,
    /// Perishable-weighted RMSE in log space
    pub weighted_rmse: f64,
}

/// Per-horizon training metrics
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FitReport {
    pub anchors: Vec<NaiveDate>,
    pub rows: usize,
    pub horizons: Vec<HorizonFit>,
}

/// Fits one model per horizon day with the configured technique
#[derive(Debug, Clone)]
pub struct Trainer {
    kind: ModelKind,
}

impl Trainer {
    pub fn new(kind: ModelKind) -> Self {
        Self { kind }
    }

    /// Fit all horizon models and report their in-sample error
    pub fn fit(&self, set: &TrainingSet, anchors: &[NaiveDate]) -> Result<(ModelSet, FitReport)> {
        if set.features.n_rows() == 0 {
            return Err(ForecastError::DataError(
                "Training set has no rows".to_string(),
            ));
        }

        let mut models = Vec::with_capacity(HORIZON);
        let mut horizons = Vec::with_capacity(HORIZON);
        for (h, targets) in set.targets.iter().enumerate() {
            let model = self.kind.train(&set.features, targets)?;
            let fitted = model.predict(&set.features)?;
            let accuracy = evaluate_forecast(&fitted, targets)?;
            let fit = HorizonFit {
                horizon: h,
                model: model.name().to_string(),
                mae: accuracy.mae,
                median_ae: accuracy.median_ae,
                rmse: accuracy.rmse,
                weighted_rmse: weighted_rmse(&fitted, targets, &set.weights)?,
            };
            debug!("Horizon {} fitted with RMSE {:.4}", h, fit.rmse);
            horizons.push(fit);
            models.push(model);
        }

        let report = FitReport {
            anchors: anchors.to_vec(),
            rows: set.features.n_rows(),
            horizons,
        };
        Ok((ModelSet::new(models)?, report))
    }
}
