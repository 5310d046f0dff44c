//! End-to-end prediction and training runs
//!
//! Raw log, reshape, encode, features, forecast, skeleton join. Training
//! follows the same path up to the features and then fits the horizon models.

use crate::aggregate::{merge, ForecastRow};
use crate::data::{ItemCatalog, PromoSchedule, StoreCatalog, TransactionLog};
use crate::encoding::{encode, CategoricalGroupings};
use crate::engine::{ForecastEngine, HorizonForecast};
use crate::error::{ForecastError, Result};
use crate::features::{FeatureExtractor, FeaturePlan, Normalization};
use crate::models::{ModelKind, ModelSet};
use crate::reshape::{reshape, ReshapedData};
use crate::training::{training_anchors, FitReport, Trainer, TrainingSet};
use chrono::{Duration, NaiveDate};
use tracing::info;

/// Reshaped matrices together with their categorical groups
#[derive(Debug, Clone)]
pub struct PreparedData {
    pub data: ReshapedData,
    pub groupings: CategoricalGroupings,
}

impl PreparedData {
    /// Reshape the log and encode its rows
    pub fn new(
        history: &TransactionLog,
        schedule: &PromoSchedule,
        items: &ItemCatalog,
        stores: &StoreCatalog,
    ) -> Result<Self> {
        let data = reshape(history, schedule)?;
        let groupings = encode(data.rows(), items, stores);
        Ok(Self { data, groupings })
    }
}

/// Result of a prediction run
#[derive(Debug, Clone)]
pub struct Prediction {
    pub anchor: NaiveDate,
    pub forecast: HorizonForecast,
    /// Skeleton rows with their clipped forecast
    pub rows: Vec<ForecastRow>,
}

/// Feature plan and normalization shared by training and prediction
#[derive(Debug, Clone)]
pub struct ForecastPipeline {
    extractor: FeatureExtractor,
    normalization: Normalization,
}

impl ForecastPipeline {
    pub fn new(plan: FeaturePlan, normalization: Normalization) -> Self {
        Self {
            extractor: FeatureExtractor::new(plan),
            normalization,
        }
    }

    pub fn extractor(&self) -> &FeatureExtractor {
        &self.extractor
    }

    pub fn normalization(&self) -> Normalization {
        self.normalization
    }

    /// Forecast the 16 days from `anchor` and join them onto the schedule.
    ///
    /// Without an explicit anchor the first scheduled date is used, falling
    /// back to the day after the last history date.
    pub fn predict(
        &self,
        history: &TransactionLog,
        schedule: &PromoSchedule,
        items: &ItemCatalog,
        stores: &StoreCatalog,
        models: &ModelSet,
        anchor: Option<NaiveDate>,
    ) -> Result<Prediction> {
        let anchor = anchor
            .or_else(|| schedule.date_range().map(|(start, _)| start))
            .or_else(|| history.date_range().map(|(_, end)| end + Duration::days(1)))
            .ok_or_else(|| {
                ForecastError::InvalidParameter(
                    "No anchor date given and no data to derive one from".to_string(),
                )
            })?;
        info!("Predicting 16 days from {}", anchor);

        let prepared = PreparedData::new(history, schedule, items, stores)?;
        let sales = self
            .extractor
            .sales(&prepared.data, &prepared.groupings, anchor)?;
        let promo = self
            .extractor
            .promo(&prepared.data, &prepared.groupings, anchor)?;

        let engine = ForecastEngine::new(models.clone(), self.normalization);
        let forecast = engine.forecast(sales, promo, anchor)?;
        let rows = merge(schedule, &forecast);

        Ok(Prediction {
            anchor,
            forecast,
            rows,
        })
    }

    /// Fit one model per horizon day on weekly anchors from the history alone
    pub fn train(
        &self,
        history: &TransactionLog,
        items: &ItemCatalog,
        stores: &StoreCatalog,
        kind: &ModelKind,
        anchor: Option<NaiveDate>,
        weeks: usize,
    ) -> Result<(ModelSet, FitReport)> {
        let (_, last_date) = history.date_range().ok_or_else(|| {
            ForecastError::DataError("Cannot train on an empty history".to_string())
        })?;
        let anchors = training_anchors(last_date, anchor, weeks)?;
        info!(
            "Training on {} anchors ending {}",
            anchors.len(),
            anchors[0]
        );

        let prepared = PreparedData::new(history, &PromoSchedule::empty(), items, stores)?;
        let set = TrainingSet::build(
            &prepared.data,
            &prepared.groupings,
            &self.extractor,
            items,
            &anchors,
            self.normalization,
        )?;

        Trainer::new(kind.clone()).fit(&set, &anchors)
    }
}
