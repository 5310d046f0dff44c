//! Per-horizon regression models
//!
//! A [`RegressionModel`] is a trainer; training produces a
//! [`TrainedRegressionModel`] that maps a feature table to one log-sales
//! prediction per row. Models read their inputs by feature name, so column
//! order in the table does not matter.

use crate::error::Result;
use crate::features::FeatureTable;
use serde::{Deserialize, Serialize};
use std::fmt::Debug;

pub mod moving_average;
pub mod ridge;
pub mod store;

pub use moving_average::{MovingAverage, TrainedMovingAverage};
pub use ridge::{RidgeRegression, TrainedRidge};
pub use store::{ModelSet, ModelStore};

/// Trained model that scores feature tables
pub trait TrainedRegressionModel: Debug {
    /// One prediction per table row, in log space
    fn predict(&self, features: &FeatureTable) -> Result<Vec<f64>>;

    /// Name of the model
    fn name(&self) -> &str;
}

/// Regression model that can be trained on a feature table
pub trait RegressionModel: Debug + Clone {
    /// The type of trained model produced
    type Trained: TrainedRegressionModel;

    /// Train against one target per table row
    fn train(&self, features: &FeatureTable, targets: &[f64]) -> Result<Self::Trained>;

    /// Get the name of the model
    fn name(&self) -> &str;
}

fn default_lambda() -> f64 {
    1.0
}

fn default_feature() -> String {
    "item_store_mean_30".to_string()
}

/// Configured choice of training technique
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ModelKind {
    Ridge {
        #[serde(default = "default_lambda")]
        lambda: f64,
    },
    MovingAverage {
        #[serde(default = "default_feature")]
        feature: String,
    },
}

impl Default for ModelKind {
    fn default() -> Self {
        ModelKind::Ridge {
            lambda: default_lambda(),
        }
    }
}

impl ModelKind {
    /// Train the configured technique into a persistable model
    pub fn train(&self, features: &FeatureTable, targets: &[f64]) -> Result<TrainedModel> {
        Ok(match self {
            ModelKind::Ridge { lambda } => {
                TrainedModel::Ridge(RidgeRegression::new(*lambda)?.train(features, targets)?)
            }
            ModelKind::MovingAverage { feature } => TrainedModel::MovingAverage(
                MovingAverage::new(feature.clone())?.train(features, targets)?,
            ),
        })
    }
}

/// Any trained model, in the form written to a horizon artifact
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TrainedModel {
    Ridge(TrainedRidge),
    MovingAverage(TrainedMovingAverage),
}

impl TrainedRegressionModel for TrainedModel {
    fn predict(&self, features: &FeatureTable) -> Result<Vec<f64>> {
        match self {
            TrainedModel::Ridge(model) => model.predict(features),
            TrainedModel::MovingAverage(model) => model.predict(features),
        }
    }

    fn name(&self) -> &str {
        match self {
            TrainedModel::Ridge(model) => model.name(),
            TrainedModel::MovingAverage(model) => model.name(),
        }
    }
}

impl From<TrainedRidge> for TrainedModel {
    fn from(model: TrainedRidge) -> Self {
        TrainedModel::Ridge(model)
    }
}

impl From<TrainedMovingAverage> for TrainedModel {
    fn from(model: TrainedMovingAverage) -> Self {
        TrainedModel::MovingAverage(model)
    }
}
