//! Moving-average baseline
//!
//! Predicts a window mean that the feature extractor already computed, for
//! example `item_store_mean_30`. Since sales features are log sales, the
//! prediction is the mean of log sales over the window.

use crate::error::{ForecastError, Result};
use crate::features::FeatureTable;
use crate::models::{RegressionModel, TrainedRegressionModel};
use serde::{Deserialize, Serialize};

/// Baseline that echoes one feature column
#[derive(Debug, Clone)]
pub struct MovingAverage {
    /// Name of the model
    name: String,
    /// Feature column to echo
    feature: String,
}

/// Trained moving-average baseline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainedMovingAverage {
    feature: String,
}

impl MovingAverage {
    /// Create a baseline over the named feature
    pub fn new(feature: impl Into<String>) -> Result<Self> {
        let feature = feature.into();
        if feature.is_empty() {
            return Err(ForecastError::InvalidParameter(
                "Moving average needs a feature name".to_string(),
            ));
        }

        Ok(Self {
            name: format!("Moving Average ({})", feature),
            feature,
        })
    }
}

impl RegressionModel for MovingAverage {
    type Trained = TrainedMovingAverage;

    fn train(&self, features: &FeatureTable, _targets: &[f64]) -> Result<Self::Trained> {
        features.require(&self.feature)?;

        Ok(TrainedMovingAverage {
            feature: self.feature.clone(),
        })
    }

    fn name(&self) -> &str {
        &self.name
    }
}

impl TrainedMovingAverage {
    /// Build the trained form directly
    pub fn new(feature: impl Into<String>) -> Self {
        Self {
            feature: feature.into(),
        }
    }

    pub fn feature(&self) -> &str {
        &self.feature
    }
}

impl TrainedRegressionModel for TrainedMovingAverage {
    fn predict(&self, features: &FeatureTable) -> Result<Vec<f64>> {
        Ok(features.require(&self.feature)?.to_vec())
    }

    fn name(&self) -> &str {
        "Moving Average"
    }
}
