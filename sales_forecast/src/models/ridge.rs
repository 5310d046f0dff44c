//! Ridge regression over every feature column

use crate::error::{ForecastError, Result};
use crate::features::FeatureTable;
use crate::models::{RegressionModel, TrainedRegressionModel};
use sales_math::{solve_ridge, RidgeFit};
use serde::{Deserialize, Serialize};

/// L2-penalized linear regression with an unpenalized intercept
#[derive(Debug, Clone)]
pub struct RidgeRegression {
    /// Name of the model
    name: String,
    /// Penalty strength
    lambda: f64,
}

/// Trained ridge regression
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainedRidge {
    /// Feature names the weights refer to, in weight order
    features: Vec<String>,
    fit: RidgeFit,
}

impl RidgeRegression {
    /// Create a new ridge regression
    pub fn new(lambda: f64) -> Result<Self> {
        if !(lambda > 0.0) || !lambda.is_finite() {
            return Err(ForecastError::InvalidParameter(format!(
                "Ridge lambda must be positive and finite, got {}",
                lambda
            )));
        }

        Ok(Self {
            name: format!("Ridge Regression (lambda={})", lambda),
            lambda,
        })
    }

    pub fn lambda(&self) -> f64 {
        self.lambda
    }
}

impl RegressionModel for RidgeRegression {
    type Trained = TrainedRidge;

    fn train(&self, features: &FeatureTable, targets: &[f64]) -> Result<Self::Trained> {
        if targets.len() != features.n_rows() {
            return Err(ForecastError::ValidationError(format!(
                "Targets length ({}) doesn't match feature rows ({})",
                targets.len(),
                features.n_rows()
            )));
        }

        let names = features.names().to_vec();
        let columns = features.select(&names)?;
        let fit = solve_ridge(&columns, targets, self.lambda)?;

        Ok(TrainedRidge {
            features: names,
            fit,
        })
    }

    fn name(&self) -> &str {
        &self.name
    }
}

impl TrainedRidge {
    /// Feature names used by the model
    pub fn features(&self) -> &[String] {
        &self.features
    }

    /// Fitted coefficients
    pub fn fit(&self) -> &RidgeFit {
        &self.fit
    }
}

impl TrainedRegressionModel for TrainedRidge {
    fn predict(&self, features: &FeatureTable) -> Result<Vec<f64>> {
        let columns = features.select(&self.features)?;
        let mut row = vec![0.0; columns.len()];

        let predictions = (0..features.n_rows())
            .map(|i| {
                for (value, column) in row.iter_mut().zip(columns.iter()) {
                    *value = column[i];
                }
                self.fit.predict_row(&row)
            })
            .collect();

        Ok(predictions)
    }

    fn name(&self) -> &str {
        "Ridge Regression"
    }
}
