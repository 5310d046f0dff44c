//! Metrics for evaluating forecast performance

use crate::error::{ForecastError, Result};
use statrs::statistics::{Data, Median};

/// Weight given to perishable items in the weighted error
pub const PERISHABLE_WEIGHT: f64 = 1.25;

/// Forecast accuracy metrics
#[derive(Debug, Clone, PartialEq)]
pub struct ForecastAccuracy {
    /// Mean Absolute Error
    pub mae: f64,
    /// Median Absolute Error
    pub median_ae: f64,
    /// Mean Squared Error
    pub mse: f64,
    /// Root Mean Squared Error
    pub rmse: f64,
}

impl std::fmt::Display for ForecastAccuracy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Forecast Accuracy Metrics:")?;
        writeln!(f, "  MAE:   {:.4}", self.mae)?;
        writeln!(f, "  MedAE: {:.4}", self.median_ae)?;
        writeln!(f, "  MSE:   {:.4}", self.mse)?;
        writeln!(f, "  RMSE:  {:.4}", self.rmse)?;
        Ok(())
    }
}

fn check_lengths(forecast: &[f64], actual: &[f64]) -> Result<()> {
    if forecast.len() != actual.len() || forecast.is_empty() {
        return Err(ForecastError::ValidationError(
            "Forecast and actual values must have the same non-zero length".to_string(),
        ));
    }
    Ok(())
}

/// Evaluate forecast accuracy against actual values
pub fn evaluate_forecast(forecast: &[f64], actual: &[f64]) -> Result<ForecastAccuracy> {
    check_lengths(forecast, actual)?;

    let n = forecast.len() as f64;
    let errors: Vec<f64> = forecast
        .iter()
        .zip(actual.iter())
        .map(|(&f, &a)| a - f)
        .collect();

    let mae = errors.iter().map(|e| e.abs()).sum::<f64>() / n;
    let mse = errors.iter().map(|e| e.powi(2)).sum::<f64>() / n;
    let median_ae = Data::new(errors.iter().map(|e| e.abs()).collect::<Vec<f64>>()).median();

    Ok(ForecastAccuracy {
        mae,
        median_ae,
        mse,
        rmse: mse.sqrt(),
    })
}

/// Root mean squared error with per-observation weights.
///
/// Applied to log sales with [`PERISHABLE_WEIGHT`] on perishable items this
/// is the normalized weighted RMSLE used to score unit-sales forecasts.
pub fn weighted_rmse(forecast: &[f64], actual: &[f64], weights: &[f64]) -> Result<f64> {
    check_lengths(forecast, actual)?;
    if weights.len() != forecast.len() {
        return Err(ForecastError::ValidationError(format!(
            "Weights length ({}) doesn't match forecast length ({})",
            weights.len(),
            forecast.len()
        )));
    }

    let total_weight: f64 = weights.iter().sum();
    if total_weight <= 0.0 {
        return Err(ForecastError::ValidationError(
            "Weights must have a positive sum".to_string(),
        ));
    }

    let weighted: f64 = forecast
        .iter()
        .zip(actual.iter())
        .zip(weights.iter())
        .map(|((f, a), w)| w * (a - f).powi(2))
        .sum();

    Ok((weighted / total_weight).sqrt())
}
