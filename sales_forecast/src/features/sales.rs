//! Window statistics over log sales

use crate::error::Result;
use crate::features::Granularity;
use sales_math::windows;
use serde::{Deserialize, Serialize};

/// Statistic computed over the days before the anchor
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum SalesStatistic {
    Mean,
    /// Weighted mean with weight `decay^age`, age 0 being the day before the anchor
    DecayMean { decay: f64 },
    Median,
    Min,
    Max,
    Std,
    /// Days with positive sales
    SaleDays,
    /// Days from the anchor back to the most recent sale
    LastSaleAge,
    /// Days from the anchor back to the earliest sale in the window
    FirstSaleAge,
    /// Mean over the preceding days sharing a weekday with `anchor + offset`;
    /// the window counts weeks
    WeekdayMean { offset: usize },
}

/// One sales feature column
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SalesFeatureDef {
    pub name: String,
    pub granularity: Granularity,
    pub window: usize,
    pub statistic: SalesStatistic,
}

impl SalesFeatureDef {
    pub fn new(granularity: Granularity, window: usize, statistic: SalesStatistic) -> Self {
        let stem = match statistic {
            SalesStatistic::Mean => format!("mean_{}", window),
            SalesStatistic::DecayMean { .. } => format!("decay_mean_{}", window),
            SalesStatistic::Median => format!("median_{}", window),
            SalesStatistic::Min => format!("min_{}", window),
            SalesStatistic::Max => format!("max_{}", window),
            SalesStatistic::Std => format!("std_{}", window),
            SalesStatistic::SaleDays => format!("sale_days_{}", window),
            SalesStatistic::LastSaleAge => format!("last_sale_age_{}", window),
            SalesStatistic::FirstSaleAge => format!("first_sale_age_{}", window),
            SalesStatistic::WeekdayMean { offset } => format!("dow{}_mean_{}w", offset, window),
        };

        Self {
            name: format!("{}_{}", granularity.tag(), stem),
            granularity,
            window,
            statistic,
        }
    }

    /// Evaluate over one daily series, looking only at days before `anchor_idx`
    pub fn evaluate(&self, series: &[f64], anchor_idx: usize) -> Result<f64> {
        let window = windows::trailing(series, anchor_idx, self.window);

        let value = match self.statistic {
            SalesStatistic::Mean => windows::mean(window),
            SalesStatistic::DecayMean { decay } => windows::decayed_mean(window, decay)?,
            SalesStatistic::Median => windows::median(window),
            SalesStatistic::Min => windows::min(window),
            SalesStatistic::Max => windows::max(window),
            SalesStatistic::Std => windows::std_dev(window),
            SalesStatistic::SaleDays => windows::count_positive(window),
            // No sale in the window falls back to the days actually covered
            SalesStatistic::LastSaleAge => windows::days_since_last_positive(window, window.len()),
            SalesStatistic::FirstSaleAge => {
                windows::days_since_first_positive(window, window.len())
            }
            SalesStatistic::WeekdayMean { offset } => {
                let history = &series[..anchor_idx.min(series.len())];
                windows::same_weekday_mean(history, anchor_idx, offset, self.window)
            }
        };
        Ok(value)
    }
}
