//! Value transforms applied around the models
//!
//! - Log transform of unit sales (`log1p` after clamping returns to zero)
//! - Inverse transform back to unit space (`expm1`)
//! - In-place min-max scaling of a feature column

/// Clamp negative sales (returns) to zero and move to log space
pub fn to_log_sales(unit_sales: f64) -> f64 {
    unit_sales.max(0.0).ln_1p()
}

/// Inverse of [`to_log_sales`] for non-negative inputs
pub fn from_log_sales(log_sales: f64) -> f64 {
    log_sales.exp_m1()
}

/// Rescale a column in place to `[0, 1]` using its own min and max.
///
/// A column whose range is zero or not finite has no well-defined rescaled
/// value and is left untouched. Returns whether the column was rewritten.
pub fn min_max_scale(column: &mut [f64]) -> bool {
    let (lo, hi) = column
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| {
            (lo.min(v), hi.max(v))
        });

    let range = hi - lo;
    if !range.is_finite() || range == 0.0 {
        return false;
    }

    for value in column.iter_mut() {
        *value = (*value - lo) / range;
    }
    true
}
