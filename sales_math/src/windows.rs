//! Window statistics over daily series
//!
//! Every statistic operates on a slice that has already been cut to the
//! requested window. A window that reaches past the start of the series is
//! clipped to the available days, so a 140-day window over 30 days of history
//! yields exactly the 30-day value. Empty windows produce neutral values
//! (zero, or the covered length for the age statistics) rather than errors.

use crate::{MathError, Result};

/// Slice covering the `window` days that end just before index `end`.
///
/// `end` may exceed the series length; missing trailing days are ignored.
pub fn trailing(values: &[f64], end: usize, window: usize) -> &[f64] {
    let end = end.min(values.len());
    let start = end.saturating_sub(window);
    &values[start..end]
}

/// Slice covering `span` days starting at index `start`, clipped to the series.
pub fn leading(values: &[f64], start: usize, span: usize) -> &[f64] {
    let start = start.min(values.len());
    let end = start.saturating_add(span).min(values.len());
    &values[start..end]
}

/// Arithmetic mean, zero for an empty window
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Sum of the window
pub fn sum(values: &[f64]) -> f64 {
    values.iter().sum()
}

/// Exponentially decayed weighted mean.
///
/// The most recent value (last element) has weight 1, the one before it
/// `decay`, then `decay^2` and so on. Weights are normalized by their sum.
pub fn decayed_mean(values: &[f64], decay: f64) -> Result<f64> {
    if !(decay > 0.0 && decay <= 1.0) {
        return Err(MathError::InvalidInput(format!(
            "Decay must be in (0, 1], got {}",
            decay
        )));
    }

    let mut weight = 1.0;
    let mut weighted_sum = 0.0;
    let mut weight_total = 0.0;
    for &value in values.iter().rev() {
        weighted_sum += value * weight;
        weight_total += weight;
        weight *= decay;
    }

    if weight_total == 0.0 {
        return Ok(0.0);
    }
    Ok(weighted_sum / weight_total)
}

/// Median of the window, zero when empty
pub fn median(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }

    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));

    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    } else {
        sorted[mid]
    }
}

/// Minimum of the window, zero when empty
pub fn min(values: &[f64]) -> f64 {
    values.iter().copied().reduce(f64::min).unwrap_or(0.0)
}

/// Maximum of the window, zero when empty
pub fn max(values: &[f64]) -> f64 {
    values.iter().copied().reduce(f64::max).unwrap_or(0.0)
}

/// Population standard deviation, zero when empty
pub fn std_dev(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }

    let avg = mean(values);
    let variance = values.iter().map(|v| (v - avg).powi(2)).sum::<f64>() / values.len() as f64;
    variance.sqrt()
}

/// Number of days with a strictly positive value
pub fn count_positive(values: &[f64]) -> f64 {
    values.iter().filter(|&&v| v > 0.0).count() as f64
}

/// Days between the end of the window and the most recent positive value.
///
/// The day just before the window end counts as age 1. Returns `window`
/// when the window holds no positive value.
pub fn days_since_last_positive(values: &[f64], window: usize) -> f64 {
    values
        .iter()
        .rev()
        .position(|&v| v > 0.0)
        .map(|age| (age + 1) as f64)
        .unwrap_or(window as f64)
}

/// Days between the end of the window and the earliest positive value in it.
///
/// Returns `window` when the window holds no positive value.
pub fn days_since_first_positive(values: &[f64], window: usize) -> f64 {
    values
        .iter()
        .position(|&v| v > 0.0)
        .map(|idx| (values.len() - idx) as f64)
        .unwrap_or(window as f64)
}

/// Mean over the `weeks` days sharing a weekday with day `end + offset`
/// that fall strictly before `end`.
///
/// Days before the start of the series are skipped, and an empty selection
/// yields zero.
pub fn same_weekday_mean(values: &[f64], end: usize, offset: usize, weeks: usize) -> f64 {
    let end = end.min(values.len());
    let target = end + offset;
    let mut total = 0.0;
    let mut count = 0usize;

    // First same-weekday day strictly before `end`
    let mut back = (offset / 7 + 1) * 7;
    for _ in 0..weeks {
        if back > target {
            break;
        }
        total += values[target - back];
        count += 1;
        back += 7;
    }

    if count == 0 {
        0.0
    } else {
        total / count as f64
    }
}
