//! Promotion counts before and after the anchor

use crate::encoding::GroupAxis;
use crate::features::Granularity;
use sales_math::windows;
use serde::{Deserialize, Serialize};

/// Range of days a promo feature covers, relative to the anchor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PromoSpan {
    /// The `w` days before the anchor
    Before(usize),
    /// The anchor and the `n - 1` days after it
    After(usize),
    /// The single day `anchor + i`
    Day(usize),
}

impl PromoSpan {
    /// Slice of a daily promo series covered by this span
    pub fn slice(self, series: &[f64], anchor_idx: usize) -> &[f64] {
        match self {
            PromoSpan::Before(w) => windows::trailing(series, anchor_idx, w),
            PromoSpan::After(n) => windows::leading(series, anchor_idx, n),
            PromoSpan::Day(i) => windows::leading(series, anchor_idx + i, 1),
        }
    }

    /// Number of days the span covers over a series of `len` days
    pub fn days_available(self, len: usize, anchor_idx: usize) -> usize {
        match self {
            PromoSpan::Before(w) => anchor_idx.min(len).min(w),
            PromoSpan::After(n) => len.saturating_sub(anchor_idx).min(n),
            PromoSpan::Day(i) => usize::from(anchor_idx + i < len),
        }
    }

    fn stem(self) -> String {
        match self {
            PromoSpan::Before(w) => format!("before_{}", w),
            PromoSpan::After(n) => format!("after_{}", n),
            PromoSpan::Day(i) => format!("day_{}", i),
        }
    }
}

/// How promo days inside a span are summarised
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PromoStatistic {
    /// Promo days of the row itself
    Sum,
    /// Promo days summed over every row of the axis group
    GroupCount,
    /// Group count divided by group rows times days in the span
    GroupMean,
}

/// One promo feature column
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PromoFeatureDef {
    pub name: String,
    pub granularity: Granularity,
    pub span: PromoSpan,
    pub statistic: PromoStatistic,
    /// Grouping axis, set for the group statistics only
    pub axis: Option<GroupAxis>,
}

impl PromoFeatureDef {
    /// Promo days of the row within `span`
    pub fn sum(granularity: Granularity, span: PromoSpan) -> Self {
        let stem = match span {
            PromoSpan::Day(i) => format!("promo_day_{}", i),
            other => format!("promo_sum_{}", other.stem()),
        };
        Self {
            name: prefixed(granularity, stem),
            granularity,
            span,
            statistic: PromoStatistic::Sum,
            axis: None,
        }
    }

    /// Promo days within `span` across the row's `axis` group
    pub fn group_count(granularity: Granularity, span: PromoSpan, axis: GroupAxis) -> Self {
        Self {
            name: prefixed(granularity, format!("promo_{}_count_{}", axis, span.stem())),
            granularity,
            span,
            statistic: PromoStatistic::GroupCount,
            axis: Some(axis),
        }
    }

    /// Share of promo days within `span` across the row's `axis` group
    pub fn group_mean(granularity: Granularity, span: PromoSpan, axis: GroupAxis) -> Self {
        Self {
            name: prefixed(granularity, format!("promo_{}_mean_{}", axis, span.stem())),
            granularity,
            span,
            statistic: PromoStatistic::GroupMean,
            axis: Some(axis),
        }
    }

    /// Promo days of one series within the span
    pub fn row_count(&self, series: &[f64], anchor_idx: usize) -> f64 {
        windows::sum(self.span.slice(series, anchor_idx))
    }

    /// Combine per-row span counts into this feature's column.
    ///
    /// `group_of` assigns each row its group along the feature's axis and is
    /// ignored for [`PromoStatistic::Sum`].
    pub fn evaluate(&self, row_counts: &[f64], group_of: &[usize], days_available: usize) -> Vec<f64> {
        if self.statistic == PromoStatistic::Sum {
            return row_counts.to_vec();
        }

        let n_groups = group_of.iter().map(|&g| g + 1).max().unwrap_or(0);
        let mut totals = vec![0.0; n_groups];
        let mut sizes = vec![0usize; n_groups];
        for (&group, &count) in group_of.iter().zip(row_counts.iter()) {
            totals[group] += count;
            sizes[group] += 1;
        }

        group_of
            .iter()
            .map(|&group| match self.statistic {
                PromoStatistic::GroupMean => {
                    let denominator = (sizes[group] * days_available) as f64;
                    if denominator > 0.0 {
                        totals[group] / denominator
                    } else {
                        0.0
                    }
                }
                _ => totals[group],
            })
            .collect()
    }
}

/// Item-store promo features keep their bare names; coarser granularities are
/// prefixed with their tag
fn prefixed(granularity: Granularity, stem: String) -> String {
    match granularity {
        Granularity::ItemStore => stem,
        other => format!("{}_{}", other.tag(), stem),
    }
}
