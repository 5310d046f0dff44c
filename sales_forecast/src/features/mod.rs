//! Feature extraction at an anchor date
//!
//! Features are described by a [`FeaturePlan`], a flat list of sales and
//! promo definitions built from [`FeatureConfig`]. The extractor evaluates
//! every definition over the reshaped matrices and returns one
//! [`FeatureTable`] row per matrix row.
//!
//! Sales features only look at days strictly before the anchor. Promo
//! features may also look at the horizon, whose promotions are known in
//! advance.

use crate::encoding::{CategoricalGroupings, GroupAxis};
use crate::error::{ForecastError, Result};
use crate::reshape::{DateMatrix, ReshapedData, RowKey};
use crate::HORIZON;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use tracing::info;

pub mod promo;
pub mod sales;
pub mod table;

pub use promo::{PromoFeatureDef, PromoSpan, PromoStatistic};
pub use sales::{SalesFeatureDef, SalesStatistic};
pub use table::{FeatureTable, Normalization};

/// Aggregation key applied to a matrix before features are computed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Granularity {
    /// Every (store, item) row on its own
    ItemStore,
    /// All stores of an item
    Item,
    /// All items of a store
    Store,
    /// All items of one class within a store
    StoreClass,
}

impl Granularity {
    /// Prefix used in feature names
    pub fn tag(&self) -> &'static str {
        match self {
            Granularity::ItemStore => "item_store",
            Granularity::Item => "item",
            Granularity::Store => "store",
            Granularity::StoreClass => "store_class",
        }
    }

    fn key(&self, row: &RowKey, groupings: &CategoricalGroupings) -> Result<(u64, u64)> {
        Ok(match self {
            Granularity::ItemStore => (row.store as u64, row.item),
            Granularity::Item => (0, row.item),
            Granularity::Store => (row.store as u64, 0),
            Granularity::StoreClass => {
                let class = groupings.group(row, GroupAxis::Class).ok_or_else(|| {
                    ForecastError::RowMismatch(format!(
                        "Row (store {}, item {}) has no categorical groups",
                        row.store, row.item
                    ))
                })?;
                (row.store as u64, class as u64)
            }
        })
    }
}

/// Matrix rows averaged per granularity group
#[derive(Debug, Clone)]
pub struct GroupedSeries {
    series: Vec<Vec<f64>>,
    member_of: Vec<usize>,
}

impl GroupedSeries {
    /// Average the rows of `matrix` that share a granularity key
    pub fn build(
        matrix: &DateMatrix,
        groupings: &CategoricalGroupings,
        granularity: Granularity,
    ) -> Result<Self> {
        if granularity == Granularity::ItemStore {
            return Ok(Self {
                series: (0..matrix.n_rows())
                    .map(|i| matrix.row_at(i).to_vec())
                    .collect(),
                member_of: (0..matrix.n_rows()).collect(),
            });
        }

        let keys = matrix
            .rows()
            .iter()
            .map(|row| granularity.key(row, groupings))
            .collect::<Result<Vec<_>>>()?;
        let group_ids: BTreeMap<(u64, u64), usize> = keys
            .iter()
            .copied()
            .collect::<BTreeSet<_>>()
            .into_iter()
            .enumerate()
            .map(|(id, key)| (key, id))
            .collect();

        let n_dates = matrix.n_dates();
        let mut series = vec![vec![0.0; n_dates]; group_ids.len()];
        let mut sizes = vec![0usize; group_ids.len()];
        let mut member_of = Vec::with_capacity(keys.len());
        for (row, key) in keys.iter().enumerate() {
            let group = group_ids[key];
            for (total, value) in series[group].iter_mut().zip(matrix.row_at(row)) {
                *total += value;
            }
            sizes[group] += 1;
            member_of.push(group);
        }
        for (values, size) in series.iter_mut().zip(sizes) {
            for value in values.iter_mut() {
                *value /= size as f64;
            }
        }

        Ok(Self { series, member_of })
    }

    /// Extend every series with zero days up to `len` columns
    pub fn pad_to(&mut self, len: usize) {
        for values in &mut self.series {
            if values.len() < len {
                values.resize(len, 0.0);
            }
        }
    }

    /// Number of groups
    pub fn n_groups(&self) -> usize {
        self.series.len()
    }

    /// Averaged series of a group
    pub fn series(&self, group: usize) -> &[f64] {
        &self.series[group]
    }

    /// Series a matrix row is represented by
    pub fn series_of_row(&self, row: usize) -> &[f64] {
        &self.series[self.member_of[row]]
    }

    /// Spread one value per group back onto the matrix rows
    pub fn broadcast(&self, per_group: &[f64]) -> Vec<f64> {
        self.member_of.iter().map(|&g| per_group[g]).collect()
    }
}

fn default_windows() -> Vec<usize> {
    vec![3, 7, 14, 30, 60, 140]
}

fn default_sale_day_windows() -> Vec<usize> {
    vec![7, 14, 30, 60, 140]
}

fn default_weekday_weeks() -> Vec<usize> {
    vec![4, 20]
}

fn default_decay() -> f64 {
    0.9
}

fn default_promo_windows() -> Vec<usize> {
    vec![14, 60, 140]
}

fn default_sales_granularities() -> Vec<Granularity> {
    vec![
        Granularity::ItemStore,
        Granularity::Item,
        Granularity::StoreClass,
    ]
}

fn default_promo_granularities() -> Vec<Granularity> {
    vec![Granularity::ItemStore]
}

fn default_promo_axes() -> Vec<GroupAxis> {
    GroupAxis::ALL.to_vec()
}

/// Feature menu settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureConfig {
    /// Windows for mean, decayed mean, median, min, max and std
    #[serde(default = "default_windows")]
    pub windows: Vec<usize>,
    /// Windows for sale-day counts and sale ages
    #[serde(default = "default_sale_day_windows")]
    pub sale_day_windows: Vec<usize>,
    /// Week counts for the same-weekday means
    #[serde(default = "default_weekday_weeks")]
    pub weekday_weeks: Vec<usize>,
    /// Decay factor of the decayed mean
    #[serde(default = "default_decay")]
    pub decay: f64,
    /// Windows for promo counts before the anchor
    #[serde(default = "default_promo_windows")]
    pub promo_windows: Vec<usize>,
    #[serde(default = "default_sales_granularities")]
    pub sales_granularities: Vec<Granularity>,
    #[serde(default = "default_promo_granularities")]
    pub promo_granularities: Vec<Granularity>,
    /// Axes for grouped promo counts
    #[serde(default = "default_promo_axes")]
    pub promo_axes: Vec<GroupAxis>,
}

impl Default for FeatureConfig {
    fn default() -> Self {
        Self {
            windows: default_windows(),
            sale_day_windows: default_sale_day_windows(),
            weekday_weeks: default_weekday_weeks(),
            decay: default_decay(),
            promo_windows: default_promo_windows(),
            sales_granularities: default_sales_granularities(),
            promo_granularities: default_promo_granularities(),
            promo_axes: default_promo_axes(),
        }
    }
}

/// Enumerable list of every feature to compute
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeaturePlan {
    sales: Vec<SalesFeatureDef>,
    promo: Vec<PromoFeatureDef>,
}

impl FeaturePlan {
    /// Build the plan from explicit definitions
    pub fn new(sales: Vec<SalesFeatureDef>, promo: Vec<PromoFeatureDef>) -> Result<Self> {
        let mut seen = HashSet::new();
        let names = sales
            .iter()
            .map(|d| &d.name)
            .chain(promo.iter().map(|d| &d.name));
        for name in names {
            if !seen.insert(name.as_str()) {
                return Err(ForecastError::InvalidParameter(format!(
                    "Feature {} is defined twice",
                    name
                )));
            }
        }
        for def in &sales {
            if def.window == 0 {
                return Err(ForecastError::InvalidParameter(format!(
                    "Feature {} has an empty window",
                    def.name
                )));
            }
        }

        Ok(Self { sales, promo })
    }

    /// Expand the configured menus into definitions
    pub fn from_config(config: &FeatureConfig) -> Result<Self> {
        if !(config.decay > 0.0 && config.decay <= 1.0) {
            return Err(ForecastError::InvalidParameter(format!(
                "Decay must lie in (0, 1], got {}",
                config.decay
            )));
        }

        let mut sales = Vec::new();
        for &granularity in &config.sales_granularities {
            for &window in &config.windows {
                for statistic in [
                    SalesStatistic::Mean,
                    SalesStatistic::DecayMean {
                        decay: config.decay,
                    },
                    SalesStatistic::Median,
                    SalesStatistic::Min,
                    SalesStatistic::Max,
                    SalesStatistic::Std,
                ] {
                    sales.push(SalesFeatureDef::new(granularity, window, statistic));
                }
            }
            for &window in &config.sale_day_windows {
                for statistic in [
                    SalesStatistic::SaleDays,
                    SalesStatistic::LastSaleAge,
                    SalesStatistic::FirstSaleAge,
                ] {
                    sales.push(SalesFeatureDef::new(granularity, window, statistic));
                }
            }
            for offset in 0..7 {
                for &weeks in &config.weekday_weeks {
                    sales.push(SalesFeatureDef::new(
                        granularity,
                        weeks,
                        SalesStatistic::WeekdayMean { offset },
                    ));
                }
            }
        }

        let spans: Vec<PromoSpan> = config
            .promo_windows
            .iter()
            .map(|&w| PromoSpan::Before(w))
            .chain(std::iter::once(PromoSpan::After(HORIZON)))
            .collect();
        let mut promo = Vec::new();
        for &granularity in &config.promo_granularities {
            for &span in &spans {
                promo.push(PromoFeatureDef::sum(granularity, span));
            }
            for day in 0..HORIZON {
                promo.push(PromoFeatureDef::sum(granularity, PromoSpan::Day(day)));
            }
            for &axis in &config.promo_axes {
                for &span in &spans {
                    promo.push(PromoFeatureDef::group_count(granularity, span, axis));
                    promo.push(PromoFeatureDef::group_mean(granularity, span, axis));
                }
            }
        }

        Self::new(sales, promo)
    }

    pub fn sales(&self) -> &[SalesFeatureDef] {
        &self.sales
    }

    pub fn promo(&self) -> &[PromoFeatureDef] {
        &self.promo
    }

    /// Every feature name, sales first
    pub fn names(&self) -> Vec<String> {
        self.sales
            .iter()
            .map(|d| d.name.clone())
            .chain(self.promo.iter().map(|d| d.name.clone()))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.sales.len() + self.promo.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sales.is_empty() && self.promo.is_empty()
    }
}

/// Evaluates a [`FeaturePlan`] over reshaped data
#[derive(Debug, Clone)]
pub struct FeatureExtractor {
    plan: FeaturePlan,
}

impl FeatureExtractor {
    pub fn new(plan: FeaturePlan) -> Self {
        Self { plan }
    }

    pub fn plan(&self) -> &FeaturePlan {
        &self.plan
    }

    /// Sales features at `anchor`, one row per sales matrix row
    pub fn sales(
        &self,
        data: &ReshapedData,
        groupings: &CategoricalGroupings,
        anchor: NaiveDate,
    ) -> Result<FeatureTable> {
        let matrix = &data.sales;
        let anchor_idx = matrix.anchor_index(anchor);
        let mut grouped: HashMap<Granularity, GroupedSeries> = HashMap::new();
        let mut table = FeatureTable::new(matrix.rows().to_vec());

        for def in &self.plan.sales {
            if !grouped.contains_key(&def.granularity) {
                let mut series = GroupedSeries::build(matrix, groupings, def.granularity)?;
                series.pad_to(anchor_idx);
                grouped.insert(def.granularity, series);
            }
            let series = &grouped[&def.granularity];

            let per_group = (0..series.n_groups())
                .map(|g| def.evaluate(series.series(g), anchor_idx))
                .collect::<Result<Vec<f64>>>()?;
            table.push_column(def.name.clone(), series.broadcast(&per_group))?;
        }

        Ok(table)
    }

    /// Promo features at `anchor`, one row per promo matrix row
    pub fn promo(
        &self,
        data: &ReshapedData,
        groupings: &CategoricalGroupings,
        anchor: NaiveDate,
    ) -> Result<FeatureTable> {
        let matrix = &data.promo;
        let anchor_idx = matrix.anchor_index(anchor);
        let mut grouped: HashMap<Granularity, GroupedSeries> = HashMap::new();
        let mut row_counts: HashMap<(Granularity, PromoSpan), Vec<f64>> = HashMap::new();
        let mut axis_groups: HashMap<GroupAxis, Vec<usize>> = HashMap::new();
        for axis in self.plan.promo.iter().filter_map(|d| d.axis) {
            if !axis_groups.contains_key(&axis) {
                axis_groups.insert(axis, axis_assignment(matrix.rows(), groupings, axis)?);
            }
        }
        let mut table = FeatureTable::new(matrix.rows().to_vec());

        let n_dates = matrix.n_dates().max(anchor_idx);

        for def in &self.plan.promo {
            if !grouped.contains_key(&def.granularity) {
                let mut series = GroupedSeries::build(matrix, groupings, def.granularity)?;
                series.pad_to(anchor_idx);
                grouped.insert(def.granularity, series);
            }
            let series = &grouped[&def.granularity];

            let counts = row_counts
                .entry((def.granularity, def.span))
                .or_insert_with(|| {
                    (0..matrix.n_rows())
                        .map(|row| def.row_count(series.series_of_row(row), anchor_idx))
                        .collect()
                });

            let group_of = def
                .axis
                .and_then(|axis| axis_groups.get(&axis))
                .map_or(&[][..], |groups| groups.as_slice());
            let days = def.span.days_available(n_dates, anchor_idx);
            table.push_column(def.name.clone(), def.evaluate(counts, group_of, days))?;
        }

        Ok(table)
    }

    /// Sales and promo features merged into one table
    pub fn extract(
        &self,
        data: &ReshapedData,
        groupings: &CategoricalGroupings,
        anchor: NaiveDate,
    ) -> Result<FeatureTable> {
        let sales = self.sales(data, groupings, anchor)?;
        let promo = self.promo(data, groupings, anchor)?;
        let table = sales.merge(promo)?;

        info!(
            "Extracted {} features for {} rows at anchor {}",
            table.n_features(),
            table.n_rows(),
            anchor
        );
        Ok(table)
    }
}

fn axis_assignment(
    rows: &[RowKey],
    groupings: &CategoricalGroupings,
    axis: GroupAxis,
) -> Result<Vec<usize>> {
    rows.iter()
        .map(|row| {
            groupings
                .group(row, axis)
                .map(|g| g as usize)
                .ok_or_else(|| {
                    ForecastError::RowMismatch(format!(
                        "Row (store {}, item {}) has no {} group",
                        row.store, row.item, axis
                    ))
                })
        })
        .collect()
}
