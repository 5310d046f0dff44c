//! Skeleton join and top-N summaries
//!
//! Forecasts are left-joined onto the schedule rows by (date, store, item).
//! Rows without a forecast, and forecasts that are negative or not finite,
//! become zero. Summaries rank groups by summed unit sales; equal totals keep
//! ascending label (or item number) order, with the unknown label last.

use crate::data::{ItemCatalog, PromoSchedule, StoreCatalog};
use crate::encoding::GroupLabel;
use crate::engine::HorizonForecast;
use crate::reshape::RowKey;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{info, warn};

/// Default number of entries per summary
pub const DEFAULT_TOP_N: usize = 10;

/// One output row: a skeleton row plus its forecast
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastRow {
    pub id: Option<u64>,
    pub date: NaiveDate,
    pub store_nbr: u32,
    pub item_nbr: u64,
    pub onpromotion: bool,
    pub unit_sales: f64,
}

/// What a summary entry ranks: a label or an item number
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Domain {
    Id(u64),
    Label(String),
}

/// `{domain, measure}` pair of a summary
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryEntry {
    pub domain: Domain,
    pub measure: f64,
}

/// The three top-N summaries served to callers
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Summaries {
    pub categories: Vec<SummaryEntry>,
    pub items: Vec<SummaryEntry>,
    pub stores: Vec<SummaryEntry>,
}

impl Summaries {
    /// Build every summary from the joined forecast
    pub fn build(
        rows: &[ForecastRow],
        items: &ItemCatalog,
        stores: &StoreCatalog,
        top_n: usize,
    ) -> Self {
        Self {
            categories: top_categories(rows, items, top_n),
            items: top_items(rows, top_n),
            stores: top_stores(rows, stores, top_n),
        }
    }
}

/// Left-join forecasts onto the skeleton, zero-filling and clipping at zero
pub fn merge(skeleton: &PromoSchedule, forecast: &HorizonForecast) -> Vec<ForecastRow> {
    let mut unmatched = 0usize;
    let rows: Vec<ForecastRow> = skeleton
        .records()
        .iter()
        .map(|record| {
            let key = RowKey::new(record.store_nbr, record.item_nbr);
            let unit_sales = match forecast.value(&key, record.date) {
                Some(value) if value.is_finite() => value.max(0.0),
                Some(_) => 0.0,
                None => {
                    unmatched += 1;
                    0.0
                }
            };

            ForecastRow {
                id: record.id,
                date: record.date,
                store_nbr: record.store_nbr,
                item_nbr: record.item_nbr,
                onpromotion: record.onpromotion,
                unit_sales,
            }
        })
        .collect();

    if unmatched > 0 {
        warn!(
            "{} of {} skeleton rows have no forecast and are set to 0",
            unmatched,
            rows.len()
        );
    }
    info!("Merged forecast onto {} skeleton rows", rows.len());
    rows
}

fn rank<K: Ord>(totals: BTreeMap<K, f64>, top_n: usize, domain: impl Fn(K) -> Domain) -> Vec<SummaryEntry> {
    let mut entries: Vec<SummaryEntry> = totals
        .into_iter()
        .map(|(key, measure)| SummaryEntry {
            domain: domain(key),
            measure,
        })
        .collect();
    // Stable: equal totals keep ascending key order
    entries.sort_by(|a, b| b.measure.total_cmp(&a.measure));
    entries.truncate(top_n);
    entries
}

/// Item families with the highest forecast sales
pub fn top_categories(rows: &[ForecastRow], items: &ItemCatalog, top_n: usize) -> Vec<SummaryEntry> {
    let mut totals: BTreeMap<GroupLabel, f64> = BTreeMap::new();
    for row in rows {
        let family = items
            .get(row.item_nbr)
            .map_or(GroupLabel::Unknown, |item| GroupLabel::Name(item.family.clone()));
        *totals.entry(family).or_insert(0.0) += row.unit_sales;
    }
    rank(totals, top_n, |label| Domain::Label(label.to_string()))
}

/// Items with the highest forecast sales
pub fn top_items(rows: &[ForecastRow], top_n: usize) -> Vec<SummaryEntry> {
    let mut totals: BTreeMap<u64, f64> = BTreeMap::new();
    for row in rows {
        *totals.entry(row.item_nbr).or_insert(0.0) += row.unit_sales;
    }
    rank(totals, top_n, Domain::Id)
}

/// Store states with the highest forecast sales
pub fn top_stores(rows: &[ForecastRow], stores: &StoreCatalog, top_n: usize) -> Vec<SummaryEntry> {
    let mut totals: BTreeMap<GroupLabel, f64> = BTreeMap::new();
    for row in rows {
        let state = stores
            .get(row.store_nbr)
            .map_or(GroupLabel::Unknown, |store| GroupLabel::Name(store.state.clone()));
        *totals.entry(state).or_insert(0.0) += row.unit_sales;
    }
    rank(totals, top_n, |label| Domain::Label(label.to_string()))
}
