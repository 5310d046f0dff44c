//! Long-to-wide reshaping of transaction logs
//!
//! The history log becomes a Sales Matrix (log1p of clamped unit sales) and,
//! together with the future schedule, a Promo Matrix. Both matrices are keyed
//! by [`RowKey`] and share the exact same row set and order: the pairs seen in
//! history, sorted by (store, item). A pair that only appears in the schedule
//! is never added as a row, so it can only be served by the aggregator's
//! zero-fill.

use crate::data::{PromoSchedule, TransactionLog};
use crate::error::Result;
use chrono::{Duration, NaiveDate};
use sales_math::to_log_sales;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use tracing::{debug, info, warn};

/// Row key of every wide matrix: one (store, item) pair
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RowKey {
    pub store: u32,
    pub item: u64,
}

impl RowKey {
    pub fn new(store: u32, item: u64) -> Self {
        Self { store, item }
    }
}

/// Wide matrix with one row per [`RowKey`] and one column per calendar day.
///
/// Columns cover a contiguous date range. Reads outside the range, or for an
/// unknown key, return zero.
#[derive(Debug, Clone, PartialEq)]
pub struct DateMatrix {
    rows: Vec<RowKey>,
    index: HashMap<RowKey, usize>,
    dates: Vec<NaiveDate>,
    values: Vec<f64>,
}

impl DateMatrix {
    /// All-zero matrix over `rows` and the inclusive date range `[start, end]`
    pub fn zeros(rows: Vec<RowKey>, start: NaiveDate, end: NaiveDate) -> Self {
        let n_dates = if end < start {
            0
        } else {
            (end - start).num_days() as usize + 1
        };
        let dates = (0..n_dates)
            .map(|offset| start + Duration::days(offset as i64))
            .collect();
        let index = rows.iter().enumerate().map(|(i, k)| (*k, i)).collect();
        let values = vec![0.0; rows.len() * n_dates];

        Self {
            rows,
            index,
            dates,
            values,
        }
    }

    /// Matrix with no rows and no dates
    pub fn empty() -> Self {
        Self {
            rows: Vec::new(),
            index: HashMap::new(),
            dates: Vec::new(),
            values: Vec::new(),
        }
    }

    /// Row keys in matrix order
    pub fn rows(&self) -> &[RowKey] {
        &self.rows
    }

    /// Column dates in ascending order
    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    pub fn n_rows(&self) -> usize {
        self.rows.len()
    }

    pub fn n_dates(&self) -> usize {
        self.dates.len()
    }

    pub fn first_date(&self) -> Option<NaiveDate> {
        self.dates.first().copied()
    }

    pub fn last_date(&self) -> Option<NaiveDate> {
        self.dates.last().copied()
    }

    /// Position of a row key
    pub fn row_index(&self, key: &RowKey) -> Option<usize> {
        self.index.get(key).copied()
    }

    /// Column index of a date, if it lies inside the matrix
    pub fn date_index(&self, date: NaiveDate) -> Option<usize> {
        let start = self.first_date()?;
        let offset = (date - start).num_days();
        if offset < 0 || offset as usize >= self.dates.len() {
            None
        } else {
            Some(offset as usize)
        }
    }

    /// Number of days from the first column up to, not including, `anchor`.
    ///
    /// An anchor past the last column keeps its real offset; the days between
    /// the matrix end and the anchor count as zeros.
    pub fn anchor_index(&self, anchor: NaiveDate) -> usize {
        match self.first_date() {
            None => 0,
            Some(start) => (anchor - start).num_days().max(0) as usize,
        }
    }

    /// Daily values of a row by position
    pub fn row_at(&self, idx: usize) -> &[f64] {
        let width = self.dates.len();
        &self.values[idx * width..(idx + 1) * width]
    }

    /// Daily values of a row by key
    pub fn row(&self, key: &RowKey) -> Option<&[f64]> {
        self.row_index(key).map(|idx| self.row_at(idx))
    }

    /// Single cell, zero when the key or date is outside the matrix
    pub fn get(&self, key: &RowKey, date: NaiveDate) -> f64 {
        match (self.row_index(key), self.date_index(date)) {
            (Some(r), Some(c)) => self.values[r * self.dates.len() + c],
            _ => 0.0,
        }
    }

    fn cell_mut(&mut self, row: usize, col: usize) -> &mut f64 {
        let width = self.dates.len();
        &mut self.values[row * width + col]
    }

    fn map_in_place(&mut self, f: impl Fn(f64) -> f64) {
        for value in self.values.iter_mut() {
            *value = f(*value);
        }
    }
}

/// Sales and promo matrices sharing one row set
#[derive(Debug, Clone)]
pub struct ReshapedData {
    /// log1p of clamped unit sales over the history dates
    pub sales: DateMatrix,
    /// 0/1 promotion flags over history plus the scheduled horizon
    pub promo: DateMatrix,
}

impl ReshapedData {
    /// Row keys shared by both matrices
    pub fn rows(&self) -> &[RowKey] {
        self.sales.rows()
    }
}

/// Pivot the history log and the future schedule into wide matrices.
///
/// Duplicate (date, store, item) sales are summed before the log transform;
/// duplicate promo flags are OR-ed. On a date present in the schedule the
/// schedule is authoritative for every row.
///
/// An empty history yields empty matrices; every skeleton row is then
/// zero-filled by the aggregator.
pub fn reshape(history: &TransactionLog, schedule: &PromoSchedule) -> Result<ReshapedData> {
    let Some((start, history_end)) = history.date_range() else {
        warn!("History log is empty, every forecast will be zero");
        return Ok(ReshapedData {
            sales: DateMatrix::empty(),
            promo: DateMatrix::empty(),
        });
    };

    let rows: Vec<RowKey> = history
        .records()
        .iter()
        .map(|r| RowKey::new(r.store_nbr, r.item_nbr))
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();

    let mut sales = DateMatrix::zeros(rows.clone(), start, history_end);
    let promo_end = schedule
        .date_range()
        .map(|(_, end)| end.max(history_end))
        .unwrap_or(history_end);
    let mut promo = DateMatrix::zeros(rows, start, promo_end);

    for record in history.records() {
        let key = RowKey::new(record.store_nbr, record.item_nbr);
        let (Some(row), Some(col)) = (sales.row_index(&key), sales.date_index(record.date)) else {
            continue;
        };
        *sales.cell_mut(row, col) += record.unit_sales.max(0.0);
        if record.onpromotion {
            *promo.cell_mut(row, col) = 1.0;
        }
    }
    sales.map_in_place(to_log_sales);

    // The schedule replaces whole columns so rows absent from it read as 0
    let scheduled_dates: BTreeSet<usize> = schedule
        .records()
        .iter()
        .filter_map(|r| promo.date_index(r.date))
        .collect();
    for &col in &scheduled_dates {
        for row in 0..promo.n_rows() {
            *promo.cell_mut(row, col) = 0.0;
        }
    }

    let mut unseen_pairs = BTreeSet::new();
    for record in schedule.records() {
        let key = RowKey::new(record.store_nbr, record.item_nbr);
        let Some(col) = promo.date_index(record.date) else {
            continue;
        };
        match promo.row_index(&key) {
            Some(row) => {
                if record.onpromotion {
                    *promo.cell_mut(row, col) = 1.0;
                }
            }
            None => {
                unseen_pairs.insert(key);
            }
        }
    }
    if !unseen_pairs.is_empty() {
        debug!(
            "{} scheduled (store, item) pairs have no history and are not scored",
            unseen_pairs.len()
        );
    }

    info!(
        "Shape of sales and promo data is: ({}, {}) and ({}, {})",
        sales.n_rows(),
        sales.n_dates(),
        promo.n_rows(),
        promo.n_dates()
    );

    Ok(ReshapedData { sales, promo })
}
