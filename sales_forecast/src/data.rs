//! Transaction logs and store/item catalogs
//!
//! Input tables are read with polars, checked for their required columns and
//! converted into typed records. A missing column is a schema error and is
//! reported before any reshaping happens; a malformed value names the column
//! it was found in.

use crate::error::{ForecastError, Result};
use crate::utils::parse_date;
use chrono::NaiveDate;
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs::File;
use std::path::Path;
use tracing::info;

/// Columns the history log must carry
pub const HISTORY_COLUMNS: [&str; 5] = ["date", "store_nbr", "item_nbr", "unit_sales", "onpromotion"];
/// Columns the promotion schedule must carry
pub const SCHEDULE_COLUMNS: [&str; 4] = ["date", "store_nbr", "item_nbr", "onpromotion"];
/// Columns the item catalog must carry
pub const ITEM_COLUMNS: [&str; 3] = ["item_nbr", "family", "class"];
/// Columns the store catalog must carry
pub const STORE_COLUMNS: [&str; 5] = ["store_nbr", "city", "state", "type", "cluster"];

/// One historical sales observation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionRecord {
    /// Calendar day of the sale
    pub date: NaiveDate,
    /// Store number
    pub store_nbr: u32,
    /// Item number
    pub item_nbr: u64,
    /// Units sold; negative values are returns
    pub unit_sales: f64,
    /// Whether the item was on promotion
    pub onpromotion: bool,
}

/// One row of the future promotion schedule (also the output skeleton)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleRecord {
    /// Optional row id carried through to the forecast output
    pub id: Option<u64>,
    /// Calendar day inside the forecast horizon
    pub date: NaiveDate,
    /// Store number
    pub store_nbr: u32,
    /// Item number
    pub item_nbr: u64,
    /// Whether the item is scheduled to be on promotion
    pub onpromotion: bool,
}

/// Historical transaction log
#[derive(Debug, Clone, Default)]
pub struct TransactionLog {
    records: Vec<TransactionRecord>,
}

impl TransactionLog {
    /// Create a log from records in any order
    pub fn new(records: Vec<TransactionRecord>) -> Self {
        Self { records }
    }

    /// Get the records
    pub fn records(&self) -> &[TransactionRecord] {
        &self.records
    }

    /// Number of records
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Check if the log is empty
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// First and last date in the log
    pub fn date_range(&self) -> Option<(NaiveDate, NaiveDate)> {
        date_range(self.records.iter().map(|r| r.date))
    }

    /// Keep only records on or after `start`
    pub fn since(self, start: NaiveDate) -> Self {
        Self {
            records: self
                .records
                .into_iter()
                .filter(|r| r.date >= start)
                .collect(),
        }
    }
}

/// Known future promotion schedule
#[derive(Debug, Clone, Default)]
pub struct PromoSchedule {
    records: Vec<ScheduleRecord>,
}

impl PromoSchedule {
    /// Create a schedule from records in any order
    pub fn new(records: Vec<ScheduleRecord>) -> Self {
        Self { records }
    }

    /// A schedule with no future dates (used for training)
    pub fn empty() -> Self {
        Self::default()
    }

    /// Get the records
    pub fn records(&self) -> &[ScheduleRecord] {
        &self.records
    }

    /// Number of records
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Check if the schedule is empty
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// First and last date in the schedule
    pub fn date_range(&self) -> Option<(NaiveDate, NaiveDate)> {
        date_range(self.records.iter().map(|r| r.date))
    }
}

fn date_range(dates: impl Iterator<Item = NaiveDate>) -> Option<(NaiveDate, NaiveDate)> {
    dates.fold(None, |acc, d| match acc {
        None => Some((d, d)),
        Some((lo, hi)) => Some((lo.min(d), hi.max(d))),
    })
}

/// Static attributes of an item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemInfo {
    pub item_nbr: u64,
    pub family: String,
    pub class: u32,
    pub perishable: bool,
}

/// Static attributes of a store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoreInfo {
    pub store_nbr: u32,
    pub city: String,
    pub state: String,
    pub store_type: String,
    pub cluster: u32,
}

/// Item metadata keyed by item number
#[derive(Debug, Clone, Default)]
pub struct ItemCatalog {
    items: HashMap<u64, ItemInfo>,
}

impl ItemCatalog {
    pub fn new(items: impl IntoIterator<Item = ItemInfo>) -> Self {
        Self {
            items: items.into_iter().map(|i| (i.item_nbr, i)).collect(),
        }
    }

    pub fn get(&self, item_nbr: u64) -> Option<&ItemInfo> {
        self.items.get(&item_nbr)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Store metadata keyed by store number
#[derive(Debug, Clone, Default)]
pub struct StoreCatalog {
    stores: HashMap<u32, StoreInfo>,
}

impl StoreCatalog {
    pub fn new(stores: impl IntoIterator<Item = StoreInfo>) -> Self {
        Self {
            stores: stores.into_iter().map(|s| (s.store_nbr, s)).collect(),
        }
    }

    pub fn get(&self, store_nbr: u32) -> Option<&StoreInfo> {
        self.stores.get(&store_nbr)
    }

    pub fn len(&self) -> usize {
        self.stores.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stores.is_empty()
    }
}

/// Data loader for the pipeline's input tables
#[derive(Debug)]
pub struct DataLoader;

impl DataLoader {
    /// Read a CSV file into a DataFrame
    pub fn read_frame<P: AsRef<Path>>(path: P) -> Result<DataFrame> {
        let path = path.as_ref();
        info!("Loading data from: {}", path.display());

        let file = File::open(path)?;
        let df = CsvReader::new(file)
            .infer_schema(None)
            .has_header(true)
            .finish()?;

        Ok(df)
    }

    /// Load the history log from a CSV file
    pub fn transactions_from_csv<P: AsRef<Path>>(path: P) -> Result<TransactionLog> {
        let df = Self::read_frame(path)?;
        Self::transactions_from_dataframe(&df)
    }

    /// Convert a DataFrame into a history log
    pub fn transactions_from_dataframe(df: &DataFrame) -> Result<TransactionLog> {
        require_columns(df, "history", &HISTORY_COLUMNS)?;

        let dates = column_as_dates(df, "date")?;
        let stores = column_as_store_ids(df, "store_nbr")?;
        let items = column_as_u64(df, "item_nbr")?;
        let sales = column_as_f64(df, "unit_sales")?;
        let promos = column_as_flags(df, "onpromotion")?;

        let records = dates
            .into_iter()
            .zip(stores)
            .zip(items)
            .zip(sales)
            .zip(promos)
            .map(
                |((((date, store_nbr), item_nbr), unit_sales), onpromotion)| TransactionRecord {
                    date,
                    store_nbr,
                    item_nbr,
                    unit_sales,
                    onpromotion,
                },
            )
            .collect::<Vec<_>>();

        info!("Loaded {} history records", records.len());
        Ok(TransactionLog::new(records))
    }

    /// Load the promotion schedule from a CSV file
    pub fn schedule_from_csv<P: AsRef<Path>>(path: P) -> Result<PromoSchedule> {
        let df = Self::read_frame(path)?;
        Self::schedule_from_dataframe(&df)
    }

    /// Convert a DataFrame into a promotion schedule
    pub fn schedule_from_dataframe(df: &DataFrame) -> Result<PromoSchedule> {
        require_columns(df, "schedule", &SCHEDULE_COLUMNS)?;

        let ids: Vec<Option<u64>> = if has_column(df, "id") {
            column_as_u64(df, "id")?.into_iter().map(Some).collect()
        } else {
            vec![None; df.height()]
        };
        let dates = column_as_dates(df, "date")?;
        let stores = column_as_store_ids(df, "store_nbr")?;
        let items = column_as_u64(df, "item_nbr")?;
        let promos = column_as_flags(df, "onpromotion")?;

        let records = ids
            .into_iter()
            .zip(dates)
            .zip(stores)
            .zip(items)
            .zip(promos)
            .map(
                |((((id, date), store_nbr), item_nbr), onpromotion)| ScheduleRecord {
                    id,
                    date,
                    store_nbr,
                    item_nbr,
                    onpromotion,
                },
            )
            .collect::<Vec<_>>();

        info!("Loaded {} schedule records", records.len());
        Ok(PromoSchedule::new(records))
    }

    /// Load the item catalog from a CSV file
    pub fn items_from_csv<P: AsRef<Path>>(path: P) -> Result<ItemCatalog> {
        let df = Self::read_frame(path)?;
        Self::items_from_dataframe(&df)
    }

    /// Convert a DataFrame into an item catalog
    pub fn items_from_dataframe(df: &DataFrame) -> Result<ItemCatalog> {
        require_columns(df, "items", &ITEM_COLUMNS)?;

        let item_ids = column_as_u64(df, "item_nbr")?;
        let families = column_as_strings(df, "family")?;
        let classes = column_as_u64(df, "class")?;
        let perishable = if has_column(df, "perishable") {
            column_as_flags(df, "perishable")?
        } else {
            vec![false; df.height()]
        };

        let mut items = Vec::with_capacity(item_ids.len());
        for (((item_nbr, family), class), perishable) in item_ids
            .into_iter()
            .zip(families)
            .zip(classes)
            .zip(perishable)
        {
            let class = u32::try_from(class).map_err(|_| {
                ForecastError::DataError(format!("Column 'class' value {} out of range", class))
            })?;
            items.push(ItemInfo {
                item_nbr,
                family,
                class,
                perishable,
            });
        }

        Ok(ItemCatalog::new(items))
    }

    /// Load the store catalog from a CSV file
    pub fn stores_from_csv<P: AsRef<Path>>(path: P) -> Result<StoreCatalog> {
        let df = Self::read_frame(path)?;
        Self::stores_from_dataframe(&df)
    }

    /// Convert a DataFrame into a store catalog
    pub fn stores_from_dataframe(df: &DataFrame) -> Result<StoreCatalog> {
        require_columns(df, "stores", &STORE_COLUMNS)?;

        let store_ids = column_as_store_ids(df, "store_nbr")?;
        let cities = column_as_strings(df, "city")?;
        let states = column_as_strings(df, "state")?;
        let types = column_as_strings(df, "type")?;
        let clusters = column_as_store_ids(df, "cluster")?;

        let stores = store_ids
            .into_iter()
            .zip(cities)
            .zip(states)
            .zip(types)
            .zip(clusters)
            .map(|((((store_nbr, city), state), store_type), cluster)| StoreInfo {
                store_nbr,
                city,
                state,
                store_type,
                cluster,
            })
            .collect::<Vec<_>>();

        Ok(StoreCatalog::new(stores))
    }
}

fn has_column(df: &DataFrame, name: &str) -> bool {
    df.get_column_names().iter().any(|c| *c == name)
}

/// Fail fast when any required column is absent
fn require_columns(df: &DataFrame, table: &str, required: &[&str]) -> Result<()> {
    let missing: Vec<String> = required
        .iter()
        .filter(|name| !has_column(df, name))
        .map(|name| name.to_string())
        .collect();

    if missing.is_empty() {
        Ok(())
    } else {
        Err(ForecastError::SchemaMismatch {
            table: table.to_string(),
            missing,
        })
    }
}

fn null_error(column_name: &str, row: usize) -> ForecastError {
    ForecastError::DataError(format!(
        "Column '{}' has a missing value at row {}",
        column_name, row
    ))
}

/// Helper to get a column as f64 values, rejecting nulls
fn column_as_f64(df: &DataFrame, column_name: &str) -> Result<Vec<f64>> {
    let series = df.column(column_name)?.cast(&DataType::Float64)?;
    series
        .f64()?
        .into_iter()
        .enumerate()
        .map(|(row, v)| v.ok_or_else(|| null_error(column_name, row)))
        .collect()
}

/// Helper to get a column as non-negative integer ids
fn column_as_u64(df: &DataFrame, column_name: &str) -> Result<Vec<u64>> {
    let series = df.column(column_name)?.cast(&DataType::Int64)?;
    series
        .i64()?
        .into_iter()
        .enumerate()
        .map(|(row, v)| -> Result<u64> {
            let v = v.ok_or_else(|| null_error(column_name, row))?;
            u64::try_from(v).map_err(|_| {
                ForecastError::DataError(format!(
                    "Column '{}' has negative id {} at row {}",
                    column_name, v, row
                ))
            })
        })
        .collect()
}

fn column_as_store_ids(df: &DataFrame, column_name: &str) -> Result<Vec<u32>> {
    column_as_u64(df, column_name)?
        .into_iter()
        .map(|v| {
            u32::try_from(v).map_err(|_| {
                ForecastError::DataError(format!(
                    "Column '{}' value {} out of range",
                    column_name, v
                ))
            })
        })
        .collect()
}

fn column_as_strings(df: &DataFrame, column_name: &str) -> Result<Vec<String>> {
    let series = df.column(column_name)?.cast(&DataType::Utf8)?;
    series
        .utf8()?
        .into_iter()
        .enumerate()
        .map(|(row, v)| {
            v.map(|s| s.to_string())
                .ok_or_else(|| null_error(column_name, row))
        })
        .collect()
}

fn column_as_dates(df: &DataFrame, column_name: &str) -> Result<Vec<NaiveDate>> {
    let series = df.column(column_name)?.cast(&DataType::Utf8)?;
    series
        .utf8()?
        .into_iter()
        .enumerate()
        .map(|(row, v)| -> Result<NaiveDate> {
            // Datetime columns render with a time part; the day is enough
            parse_date(v.ok_or_else(|| null_error(column_name, row))?)
        })
        .collect()
}

/// Promotion flags; an empty cell means "not on promotion"
fn column_as_flags(df: &DataFrame, column_name: &str) -> Result<Vec<bool>> {
    let series = df.column(column_name)?.cast(&DataType::Utf8)?;
    series
        .utf8()?
        .into_iter()
        .enumerate()
        .map(|(row, v)| match v.map(|s| s.trim().to_ascii_lowercase()) {
            None => Ok(false),
            Some(s) => match s.as_str() {
                "" | "false" | "0" | "0.0" => Ok(false),
                "true" | "1" | "1.0" => Ok(true),
                other => Err(ForecastError::DataError(format!(
                    "Column '{}' has unrecognised flag '{}' at row {}",
                    column_name, other, row
                ))),
            },
        })
        .collect()
}
