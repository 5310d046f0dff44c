//! Persisted forecast and summary files
//!
//! A prediction run writes `final.csv` plus one CSV per summary into the
//! output directory. Cached reads rebuild [`Summaries`] from those files.

use crate::aggregate::{Domain, ForecastRow, SummaryEntry, Summaries};
use crate::error::{ForecastError, Result};
use crate::utils::{read_csv, write_csv_atomic, write_csv_header};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::info;

pub const FORECAST_FILE: &str = "final.csv";
pub const CATEGORIES_FILE: &str = "categories.csv";
pub const ITEMS_FILE: &str = "items.csv";
pub const STORES_FILE: &str = "stores.csv";

const FORECAST_HEADER: [&str; 6] = ["id", "date", "store_nbr", "item_nbr", "onpromotion", "unit_sales"];

#[derive(Debug, Serialize, Deserialize)]
struct CategoryRecord {
    family: String,
    unit_sales: f64,
}

#[derive(Debug, Serialize, Deserialize)]
struct ItemRecord {
    item_nbr: u64,
    unit_sales: f64,
}

#[derive(Debug, Serialize, Deserialize)]
struct StoreRecord {
    state: String,
    unit_sales: f64,
}

/// Output directory of prediction runs
#[derive(Debug, Clone)]
pub struct OutputStore {
    dir: PathBuf,
}

impl OutputStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path(&self, file: &str) -> PathBuf {
        self.dir.join(file)
    }

    /// Write the skeleton-aligned forecast
    pub fn write_forecast(&self, rows: &[ForecastRow]) -> Result<PathBuf> {
        let path = self.path(FORECAST_FILE);
        if rows.is_empty() {
            write_csv_header(&path, &FORECAST_HEADER)?;
        } else {
            write_csv_atomic(&path, rows)?;
        }
        info!("Wrote {} forecast rows to {}", rows.len(), path.display());
        Ok(path)
    }

    /// Read back the skeleton-aligned forecast
    pub fn read_forecast(&self) -> Result<Vec<ForecastRow>> {
        read_csv(&self.path(FORECAST_FILE))
    }

    /// Write the three summary files
    pub fn write_summaries(&self, summaries: &Summaries) -> Result<()> {
        let categories = summaries
            .categories
            .iter()
            .map(|e| {
                Ok(CategoryRecord {
                    family: label(&e.domain, CATEGORIES_FILE)?,
                    unit_sales: e.measure,
                })
            })
            .collect::<Result<Vec<_>>>()?;
        let items = summaries
            .items
            .iter()
            .map(|e| match e.domain {
                Domain::Id(item_nbr) => Ok(ItemRecord {
                    item_nbr,
                    unit_sales: e.measure,
                }),
                Domain::Label(ref other) => Err(ForecastError::DataError(format!(
                    "Item summary entry {} is not an item number",
                    other
                ))),
            })
            .collect::<Result<Vec<_>>>()?;
        let stores = summaries
            .stores
            .iter()
            .map(|e| {
                Ok(StoreRecord {
                    state: label(&e.domain, STORES_FILE)?,
                    unit_sales: e.measure,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        write_records(&self.path(CATEGORIES_FILE), &categories, &["family", "unit_sales"])?;
        write_records(&self.path(ITEMS_FILE), &items, &["item_nbr", "unit_sales"])?;
        write_records(&self.path(STORES_FILE), &stores, &["state", "unit_sales"])?;
        info!("Wrote summaries to {}", self.dir.display());
        Ok(())
    }

    /// Rebuild summaries from the files of the last prediction run
    pub fn read_summaries(&self) -> Result<Summaries> {
        let categories: Vec<CategoryRecord> = read_csv(&self.path(CATEGORIES_FILE))?;
        let items: Vec<ItemRecord> = read_csv(&self.path(ITEMS_FILE))?;
        let stores: Vec<StoreRecord> = read_csv(&self.path(STORES_FILE))?;

        Ok(Summaries {
            categories: categories
                .into_iter()
                .map(|r| SummaryEntry {
                    domain: Domain::Label(r.family),
                    measure: r.unit_sales,
                })
                .collect(),
            items: items
                .into_iter()
                .map(|r| SummaryEntry {
                    domain: Domain::Id(r.item_nbr),
                    measure: r.unit_sales,
                })
                .collect(),
            stores: stores
                .into_iter()
                .map(|r| SummaryEntry {
                    domain: Domain::Label(r.state),
                    measure: r.unit_sales,
                })
                .collect(),
        })
    }
}

fn label(domain: &Domain, file: &str) -> Result<String> {
    match domain {
        Domain::Label(label) => Ok(label.clone()),
        Domain::Id(id) => Err(ForecastError::DataError(format!(
            "Summary entry {} for {} is not a label",
            id, file
        ))),
    }
}

fn write_records<T: Serialize>(path: &Path, records: &[T], header: &[&str]) -> Result<()> {
    if records.is_empty() {
        write_csv_header(path, header)
    } else {
        write_csv_atomic(path, records)
    }
}
