//! Utility functions for the sales_forecast crate

use crate::error::{ForecastError, Result};
use chrono::NaiveDate;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs;
use std::path::Path;
use tempfile::NamedTempFile;

/// Parse a `YYYY-MM-DD` date; longer timestamps keep their date part
pub fn parse_date(value: &str) -> Result<NaiveDate> {
    let value = value.trim();
    let day = value.get(..10).unwrap_or(value);
    Ok(NaiveDate::parse_from_str(day, "%Y-%m-%d")?)
}

/// Write records to a CSV file, replacing any previous file atomically
pub fn write_csv_atomic<T: Serialize>(path: &Path, records: &[T]) -> Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    fs::create_dir_all(dir)?;

    let tmp = NamedTempFile::new_in(dir)?;
    {
        let mut writer = csv::Writer::from_writer(tmp.as_file());
        for record in records {
            writer.serialize(record)?;
        }
        writer.flush()?;
    }
    tmp.persist(path)?;
    Ok(())
}

/// Write a header-only CSV when there are no records to serialize
pub fn write_csv_header(path: &Path, header: &[&str]) -> Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    fs::create_dir_all(dir)?;

    let tmp = NamedTempFile::new_in(dir)?;
    {
        let mut writer = csv::Writer::from_writer(tmp.as_file());
        writer.write_record(header)?;
        writer.flush()?;
    }
    tmp.persist(path)?;
    Ok(())
}

/// Read every record of a CSV file.
///
/// A missing file means nothing has been written yet and is reported as
/// [`ForecastError::StaleCache`].
pub fn read_csv<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>> {
    if !path.is_file() {
        return Err(ForecastError::StaleCache {
            path: path.to_path_buf(),
        });
    }

    let mut reader = csv::Reader::from_path(path)?;
    let records = reader.deserialize().collect::<std::result::Result<Vec<T>, _>>()?;
    Ok(records)
}
