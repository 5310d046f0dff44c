//! Named feature columns over a fixed row set

use crate::error::{ForecastError, Result};
use crate::reshape::RowKey;
use sales_math::min_max_scale;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::debug;

/// How feature columns are rescaled before they reach a model
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Normalization {
    /// Min-max scale every column over the rows of the current batch
    #[default]
    BatchMinMax,
    /// Leave raw feature values untouched
    Disabled,
}

/// Column-major feature matrix.
///
/// Every column has exactly one value per row. Rows may repeat a key when
/// tables from several anchors are stacked for training.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureTable {
    rows: Vec<RowKey>,
    names: Vec<String>,
    index: HashMap<String, usize>,
    columns: Vec<Vec<f64>>,
}

impl FeatureTable {
    /// Empty table over the given rows
    pub fn new(rows: Vec<RowKey>) -> Self {
        Self {
            rows,
            names: Vec::new(),
            index: HashMap::new(),
            columns: Vec::new(),
        }
    }

    /// Append a column
    pub fn push_column(&mut self, name: impl Into<String>, values: Vec<f64>) -> Result<()> {
        let name = name.into();
        if self.index.contains_key(&name) {
            return Err(ForecastError::FeatureMismatch(format!(
                "Duplicate feature name: {}",
                name
            )));
        }
        if values.len() != self.rows.len() {
            return Err(ForecastError::ValidationError(format!(
                "Feature {} has {} values, expected {}",
                name,
                values.len(),
                self.rows.len()
            )));
        }

        self.index.insert(name.clone(), self.columns.len());
        self.names.push(name);
        self.columns.push(values);
        Ok(())
    }

    /// Row keys in table order
    pub fn rows(&self) -> &[RowKey] {
        &self.rows
    }

    /// Feature names in column order
    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn n_rows(&self) -> usize {
        self.rows.len()
    }

    pub fn n_features(&self) -> usize {
        self.columns.len()
    }

    /// Column by name
    pub fn column(&self, name: &str) -> Option<&[f64]> {
        self.index.get(name).map(|&i| self.columns[i].as_slice())
    }

    /// Column by name, failing when the table does not carry it
    pub fn require(&self, name: &str) -> Result<&[f64]> {
        self.column(name).ok_or_else(|| {
            ForecastError::FeatureMismatch(format!("Feature table has no column named {}", name))
        })
    }

    /// Columns in the requested order
    pub fn select(&self, names: &[String]) -> Result<Vec<&[f64]>> {
        names.iter().map(|name| self.require(name)).collect()
    }

    /// Append the columns of `other`, which must cover the same rows in the
    /// same order
    pub fn merge(mut self, other: FeatureTable) -> Result<Self> {
        if self.rows != other.rows {
            return Err(ForecastError::RowMismatch(format!(
                "Cannot merge feature tables over different rows ({} vs {})",
                self.rows.len(),
                other.rows.len()
            )));
        }

        for (name, values) in other.names.into_iter().zip(other.columns) {
            self.push_column(name, values)?;
        }
        Ok(self)
    }

    /// Concatenate tables row-wise; every table must carry the same columns in
    /// the same order
    pub fn stack(tables: Vec<FeatureTable>) -> Result<Self> {
        let mut tables = tables.into_iter();
        let Some(mut stacked) = tables.next() else {
            return Ok(Self::new(Vec::new()));
        };

        for table in tables {
            if table.names != stacked.names {
                return Err(ForecastError::FeatureMismatch(
                    "Cannot stack feature tables with different columns".to_string(),
                ));
            }
            stacked.rows.extend(table.rows);
            for (column, values) in stacked.columns.iter_mut().zip(table.columns) {
                column.extend(values);
            }
        }
        Ok(stacked)
    }

    /// Rescale columns in place, returning how many columns changed.
    ///
    /// Constant columns keep their raw values.
    pub fn normalize(&mut self, normalization: Normalization) -> usize {
        match normalization {
            Normalization::Disabled => 0,
            Normalization::BatchMinMax => {
                let mut rescaled = 0;
                for (name, column) in self.names.iter().zip(self.columns.iter_mut()) {
                    if min_max_scale(column) {
                        rescaled += 1;
                    } else {
                        debug!("Feature {} is constant over the batch, left unscaled", name);
                    }
                }
                rescaled
            }
        }
    }
}
