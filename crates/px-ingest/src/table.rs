//! Table loading and the table provider interface.
//!
//! Validation compares a produced table against reference data served by
//! some provider. [`TableProvider`] is that seam; [`CsvTableProvider`] serves
//! datasets from a directory of CSV exports.

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use polars::prelude::*;
use tracing::{debug, info};

use crate::error::{IngestError, Result};
use crate::polars_utils::{require_columns, string_values};

/// Which values of a dimension to keep.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selection {
    /// Every value.
    All,
    /// Only the listed value codes.
    Values(BTreeSet<String>),
}

impl Selection {
    pub fn values<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Values(values.into_iter().map(Into::into).collect())
    }

    pub fn matches(&self, value: &str) -> bool {
        match self {
            Selection::All => true,
            Selection::Values(values) => values.contains(value),
        }
    }
}

/// Filters keyed by column name.
pub type Filters = BTreeMap<String, Selection>;

/// Source of reference tables.
pub trait TableProvider {
    /// Fetch the dataset at `dataset`, keeping rows that match every filter.
    fn fetch(&self, dataset: &str, filters: &Filters) -> Result<DataFrame>;
}

/// Serves `<root>/<dataset>.csv` with every column read as text.
#[derive(Debug, Clone)]
pub struct CsvTableProvider {
    root: PathBuf,
}

impl CsvTableProvider {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// File backing a dataset path.
    pub fn dataset_path(&self, dataset: &str) -> PathBuf {
        self.root.join(format!("{}.csv", dataset.trim_matches('/')))
    }
}

impl TableProvider for CsvTableProvider {
    fn fetch(&self, dataset: &str, filters: &Filters) -> Result<DataFrame> {
        let path = self.dataset_path(dataset);
        if !path.is_file() {
            return Err(IngestError::NotFound {
                dataset: dataset.to_string(),
                path,
            });
        }
        let df = read_table(&path)?;
        let filtered = apply_filters(&df, filters, dataset)?;
        info!(
            dataset,
            rows = filtered.height(),
            dropped = df.height() - filtered.height(),
            "fetched table"
        );
        Ok(filtered)
    }
}

/// Read a CSV file with a header row into a DataFrame of string columns.
pub fn read_table(path: &Path) -> Result<DataFrame> {
    let df = CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(Some(0))
        .try_into_reader_with_file_path(Some(path.to_path_buf()))?
        .finish()?;
    debug!(
        path = %path.display(),
        rows = df.height(),
        columns = df.width(),
        "read table"
    );
    Ok(df)
}

/// Keep the rows whose value in each filtered column is selected.
pub fn apply_filters(df: &DataFrame, filters: &Filters, table: &str) -> Result<DataFrame> {
    let active: Vec<(&str, &Selection)> = filters
        .iter()
        .filter(|(_, selection)| !matches!(selection, Selection::All))
        .map(|(column, selection)| (column.as_str(), selection))
        .collect();
    let names: Vec<&str> = filters.keys().map(String::as_str).collect();
    require_columns(df, &names, table)?;
    if active.is_empty() {
        return Ok(df.clone());
    }

    let mut keep = vec![true; df.height()];
    for (column, selection) in active {
        for (flag, value) in keep.iter_mut().zip(string_values(df, column)?) {
            *flag = *flag && selection.matches(&value);
        }
    }
    let mask = BooleanChunked::from_slice("keep".into(), &keep);
    Ok(df.filter(&mask)?)
}
