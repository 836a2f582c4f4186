//! Frequency tables and totals from microdata.
//!
//! Microdata has one row per observation. [`frequency_table`] counts rows per
//! key combination, [`add_totals`] appends total rows for one variable and
//! [`from_microdata`] turns the result into a [`Document`]. Tables that are
//! already aggregated go through [`from_table`].

use std::collections::{BTreeMap, BTreeSet};

use polars::prelude::*;
use tracing::{debug, info};

use px_ingest::{numeric_values, require_columns, string_values};
use px_model::{Document, Placement, PxError};

use crate::data::attach_data;
use crate::error::Result;
use crate::frame::{add_optional, keyed_frame, sort_codes};

/// Default value code of synthesized totals.
pub const DEFAULT_TOTAL_CODE: &str = "Total";

/// Default name of the frequency column.
pub const DEFAULT_COUNT_COLUMN: &str = "count";

/// How [`from_microdata`] shapes the document.
#[derive(Debug, Clone)]
pub struct MicrodataOptions {
    /// Primary language of the new document.
    pub language: String,
    /// Key columns placed in the heading; the others form the stub.
    pub heading: Vec<String>,
    /// Key columns that get a total value code, applied in order.
    pub totals: Vec<String>,
    pub total_code: String,
    pub count_column: String,
}

impl Default for MicrodataOptions {
    fn default() -> Self {
        Self {
            language: "en".to_string(),
            heading: Vec::new(),
            totals: Vec::new(),
            total_code: DEFAULT_TOTAL_CODE.to_string(),
            count_column: DEFAULT_COUNT_COLUMN.to_string(),
        }
    }
}

impl MicrodataOptions {
    pub fn new(language: impl Into<String>) -> Self {
        Self {
            language: language.into(),
            ..Self::default()
        }
    }

    pub fn with_heading<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.heading = columns.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_totals<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.totals = columns.into_iter().map(Into::into).collect();
        self
    }
}

/// Count rows per combination of `keys`.
///
/// The result has the key columns as text plus `count_column`, one row per
/// observed combination, sorted by key.
pub fn frequency_table(df: &DataFrame, keys: &[&str], count_column: &str) -> Result<DataFrame> {
    require_columns(df, keys, "microdata")?;
    let columns: Vec<Vec<String>> = keys
        .iter()
        .map(|key| string_values(df, key))
        .collect::<std::result::Result<_, _>>()?;

    let mut counts: BTreeMap<Vec<String>, f64> = BTreeMap::new();
    for idx in 0..df.height() {
        let combination: Vec<String> = columns.iter().map(|values| values[idx].clone()).collect();
        *counts.entry(combination).or_insert(0.0) += 1.0;
    }
    debug!(
        rows = df.height(),
        combinations = counts.len(),
        "built frequency table"
    );
    let rows: Vec<(Vec<String>, Option<f64>)> = counts
        .into_iter()
        .map(|(codes, count)| (codes, Some(count)))
        .collect();
    keyed_frame(keys, &rows, count_column)
}

/// Append total rows for `variable`.
///
/// For every combination of the other keys, a row with `variable` set to
/// `total_code` holds the sum of the values sharing that combination. The
/// result keeps only the key columns and `value_column`.
pub fn add_totals(
    df: &DataFrame,
    keys: &[&str],
    value_column: &str,
    variable: &str,
    total_code: &str,
) -> Result<DataFrame> {
    require_columns(df, keys, "frame")?;
    require_columns(df, &[value_column], "frame")?;
    let slot = keys
        .iter()
        .position(|key| *key == variable)
        .ok_or_else(|| PxError::unknown_variable(variable))?;

    let columns: Vec<Vec<String>> = keys
        .iter()
        .map(|key| string_values(df, key))
        .collect::<std::result::Result<_, _>>()?;
    let values = numeric_values(df, value_column)?;

    let mut rows: Vec<(Vec<String>, Option<f64>)> = Vec::with_capacity(df.height());
    let mut totals: BTreeMap<Vec<String>, Option<f64>> = BTreeMap::new();
    for (idx, value) in values.into_iter().enumerate() {
        let codes: Vec<String> = columns.iter().map(|column| column[idx].clone()).collect();
        if codes[slot] == total_code {
            return Err(PxError::DuplicateCode {
                code: total_code.to_string(),
                context: format!("values of '{variable}'"),
            }
            .into());
        }
        let mut total_key = codes.clone();
        total_key[slot] = total_code.to_string();
        let entry = totals.entry(total_key).or_insert(None);
        *entry = add_optional(*entry, value);
        rows.push((codes, value));
    }
    debug!(variable, totals = totals.len(), "added totals");
    rows.extend(totals);
    keyed_frame(keys, &rows, value_column)
}

/// Build a document from microdata.
///
/// Each key column becomes a variable whose value codes are the observed
/// values, sorted. Variables listed in `options.totals` get a total code,
/// placed first and used as the elimination value. Cells for unobserved
/// combinations stay missing.
pub fn from_microdata(df: &DataFrame, keys: &[&str], options: &MicrodataOptions) -> Result<Document> {
    let table = frequency_table(df, keys, &options.count_column)?;
    let doc = from_table(&table, keys, &options.count_column, options)?;
    info!(
        observations = df.height(),
        variables = keys.len(),
        cells = doc.shape().cell_count(),
        "built document from microdata"
    );
    Ok(doc)
}

/// Build a document from an already aggregated table.
///
/// `df` holds one row per key combination with its value in
/// `value_column`. Codes, totals and placement follow [`from_microdata`].
pub fn from_table(
    df: &DataFrame,
    keys: &[&str],
    value_column: &str,
    options: &MicrodataOptions,
) -> Result<Document> {
    let mut table = df.clone();
    for variable in &options.totals {
        table = add_totals(&table, keys, value_column, variable, &options.total_code)?;
    }

    let mut doc = Document::new(&options.language)?;
    for key in keys {
        let with_total = options.totals.iter().any(|total| total == key);
        let mut codes: Vec<String> = string_values(&table, key)?
            .into_iter()
            .filter(|code| !with_total || code != &options.total_code)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        sort_codes(&mut codes);
        if with_total {
            codes.insert(0, options.total_code.clone());
        }
        let placement = if options.heading.iter().any(|heading| heading == key) {
            Placement::Heading
        } else {
            Placement::Stub
        };
        doc.add_variable(key, placement, codes)?;
        if with_total {
            doc.set_elimination(key, Some(options.total_code.as_str()))?;
        }
    }
    attach_data(&mut doc, &table, value_column)?;
    debug!(rows = df.height(), variables = keys.len(), "built document from table");
    Ok(doc)
}
