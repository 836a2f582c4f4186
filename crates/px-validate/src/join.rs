//! Left outer join of two tables on shared key columns.
//!
//! Keys are compared as trimmed strings, so `"0301"` and `" 0301"` match
//! while numeric columns are normalised through their shortest text form.
//! Every non-key column becomes a numeric measure; text that does not
//! parse as a number is carried as missing.

use std::collections::{BTreeMap, BTreeSet};

use polars::prelude::{AnyValue, Column, DataFrame, NamedFrom, Series};
use serde::Serialize;
use tracing::{debug, warn};

use px_ingest::{any_to_f64, any_to_string};

use crate::error::{Result, ValidateError};

/// Suffix appended to right-hand measures whose name is taken on the left.
pub const RIGHT_SUFFIX: &str = "_right";

/// One left row and the right row sharing its key, if any.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JoinedRow {
    pub key: Vec<String>,
    /// Values aligned with [`JoinedTable::measures`].
    pub values: Vec<Option<f64>>,
    pub matched: bool,
}

/// Result of [`join`].
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct JoinedTable {
    pub keys: Vec<String>,
    /// Left measures first, then right measures under their joined names.
    pub measures: Vec<String>,
    pub rows: Vec<JoinedRow>,
    /// Right keys that no left row asked for, in right table order.
    pub unmatched_right: Vec<Vec<String>>,
    right_names: BTreeMap<String, String>,
}

impl JoinedTable {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Position of a measure by its joined name.
    pub fn measure_index(&self, name: &str) -> Option<usize> {
        self.measures.iter().position(|m| m == name)
    }

    /// Joined name of a right-hand column (`value` may become `value_right`).
    pub fn right_column(&self, original: &str) -> Option<&str> {
        self.right_names.get(original).map(String::as_str)
    }

    /// Values of one measure, row by row.
    pub fn column(&self, name: &str) -> Option<Vec<Option<f64>>> {
        let idx = self.measure_index(name)?;
        Some(self.rows.iter().map(|row| row.values[idx]).collect())
    }

    pub fn unmatched_left(&self) -> usize {
        self.rows.iter().filter(|row| !row.matched).count()
    }

    /// Key columns as text, measures as nullable floats.
    pub fn to_frame(&self) -> Result<DataFrame> {
        let mut columns: Vec<Column> = Vec::with_capacity(self.keys.len() + self.measures.len());
        for (pos, key) in self.keys.iter().enumerate() {
            let values: Vec<String> = self.rows.iter().map(|row| row.key[pos].clone()).collect();
            columns.push(Series::new(key.as_str().into(), values).into());
        }
        for (pos, measure) in self.measures.iter().enumerate() {
            let values: Vec<Option<f64>> = self.rows.iter().map(|row| row.values[pos]).collect();
            columns.push(Series::new(measure.as_str().into(), values).into());
        }
        Ok(DataFrame::new(columns)?)
    }
}

struct Side<'a> {
    df: &'a DataFrame,
    name: &'static str,
    measures: Vec<String>,
}

impl<'a> Side<'a> {
    fn new(df: &'a DataFrame, name: &'static str, keys: &[String]) -> Result<Self> {
        let columns: Vec<String> = df
            .get_column_names()
            .iter()
            .map(|c| c.to_string())
            .collect();
        for key in keys {
            if !columns.contains(key) {
                return Err(ValidateError::MissingColumn {
                    column: key.clone(),
                    side: name.to_string(),
                });
            }
        }
        let measures = columns.into_iter().filter(|c| !keys.contains(c)).collect();
        Ok(Self { df, name, measures })
    }

    fn key_rows(&self, keys: &[String]) -> Result<Vec<Vec<String>>> {
        let series: Vec<&Column> = keys
            .iter()
            .map(|key| self.df.column(key))
            .collect::<std::result::Result<_, _>>()?;
        Ok((0..self.df.height())
            .map(|idx| {
                series
                    .iter()
                    .map(|s| any_to_string(s.get(idx).unwrap_or(AnyValue::Null)).trim().to_string())
                    .collect()
            })
            .collect())
    }

    fn measure_values(&self, idx: usize) -> Result<Vec<Option<f64>>> {
        self.measures
            .iter()
            .map(|name| {
                let column = self.df.column(name)?;
                Ok(any_to_f64(column.get(idx).unwrap_or(AnyValue::Null)))
            })
            .collect()
    }
}

/// Left outer join of `left` and `right` on `keys`.
///
/// Every left row appears once in left order. Left keys without a partner
/// carry missing right values; right keys without a partner are listed in
/// [`JoinedTable::unmatched_right`]. A key repeated on the right side fails
/// with [`ValidateError::DuplicateKey`].
pub fn join(left: &DataFrame, right: &DataFrame, keys: &[String]) -> Result<JoinedTable> {
    let left_side = Side::new(left, "left", keys)?;
    let right_side = Side::new(right, "right", keys)?;

    let right_keys = right_side.key_rows(keys)?;
    let mut right_index: BTreeMap<Vec<String>, usize> = BTreeMap::new();
    for (idx, key) in right_keys.iter().enumerate() {
        if right_index.insert(key.clone(), idx).is_some() {
            return Err(ValidateError::DuplicateKey { key: key.clone() });
        }
    }

    let mut right_names = BTreeMap::new();
    let mut measures = left_side.measures.clone();
    for name in &right_side.measures {
        let joined = if left_side.measures.contains(name) {
            format!("{name}{RIGHT_SUFFIX}")
        } else {
            name.clone()
        };
        right_names.insert(name.clone(), joined.clone());
        measures.push(joined);
    }

    let mut used: BTreeSet<usize> = BTreeSet::new();
    let mut rows = Vec::with_capacity(left.height());
    for (idx, key) in left_side.key_rows(keys)?.into_iter().enumerate() {
        let mut values = left_side.measure_values(idx)?;
        let partner = right_index.get(&key).copied();
        match partner {
            Some(right_idx) => {
                used.insert(right_idx);
                values.extend(right_side.measure_values(right_idx)?);
            }
            None => values.extend(std::iter::repeat_n(None, right_side.measures.len())),
        }
        rows.push(JoinedRow {
            key,
            values,
            matched: partner.is_some(),
        });
    }

    let unmatched_right: Vec<Vec<String>> = right_keys
        .into_iter()
        .enumerate()
        .filter(|(idx, _)| !used.contains(idx))
        .map(|(_, key)| key)
        .collect();
    if !unmatched_right.is_empty() {
        warn!(
            count = unmatched_right.len(),
            side = right_side.name,
            first = %unmatched_right[0].join("/"),
            "keys without a left partner"
        );
    }

    let table = JoinedTable {
        keys: keys.to_vec(),
        measures,
        rows,
        unmatched_right,
        right_names,
    };
    debug!(
        side = left_side.name,
        rows = table.len(),
        unmatched_left = table.unmatched_left(),
        "joined tables"
    );
    Ok(table)
}
