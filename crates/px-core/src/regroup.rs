//! Summing fine categories into coarse ones before comparison.
//!
//! A new table is often published at a finer level than the reference it is
//! checked against. [`regroup_sum`] maps one key column through a
//! classification grouping and sums the measures of rows that end up with
//! the same key.

use std::collections::BTreeMap;

use polars::prelude::*;
use tracing::debug;

use px_classification::Classification;
use px_ingest::{numeric_values, require_columns, string_values};
use px_model::PxError;

use crate::error::Result;
use crate::frame::add_optional;

/// Regroup `column` through `grouping` (value code to group label) and sum
/// `value_columns` per resulting key.
///
/// Every column that is not a value column is part of the key. Output rows
/// keep the first-seen order of their keys. A code missing from the grouping
/// fails with `UnknownValueCode`.
pub fn regroup_sum(
    df: &DataFrame,
    column: &str,
    grouping: &BTreeMap<String, String>,
    value_columns: &[&str],
) -> Result<DataFrame> {
    require_columns(df, &[column], "frame")?;
    require_columns(df, value_columns, "frame")?;
    let key_columns: Vec<String> = df
        .get_column_names()
        .into_iter()
        .map(|name| name.to_string())
        .filter(|name| !value_columns.contains(&name.as_str()))
        .collect();

    let keys: Vec<Vec<String>> = key_columns
        .iter()
        .map(|name| string_values(df, name))
        .collect::<std::result::Result<_, _>>()?;
    let measures: Vec<Vec<Option<f64>>> = value_columns
        .iter()
        .map(|name| numeric_values(df, name))
        .collect::<std::result::Result<_, _>>()?;
    let slot = key_columns
        .iter()
        .position(|name| name == column)
        .ok_or_else(|| PxError::unknown_variable(column))?;

    let mut order: Vec<Vec<String>> = Vec::new();
    let mut sums: BTreeMap<Vec<String>, Vec<Option<f64>>> = BTreeMap::new();
    for idx in 0..df.height() {
        let mut key: Vec<String> = keys.iter().map(|values| values[idx].clone()).collect();
        let group = grouping
            .get(&key[slot])
            .ok_or_else(|| PxError::UnknownValueCode {
                variable: column.to_string(),
                code: key[slot].clone(),
            })?;
        key[slot] = group.clone();
        let entry = sums.entry(key.clone()).or_insert_with(|| {
            order.push(key);
            vec![None; measures.len()]
        });
        for (total, measure) in entry.iter_mut().zip(&measures) {
            *total = add_optional(*total, measure[idx]);
        }
    }
    debug!(
        column,
        rows = df.height(),
        groups = order.len(),
        "regrouped table"
    );

    let mut out: Vec<Column> = Vec::with_capacity(key_columns.len() + value_columns.len());
    for (pos, name) in key_columns.iter().enumerate() {
        let values: Vec<String> = order.iter().map(|key| key[pos].clone()).collect();
        out.push(Series::new(name.as_str().into(), values).into());
    }
    for (pos, name) in value_columns.iter().enumerate() {
        let values: Vec<Option<f64>> = order
            .iter()
            .map(|key| sums.get(key).and_then(|totals| totals[pos]))
            .collect();
        out.push(Series::new((*name).into(), values).into());
    }
    Ok(DataFrame::new(out)?)
}

/// [`regroup_sum`] with the grouping of one classification aggregation.
pub fn regroup_by_classification(
    df: &DataFrame,
    column: &str,
    classification: &Classification,
    aggregation: &str,
    value_columns: &[&str],
) -> Result<DataFrame> {
    let grouping = classification.grouping(aggregation).ok_or_else(|| {
        PxError::UnknownDomain {
            domain: format!("{}:{aggregation}", classification.name()),
        }
    })?;
    regroup_sum(df, column, &grouping, value_columns)
}
