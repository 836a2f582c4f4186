//! Filling a document's data cube from a keyed table.

use std::collections::BTreeSet;

use polars::prelude::*;
use tracing::debug;

use px_ingest::{numeric_values, require_columns, string_values};
use px_model::{Document, PxError};

use crate::error::Result;

/// Replace the document's data with the values of `value_column`.
///
/// The frame has one column per variable, named by variable code. Each row
/// addresses one cell; cells without a row stay missing. A row naming an
/// unknown value code fails with `UnknownValueCode`, two rows for the same
/// cell with `DuplicateCell`.
pub fn attach_data(doc: &mut Document, df: &DataFrame, value_column: &str) -> Result<()> {
    let codes: Vec<String> = doc.variables().iter().map(|v| v.code().to_string()).collect();
    let names: Vec<&str> = codes.iter().map(String::as_str).collect();
    require_columns(df, &names, "data")?;
    require_columns(df, &[value_column], "data")?;

    let columns: Vec<Vec<String>> = names
        .iter()
        .map(|name| string_values(df, name))
        .collect::<std::result::Result<_, _>>()?;
    let values = numeric_values(df, value_column)?;

    let mut cells = vec![None; doc.shape().cell_count()];
    let mut seen = BTreeSet::new();
    for (idx, value) in values.into_iter().enumerate() {
        let row: Vec<&str> = columns.iter().map(|column| column[idx].as_str()).collect();
        let cell = doc.cell_index(&row)?;
        if !seen.insert(cell) {
            return Err(PxError::DuplicateCell {
                codes: row.iter().map(|code| (*code).to_string()).collect(),
            }
            .into());
        }
        cells[cell] = value;
    }

    let missing = cells.len() - seen.len();
    doc.set_data(cells)?;
    debug!(rows = df.height(), missing, "attached data");
    Ok(())
}
