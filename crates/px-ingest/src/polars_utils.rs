//! Polars AnyValue helpers.
//!
//! Tables are read with every column as text, so most callers go through
//! [`any_to_string`] for keys and [`any_to_f64`] for measures.

use polars::prelude::*;

use crate::error::{IngestError, Result};

/// Converts a Polars AnyValue to a String representation.
/// Returns empty string for Null, formats floats without a trailing `.0`.
pub fn any_to_string(value: AnyValue<'_>) -> String {
    match value {
        AnyValue::Null => String::new(),
        AnyValue::Int8(v) => v.to_string(),
        AnyValue::Int16(v) => v.to_string(),
        AnyValue::Int32(v) => v.to_string(),
        AnyValue::Int64(v) => v.to_string(),
        AnyValue::UInt8(v) => v.to_string(),
        AnyValue::UInt16(v) => v.to_string(),
        AnyValue::UInt32(v) => v.to_string(),
        AnyValue::UInt64(v) => v.to_string(),
        AnyValue::Float32(v) => format_numeric(f64::from(v)),
        AnyValue::Float64(v) => format_numeric(v),
        AnyValue::String(s) => s.to_string(),
        AnyValue::StringOwned(s) => s.to_string(),
        other => other.to_string(),
    }
}

/// Formats a number in its shortest form (`3`, `2.5`).
pub fn format_numeric(v: f64) -> String {
    if v == 0.0 {
        return "0".to_string();
    }
    format!("{v}")
}

/// Converts an AnyValue to f64, returning None for non-numeric or null values.
pub fn any_to_f64(value: AnyValue<'_>) -> Option<f64> {
    match value {
        AnyValue::Null => None,
        AnyValue::Int8(v) => Some(f64::from(v)),
        AnyValue::Int16(v) => Some(f64::from(v)),
        AnyValue::Int32(v) => Some(f64::from(v)),
        AnyValue::Int64(v) => Some(v as f64),
        AnyValue::UInt8(v) => Some(f64::from(v)),
        AnyValue::UInt16(v) => Some(f64::from(v)),
        AnyValue::UInt32(v) => Some(f64::from(v)),
        AnyValue::UInt64(v) => Some(v as f64),
        AnyValue::Float32(v) => Some(f64::from(v)),
        AnyValue::Float64(v) => Some(v),
        AnyValue::String(s) => parse_f64(s),
        AnyValue::StringOwned(s) => parse_f64(&s),
        _ => None,
    }
}

/// Parses a string as f64, returning None for invalid or empty strings.
pub fn parse_f64(value: &str) -> Option<f64> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return None;
    }
    trimmed.parse::<f64>().ok()
}

/// Fails with `MissingColumn` unless every name is a column of `df`.
pub fn require_columns(df: &DataFrame, columns: &[&str], table: &str) -> Result<()> {
    for column in columns {
        if df.column(column).is_err() {
            return Err(IngestError::MissingColumn {
                column: (*column).to_string(),
                table: table.to_string(),
            });
        }
    }
    Ok(())
}

/// All values of a column as trimmed strings.
pub fn string_values(df: &DataFrame, column: &str) -> Result<Vec<String>> {
    let series = df.column(column)?;
    Ok((0..df.height())
        .map(|idx| any_to_string(series.get(idx).unwrap_or(AnyValue::Null)).trim().to_string())
        .collect())
}

/// All values of a column as numbers; blanks and non-numeric text are `None`.
pub fn numeric_values(df: &DataFrame, column: &str) -> Result<Vec<Option<f64>>> {
    let series = df.column(column)?;
    Ok((0..df.height())
        .map(|idx| any_to_f64(series.get(idx).unwrap_or(AnyValue::Null)))
        .collect())
}
