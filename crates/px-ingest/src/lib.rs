//! Table ingestion for PX production and validation.
//!
//! Tables are loaded into polars DataFrames with every column as text;
//! numeric conversion happens where a column is used as a measure.

pub mod classification;
pub mod error;
pub mod polars_utils;
pub mod table;

pub use classification::{load_classification, read_classification_rows};
pub use error::{IngestError, Result};
pub use polars_utils::{
    any_to_f64, any_to_string, format_numeric, numeric_values, parse_f64, require_columns,
    string_values,
};
pub use table::{CsvTableProvider, Filters, Selection, TableProvider, apply_filters, read_table};
