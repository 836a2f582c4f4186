//! PX table production.
//!
//! - [`microdata`]: frequency tables, totals and documents from microdata
//! - [`data`]: filling a document's cube from a keyed table
//! - [`regroup`]: summing fine categories into classification groups
//! - [`translation`]: CSV interchange for translators

pub mod data;
pub mod error;
mod frame;
pub mod microdata;
pub mod regroup;
pub mod translation;

pub use data::attach_data;
pub use error::{CoreError, Result};
pub use frame::sort_codes;
pub use microdata::{
    DEFAULT_COUNT_COLUMN, DEFAULT_TOTAL_CODE, MicrodataOptions, add_totals, frequency_table,
    from_microdata, from_table,
};
pub use regroup::{regroup_by_classification, regroup_sum};
pub use translation::{export_for_translation, import_from_translation};
