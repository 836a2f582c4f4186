//! Cross-table validation for PX production.
//!
//! A new table is checked against a trusted one by joining both on their
//! shared dimension keys and comparing a measure row by row:
//!
//! - [`join`]: left outer join, so rows missing on the right surface as
//!   unmatched instead of disappearing
//! - [`compute_percent_change`]: `(right - left) * 100 / left`, with zero
//!   bases and missing values flagged rather than computed
//! - [`check_threshold`]: PASS/FAIL against a tolerance in percent
//! - [`validate`]: the three steps in one call

pub mod compare;
pub mod error;
pub mod join;
pub mod validate;

pub use compare::{
    NonFiniteRow, PercentChange, ValidationResult, Verdict, Violation, check_threshold,
    compute_percent_change, exceeds,
};
pub use error::{Result, ValidateError};
pub use join::{JoinedRow, JoinedTable, RIGHT_SUFFIX, join};
pub use validate::{ComparisonSpec, validate};
