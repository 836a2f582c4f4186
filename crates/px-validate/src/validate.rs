//! One-call composition of join, percent change and threshold.
//!
//! The same check serves period-over-period comparison of one table and
//! comparison of two tables sharing dimensions. When one side is finer
//! than the other, the caller sums it into the coarser grouping first.

use polars::prelude::DataFrame;
use serde::Serialize;
use tracing::info;

use crate::compare::{ValidationResult, check_threshold, compute_percent_change};
use crate::error::{Result, ValidateError};
use crate::join::join;

/// What to join on and which measures to compare.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComparisonSpec {
    pub keys: Vec<String>,
    pub left_value: String,
    /// Name in the right table; resolved to its joined name internally.
    pub right_value: String,
    /// Tolerated absolute percent change.
    pub threshold: f64,
}

impl ComparisonSpec {
    pub fn new<I, S>(keys: I, value: &str, threshold: f64) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            keys: keys.into_iter().map(Into::into).collect(),
            left_value: value.to_string(),
            right_value: value.to_string(),
            threshold,
        }
    }

    pub fn with_right_value(mut self, value: &str) -> Self {
        self.right_value = value.to_string();
        self
    }
}

/// Joins `left` and `right`, computes percent change and applies the threshold.
pub fn validate(
    left: &DataFrame,
    right: &DataFrame,
    spec: &ComparisonSpec,
) -> Result<ValidationResult> {
    if !spec.threshold.is_finite() || spec.threshold < 0.0 {
        return Err(ValidateError::InvalidThreshold {
            threshold: spec.threshold,
        });
    }
    if spec.keys.contains(&spec.left_value) || left.column(&spec.left_value).is_err() {
        return Err(ValidateError::MissingColumn {
            column: spec.left_value.clone(),
            side: "left".to_string(),
        });
    }
    let joined = join(left, right, &spec.keys)?;
    let right_col = joined
        .right_column(&spec.right_value)
        .ok_or_else(|| ValidateError::MissingColumn {
            column: spec.right_value.clone(),
            side: "right".to_string(),
        })?
        .to_string();

    let changes = compute_percent_change(&joined, &spec.left_value, &right_col)?;
    let result = check_threshold(joined, changes, spec.threshold)?;
    info!(
        verdict = ?result.verdict,
        threshold = spec.threshold,
        rows = result.compared,
        violations = result.violations.len(),
        non_finite = result.non_finite.len(),
        "comparison finished"
    );
    Ok(result)
}

