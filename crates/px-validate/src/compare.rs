//! Percent change between joined measures and the threshold verdict.

use std::cmp::Ordering;

use polars::prelude::{Column, DataFrame, NamedFrom, Series};
use serde::Serialize;
use tracing::debug;

use crate::error::{Result, ValidateError};
use crate::join::JoinedTable;

/// Relative slack on the threshold, absorbing rounding in the ratio.
const THRESHOLD_TOLERANCE: f64 = 1e-9;

/// Whether `change` lies beyond `threshold` once rounding noise is allowed.
pub fn exceeds(change: f64, threshold: f64) -> bool {
    change.abs() > threshold * (1.0 + THRESHOLD_TOLERANCE)
}

/// Relative change of one joined row.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "kind", content = "percent", rename_all = "snake_case")]
pub enum PercentChange {
    Finite(f64),
    /// The left value is zero, so no ratio exists.
    ZeroBase,
    /// A value is absent on either side (or not a finite number).
    Missing,
}

impl PercentChange {
    /// `(right - left) * 100 / left`.
    pub fn between(left: Option<f64>, right: Option<f64>) -> Self {
        let Some(left) = left.filter(|v| v.is_finite()) else {
            return Self::Missing;
        };
        if left == 0.0 {
            return Self::ZeroBase;
        }
        let Some(right) = right.filter(|v| v.is_finite()) else {
            return Self::Missing;
        };
        let change = (right - left) * 100.0 / left;
        if change.is_finite() {
            Self::Finite(change)
        } else {
            Self::Missing
        }
    }

    pub fn value(self) -> Option<f64> {
        match self {
            Self::Finite(v) => Some(v),
            Self::ZeroBase | Self::Missing => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Finite(_) => "finite",
            Self::ZeroBase => "zero_base",
            Self::Missing => "missing",
        }
    }
}

/// Percent change per joined row, aligned with `joined.rows`.
pub fn compute_percent_change(
    joined: &JoinedTable,
    left_col: &str,
    right_col: &str,
) -> Result<Vec<PercentChange>> {
    let left = joined
        .column(left_col)
        .ok_or_else(|| ValidateError::MissingColumn {
            column: left_col.to_string(),
            side: "left".to_string(),
        })?;
    let right = joined
        .column(right_col)
        .ok_or_else(|| ValidateError::MissingColumn {
            column: right_col.to_string(),
            side: "right".to_string(),
        })?;
    Ok(left
        .into_iter()
        .zip(right)
        .map(|(l, r)| PercentChange::between(l, r))
        .collect())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Verdict {
    Pass,
    Fail,
}

/// A row whose finite change exceeds the threshold.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Violation {
    pub key: Vec<String>,
    pub percent_change: f64,
}

/// A row without a finite change.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NonFiniteRow {
    pub key: Vec<String>,
    pub reason: PercentChange,
}

/// Outcome of a threshold check.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidationResult {
    pub verdict: Verdict,
    pub threshold: f64,
    pub compared: usize,
    pub max_abs_change: Option<f64>,
    /// Sorted by descending absolute change, then by key.
    pub violations: Vec<Violation>,
    /// In joined row order.
    pub non_finite: Vec<NonFiniteRow>,
    pub unmatched_right: Vec<Vec<String>>,
    #[serde(skip)]
    pub joined: JoinedTable,
    #[serde(skip)]
    pub changes: Vec<PercentChange>,
}

impl ValidationResult {
    pub fn passed(&self) -> bool {
        self.verdict == Verdict::Pass
    }

    /// Turns a FAIL verdict into an error for callers treating the check as fatal.
    pub fn into_result(self) -> Result<Self> {
        if self.passed() {
            return Ok(self);
        }
        if let Some(first) = self.non_finite.first() {
            return Err(ValidateError::NonFiniteComparison {
                count: self.non_finite.len(),
                first: first.key.clone(),
            });
        }
        let first = self.violations.first().map(|v| v.key.clone()).unwrap_or_default();
        Err(ValidateError::ThresholdExceeded {
            count: self.violations.len(),
            threshold: self.threshold,
            max_abs_change: self.violations.first().map_or(0.0, |v| v.percent_change),
            first,
        })
    }

    /// Joined rows with `percent_change` and `status` columns appended.
    pub fn report_frame(&self) -> Result<DataFrame> {
        let mut df = self.joined.to_frame()?;
        let percent: Vec<Option<f64>> = self.changes.iter().map(|c| c.value()).collect();
        let status: Vec<&str> = self
            .changes
            .iter()
            .map(|change| match change.value() {
                Some(v) if exceeds(v, self.threshold) => "exceeds",
                Some(_) => "ok",
                None => change.as_str(),
            })
            .collect();
        df.with_column(Column::from(Series::new("percent_change".into(), percent)))?;
        df.with_column(Column::from(Series::new("status".into(), status)))?;
        Ok(df)
    }
}

fn by_magnitude(a: &Violation, b: &Violation) -> Ordering {
    b.percent_change
        .abs()
        .total_cmp(&a.percent_change.abs())
        .then_with(|| a.key.cmp(&b.key))
}

/// Verdict over `changes` (aligned with `joined.rows`).
///
/// PASS iff every change is finite and none exceeds `threshold` in
/// absolute value; the boundary is inclusive, see [`exceeds`].
pub fn check_threshold(
    joined: JoinedTable,
    changes: Vec<PercentChange>,
    threshold: f64,
) -> Result<ValidationResult> {
    if !threshold.is_finite() || threshold < 0.0 {
        return Err(ValidateError::InvalidThreshold { threshold });
    }

    let mut violations = Vec::new();
    let mut non_finite = Vec::new();
    let mut max_abs_change: Option<f64> = None;
    for (row, change) in joined.rows.iter().zip(&changes) {
        match change {
            PercentChange::Finite(v) => {
                max_abs_change = Some(max_abs_change.map_or(v.abs(), |m| m.max(v.abs())));
                if exceeds(*v, threshold) {
                    violations.push(Violation {
                        key: row.key.clone(),
                        percent_change: *v,
                    });
                }
            }
            reason => non_finite.push(NonFiniteRow {
                key: row.key.clone(),
                reason: *reason,
            }),
        }
    }
    violations.sort_by(by_magnitude);

    let verdict = if violations.is_empty() && non_finite.is_empty() {
        Verdict::Pass
    } else {
        Verdict::Fail
    };
    debug!(
        ?verdict,
        compared = changes.len(),
        violations = violations.len(),
        non_finite = non_finite.len(),
        "threshold check"
    );

    Ok(ValidationResult {
        verdict,
        threshold,
        compared: changes.len(),
        max_abs_change,
        violations,
        non_finite,
        unmatched_right: joined.unmatched_right.clone(),
        joined,
        changes,
    })
}
