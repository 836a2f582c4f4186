//! Error types for cross-table validation.

use thiserror::Error;

/// Errors raised while joining and comparing tables.
#[derive(Debug, Error)]
pub enum ValidateError {
    /// A key or value column is absent from one side.
    #[error("column '{column}' not found in {side} table")]
    MissingColumn { column: String, side: String },

    /// The right table holds the same key more than once.
    #[error("duplicate key {} in right table", .key.join("/"))]
    DuplicateKey { key: Vec<String> },

    /// Thresholds must be finite and non-negative.
    #[error("invalid threshold {threshold}: must be a finite, non-negative percentage")]
    InvalidThreshold { threshold: f64 },

    /// Some rows had no computable percent change.
    #[error("{count} rows could not be compared (first: {})", .first.join("/"))]
    NonFiniteComparison { count: usize, first: Vec<String> },

    /// Some rows changed by more than the threshold.
    #[error("{count} rows exceed {threshold}% (largest: {max_abs_change:.3}% at {})", .first.join("/"))]
    ThresholdExceeded {
        count: usize,
        threshold: f64,
        max_abs_change: f64,
        first: Vec<String>,
    },

    /// Polars failed to build a report frame.
    #[error("table operation failed: {message}")]
    Polars { message: String },
}

impl From<polars::prelude::PolarsError> for ValidateError {
    fn from(err: polars::prelude::PolarsError) -> Self {
        Self::Polars {
            message: err.to_string(),
        }
    }
}

/// Result type for validation operations.
pub type Result<T> = std::result::Result<T, ValidateError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_are_joined_with_slashes() {
        let err = ValidateError::DuplicateKey {
            key: vec!["0301".to_string(), "2024".to_string()],
        };
        assert_eq!(err.to_string(), "duplicate key 0301/2024 in right table");
    }

    #[test]
    fn exceeded_reports_largest_change() {
        let err = ValidateError::ThresholdExceeded {
            count: 2,
            threshold: 10.0,
            max_abs_change: -99.99496,
            first: vec!["Total".to_string()],
        };
        assert_eq!(
            err.to_string(),
            "2 rows exceed 10% (largest: -99.995% at Total)"
        );
    }
}
