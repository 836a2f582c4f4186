//! Error types for table ingestion.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while loading tables and classification rows.
#[derive(Debug, Error)]
pub enum IngestError {
    /// Failed to read a file.
    #[error("failed to read file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Polars could not read or transform a table.
    #[error("table operation failed: {message}")]
    Polars { message: String },

    /// The csv reader rejected a record.
    #[error("failed to parse CSV {path}: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    /// A required column is absent.
    #[error("required column '{column}' not found in {table}")]
    MissingColumn { column: String, table: String },

    /// The provider has no dataset at this path.
    #[error("dataset '{dataset}' not found at {path}")]
    NotFound { dataset: String, path: PathBuf },

    /// Loaded rows do not form a valid classification.
    #[error(transparent)]
    Model(#[from] px_model::PxError),
}

impl From<polars::prelude::PolarsError> for IngestError {
    fn from(err: polars::prelude::PolarsError) -> Self {
        Self::Polars {
            message: err.to_string(),
        }
    }
}

/// Result type for ingestion operations.
pub type Result<T> = std::result::Result<T, IngestError>;
