//! Error types for PX production.

use thiserror::Error;

use px_ingest::IngestError;
use px_model::PxError;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error(transparent)]
    Model(#[from] PxError),

    #[error(transparent)]
    Ingest(#[from] IngestError),

    #[error("table operation failed: {message}")]
    Polars { message: String },

    #[error("translation CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error("translation file line {line}: {message}")]
    Translation { line: u64, message: String },
}

impl From<polars::prelude::PolarsError> for CoreError {
    fn from(err: polars::prelude::PolarsError) -> Self {
        Self::Polars {
            message: err.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, CoreError>;
