use thiserror::Error;

use crate::types::CellId;

#[derive(Error, Debug)]
pub enum SimError {
    #[error("Cannot read {path}: {source}")]
    ConfigRead {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid configuration '{field}': {reason}")]
    InvalidConfig { field: String, reason: String },

    #[error("Invalid setup for cell {cell}: {reason}")]
    InvalidCell { cell: CellId, reason: String },

    #[error("Shape mismatch in {what}: expected {expected} values, got {actual}")]
    ShapeMismatch {
        what: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl SimError {
    pub(crate) fn config(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidConfig {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

pub type SimResult<T> = Result<T, SimError>;
