use std::path::PathBuf;

use thiserror::Error;

/// Workspace-wide error type for all experiment operations.
#[derive(Debug, Error)]
pub enum LabError {
    #[error("Shape mismatch: expected {expected:?}, got {got:?}")]
    ShapeMismatch {
        expected: Vec<usize>,
        got: Vec<usize>,
    },

    #[error("Column not found: {0}")]
    ColumnNotFound(String),

    #[error("Column '{column}' is not {expected}")]
    ColumnType {
        column: String,
        expected: &'static str,
    },

    #[error("Not fitted: call fit() before {0}")]
    NotFitted(&'static str),

    #[error("Unknown parameter '{name}' for {target}")]
    UnknownParam { target: &'static str, name: String },

    #[error("Invalid value for parameter '{name}': {reason}")]
    InvalidParam { name: String, reason: String },

    #[error("Empty frame")]
    EmptyFrame,

    #[error("Invalid operation: {0}")]
    InvalidOperation(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse {path}: {message}")]
    Parse { path: PathBuf, message: String },

    #[error("Serialization error: {0}")]
    Serialize(String),
}

pub type LabResult<T> = Result<T, LabError>;
