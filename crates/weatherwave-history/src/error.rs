use std::path::PathBuf;

use weatherwave_core::{AppError, DatasetError};

/// Historical dataset errors
#[derive(Debug, thiserror::Error)]
pub enum HistoryError {
    #[error("Dataset not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("Failed to read dataset: {0}")]
    Csv(#[from] csv::Error),

    #[error("Line {line}: {message}")]
    Malformed { line: u64, message: String },

    #[error("Unknown column: {0}")]
    UnknownColumn(String),

    #[error("Dataset has no rows")]
    Empty,
}

impl From<HistoryError> for AppError {
    fn from(e: HistoryError) -> Self {
        match e {
            HistoryError::NotFound(path) => {
                AppError::Dataset(DatasetError::NotFound(path.display().to_string()))
            }
            HistoryError::UnknownColumn(name) => AppError::Dataset(DatasetError::UnknownColumn(name)),
            other => AppError::Dataset(DatasetError::Malformed(other.to_string())),
        }
    }
}
