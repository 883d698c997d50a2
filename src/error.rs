use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum MonitorError {
    #[error("Dataset not found: {0}")]
    DatasetNotFound(PathBuf),

    #[error("Dataset {0} has no header row")]
    MissingHeader(PathBuf),

    #[error("Column {column} is not present in the dataset")]
    MissingColumn { column: String },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error(transparent)]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}
