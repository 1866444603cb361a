use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AggregateError {
    #[error("Raw file not found: {}", path.display())]
    FileNotFound { path: PathBuf },
    #[error("Missing column {column} in {}", path.display())]
    MissingColumn { column: String, path: PathBuf },
    #[error("Invalid value {value:?} in column {column} of {}", path.display())]
    InvalidValue {
        value: String,
        column: String,
        path: PathBuf,
    },
    #[error("Column {column} has no values to reduce")]
    EmptySample { column: String },
    #[error("Workload list {} is empty", path.display())]
    EmptyWorkloadList { path: PathBuf },
    #[error("Default policy {0} is not one of the requested policies")]
    UnknownDefaultPolicy(String),
    #[error("Invalid metric rule pattern {pattern:?}")]
    InvalidRule {
        pattern: String,
        #[source]
        source: regex::Error,
    },
    #[error(transparent)]
    Csv(#[from] csv::Error),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Yaml(#[from] serde_yml::Error),
}

pub type Result<T, E = AggregateError> = std::result::Result<T, E>;
