use std::path::PathBuf;

use thiserror::Error;

/// I/O layer result type
pub type Result<T> = std::result::Result<T, IoError>;

/// Errors raised while reading configuration and cases or writing tables.
#[derive(Debug, Error)]
pub enum IoError {
    #[error(transparent)]
    Engine(#[from] ensquant_core::Error),

    #[error("{path}: {source}")]
    File {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{path}:{line}: {message}")]
    Config {
        path: PathBuf,
        line: usize,
        message: String,
    },

    #[error("invalid configuration: {0}")]
    Invalid(String),

    #[error("failed to load case {path}: {message}")]
    Load { path: PathBuf, message: String },

    #[error("invalid case file pattern `{pattern}`: {source}")]
    Pattern {
        pattern: String,
        #[source]
        source: glob::PatternError,
    },

    #[error("timestamp {0} cannot be represented as a calendar date")]
    Timestamp(f64),

    #[error(transparent)]
    Parquet(#[from] parquet::errors::ParquetError),

    #[error(transparent)]
    Arrow(#[from] arrow::error::ArrowError),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl IoError {
    pub(crate) fn file(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        IoError::File {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn load(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        IoError::Load {
            path: path.into(),
            message: message.into(),
        }
    }
}
