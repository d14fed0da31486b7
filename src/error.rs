use thiserror::Error;
use aws_sdk_s3::primitives::ByteStreamError;
use parquet::errors::ParquetError;
use arrow::error::ArrowError;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("HTTP error: {0}")]
    Http(#[from] rquest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("S3 error: {0}")]
    S3(#[from] aws_sdk_s3::Error),

    #[error("Rate limit exceeded")]
    RateLimit,

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Maximum retries exceeded")]
    MaxRetriesExceeded,

    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("ByteStream error: {0}")]
    ByteStream(#[from] ByteStreamError),

    #[error("Parquet error: {0}")]
    Parquet(#[from] ParquetError),

    #[error("Arrow error: {0}")]
    Arrow(#[from] ArrowError),

    #[error("{kind} '{id}' not found")]
    NotFound { kind: &'static str, id: String },

    #[error("Invalid input: {0}")]
    Validation(String),

    #[error("No livestock category named '{0}'")]
    UnknownCategory(String),

    #[error("Insufficient stock for {category}: requested {requested}, available {available}")]
    InsufficientStock {
        category: String,
        requested: u32,
        available: i64,
    },

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Upstream error: {0}")]
    Upstream(String),
}

impl Error {
    /// Failures worth retrying: rate limits, transport errors and upstream 5xx.
    pub fn is_transient(&self) -> bool {
        matches!(self, Error::RateLimit | Error::Http(_) | Error::Upstream(_) | Error::Io(_))
    }

    pub fn not_found(kind: &'static str, id: impl Into<String>) -> Self {
        Error::NotFound { kind, id: id.into() }
    }
}
