//! BucketView Error Types

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// Result type alias for BucketView operations
pub type Result<T> = std::result::Result<T, Error>;

/// BucketView error types
#[derive(Error, Debug)]
pub enum Error {
    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid configuration file: {0}")]
    ConfigParse(#[from] toml::de::Error),

    // Storage errors
    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Object {key} not found in bucket {bucket}")]
    NotFound { bucket: String, key: String },

    #[error("Bucket not found: {0}")]
    BucketNotFound(String),

    // Request errors
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    // Network errors
    #[error("Network error: {0}")]
    Network(String),

    // I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// HTTP status this error is reported with
    pub fn status_code(&self) -> StatusCode {
        match self {
            Error::NotFound { .. } | Error::BucketNotFound(_) => StatusCode::NOT_FOUND,
            Error::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Short machine-readable code used in JSON error bodies
    pub fn code(&self) -> &'static str {
        match self {
            Error::Config(_) | Error::ConfigParse(_) => "ConfigError",
            Error::Storage(_) => "StorageUnavailable",
            Error::NotFound { .. } | Error::BucketNotFound(_) => "NotFound",
            Error::InvalidRequest(_) => "InvalidRequest",
            Error::Network(_) => "NetworkError",
            Error::Io(_) => "IoError",
        }
    }
}

impl From<s3::error::S3Error> for Error {
    fn from(e: s3::error::S3Error) -> Self {
        Error::Storage(e.to_string())
    }
}

impl From<s3::creds::error::CredentialsError> for Error {
    fn from(e: s3::creds::error::CredentialsError) -> Self {
        Error::Config(format!("invalid storage credentials: {}", e))
    }
}

/// Error body returned by the JSON API
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        tracing::error!("{}", self);
        let body = ErrorResponse {
            error: self.to_string(),
            code: self.code().to_string(),
        };
        (self.status_code(), Json(body)).into_response()
    }
}
