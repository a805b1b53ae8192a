//! Unified error type for the election monitor core.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum MonitorError {
    #[error("request to {url} failed: {message}")]
    Network { url: String, message: String },

    #[error("no election data for {0}")]
    NotFound(String),

    #[error("malformed election data: {0}")]
    MalformedData(String),

    #[error("invalid country selection: {0}")]
    InvalidCountry(String),

    #[error("config error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl MonitorError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, MonitorError::NotFound(_))
    }
}

pub type Result<T> = std::result::Result<T, MonitorError>;
