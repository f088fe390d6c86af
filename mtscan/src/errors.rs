use thiserror::Error;

/// Result alias used throughout the crate.
pub type ScanResult<T> = std::result::Result<T, ScanError>;

/// Errors surfaced by the scan core and the reference CLI.
#[derive(Debug, Error)]
pub enum ScanError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("input unavailable: {0}")]
    Input(String),
    #[error("invalid pattern: {0}")]
    InvalidPattern(String),
    #[error("configuration error: {0}")]
    Config(String),
    #[error("worker failure: {0}")]
    Worker(String),
    #[error("sink failure: {0}")]
    Sink(String),
}

impl ScanError {
    pub fn input(msg: impl Into<String>) -> Self {
        ScanError::Input(msg.into())
    }

    pub fn invalid_pattern(msg: impl Into<String>) -> Self {
        ScanError::InvalidPattern(msg.into())
    }

    pub fn config_error(msg: impl Into<String>) -> Self {
        ScanError::Config(msg.into())
    }

    pub fn worker(msg: impl Into<String>) -> Self {
        ScanError::Worker(msg.into())
    }

    pub fn sink(msg: impl Into<String>) -> Self {
        ScanError::Sink(msg.into())
    }
}
