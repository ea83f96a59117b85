use thiserror::Error;

/// Errors produced by the store layer.
#[derive(Error, Debug)]
pub enum StoreError {
    /// Reading or writing the configuration file failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The file exists but is not a valid configuration record.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Key material is absent or cannot be decoded.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Failed to determine a platform data directory.
    #[error("Could not determine application data directory")]
    NoDataDir,
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, StoreError>;
