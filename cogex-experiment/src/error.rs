use std::path::PathBuf;

use cogex_core::ConfigError;
use thiserror::Error;

/// Failures of a best-score store.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("store i/o failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("store contents are not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("store lock poisoned")]
    Poisoned,
}

/// Failures of a result sink.
#[derive(Error, Debug)]
pub enum ReportError {
    #[error("result sink i/o failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("result could not be serialized: {0}")]
    Json(#[from] serde_json::Error),

    #[error("result rejected: {0}")]
    Rejected(String),
}

#[derive(Error, Debug)]
pub enum EngineError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("a run is already active")]
    Busy,

    #[error("failed to load configuration from {}: {message}", path.display())]
    ConfigLoad { path: PathBuf, message: String },
}
