use thiserror::Error;

/// Configuration rejected before a run starts.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("unsupported grid side {side}: expected {min}..={max}")]
    UnsupportedGridSide { side: usize, min: usize, max: usize },

    #[error("invalid value for '{key}': {message}")]
    InvalidValue { key: String, message: String },
}

impl ConfigError {
    pub fn invalid(key: impl Into<String>, message: impl Into<String>) -> Self {
        ConfigError::InvalidValue {
            key: key.into(),
            message: message.into(),
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown game '{0}'")]
pub struct UnknownGame(pub String);
