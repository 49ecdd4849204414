use thiserror::Error;

/// Top-level error type for the shared catalog model.
#[derive(Error, Debug)]
pub enum GtdError {
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
