//! Fluency config errors.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read fluency config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("fluency config is not valid JSON5: {0}")]
    Syntax(#[from] json5::Error),
    #[error("fluency config has the wrong shape: {0}")]
    Decode(#[from] serde_json::Error),
    /// A key holds a value outside what the proxy or generator accepts.
    #[error("config key {path} rejected: {message}")]
    InvalidField { path: String, message: String },
    /// An override variable could not be interpreted.
    #[error("environment variable {name} has unusable value {value:?}")]
    EnvVar { name: &'static str, value: String },
}

impl ConfigError {
    pub(crate) fn field(path: &str, message: impl Into<String>) -> Self {
        Self::InvalidField {
            path: path.to_string(),
            message: message.into(),
        }
    }
}
