use thiserror::Error;

use advault_core::error::{DomainError, ErrorKind};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required config value: {0}")]
    Missing(&'static str),

    #[error("invalid config value for {0}: {1}")]
    InvalidValue(&'static str, String),
}

impl DomainError for ConfigError {
    fn kind(&self) -> ErrorKind {
        ErrorKind::ValidationFailed
    }
}
