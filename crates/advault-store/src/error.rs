use advault_core::error::{DomainError, ErrorKind};
use thiserror::Error;

/// Failures from the ledger-store boundary.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("storage backend error: {0}")]
    Storage(String),

    #[error("(de)serialization error: {0}")]
    Serialization(String),

    #[error("entity not found: {0}")]
    NotFound(String),

    #[error("unique key conflict: {0}")]
    Conflict(String),
}

impl DomainError for StoreError {
    fn kind(&self) -> ErrorKind {
        match self {
            StoreError::Storage(_) => ErrorKind::RpcTransient,
            StoreError::Serialization(_) => ErrorKind::ValidationFailed,
            StoreError::NotFound(_) => ErrorKind::NotFound,
            StoreError::Conflict(_) => ErrorKind::Conflict,
        }
    }
}

impl From<sled::Error> for StoreError {
    fn from(e: sled::Error) -> Self {
        StoreError::Storage(e.to_string())
    }
}

impl From<bincode::Error> for StoreError {
    fn from(e: bincode::Error) -> Self {
        StoreError::Serialization(e.to_string())
    }
}
