use advault_core::error::{DomainError, ErrorKind};
use thiserror::Error;

/// Failures from the privacy-primitive boundary.
#[derive(Debug, Error)]
pub enum CryptoError {
    /// AEAD tag verification failed on decrypt. → `AuthFailed` / 401.
    #[error("authentication failed: ciphertext tag mismatch")]
    AuthFailed,

    /// The wire format (`hex(iv):hex(tag):hex(ciphertext)`) was malformed.
    #[error("malformed encrypted field: {0}")]
    MalformedField(String),

    /// The configured encryption key was not 32 bytes.
    #[error("invalid key length: expected 32 bytes, got {0}")]
    InvalidKeyLength(usize),

    /// The deal-hash input could not be serialized to canonical JSON.
    #[error("failed to serialize deal-hash fields: {0}")]
    Serialization(String),
}

impl DomainError for CryptoError {
    fn kind(&self) -> ErrorKind {
        match self {
            CryptoError::AuthFailed => ErrorKind::AuthFailed,
            CryptoError::MalformedField(_) => ErrorKind::AuthFailed,
            CryptoError::InvalidKeyLength(_) => ErrorKind::ValidationFailed,
            CryptoError::Serialization(_) => ErrorKind::ValidationFailed,
        }
    }
}
