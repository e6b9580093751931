use advault_core::error::{DomainError, ErrorKind};
use thiserror::Error;

/// Failures from the chain-RPC boundary.
#[derive(Debug, Error, Clone)]
pub enum ChainError {
    /// The RPC call failed after the retry/fail-over policy was exhausted.
    #[error("chain RPC failed after retries: {0}")]
    RpcTransient(String),

    /// The submitted transfer's sequence number did not advance within
    /// the confirmation deadline. Treated as `RpcTransient` for retry
    /// purposes.
    #[error("confirmation timed out waiting for seqno to advance past {submitted_seqno}")]
    ConfirmationTimeout { submitted_seqno: u64 },

    /// The escrow key material failed to decrypt.
    #[error("failed to decrypt wallet key material: {0}")]
    KeyDecryptionFailed(String),

    /// No master wallet is configured; caller must fall back to a
    /// single-hop transfer.
    #[error("no master wallet configured")]
    NoMasterWallet,
}

impl DomainError for ChainError {
    fn kind(&self) -> ErrorKind {
        match self {
            ChainError::RpcTransient(_) => ErrorKind::RpcTransient,
            ChainError::ConfirmationTimeout { .. } => ErrorKind::ConfirmationTimeout,
            ChainError::KeyDecryptionFailed(_) => ErrorKind::AuthFailed,
            ChainError::NoMasterWallet => ErrorKind::ValidationFailed,
        }
    }
}
