use advault_core::error::{DomainError, ErrorKind};
use advault_core::types::{DealId, PendingTransferId};
use thiserror::Error;

/// Failures from the escrow saga coordinator.
#[derive(Debug, Error)]
pub enum SagaError {
    #[error("deal {0} not found")]
    DealNotFound(DealId),

    #[error("pending transfer {0} not found")]
    TransferNotFound(PendingTransferId),

    #[error("deal {0} has no payout wallet configured for its {1}")]
    NoPayoutWallet(DealId, &'static str),

    #[error("deal {0} has no escrow wallet")]
    NoEscrowWallet(DealId),

    #[error("pending transfer {0} is not eligible for hop-2 retry")]
    NotRetryEligible(PendingTransferId),

    #[error(transparent)]
    Store(#[from] advault_store::StoreError),

    #[error(transparent)]
    Chain(#[from] advault_chain::ChainError),

    #[error(transparent)]
    Engine(#[from] advault_engine::EngineError),
}

impl DomainError for SagaError {
    fn kind(&self) -> ErrorKind {
        match self {
            SagaError::DealNotFound(_) | SagaError::TransferNotFound(_) => ErrorKind::NotFound,
            SagaError::NoPayoutWallet(_, _) | SagaError::NoEscrowWallet(_) | SagaError::NotRetryEligible(_) => {
                ErrorKind::ValidationFailed
            }
            SagaError::Store(e) => e.kind(),
            SagaError::Chain(e) => e.kind(),
            SagaError::Engine(e) => e.kind(),
        }
    }
}
