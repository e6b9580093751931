use advault_core::error::{DomainError, ErrorKind};
use thiserror::Error;

/// Failures surfaced by a single worker item; the processor functions
/// themselves never propagate these past one item — see
/// [`crate::report::WorkerReport`].
#[derive(Debug, Error)]
pub enum WorkerError {
    #[error(transparent)]
    Store(#[from] advault_store::StoreError),

    #[error(transparent)]
    Engine(#[from] advault_engine::EngineError),

    #[error(transparent)]
    Saga(#[from] advault_saga::SagaError),

    #[error(transparent)]
    Dispute(#[from] advault_dispute::DisputeError),

    #[error(transparent)]
    Platform(#[from] advault_platform::PlatformError),

    #[error(transparent)]
    Chain(#[from] advault_chain::ChainError),

    #[error(transparent)]
    Crypto(#[from] advault_crypto::CryptoError),
}

impl DomainError for WorkerError {
    fn kind(&self) -> ErrorKind {
        match self {
            WorkerError::Store(e) => e.kind(),
            WorkerError::Engine(e) => e.kind(),
            WorkerError::Saga(e) => e.kind(),
            WorkerError::Dispute(e) => e.kind(),
            WorkerError::Platform(e) => e.kind(),
            WorkerError::Chain(e) => e.kind(),
            WorkerError::Crypto(e) => e.kind(),
        }
    }
}
