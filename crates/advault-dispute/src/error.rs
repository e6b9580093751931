use advault_core::error::{DomainError, ErrorKind};
use advault_core::types::{DealId, DisputeId};
use thiserror::Error;

/// Failures from the dispute resolution protocol.
#[derive(Debug, Error)]
pub enum DisputeError {
    #[error("deal {0} not found")]
    DealNotFound(DealId),

    #[error("dispute {0} not found")]
    DisputeNotFound(DisputeId),

    #[error("deal {0} already has an open dispute")]
    AlreadyDisputed(DealId),

    #[error("actor is not a party to this deal")]
    Forbidden,

    #[error("{0}")]
    InvalidState(String),

    #[error("{0}")]
    ValidationFailed(String),

    #[error("dispute has not been escalated to admin review")]
    NotEscalated,

    #[error(transparent)]
    Store(#[from] advault_store::StoreError),

    #[error(transparent)]
    Engine(#[from] advault_engine::EngineError),

    #[error(transparent)]
    Saga(#[from] advault_saga::SagaError),
}

impl DomainError for DisputeError {
    fn kind(&self) -> ErrorKind {
        match self {
            DisputeError::DealNotFound(_) | DisputeError::DisputeNotFound(_) => ErrorKind::NotFound,
            DisputeError::AlreadyDisputed(_) => ErrorKind::Conflict,
            DisputeError::Forbidden => ErrorKind::Forbidden,
            DisputeError::InvalidState(_) => ErrorKind::InvalidTransition,
            DisputeError::ValidationFailed(_) | DisputeError::NotEscalated => ErrorKind::ValidationFailed,
            DisputeError::Store(e) => e.kind(),
            DisputeError::Engine(e) => e.kind(),
            DisputeError::Saga(e) => e.kind(),
        }
    }
}
