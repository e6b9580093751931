use advault_core::error::{DomainError, ErrorKind};
use advault_core::types::DealStatus;
use thiserror::Error;

/// Failures from the deal state machine, requirement evaluator, and
/// creative pipeline.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("deal {0} not found")]
    DealNotFound(advault_core::types::DealId),

    #[error("requirement {0} not found")]
    RequirementNotFound(advault_core::types::RequirementId),

    #[error("transition from {from:?} to {to:?} is not allowed")]
    InvalidTransition { from: DealStatus, to: DealStatus },

    #[error("actor is not a party to this deal")]
    Forbidden,

    #[error("{0}")]
    ValidationFailed(String),

    #[error("platform url could not be parsed: {0}")]
    UnparseableUrl(String),

    #[error(transparent)]
    Store(#[from] advault_store::StoreError),

    #[error(transparent)]
    Crypto(#[from] advault_crypto::CryptoError),

    #[error(transparent)]
    Platform(#[from] advault_platform::PlatformError),
}

impl DomainError for EngineError {
    fn kind(&self) -> ErrorKind {
        match self {
            EngineError::DealNotFound(_) | EngineError::RequirementNotFound(_) => ErrorKind::NotFound,
            EngineError::InvalidTransition { .. } => ErrorKind::InvalidTransition,
            EngineError::Forbidden => ErrorKind::Forbidden,
            EngineError::ValidationFailed(_) => ErrorKind::ValidationFailed,
            EngineError::UnparseableUrl(_) => ErrorKind::UnparseableUrl,
            EngineError::Store(e) => e.kind(),
            EngineError::Crypto(e) => e.kind(),
            EngineError::Platform(e) => e.kind(),
        }
    }
}
