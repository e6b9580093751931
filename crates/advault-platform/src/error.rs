use advault_core::error::{DomainError, ErrorKind};
use thiserror::Error;

/// Failures from the platform-adapter boundary.
#[derive(Debug, Error)]
pub enum PlatformError {
    /// No adapter registered for a platform tag — a programming error.
    #[error("no adapter registered for platform {0}")]
    AdapterMissing(String),

    /// The post URL doesn't match any pattern this adapter recognizes.
    #[error("unparseable post URL: {0}")]
    UnparseableUrl(String),

    /// The outbound call to the third-party platform API failed
    /// (after the adapter's own retry policy, if any).
    #[error("platform API call failed: {0}")]
    ApiCallFailed(String),

    /// This platform/format combination cannot be posted to.
    #[error("channel does not support this ad format")]
    UnsupportedFormat,
}

impl DomainError for PlatformError {
    fn kind(&self) -> ErrorKind {
        match self {
            PlatformError::AdapterMissing(_) => ErrorKind::AdapterMissing,
            PlatformError::UnparseableUrl(_) => ErrorKind::UnparseableUrl,
            PlatformError::ApiCallFailed(_) => ErrorKind::RpcTransient,
            PlatformError::UnsupportedFormat => ErrorKind::ValidationFailed,
        }
    }
}
