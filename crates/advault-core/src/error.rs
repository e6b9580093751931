//! The shared error taxonomy.
//!
//! Every crate in the workspace defines its own `thiserror` error enum for
//! the failures specific to its boundary (store I/O, crypto, chain RPC,
//! ...). Each of those enums maps its variants onto [`ErrorKind`] here so
//! that an outer layer (HTTP, RPC — both out of scope for this workspace)
//! can translate any error to a status code without depending on the
//! crate that produced it.

use serde::{Deserialize, Serialize};

/// The coarse failure category a domain error belongs to.
///
/// This is data, not behavior — the HTTP status mapping documented on
/// each variant is informational for callers outside this workspace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorKind {
    /// Referenced entity does not exist. → 404.
    NotFound,
    /// Caller is not a party to the deal / lacks the required role. → 403.
    Forbidden,
    /// Duplicate key (channel already registered, etc). → 409.
    Conflict,
    /// State-machine rule violated. → 400.
    InvalidTransition,
    /// Input constraints violated. → 400.
    ValidationFailed,
    /// Encryption tag mismatch or signature mismatch. → 401.
    AuthFailed,
    /// Platform URL does not match any known pattern.
    UnparseableUrl,
    /// Chain or platform API failed after retries. → 5xx.
    RpcTransient,
    /// Sequence number did not advance within the confirmation deadline.
    /// Treated as `RpcTransient` for retry purposes.
    ConfirmationTimeout,
    /// No adapter registered for a platform tag (programming error).
    AdapterMissing,
}

impl ErrorKind {
    /// The HTTP status an (out-of-scope) API layer would use for this kind.
    pub fn http_status(self) -> u16 {
        match self {
            ErrorKind::NotFound => 404,
            ErrorKind::Forbidden => 403,
            ErrorKind::Conflict => 409,
            ErrorKind::InvalidTransition => 400,
            ErrorKind::ValidationFailed => 400,
            ErrorKind::AuthFailed => 401,
            ErrorKind::UnparseableUrl => 400,
            ErrorKind::RpcTransient => 502,
            ErrorKind::ConfirmationTimeout => 504,
            ErrorKind::AdapterMissing => 500,
        }
    }
}

/// Implemented by every crate-local error enum so `.kind()` is uniform
/// across the workspace.
pub trait DomainError {
    fn kind(&self) -> ErrorKind;
}
