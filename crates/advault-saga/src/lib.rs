//! The escrow saga coordinator: the two-hop
//! privacy-relayed release/refund protocol with a crash-safe
//! pending-transfer ledger.

pub mod coordinator;
pub mod error;

pub use coordinator::EscrowSaga;
pub use error::SagaError;
