//! Dispute resolution: mutual proposals with
//! auto-execution on agreement, admin escalation past the 48h window,
//! and handoff to the escrow saga to actually move funds.

pub mod dispute;
pub mod error;

pub use dispute::{DisputeProtocol, ProposeResult};
pub use error::DisputeError;
