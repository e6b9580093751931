//! The escrow wallet: per-deal wallet
//! generation, balance queries, and confirmation-polled transfers with
//! RPC fail-over.

pub mod client;
pub mod error;
pub mod retry;
pub mod wallet;

pub use client::{ChainClient, HttpChainClient, MockChainClient};
pub use error::ChainError;
pub use retry::with_retry;
pub use wallet::{EscrowWallet, GeneratedWallet};
