//! The ledger store: typed persistence for
//! every entity in the data model, plus the row-lock registry the deal
//! state machine needs to hold across `.await` points.

pub mod db;
pub mod error;
pub mod locks;

pub use db::LedgerStore;
pub use error::StoreError;
pub use locks::{DealGuard, DealLocks};
