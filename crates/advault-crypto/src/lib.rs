//! Privacy primitives: alias generation, authenticated field encryption,
//! and the canonical deal-data hash.

pub mod alias;
pub mod cipher;
pub mod error;
pub mod hash;

pub use alias::generate_alias;
pub use cipher::FieldCipher;
pub use error::CryptoError;
pub use hash::hash_deal_data;
