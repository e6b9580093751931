//! Opaque alias generation.
//!
//! Not reversible, not a secret — it is an opacity label shown to the
//! counterparty on the wire (`Seller-ab12`, `Buyer-cd34`).

use advault_core::types::Alias;
use rand::RngCore;

/// Generate `{role}-{4 hex chars}` from a CSPRNG source rather than a
/// deterministic one.
pub fn generate_alias(role: &str) -> Alias {
    let mut buf = [0u8; 2];
    rand::rngs::OsRng.fill_bytes(&mut buf);
    Alias(format!("{role}-{}", hex::encode(buf)))
}
