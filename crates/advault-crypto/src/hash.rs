//! The deterministic deal-data hash.

use std::collections::BTreeMap;

use sha2::{Digest, Sha256};

use crate::error::CryptoError;

/// Canonicalize `fields` by sorting keys lexicographically (free, via
/// `BTreeMap`), serialize as compact JSON, and return the lowercase hex
/// SHA-256 digest. Deterministic: equal content with different input key
/// order produces an equal hash, because the map itself is the
/// canonicalization — there is no ordering left to vary.
pub fn hash_deal_data(fields: &BTreeMap<String, serde_json::Value>) -> Result<String, CryptoError> {
    let bytes =
        serde_json::to_vec(fields).map_err(|e| CryptoError::Serialization(e.to_string()))?;
    let digest = Sha256::digest(&bytes);
    Ok(hex::encode(digest))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn matches_hex64_shape() {
        let mut fields = BTreeMap::new();
        fields.insert("a".to_string(), json!(1));
        let digest = hash_deal_data(&fields).unwrap();
        assert_eq!(digest.len(), 64);
        assert!(digest.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }

    #[test]
    fn key_order_in_the_source_map_does_not_matter() {
        let mut a = BTreeMap::new();
        a.insert("zebra".to_string(), json!(1));
        a.insert("apple".to_string(), json!(2));

        let mut b = BTreeMap::new();
        b.insert("apple".to_string(), json!(2));
        b.insert("zebra".to_string(), json!(1));

        assert_eq!(hash_deal_data(&a).unwrap(), hash_deal_data(&b).unwrap());
    }

    #[test]
    fn different_content_hashes_differently() {
        let mut a = BTreeMap::new();
        a.insert("amount".to_string(), json!("50.0"));
        let mut b = BTreeMap::new();
        b.insert("amount".to_string(), json!("50.1"));
        assert_ne!(hash_deal_data(&a).unwrap(), hash_deal_data(&b).unwrap());
    }
}
