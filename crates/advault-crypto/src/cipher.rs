//! Authenticated field encryption.
//!
//! Wire format: `hex(nonce):hex(tag):hex(ciphertext)`. `chacha20poly1305`'s
//! combined output already appends the tag to the ciphertext; this module
//! splits it back out on encrypt and reassembles it on decrypt so the
//! stored shape is stable rather than leaking the crate's own
//! combined-buffer convention.

use chacha20poly1305::aead::{Aead, KeyInit, OsRng};
use chacha20poly1305::{AeadCore, ChaCha20Poly1305, Key, Nonce};
use zeroize::Zeroizing;

use crate::error::CryptoError;

const TAG_LEN: usize = 16;
const NONCE_LEN: usize = 12;

/// A process-wide 256-bit AEAD key (the `escrowEncryptionKey` config
/// value, loaded once at startup). Used for creative text, creative
/// media URL, and escrow key material.
pub struct FieldCipher {
    cipher: ChaCha20Poly1305,
    _key: Zeroizing<[u8; 32]>,
}

impl FieldCipher {
    /// Build a cipher from a raw 32-byte key.
    pub fn new(key_bytes: [u8; 32]) -> Self {
        let key = Key::from_slice(&key_bytes);
        Self {
            cipher: ChaCha20Poly1305::new(key),
            _key: Zeroizing::new(key_bytes),
        }
    }

    /// Build a cipher from a 64-character hex string (32 bytes), the
    /// shape `escrowEncryptionKey` arrives in from configuration.
    pub fn from_hex(hex_key: &str) -> Result<Self, CryptoError> {
        let bytes = hex::decode(hex_key)
            .map_err(|e| CryptoError::MalformedField(format!("key hex: {e}")))?;
        if bytes.len() != 32 {
            return Err(CryptoError::InvalidKeyLength(bytes.len()));
        }
        let mut arr = [0u8; 32];
        arr.copy_from_slice(&bytes);
        Ok(Self::new(arr))
    }

    /// Encrypt `plaintext`, returning `hex(nonce):hex(tag):hex(ciphertext)`.
    /// A fresh random nonce is drawn per call.
    pub fn encrypt(&self, plaintext: &[u8]) -> Result<String, CryptoError> {
        let nonce = ChaCha20Poly1305::generate_nonce(&mut OsRng);
        let combined = self
            .cipher
            .encrypt(&nonce, plaintext)
            .map_err(|_| CryptoError::AuthFailed)?;
        let split_at = combined.len() - TAG_LEN;
        let (ct, tag) = combined.split_at(split_at);
        Ok(format!(
            "{}:{}:{}",
            hex::encode(nonce),
            hex::encode(tag),
            hex::encode(ct)
        ))
    }

    /// Encrypt a UTF-8 string, the common call shape for creative text /
    /// media URL / mnemonic.
    pub fn encrypt_str(&self, plaintext: &str) -> Result<String, CryptoError> {
        self.encrypt(plaintext.as_bytes())
    }

    /// Decrypt a `hex(nonce):hex(tag):hex(ciphertext)` field. Fails with
    /// `CryptoError::AuthFailed` when tag verification fails, and with
    /// `MalformedField` when the wire format itself is not well-formed
    /// (downstream tools must treat any value containing `:` as opaque).
    pub fn decrypt(&self, field: &str) -> Result<Vec<u8>, CryptoError> {
        let mut parts = field.splitn(3, ':');
        let nonce_hex = parts
            .next()
            .ok_or_else(|| CryptoError::MalformedField(field.to_string()))?;
        let tag_hex = parts
            .next()
            .ok_or_else(|| CryptoError::MalformedField(field.to_string()))?;
        let ct_hex = parts
            .next()
            .ok_or_else(|| CryptoError::MalformedField(field.to_string()))?;

        let nonce_bytes = hex::decode(nonce_hex)
            .map_err(|e| CryptoError::MalformedField(format!("nonce hex: {e}")))?;
        if nonce_bytes.len() != NONCE_LEN {
            return Err(CryptoError::MalformedField("bad nonce length".into()));
        }
        let tag_bytes = hex::decode(tag_hex)
            .map_err(|e| CryptoError::MalformedField(format!("tag hex: {e}")))?;
        let ct_bytes = hex::decode(ct_hex)
            .map_err(|e| CryptoError::MalformedField(format!("ciphertext hex: {e}")))?;

        let mut combined = Vec::with_capacity(ct_bytes.len() + tag_bytes.len());
        combined.extend_from_slice(&ct_bytes);
        combined.extend_from_slice(&tag_bytes);

        let nonce = Nonce::from_slice(&nonce_bytes);
        self.cipher
            .decrypt(nonce, combined.as_ref())
            .map_err(|_| CryptoError::AuthFailed)
    }

    /// Decrypt and interpret as UTF-8.
    pub fn decrypt_str(&self, field: &str) -> Result<String, CryptoError> {
        let bytes = self.decrypt(field)?;
        String::from_utf8(bytes).map_err(|e| CryptoError::MalformedField(e.to_string()))
    }
}
