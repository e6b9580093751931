//! Escrow wallet lifecycle.
//!
//! One wallet is generated per deal; its mnemonic is stored encrypted
//! (via `advault_crypto::FieldCipher`) in the deal row and only
//! decrypted in-memory for the duration of a transfer. Transfers are
//! submitted then confirmed by polling `get_seqno` until it advances
//! past the submitted value.

use std::sync::Arc;
use std::time::Duration;

use advault_core::constants::{CHAIN_CONFIRMATION_DEADLINE_SECS, CHAIN_POLL_INTERVAL_SECS};
use advault_crypto::FieldCipher;
use rand::rngs::OsRng;
use rand::RngCore;
use tokio::time::Instant;
use tracing::info;

use crate::client::ChainClient;
use crate::error::ChainError;
use crate::retry::with_retry;

/// A freshly generated escrow wallet, ready to be persisted on the deal row.
pub struct GeneratedWallet {
    pub address: String,
    pub encrypted_mnemonic: String,
}

/// The process-wide master wallet used as the middle hop of the privacy
/// relay. Absent when `masterWalletAddress`/`masterWalletMnemonic` are
/// unset in config, in which case the saga falls back to a direct
/// single-hop transfer.
pub struct MasterWallet {
    pub address: String,
    pub key: String,
}

pub struct EscrowWallet {
    chain: Arc<dyn ChainClient>,
    cipher: FieldCipher,
    master: Option<MasterWallet>,
}

impl EscrowWallet {
    pub fn new(chain: Arc<dyn ChainClient>, cipher: FieldCipher, master: Option<MasterWallet>) -> Self {
        Self { chain, cipher, master }
    }

    /// The configured master wallet address, if any — when absent, the
    /// saga falls back to a direct single-hop transfer.
    pub fn master_address(&self) -> Option<&str> {
        self.master.as_ref().map(|m| m.address.as_str())
    }

    /// Generates a fresh keypair for a new deal's escrow address. The
    /// mnemonic never leaves this function unencrypted.
    pub fn generate_wallet(&self) -> Result<GeneratedWallet, ChainError> {
        let mut entropy = [0u8; 32];
        OsRng.fill_bytes(&mut entropy);
        let mnemonic = hex::encode(entropy);
        let address = format!("EQ{}", &sha_like_address(&mnemonic));
        let encrypted_mnemonic = self
            .cipher
            .encrypt_str(&mnemonic)
            .map_err(|e| ChainError::KeyDecryptionFailed(e.to_string()))?;
        Ok(GeneratedWallet { address, encrypted_mnemonic })
    }

    pub async fn get_balance(&self, address: &str) -> Result<i128, ChainError> {
        let chain = self.chain.clone();
        let address = address.to_string();
        with_retry(move |_endpoint| {
            let chain = chain.clone();
            let address = address.clone();
            async move { chain.get_balance(&address).await }
        })
        .await
    }

    /// Transfers funds out of a per-deal escrow wallet, decrypting its
    /// mnemonic just for the submission, then polling for confirmation.
    pub async fn transfer_funds(
        &self,
        encrypted_mnemonic: &str,
        from_address: &str,
        to_address: &str,
        amount_nano: i128,
    ) -> Result<String, ChainError> {
        let mnemonic = self
            .cipher
            .decrypt_str(encrypted_mnemonic)
            .map_err(|e| ChainError::KeyDecryptionFailed(e.to_string()))?;
        self.submit_and_confirm(&mnemonic, from_address, to_address, amount_nano).await
    }

    /// Transfers funds from the process-wide master wallet (the second
    /// hop of the two-hop privacy relay).
    pub async fn transfer_from_master(&self, to_address: &str, amount_nano: i128) -> Result<String, ChainError> {
        let master = self.master.as_ref().ok_or(ChainError::NoMasterWallet)?;
        self.submit_and_confirm(&master.key, &master.address, to_address, amount_nano).await
    }

    async fn submit_and_confirm(
        &self,
        key: &str,
        from_address: &str,
        to_address: &str,
        amount_nano: i128,
    ) -> Result<String, ChainError> {
        let chain = self.chain.clone();
        let seqno = {
            let chain = chain.clone();
            let from_address = from_address.to_string();
            with_retry(move |_endpoint| {
                let chain = chain.clone();
                let from_address = from_address.clone();
                async move { chain.get_seqno(&from_address).await }
            })
            .await?
        };

        let tx_id = {
            let chain = chain.clone();
            let key = key.to_string();
            let to_address = to_address.to_string();
            with_retry(move |_endpoint| {
                let chain = chain.clone();
                let key = key.clone();
                let to_address = to_address.clone();
                async move { chain.send_transfer(&key, &to_address, amount_nano, seqno).await }
            })
            .await?
        };

        let deadline = Instant::now() + Duration::from_secs(CHAIN_CONFIRMATION_DEADLINE_SECS);
        loop {
            let current = chain.get_seqno(from_address).await.unwrap_or(seqno);
            if current > seqno {
                info!(tx_id, from_address, to_address, amount_nano, "transfer confirmed");
                return Ok(tx_id);
            }
            if Instant::now() >= deadline {
                return Err(ChainError::ConfirmationTimeout { submitted_seqno: seqno });
            }
            tokio::time::sleep(Duration::from_secs(CHAIN_POLL_INTERVAL_SECS)).await;
        }
    }
}

fn sha_like_address(mnemonic: &str) -> String {
    use sha2::{Digest, Sha256};
    let digest = Sha256::digest(mnemonic.as_bytes());
    hex::encode(&digest[..16])
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::client::MockChainClient;

    fn wallet(chain: Arc<MockChainClient>) -> EscrowWallet {
        EscrowWallet::new(
            chain,
            FieldCipher::new([7u8; 32]),
            Some(MasterWallet { address: "master".to_string(), key: "master-key".to_string() }),
        )
    }

    #[tokio::test(start_paused = true)]
    async fn generate_then_fund_then_transfer_round_trips() {
        let chain = Arc::new(MockChainClient::new());
        let w = wallet(chain.clone());
        let generated = w.generate_wallet().unwrap();
        chain.fund(&generated.address, 1_000);

        let tx_id = w
            .transfer_funds(&generated.encrypted_mnemonic, &generated.address, "payee", 400)
            .await
            .unwrap();
        assert!(!tx_id.is_empty());
        assert_eq!(chain.balance_of(&generated.address), 600);
        assert_eq!(chain.balance_of("payee"), 400);
    }

    #[tokio::test(start_paused = true)]
    async fn transfer_from_master_moves_funds_from_the_configured_address() {
        let chain = Arc::new(MockChainClient::new());
        chain.fund("master", 1_000);
        let w = wallet(chain.clone());
        let tx_id = w.transfer_from_master("payee", 250).await.unwrap();
        assert!(!tx_id.is_empty());
        assert_eq!(chain.balance_of("master"), 750);
        assert_eq!(chain.balance_of("payee"), 250);
    }

    #[tokio::test]
    async fn transfer_from_master_without_configured_key_fails() {
        let chain = Arc::new(MockChainClient::new());
        let w = EscrowWallet::new(chain, FieldCipher::new([7u8; 32]), None);
        let err = w.transfer_from_master("payee", 1).await.unwrap_err();
        assert!(matches!(err, ChainError::NoMasterWallet));
    }

    #[tokio::test]
    async fn wrong_cipher_fails_to_decrypt_mnemonic() {
        let chain = Arc::new(MockChainClient::new());
        let w = wallet(chain.clone());
        let generated = w.generate_wallet().unwrap();
        chain.fund(&generated.address, 1_000);

        let wrong_key_wallet = EscrowWallet::new(chain, FieldCipher::new([9u8; 32]), None);
        let err = wrong_key_wallet
            .transfer_funds(&generated.encrypted_mnemonic, &generated.address, "payee", 1)
            .await
            .unwrap_err();
        assert!(matches!(err, ChainError::KeyDecryptionFailed(_)));
    }
}
