//! The raw chain JSON-RPC boundary ("Chain interface").
//!
//! `ChainClient` is deliberately out of scope as a *production*
//! implementation — the raw RPC client is treated as an external
//! collaborator — but is defined here as the trait seam `EscrowWallet`
//! is generic over, plus a `reqwest`-based implementation, and an
//! in-memory `MockChainClient` test double used throughout the
//! `advault-saga`/`advault-workers` test suites.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::error::ChainError;

#[async_trait]
pub trait ChainClient: Send + Sync {
    /// Current balance of `address`, in nanounits.
    async fn get_balance(&self, address: &str) -> Result<i128, ChainError>;

    /// Current account sequence number for `address`.
    async fn get_seqno(&self, address: &str) -> Result<u64, ChainError>;

    /// Submit a transfer of `amount_nano` from the account identified by
    /// `from_key` (opaque key material — an address or decrypted
    /// mnemonic, depending on implementation) to `to_address`, at the
    /// given `seqno`. Returns the chain transaction id.
    async fn send_transfer(
        &self,
        from_key: &str,
        to_address: &str,
        amount_nano: i128,
        seqno: u64,
    ) -> Result<String, ChainError>;
}

/// A `reqwest`-based JSON-RPC 2.0 client pointed at the escrow chain's
/// RPC endpoint (`getBalance`, `sendTransfer`, `getSeqno`).
pub struct HttpChainClient {
    endpoint: String,
    api_key: String,
    http: reqwest::Client,
}

impl HttpChainClient {
    pub fn new(endpoint: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            api_key: api_key.into(),
            http: reqwest::Client::new(),
        }
    }

    async fn call(&self, method: &str, params: serde_json::Value) -> Result<serde_json::Value, ChainError> {
        let body = serde_json::json!({
            "jsonrpc": "2.0",
            "method": method,
            "params": params,
            "id": 1,
        });
        let resp = self
            .http
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| ChainError::RpcTransient(e.to_string()))?;
        let json: serde_json::Value = resp
            .json()
            .await
            .map_err(|e| ChainError::RpcTransient(format!("parsing RPC response: {e}")))?;
        if let Some(err) = json.get("error") {
            return Err(ChainError::RpcTransient(err.to_string()));
        }
        Ok(json["result"].clone())
    }
}

#[async_trait]
impl ChainClient for HttpChainClient {
    async fn get_balance(&self, address: &str) -> Result<i128, ChainError> {
        let result = self.call("getBalance", serde_json::json!([address])).await?;
        let s = result
            .as_str()
            .ok_or_else(|| ChainError::RpcTransient("expected string balance".into()))?;
        s.parse()
            .map_err(|e| ChainError::RpcTransient(format!("parsing balance: {e}")))
    }

    async fn get_seqno(&self, address: &str) -> Result<u64, ChainError> {
        let result = self.call("getSeqno", serde_json::json!([address])).await?;
        result
            .as_u64()
            .ok_or_else(|| ChainError::RpcTransient("expected numeric seqno".into()))
    }

    async fn send_transfer(
        &self,
        from_key: &str,
        to_address: &str,
        amount_nano: i128,
        seqno: u64,
    ) -> Result<String, ChainError> {
        let result = self
            .call(
                "sendTransfer",
                serde_json::json!({
                    "seqno": seqno,
                    "key": from_key,
                    "messages": [{ "to": to_address, "value": amount_nano.to_string(), "bounce": false }],
                }),
            )
            .await?;
        result
            .as_str()
            .map(|s| s.to_string())
            .ok_or_else(|| ChainError::RpcTransient("expected tx id string".into()))
    }
}

/// An in-memory chain for tests. Balances and seqnos are tracked per
/// address; `send_transfer` moves funds and bumps the sender's seqno
/// immediately (deterministic, no asynchronous confirmation delay) unless
/// `fail_next_sends` has injected a failure for this address.
#[derive(Default)]
pub struct MockChainClient {
    state: Mutex<HashMap<String, AccountState>>,
    fail_next: Mutex<HashMap<String, u32>>,
}

#[derive(Default, Clone)]
struct AccountState {
    balance: i128,
    seqno: u64,
}

impl MockChainClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fund(&self, address: &str, amount_nano: i128) {
        let mut state = self.state.lock().unwrap();
        state.entry(address.to_string()).or_default().balance += amount_nano;
    }

    pub fn balance_of(&self, address: &str) -> i128 {
        self.state.lock().unwrap().get(address).map(|a| a.balance).unwrap_or(0)
    }

    pub fn seqno_of(&self, address: &str) -> u64 {
        self.state.lock().unwrap().get(address).map(|a| a.seqno).unwrap_or(0)
    }

    /// Make the next `n` `send_transfer` calls for `address` fail, to
    /// exercise the retry/fail-over and saga-recovery paths.
    pub fn fail_next_sends(&self, address: &str, n: u32) {
        self.fail_next.lock().unwrap().insert(address.to_string(), n);
    }

    fn should_fail(&self, address: &str) -> bool {
        let mut fail_next = self.fail_next.lock().unwrap();
        if let Some(count) = fail_next.get_mut(address) {
            if *count > 0 {
                *count -= 1;
                return true;
            }
        }
        false
    }
}

#[async_trait]
impl ChainClient for MockChainClient {
    async fn get_balance(&self, address: &str) -> Result<i128, ChainError> {
        Ok(self.balance_of(address))
    }

    async fn get_seqno(&self, address: &str) -> Result<u64, ChainError> {
        Ok(self.seqno_of(address))
    }

    async fn send_transfer(
        &self,
        from_key: &str,
        to_address: &str,
        amount_nano: i128,
        seqno: u64,
    ) -> Result<String, ChainError> {
        if self.should_fail(from_key) {
            return Err(ChainError::RpcTransient("injected test failure".into()));
        }
        let mut state = self.state.lock().unwrap();
        let sender = state.entry(from_key.to_string()).or_default();
        if sender.seqno != seqno {
            return Err(ChainError::RpcTransient(format!(
                "stale seqno: expected {}, got {seqno}",
                sender.seqno
            )));
        }
        if sender.balance < amount_nano {
            return Err(ChainError::RpcTransient("insufficient balance".into()));
        }
        sender.balance -= amount_nano;
        sender.seqno += 1;
        let tx_id = format!("mocktx-{from_key}-{seqno}");
        state.entry(to_address.to_string()).or_default().balance += amount_nano;
        Ok(tx_id)
    }
}
