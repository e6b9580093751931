//! Config & bootstrap.
//!
//! A typed `Config` covering every value the worker process needs,
//! loaded with plain `std::env::var` calls — no `envy`/`config` crate.
//! The binary's CLI surface is `clap`-driven; this crate owns the plain
//! struct wired downstream of it, and is dependency-light on purpose:
//! it is the first thing that runs, before logging or the store are up,
//! so it should have as little as possible that can itself fail to
//! compile against a stale environment.
//!
//! Loading is split into `Config::from_env` (collects `std::env::vars`
//! into a map and delegates) and `Config::from_map` (pure, takes any
//! `&HashMap<String, String>`) so tests exercise the parsing/validation
//! logic without mutating the real process environment — process env is
//! global mutable state and `std::env::set_var` races across
//! `#[test]` threads otherwise.

pub mod error;

use std::collections::HashMap;

use advault_core::constants::DEFAULT_VERIFY_HOLD_HOURS;

pub use error::ConfigError;

/// `chainNetwork` — which chain endpoint family the escrow wallet talks to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChainNetwork {
    Mainnet,
    Testnet,
}

/// `masterWalletAddress` / `masterWalletMnemonic` — present together or
/// not at all. Absence disables the privacy relay's second hop; the
/// saga falls back to a direct single-hop transfer (dev-only).
#[derive(Debug, Clone)]
pub struct MasterWalletConfig {
    pub address: String,
    pub mnemonic: String,
}

/// Platform-adapter credentials (`botToken`, `youtubeApiKey`, ...). The
/// adapters themselves are out of scope; this crate only carries the
/// secrets they'd be constructed with.
#[derive(Debug, Clone, Default)]
pub struct PlatformCredentials {
    pub bot_token: Option<String>,
    pub youtube_api_key: Option<String>,
}

/// Every config option the worker process needs, typed and validated
/// at load time rather than at first use deep in a worker.
#[derive(Debug, Clone)]
pub struct Config {
    pub chain_network: ChainNetwork,
    pub chain_api_key: String,
    pub chain_api_key_fallback: Option<String>,
    pub master_wallet: Option<MasterWalletConfig>,
    /// `escrowEncryptionKey` — 32 raw bytes, parsed from a 64-char hex string.
    pub escrow_encryption_key: [u8; 32],
    /// `platformFeePercent`, stored as basis points (`percent * 100`) so
    /// `Money::subtract_fee` stays exact integer arithmetic — see
    /// `advault-core::money`.
    pub platform_fee_bps: u32,
    /// `verifyHoldHours` — default verification window for deals that
    /// don't override it.
    pub verify_hold_hours: u32,
    pub platform_credentials: PlatformCredentials,
    /// `redisUrl` — a distributed worker lock would use this; this
    /// deployment uses `advault-workers::InProcessLock` instead (see
    /// `DESIGN.md`), so the field is retained for config-surface parity
    /// and logged as unused when set.
    pub redis_url: Option<String>,
    /// `dbUrl` — for this workspace, the sled data directory path.
    pub db_url: String,
    /// `purgeRetentionDays` override, governing the purge worker;
    /// defaults to `advault_core::constants::PURGE_RETENTION_DAYS` when
    /// unset.
    pub purge_retention_days: i64,
}

impl Config {
    /// Loads configuration from the real process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        let map: HashMap<String, String> = std::env::vars().collect();
        Self::from_map(&map)
    }

    /// Loads and validates configuration from an explicit key/value map.
    /// Pure function — the logic `from_env` and tests both exercise.
    pub fn from_map(vars: &HashMap<String, String>) -> Result<Self, ConfigError> {
        let chain_network = match required(vars, "ADVAULT_CHAIN_NETWORK")?.as_str() {
            "mainnet" => ChainNetwork::Mainnet,
            "testnet" => ChainNetwork::Testnet,
            other => {
                return Err(ConfigError::InvalidValue(
                    "ADVAULT_CHAIN_NETWORK",
                    format!("must be \"mainnet\" or \"testnet\", got {other:?}"),
                ))
            }
        };

        let chain_api_key = required(vars, "ADVAULT_CHAIN_API_KEY")?;
        let chain_api_key_fallback = optional(vars, "ADVAULT_CHAIN_API_KEY_FALLBACK");

        let master_wallet = match (
            optional(vars, "ADVAULT_MASTER_WALLET_ADDRESS"),
            optional(vars, "ADVAULT_MASTER_WALLET_MNEMONIC"),
        ) {
            (Some(address), Some(mnemonic)) => Some(MasterWalletConfig { address, mnemonic }),
            (None, None) => None,
            _ => {
                return Err(ConfigError::InvalidValue(
                    "ADVAULT_MASTER_WALLET_ADDRESS",
                    "address and mnemonic must both be set, or neither".to_string(),
                ))
            }
        };

        let escrow_encryption_key = parse_hex_key(&required(vars, "ADVAULT_ESCROW_ENCRYPTION_KEY")?)?;

        let platform_fee_bps = parse_fee_percent(&required(vars, "ADVAULT_PLATFORM_FEE_PERCENT")?)?;

        let verify_hold_hours = match optional(vars, "ADVAULT_VERIFY_HOLD_HOURS") {
            Some(raw) => raw.parse::<u32>().map_err(|_| {
                ConfigError::InvalidValue("ADVAULT_VERIFY_HOLD_HOURS", format!("not a positive integer: {raw:?}"))
            })?,
            None => DEFAULT_VERIFY_HOLD_HOURS,
        };

        let purge_retention_days = match optional(vars, "ADVAULT_PURGE_RETENTION_DAYS") {
            Some(raw) => raw.parse::<i64>().map_err(|_| {
                ConfigError::InvalidValue("ADVAULT_PURGE_RETENTION_DAYS", format!("not an integer: {raw:?}"))
            })?,
            None => advault_core::constants::PURGE_RETENTION_DAYS,
        };

        let platform_credentials = PlatformCredentials {
            bot_token: optional(vars, "ADVAULT_BOT_TOKEN"),
            youtube_api_key: optional(vars, "ADVAULT_YOUTUBE_API_KEY"),
        };

        let redis_url = optional(vars, "ADVAULT_REDIS_URL");
        let db_url = optional(vars, "ADVAULT_DB_URL").unwrap_or_else(|| "./data/advault".to_string());

        Ok(Config {
            chain_network,
            chain_api_key,
            chain_api_key_fallback,
            master_wallet,
            escrow_encryption_key,
            platform_fee_bps,
            verify_hold_hours,
            platform_credentials,
            redis_url,
            db_url,
            purge_retention_days,
        })
    }
}

fn required(vars: &HashMap<String, String>, key: &'static str) -> Result<String, ConfigError> {
    vars.get(key).cloned().filter(|v| !v.is_empty()).ok_or(ConfigError::Missing(key))
}

fn optional(vars: &HashMap<String, String>, key: &str) -> Option<String> {
    vars.get(key).cloned().filter(|v| !v.is_empty())
}

fn parse_hex_key(raw: &str) -> Result<[u8; 32], ConfigError> {
    let bytes = hex::decode(raw)
        .map_err(|_| ConfigError::InvalidValue("ADVAULT_ESCROW_ENCRYPTION_KEY", "not valid hex".to_string()))?;
    let len = bytes.len();
    bytes.try_into().map_err(|_| {
        ConfigError::InvalidValue("ADVAULT_ESCROW_ENCRYPTION_KEY", format!("must decode to 32 bytes, got {len}"))
    })
}

fn parse_fee_percent(raw: &str) -> Result<u32, ConfigError> {
    let percent: f64 = raw
        .parse()
        .map_err(|_| ConfigError::InvalidValue("ADVAULT_PLATFORM_FEE_PERCENT", format!("not a number: {raw:?}")))?;
    if !(0.0..=100.0).contains(&percent) {
        return Err(ConfigError::InvalidValue(
            "ADVAULT_PLATFORM_FEE_PERCENT",
            format!("must be in [0, 100], got {percent}"),
        ));
    }
    Ok((percent * 100.0).round() as u32)
}
