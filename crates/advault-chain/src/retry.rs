//! RPC fail-over and exponential backoff.
//!
//! Up to `CHAIN_RETRY_MAX_ATTEMPTS` attempts; from the attempt at
//! `ceil(CHAIN_RETRY_MAX_ATTEMPTS / 2)` onward the caller's operation is
//! driven against the fallback endpoint instead of the primary. Backoff
//! between attempts is `1s * 2^attempt`.

use std::future::Future;
use std::time::Duration;

use advault_core::constants::CHAIN_RETRY_MAX_ATTEMPTS;
use tracing::warn;

use crate::error::ChainError;

/// Which endpoint an attempt should be driven against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    Primary,
    Fallback,
}

/// Runs `op` against `Endpoint::Primary`, retrying on
/// `ChainError::RpcTransient` up to `CHAIN_RETRY_MAX_ATTEMPTS` times.
/// From attempt `ceil(CHAIN_RETRY_MAX_ATTEMPTS / 2)` onward `op` is
/// called with `Endpoint::Fallback`. Non-transient errors
/// (`ConfirmationTimeout`, `KeyDecryptionFailed`, `NoMasterWallet`)
/// are returned immediately without retrying.
pub async fn with_retry<F, Fut, T>(mut op: F) -> Result<T, ChainError>
where
    F: FnMut(Endpoint) -> Fut,
    Fut: Future<Output = Result<T, ChainError>>,
{
    let failover_at = CHAIN_RETRY_MAX_ATTEMPTS.div_ceil(2);
    let mut last_err = None;
    for attempt in 1..=CHAIN_RETRY_MAX_ATTEMPTS {
        let endpoint = if attempt >= failover_at { Endpoint::Fallback } else { Endpoint::Primary };
        match op(endpoint).await {
            Ok(value) => return Ok(value),
            Err(ChainError::RpcTransient(msg)) => {
                warn!(attempt, ?endpoint, error = %msg, "chain RPC attempt failed");
                last_err = Some(ChainError::RpcTransient(msg));
                if attempt < CHAIN_RETRY_MAX_ATTEMPTS {
                    let backoff = Duration::from_secs(1 << attempt);
                    tokio::time::sleep(backoff).await;
                }
            }
            Err(other) => return Err(other),
        }
    }
    Err(last_err.unwrap_or_else(|| ChainError::RpcTransient("exhausted retries".into())))
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};

    use super::*;

    #[tokio::test(start_paused = true)]
    async fn succeeds_after_transient_failures() {
        let calls = AtomicU32::new(0);
        let result = with_retry(|_endpoint| {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            async move {
                if n < 2 {
                    Err(ChainError::RpcTransient("not yet".into()))
                } else {
                    Ok(42)
                }
            }
        })
        .await;
        assert_eq!(result.unwrap(), 42);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn switches_to_fallback_partway_through() {
        let mut seen = Vec::new();
        let result: Result<(), ChainError> = with_retry(|endpoint| {
            seen.push(endpoint);
            async move { Err(ChainError::RpcTransient("always fails".into())) }
        })
        .await;
        assert!(result.is_err());
        assert_eq!(seen.len(), CHAIN_RETRY_MAX_ATTEMPTS as usize);
        assert_eq!(seen[0], Endpoint::Primary);
        assert_eq!(*seen.last().unwrap(), Endpoint::Fallback);
    }

    #[tokio::test]
    async fn non_transient_errors_are_not_retried() {
        let calls = AtomicU32::new(0);
        let result: Result<(), ChainError> = with_retry(|_endpoint| {
            calls.fetch_add(1, Ordering::SeqCst);
            async move { Err(ChainError::NoMasterWallet) }
        })
        .await;
        assert!(matches!(result, Err(ChainError::NoMasterWallet)));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
