//! advault-node — the deal-engine worker binary.
//!
//! Startup sequence:
//!   1. Load config from the environment
//!   2. Open the ledger store
//!   3. Wire the crypto/chain/platform/engine/saga/dispute/notify layers
//!      into one `WorkerContext`
//!   4. Run the scheduler loop: each worker ticks on its own
//!      `tokio::time::interval`, spawned as an independent task
//!
//! The HTTP/RPC surface, channel/campaign CRUD, the web client, and
//! concrete platform adapters are external collaborators — this binary
//! only runs the background engine.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use tracing::{info, warn};

use advault_chain::{EscrowWallet, HttpChainClient, MockChainClient};
use advault_config::Config;
use advault_core::types::PlatformTag;
use advault_crypto::FieldCipher;
use advault_dispute::DisputeProtocol;
use advault_engine::{DealEngine, RequirementEvaluator};
use advault_notify::{LoggingSink, NotificationSink};
use advault_platform::{AdapterRegistry, MockPlatformAdapter};
use advault_saga::EscrowSaga;
use advault_store::{DealLocks, LedgerStore};
use advault_workers::{
    escalate_overdue_disputes, detect_payments, purge_completed_deals, recover_pending_transfers,
    refresh_stats, sweep_timeouts, track_metrics, InProcessLock, WorkerContext, WorkerReport,
};

#[derive(Parser, Debug)]
#[command(name = "advault-node", version, about = "AdVault deal-engine worker process")]
struct Args {
    /// Directory for the persistent ledger store. Overrides `ADVAULT_DB_URL`.
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Use the in-memory mock chain client instead of the configured RPC
    /// endpoint. For local development only.
    #[arg(long)]
    dev_chain: bool,

    /// Run every worker exactly once and exit, instead of looping
    /// forever. Useful for cron-style external scheduling or smoke
    /// testing a fresh deployment.
    #[arg(long)]
    once: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,advault=debug".parse().unwrap()),
        )
        .init();

    let args = Args::parse();
    info!("advault-node starting");

    let config = Config::from_env().context("loading configuration")?;
    if config.redis_url.is_some() {
        warn!("ADVAULT_REDIS_URL is set but unused — worker locking is in-process only (see DESIGN.md)");
    }

    let data_dir = args.data_dir.unwrap_or_else(|| PathBuf::from(&config.db_url));
    std::fs::create_dir_all(&data_dir)
        .with_context(|| format!("creating data dir {}", data_dir.display()))?;
    let store = Arc::new(LedgerStore::open(&data_dir).context("opening ledger store")?);
    info!(data_dir = %data_dir.display(), "ledger store open");

    let chain: Arc<dyn advault_chain::ChainClient> = if args.dev_chain {
        warn!("running with the in-memory mock chain client — not for production");
        Arc::new(MockChainClient::new())
    } else {
        Arc::new(HttpChainClient::new(chain_endpoint(&config), config.chain_api_key.clone()))
    };

    let master_wallet = config.master_wallet.as_ref().map(|m| advault_chain::wallet::MasterWallet {
        address: m.address.clone(),
        key: m.mnemonic.clone(),
    });
    if master_wallet.is_none() {
        warn!("no master wallet configured — saga falls back to a direct single-hop transfer (dev only)");
    }
    let wallet = Arc::new(EscrowWallet::new(chain, FieldCipher::new(config.escrow_encryption_key), master_wallet));

    let locks = Arc::new(DealLocks::new());
    let engine = Arc::new(DealEngine::new(Arc::clone(&store), Arc::clone(&locks)));
    let evaluator = Arc::new(RequirementEvaluator::new(Arc::clone(&store)));
    let saga = Arc::new(EscrowSaga::new(Arc::clone(&engine), Arc::clone(&wallet), config.platform_fee_bps));
    let dispute = Arc::new(DisputeProtocol::new(Arc::clone(&engine), Arc::clone(&saga)));

    let adapters = Arc::new(build_adapter_registry());
    let notifier: Arc<dyn NotificationSink> = Arc::new(LoggingSink);

    // `advault_engine::CreativePipeline` has no caller in this binary —
    // `submitCreative`/`approveCreative`/etc. are driven by an external
    // HTTP layer, which would construct its own pipeline from the same
    // `engine` handle this context exposes.
    let ctx = Arc::new(WorkerContext {
        store,
        engine,
        evaluator,
        saga,
        dispute,
        wallet,
        adapters,
        notifier,
        locks: Arc::new(InProcessLock::new()),
        purge_retention_days: config.purge_retention_days,
        stats_refresh_batch_size: 50,
    });

    if args.once {
        run_all_once(&ctx).await;
        return Ok(());
    }

    run_scheduler(ctx).await;
    Ok(())
}

fn chain_endpoint(config: &Config) -> String {
    match config.chain_network {
        advault_config::ChainNetwork::Mainnet => "https://mainnet-rpc.example/jsonrpc".to_string(),
        advault_config::ChainNetwork::Testnet => "https://testnet-rpc.example/jsonrpc".to_string(),
    }
}

/// Platform adapters are external collaborators — the core only
/// consumes `PlatformAdapter` as a trait boundary. Production wiring
/// would register real Telegram/YouTube/Twitter adapters here; absent
/// those, the mock test double is registered so the workers that read
/// from the registry (the metric tracker, the stats refresher) have
/// something to resolve rather than
/// failing every lookup with `AdapterMissing`.
fn build_adapter_registry() -> AdapterRegistry {
    let mut registry = AdapterRegistry::new();
    registry.register(PlatformTag::Telegram, Arc::new(MockPlatformAdapter::new(PlatformTag::Telegram)));
    registry.register(PlatformTag::YouTube, Arc::new(MockPlatformAdapter::new(PlatformTag::YouTube)));
    registry.register(PlatformTag::Twitter, Arc::new(MockPlatformAdapter::new(PlatformTag::Twitter)));
    registry
}

/// One pass of every worker, in roughly dependency order (payments
/// before creative/tracking work exists to act on, timeouts before
/// saga recovery, purge last). Used by `--once`.
async fn run_all_once(ctx: &Arc<WorkerContext>) {
    log_report("payment-detector", detect_payments(ctx).await);
    log_report("timeout-sweep", sweep_timeouts(ctx).await);
    log_report("metric-tracker", track_metrics(ctx).await);
    log_report("stats-refresh", refresh_stats(ctx).await);
    log_report("saga-recovery", recover_pending_transfers(ctx).await);
    log_report("dispute-escalator", escalate_overdue_disputes(ctx).await);
    log_report("purge", purge_completed_deals(ctx).await);
}

fn log_report(worker: &str, report: WorkerReport) {
    if report.items_failed > 0 {
        warn!(worker, processed = report.items_processed, failed = report.items_failed, "worker pass completed with failures");
    } else {
        info!(worker, processed = report.items_processed, "worker pass completed");
    }
}

/// Each worker ticks on its own `tokio::time::interval`, per its own
/// cadence. A tick that's still running when the next one fires
/// is simply queued by `interval`'s default `Burst` behavior — workers
/// are expected to complete well inside their own period, and each
/// holds per-entity locks (`WorkerContext::locks`) rather than a
/// worker-wide one, so overlap across *different* entities is safe by
/// construction.
async fn run_scheduler(ctx: Arc<WorkerContext>) {
    info!("scheduler starting");

    let handles = vec![
        spawn_periodic(Arc::clone(&ctx), "payment-detector", Duration::from_secs(30), |ctx| {
            Box::pin(detect_payments(ctx))
        }),
        spawn_periodic(Arc::clone(&ctx), "timeout-sweep", Duration::from_secs(60), |ctx| Box::pin(sweep_timeouts(ctx))),
        spawn_periodic(Arc::clone(&ctx), "metric-tracker", Duration::from_secs(5 * 60), |ctx| {
            Box::pin(track_metrics(ctx))
        }),
        spawn_periodic(Arc::clone(&ctx), "stats-refresh", Duration::from_secs(6 * 60 * 60), |ctx| {
            Box::pin(refresh_stats(ctx))
        }),
        spawn_periodic(Arc::clone(&ctx), "saga-recovery", Duration::from_secs(5 * 60), |ctx| {
            Box::pin(recover_pending_transfers(ctx))
        }),
        spawn_periodic(Arc::clone(&ctx), "dispute-escalator", Duration::from_secs(15 * 60), |ctx| {
            Box::pin(escalate_overdue_disputes(ctx))
        }),
        spawn_periodic(Arc::clone(&ctx), "purge", Duration::from_secs(24 * 60 * 60), |ctx| {
            Box::pin(purge_completed_deals(ctx))
        }),
    ];

    for handle in handles {
        let _ = handle.await;
    }
}

type WorkerFuture<'a> = std::pin::Pin<Box<dyn std::future::Future<Output = WorkerReport> + Send + 'a>>;

fn spawn_periodic<F>(ctx: Arc<WorkerContext>, name: &'static str, period: Duration, job: F) -> tokio::task::JoinHandle<()>
where
    F: for<'a> Fn(&'a WorkerContext) -> WorkerFuture<'a> + Send + Sync + 'static,
{
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        // The first tick fires immediately; skip it so the scheduler
        // doesn't stampede every worker the instant the process starts.
        ticker.tick().await;
        loop {
            ticker.tick().await;
            let report = job(&ctx).await;
            log_report(name, report);
        }
    })
}
