//! Channel stats refresh.
//!
//! Every ~6h per channel, capped at `stats_refresh_batch_size` channels
//! per cycle: lock the channel, re-fetch audience stats from its
//! platform adapter, and persist them. The per-channel lock is the
//! textbook case the `DistributedLock` seam exists for — concurrent
//! scheduler replicas must not refresh the same channel twice.

use advault_core::entities::ChannelStats;
use advault_core::time::now;
use tracing::warn;

use crate::context::WorkerContext;
use crate::report::WorkerReport;

pub async fn refresh_stats(ctx: &WorkerContext) -> WorkerReport {
    let mut report = WorkerReport::default();

    let channels = match ctx.store.iter_all_channels() {
        Ok(channels) => channels,
        Err(e) => {
            warn!(error = %e, "stats refresh: failed to list channels");
            report.record_failure();
            return report;
        }
    };

    for mut channel in channels.into_iter().take(ctx.stats_refresh_batch_size) {
        let _guard = ctx.locks.acquire(&format!("stats-refresh:{}", channel.id)).await;

        let result: Result<(), crate::error::WorkerError> = async {
            let adapter = ctx.adapters.get(&channel.platform)?;
            let info = adapter.fetch_channel_info(&channel.platform_channel_id).await?;

            channel.stats = ChannelStats {
                subscribers: info.subscribers,
                avg_views: info.avg_views,
                premium_fraction: info.premium_fraction,
                language_distribution: info.language_distribution,
            };
            channel.stats_refreshed_at = Some(now());
            ctx.store.put_channel(&channel)?;
            Ok(())
        }
        .await;

        match result {
            Ok(()) => report.record_success(),
            Err(e) => {
                warn!(channel_id = %channel.id, error = %e, "stats refresh: channel failed");
                report.record_failure();
            }
        }
    }

    report
}
