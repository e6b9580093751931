//! Notification dispatcher.
//!
//! Decouples "a deal's status changed" from "something consumes that
//! fact" via an outbound/inbound channel split rather than a direct call.

use tokio::sync::mpsc;
use tracing::info;

use crate::event::DealStatusChanged;

pub trait NotificationSink: Send + Sync {
    fn notify(&self, event: DealStatusChanged);
}

/// The default sink: every status change becomes one structured log line.
#[derive(Default)]
pub struct LoggingSink;

impl NotificationSink for LoggingSink {
    fn notify(&self, event: DealStatusChanged) {
        info!(
            deal_id = %event.deal_id,
            old_status = ?event.old_status,
            new_status = ?event.new_status,
            at = event.at,
            "deal status changed"
        );
    }
}

/// An `mpsc`-channel-backed sink for tests: assert on what was sent
/// rather than scraping log output.
pub struct QueueSink {
    tx: mpsc::Sender<DealStatusChanged>,
}

impl QueueSink {
    /// Returns the sink plus the receiving half a test drains.
    pub fn new(capacity: usize) -> (Self, mpsc::Receiver<DealStatusChanged>) {
        let (tx, rx) = mpsc::channel(capacity);
        (Self { tx }, rx)
    }
}

impl NotificationSink for QueueSink {
    fn notify(&self, event: DealStatusChanged) {
        if let Err(e) = self.tx.try_send(event) {
            tracing::warn!(error = %e, "dropped deal status notification, queue full or closed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use advault_core::types::{DealId, DealStatus};

    #[tokio::test]
    async fn queue_sink_delivers_to_its_receiver() {
        let (sink, mut rx) = QueueSink::new(4);
        sink.notify(DealStatusChanged {
            deal_id: DealId::new(1),
            old_status: DealStatus::Funded,
            new_status: DealStatus::CreativePending,
            at: 0,
        });
        let received = rx.recv().await.unwrap();
        assert_eq!(received.deal_id, DealId::new(1));
        assert_eq!(received.new_status, DealStatus::CreativePending);
    }

    #[tokio::test]
    async fn logging_sink_never_panics_on_notify() {
        let sink = LoggingSink;
        sink.notify(DealStatusChanged {
            deal_id: DealId::new(2),
            old_status: DealStatus::Tracking,
            new_status: DealStatus::Verified,
            at: 0,
        });
    }
}
