//! One-directional push path from a document operation to a viewing client.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use tokio::sync::mpsc;

use crate::delta::StreamDelta;

#[derive(Default)]
struct ChannelStats {
    delivered: AtomicU64,
    dropped: AtomicU64,
    disconnected: AtomicBool,
}

/// Writer half of the live update channel.
///
/// `write` never fails: once the consumer goes away further deltas are
/// counted as dropped and the operation carries on to persistence.
#[derive(Clone)]
pub struct LiveChannel {
    tx: Option<mpsc::Sender<StreamDelta>>,
    stats: Arc<ChannelStats>,
    drop_when_full: bool,
}

impl LiveChannel {
    pub fn bounded(capacity: usize, drop_when_full: bool) -> (Self, mpsc::Receiver<StreamDelta>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        let channel = Self {
            tx: Some(tx),
            stats: Arc::new(ChannelStats::default()),
            drop_when_full,
        };
        (channel, rx)
    }

    /// A channel nobody watches. Writes are counted and discarded.
    pub fn detached() -> Self {
        Self {
            tx: None,
            stats: Arc::new(ChannelStats::default()),
            drop_when_full: false,
        }
    }

    pub async fn write(&self, delta: StreamDelta) {
        let Some(tx) = self.tx.as_ref() else {
            self.stats.dropped.fetch_add(1, Ordering::Relaxed);
            return;
        };
        if self.is_disconnected() {
            self.stats.dropped.fetch_add(1, Ordering::Relaxed);
            return;
        }

        // Only text is shed; control and terminal deltas always wait for room.
        if self.drop_when_full && delta.text().is_some() {
            match tx.try_send(delta) {
                Ok(()) => {
                    self.stats.delivered.fetch_add(1, Ordering::Relaxed);
                }
                Err(mpsc::error::TrySendError::Full(_)) => {
                    let count = self.stats.dropped.fetch_add(1, Ordering::Relaxed);
                    if count % 100 == 0 {
                        tracing::warn!(
                            target: "docstream.channel",
                            dropped_total = count + 1,
                            "live channel full, deltas are being dropped"
                        );
                    }
                }
                Err(mpsc::error::TrySendError::Closed(_)) => self.mark_disconnected(),
            }
        } else if tx.send(delta).await.is_ok() {
            self.stats.delivered.fetch_add(1, Ordering::Relaxed);
        } else {
            self.mark_disconnected();
        }
    }

    fn mark_disconnected(&self) {
        self.stats.dropped.fetch_add(1, Ordering::Relaxed);
        if !self.stats.disconnected.swap(true, Ordering::Relaxed) {
            tracing::debug!(
                target: "docstream.channel",
                delivered = self.delivered_count(),
                "live channel consumer disconnected, continuing without live view"
            );
        }
    }

    pub fn is_disconnected(&self) -> bool {
        self.stats.disconnected.load(Ordering::Relaxed)
    }

    pub fn delivered_count(&self) -> u64 {
        self.stats.delivered.load(Ordering::Relaxed)
    }

    pub fn dropped_count(&self) -> u64 {
        self.stats.dropped.load(Ordering::Relaxed)
    }
}
