//! Latest-value throttle between the aggregator and the dispatcher.
//!
//! Pushes land in a single slot that each push overwrites. A timer task
//! wakes once per interval and, when the slot is full, takes the snapshot and
//! delivers it. Bursts therefore collapse into one delivery carrying the
//! newest value, and the accessory never lags more than one interval behind.
//!
//! 节流发布：同一周期内只投递最新快照，且每个周期最多投递一次。

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, trace};

use lw_core::WatchState;

/// Receiver of throttled snapshots.
#[async_trait]
pub trait SnapshotSink: Send + Sync {
    async fn publish(&self, snapshot: WatchState);
}

pub struct ThrottledPublisher {
    interval: Duration,
    pending: Arc<Mutex<Option<WatchState>>>,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl ThrottledPublisher {
    /// Start the delivery loop on the current tokio runtime.
    ///
    /// The first delivery opportunity is one full interval after start.
    pub fn start(interval: Duration, sink: Arc<dyn SnapshotSink>) -> Arc<Self> {
        let pending: Arc<Mutex<Option<WatchState>>> = Arc::new(Mutex::new(None));

        let slot = Arc::clone(&pending);
        let task = tokio::spawn(async move {
            let mut ticker = interval_at(Instant::now() + interval, interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                ticker.tick().await;
                let next = lock_slot(&slot).take();
                match next {
                    Some(snapshot) => {
                        debug!("Delivering throttled watch state");
                        sink.publish(snapshot).await;
                    }
                    None => trace!("Nothing pushed this interval"),
                }
            }
        });

        Arc::new(Self {
            interval,
            pending,
            task: Mutex::new(Some(task)),
        })
    }

    /// Queue `snapshot` for the next interval boundary, replacing anything
    /// queued before it.
    pub fn push(&self, snapshot: WatchState) {
        if lock_slot(&self.pending).replace(snapshot).is_some() {
            trace!("Coalesced pending watch state");
        }
    }

    pub fn has_pending(&self) -> bool {
        lock_slot(&self.pending).is_some()
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Stop the delivery loop. Anything still pending is dropped.
    pub fn stop(&self) {
        let task = self
            .task
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .take();
        if let Some(task) = task {
            task.abort();
            debug!("Throttled publisher stopped");
        }
    }
}

impl Drop for ThrottledPublisher {
    fn drop(&mut self) {
        self.stop();
    }
}

fn lock_slot(slot: &Mutex<Option<WatchState>>) -> MutexGuard<'_, Option<WatchState>> {
    slot.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
