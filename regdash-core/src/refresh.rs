//! Periodic refresh trigger

use std::time::Duration;

use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::debug;

/// One firing of the refresh timer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RefreshTick {
    pub seq: u64,
}

/// Background task that sends a `RefreshTick` every period.
///
/// The first tick arrives one period after spawning. Ticks the receiver has
/// not consumed yet are not queued twice. The task stops when the receiver is
/// dropped, on `cancel`, or when the timer itself is dropped.
#[derive(Debug)]
pub struct RefreshTimer {
    period: Duration,
    handle: JoinHandle<()>,
}

impl RefreshTimer {
    /// Must be called from within a tokio runtime
    pub fn spawn(period: Duration, tx: mpsc::Sender<RefreshTick>) -> Self {
        let handle = tokio::spawn(async move {
            let mut interval = interval_at(Instant::now() + period, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
            let mut seq = 0u64;

            loop {
                interval.tick().await;
                seq += 1;
                match tx.try_send(RefreshTick { seq }) {
                    Ok(()) => {}
                    Err(TrySendError::Full(_)) => debug!(seq, "refresh tick skipped, receiver busy"),
                    Err(TrySendError::Closed(_)) => {
                        debug!("refresh receiver gone, stopping timer");
                        break;
                    }
                }
            }
        });

        Self { period, handle }
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    pub fn cancel(&self) {
        self.handle.abort();
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

impl Drop for RefreshTimer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
