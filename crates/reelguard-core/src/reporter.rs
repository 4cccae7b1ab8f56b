//! Periodic status reporter.
//!
//! A background task that re-reads today's usage from the ledger on a fixed
//! interval and publishes it on a `watch` channel. Ledger reads are
//! synchronous, so each one runs on the blocking pool.
//!
//! It only reads, so it can run next to the enforcement controller that
//! writes the same database. For SQLite, give it its own connection from
//! [`SqliteLedger::open_reader`](crate::SqliteLedger::open_reader) so its
//! reads never queue behind the writer's connection lock.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, warn};

use crate::ledger::{DateKey, UsageLedger, UsageStatus};

const MIN_INTERVAL: Duration = Duration::from_millis(10);

/// Handle to a running reporter task.
pub struct StatusReporter {
    status_rx: watch::Receiver<Option<UsageStatus>>,
    shutdown_tx: watch::Sender<bool>,
    handle: JoinHandle<()>,
}

impl StatusReporter {
    /// Start reporting on the current tokio runtime.
    ///
    /// The first read happens immediately. `interval` is raised to 10ms if
    /// smaller.
    pub fn spawn<L>(ledger: Arc<L>, interval: Duration) -> Self
    where
        L: UsageLedger + ?Sized + 'static,
    {
        let (status_tx, status_rx) = watch::channel(None);
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let handle = tokio::spawn(report_loop(
            ledger,
            interval.max(MIN_INTERVAL),
            status_tx,
            shutdown_rx,
        ));

        Self {
            status_rx,
            shutdown_tx,
            handle,
        }
    }

    /// Receiver notified whenever the published status changes.
    pub fn subscribe(&self) -> watch::Receiver<Option<UsageStatus>> {
        self.status_rx.clone()
    }

    /// Last published status, `None` until the first successful read.
    pub fn latest(&self) -> Option<UsageStatus> {
        self.status_rx.borrow().clone()
    }

    /// Stop the task and wait for it to exit.
    pub async fn shutdown(self) {
        let _ = self.shutdown_tx.send(true);
        if let Err(e) = self.handle.await {
            warn!("status reporter ended abnormally: {e}");
        }
    }
}

async fn report_loop<L>(
    ledger: Arc<L>,
    interval: Duration,
    status_tx: watch::Sender<Option<UsageStatus>>,
    mut shutdown_rx: watch::Receiver<bool>,
) where
    L: UsageLedger + ?Sized + 'static,
{
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let reader = Arc::clone(&ledger);
                let read = tokio::task::spawn_blocking(move || {
                    UsageStatus::read(reader.as_ref(), DateKey::today())
                });
                match read.await {
                    Ok(Ok(status)) => {
                        status_tx.send_if_modified(|current| {
                            if current.as_ref() == Some(&status) {
                                false
                            } else {
                                *current = Some(status);
                                true
                            }
                        });
                    }
                    // Keep the last good status; the next tick retries.
                    Ok(Err(e)) => warn!("status refresh failed: {e}"),
                    Err(e) => warn!("status refresh task failed: {e}"),
                }
            }
            changed = shutdown_rx.changed() => {
                if changed.is_err() || *shutdown_rx.borrow() {
                    debug!("status reporter shutting down");
                    break;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::MemoryLedger;

    async fn wait_for_count(
        rx: &mut watch::Receiver<Option<UsageStatus>>,
        count: u32,
    ) -> UsageStatus {
        tokio::time::timeout(Duration::from_secs(5), async {
            loop {
                if let Some(status) = rx.borrow_and_update().clone() {
                    if status.count == count {
                        return status;
                    }
                }
                rx.changed().await.unwrap();
            }
        })
        .await
        .unwrap()
    }

    #[tokio::test]
    async fn publishes_current_usage() {
        let ledger = Arc::new(MemoryLedger::new());
        let reporter = StatusReporter::spawn(ledger.clone(), Duration::from_millis(10));
        let mut rx = reporter.subscribe();

        let status = wait_for_count(&mut rx, 0).await;
        assert_eq!(status.limit, 50);
        assert!(!status.limit_reached);

        ledger.increment(&DateKey::today()).unwrap();
        let status = wait_for_count(&mut rx, 1).await;
        assert_eq!(status.remaining, 49);
        assert_eq!(reporter.latest(), Some(status));

        reporter.shutdown().await;
    }

    #[tokio::test]
    async fn shutdown_stops_task() {
        let ledger = Arc::new(MemoryLedger::new());
        let reporter = StatusReporter::spawn(ledger, Duration::from_secs(3600));
        tokio::time::timeout(Duration::from_secs(5), reporter.shutdown())
            .await
            .unwrap();
    }
}
