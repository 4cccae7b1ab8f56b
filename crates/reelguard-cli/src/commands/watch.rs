use std::sync::Arc;
use std::time::Duration;

use clap::Args;
use reelguard_core::{Config, SqliteLedger, StatusReporter};
use tracing::info;

#[derive(Args)]
pub struct WatchArgs {
    /// Refresh interval in seconds (defaults to reporter.interval_secs)
    #[arg(long)]
    pub interval: Option<u64>,
    /// Exit after this many status updates
    #[arg(long)]
    pub ticks: Option<usize>,
}

pub fn run(args: WatchArgs) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load()?;
    let interval = args
        .interval
        .map(Duration::from_secs)
        .unwrap_or_else(|| config.reporter_interval());
    let ledger = Arc::new(SqliteLedger::open_default()?);

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(1)
        .enable_all()
        .build()?;

    runtime.block_on(async move {
        let reporter = StatusReporter::spawn(ledger, interval);
        let mut updates = reporter.subscribe();
        let mut printed = 0usize;

        loop {
            tokio::select! {
                changed = updates.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    let status = updates.borrow_and_update().clone();
                    if let Some(status) = status {
                        println!("{}", serde_json::to_string(&status)?);
                        printed += 1;
                        if args.ticks.is_some_and(|n| printed >= n) {
                            break;
                        }
                    }
                }
                _ = tokio::signal::ctrl_c() => {
                    info!("interrupted");
                    break;
                }
            }
        }

        reporter.shutdown().await;
        Ok::<(), Box<dyn std::error::Error>>(())
    })
}
