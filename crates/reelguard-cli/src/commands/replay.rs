//! Replay recorded accessibility events.
//!
//! Input is JSON lines, one event per line:
//!
//! ```text
//! {"app":"com.instagram.android","at":"2026-10-15T12:00:00Z","kind":"scrolled","snapshot":{...}}
//! ```
//!
//! `snapshot` is optional; events without one behave as if the window
//! content could not be read. Each block trigger is printed as a JSON line,
//! followed by a summary line.

use std::path::PathBuf;

use clap::Args;
use reelguard_core::{
    Config, EnforcementController, NoSnapshot, ScrollEvent, SqliteLedger, UsageLedger,
};
use serde::{Deserialize, Serialize};
use tracing::warn;

use super::classify::{read_input, snapshot_from_value};

#[derive(Args)]
pub struct ReplayArgs {
    /// JSON-lines event file; "-" reads stdin
    pub events: PathBuf,
    /// Use a throwaway in-memory ledger instead of the stored one
    #[arg(long)]
    pub in_memory: bool,
    /// Set the daily limit before replaying
    #[arg(long)]
    pub limit: Option<u32>,
}

#[derive(Deserialize)]
struct RecordedEvent {
    #[serde(flatten)]
    event: ScrollEvent,
    #[serde(default)]
    snapshot: Option<serde_json::Value>,
}

#[derive(Debug, Default, Serialize)]
struct ReplaySummary {
    events: usize,
    skipped: usize,
    counted: usize,
    failed: usize,
    triggers: usize,
}

pub fn run(args: ReplayArgs) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load()?;
    let ledger = if args.in_memory {
        SqliteLedger::open_memory()?
    } else {
        SqliteLedger::open_default()?
    };
    if let Some(limit) = args.limit {
        ledger.set_limit(limit)?;
    }

    let mut controller = EnforcementController::from_config(&config, ledger);
    let input = read_input(&args.events)?;
    let mut summary = ReplaySummary::default();

    for (index, line) in input.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let recorded: RecordedEvent = match serde_json::from_str(line) {
            Ok(recorded) => recorded,
            Err(e) => {
                warn!(line = index + 1, "skipping malformed event: {e}");
                summary.skipped += 1;
                continue;
            }
        };
        summary.events += 1;

        let snapshot = match recorded.snapshot.map(snapshot_from_value) {
            Some(Ok(snapshot)) => Some(snapshot),
            Some(Err(e)) => {
                warn!(line = index + 1, "{e}");
                None
            }
            None => None,
        };

        let outcome = match &snapshot {
            Some(snapshot) => controller.process(&recorded.event, snapshot),
            None => controller.process(&recorded.event, &NoSnapshot),
        };
        match outcome {
            Ok(outcome) => {
                if outcome.count.is_some() {
                    summary.counted += 1;
                }
                if let Some(trigger) = outcome.trigger {
                    summary.triggers += 1;
                    println!("{}", serde_json::to_string(&trigger)?);
                }
            }
            Err(e) => {
                warn!(line = index + 1, "{e}");
                summary.failed += 1;
            }
        }
    }

    println!("{}", serde_json::json!({ "summary": summary }));
    Ok(())
}
