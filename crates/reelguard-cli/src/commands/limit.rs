use clap::Subcommand;
use reelguard_core::ledger::{LIMIT_PRESETS, MAX_LIMIT, MIN_LIMIT};
use reelguard_core::{SqliteLedger, UsageLedger};

#[derive(Subcommand)]
pub enum LimitAction {
    /// Show the daily limit
    Get,
    /// Set the daily limit
    Set {
        /// Scrolls per day (10-10000)
        value: u32,
    },
    /// List the suggested limits
    Presets,
}

pub fn run(action: LimitAction) -> Result<(), Box<dyn std::error::Error>> {
    match action {
        LimitAction::Get => {
            let ledger = SqliteLedger::open_default()?;
            println!("{}", ledger.limit()?);
        }
        LimitAction::Set { value } => {
            let ledger = SqliteLedger::open_default()?;
            let limit = ledger.set_limit(value)?;
            println!("limit set to {limit}");
        }
        LimitAction::Presets => {
            for preset in LIMIT_PRESETS {
                println!("{preset}");
            }
            eprintln!("any value from {MIN_LIMIT} to {MAX_LIMIT} is accepted");
        }
    }
    Ok(())
}
