use clap::Subcommand;
use reelguard_core::ledger::UsageStatus;
use reelguard_core::{DateKey, SqliteLedger, UsageLedger};

#[derive(Subcommand)]
pub enum UsageAction {
    /// Today's count, limit and remaining scrolls
    Today,
    /// Reset today's count to zero
    Reset,
    /// Daily counts, newest first
    History {
        /// Number of days to show
        #[arg(long, default_value_t = 14)]
        days: usize,
    },
}

pub fn run(action: UsageAction) -> Result<(), Box<dyn std::error::Error>> {
    let ledger = SqliteLedger::open_default()?;

    match action {
        UsageAction::Today => {
            let status = UsageStatus::read(&ledger, DateKey::today())?;
            println!("{}", serde_json::to_string_pretty(&status)?);
        }
        UsageAction::Reset => {
            let today = DateKey::today();
            ledger.reset(&today)?;
            println!("usage reset for {today}");
        }
        UsageAction::History { days } => {
            let history: Vec<_> = ledger
                .history(days)?
                .into_iter()
                .map(|(day, count)| serde_json::json!({ "day": day, "count": count }))
                .collect();
            println!("{}", serde_json::to_string_pretty(&history)?);
        }
    }
    Ok(())
}
