mod config;
pub mod database;
pub mod migrations;

pub use config::{Config, EngineConfig, LoggingConfig, ReporterConfig};
pub use database::SqliteLedger;

use std::path::PathBuf;

/// Returns the data directory, creating it if needed.
///
/// Resolution order:
/// - `REELGUARD_HOME`, if set
/// - `~/.config/reelguard-dev/` when `REELGUARD_ENV=dev`
/// - `~/.config/reelguard/`
///
/// # Errors
/// Returns an error if creating the directory fails.
pub fn data_dir() -> std::io::Result<PathBuf> {
    let dir = match std::env::var_os("REELGUARD_HOME") {
        Some(home) if !home.is_empty() => PathBuf::from(home),
        _ => {
            let base_dir = dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".config");

            let env = std::env::var("REELGUARD_ENV").unwrap_or_else(|_| "production".to_string());
            if env == "dev" {
                base_dir.join("reelguard-dev")
            } else {
                base_dir.join("reelguard")
            }
        }
    };

    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}
