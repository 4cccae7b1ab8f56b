use std::io::Read;
use std::path::{Path, PathBuf};

use clap::Args;
use reelguard_core::{Config, SnapshotError, SnapshotNode, UiSnapshot};
use serde_json::Value;

#[derive(Args)]
pub struct ClassifyArgs {
    /// Foreground app identifier (e.g. com.instagram.android)
    #[arg(long)]
    pub app: String,
    /// Snapshot JSON file, nested or arena form; "-" reads stdin
    pub snapshot: PathBuf,
}

/// Parse a snapshot in either the nested (`children` inline) or the arena
/// (`nodes` + `root`) form.
pub fn snapshot_from_value(value: Value) -> Result<UiSnapshot, SnapshotError> {
    let parsed = if value.get("nodes").is_some() {
        serde_json::from_value::<UiSnapshot>(value)
    } else {
        serde_json::from_value::<SnapshotNode>(value).map(UiSnapshot::from_tree)
    };
    parsed.map_err(|e| SnapshotError::Malformed(e.to_string()))
}

pub fn read_input(path: &Path) -> std::io::Result<String> {
    if path.as_os_str() == "-" {
        let mut buf = String::new();
        std::io::stdin().read_to_string(&mut buf)?;
        Ok(buf)
    } else {
        std::fs::read_to_string(path)
    }
}

pub fn run(args: ClassifyArgs) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load()?;
    let classifier = config.classifier();

    let raw = read_input(&args.snapshot)?;
    let value: Value = serde_json::from_str(&raw)?;
    let snapshot = snapshot_from_value(value)?;

    let result = classifier.inspect(&args.app, &snapshot);
    let output = serde_json::json!({
        "app": args.app,
        "monitored": classifier.is_monitored(&args.app),
        "in_feed": result.in_feed,
        "nodes_visited": result.nodes_visited,
        "matched": result.matched,
        "truncated": result.truncated,
        "unreadable_nodes": result.unreadable_nodes,
    });
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
