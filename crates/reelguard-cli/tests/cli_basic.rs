//! Basic CLI E2E tests.
//!
//! Each test runs the built binary against its own data directory
//! (`REELGUARD_HOME`) and checks the output.

use std::io::Write;
use std::path::Path;
use std::process::{Command, Stdio};

use tempfile::TempDir;

/// Run a CLI command and return (stdout, stderr, exit code).
fn run_cli(home: &Path, args: &[&str]) -> (String, String, i32) {
    run_cli_with_input(home, args, None)
}

fn run_cli_with_input(home: &Path, args: &[&str], input: Option<&str>) -> (String, String, i32) {
    let mut child = Command::new(env!("CARGO_BIN_EXE_reelguard"))
        .args(args)
        .env("REELGUARD_HOME", home)
        .env_remove("RUST_LOG")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("Failed to execute CLI command");

    if let Some(input) = input {
        child
            .stdin
            .take()
            .unwrap()
            .write_all(input.as_bytes())
            .unwrap();
    } else {
        drop(child.stdin.take());
    }

    let output = child.wait_with_output().unwrap();
    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    let code = output.status.code().unwrap_or(-1);

    (stdout, stderr, code)
}

fn run_cli_success(home: &Path, args: &[&str]) -> String {
    let (stdout, stderr, code) = run_cli(home, args);
    assert_eq!(code, 0, "CLI command failed: {args:?}\n{stderr}");
    stdout
}

fn home() -> TempDir {
    tempfile::tempdir().unwrap()
}

#[test]
fn test_usage_today_starts_at_zero() {
    let home = home();
    let stdout = run_cli_success(home.path(), &["usage", "today"]);
    let status: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(status["count"], 0);
    assert_eq!(status["limit"], 50);
    assert_eq!(status["limit_reached"], false);
}

#[test]
fn test_limit_set_and_get() {
    let home = home();
    run_cli_success(home.path(), &["limit", "set", "100"]);
    let stdout = run_cli_success(home.path(), &["limit", "get"]);
    assert_eq!(stdout.trim(), "100");
}

#[test]
fn test_limit_out_of_range_is_rejected() {
    let home = home();
    let (_, stderr, code) = run_cli(home.path(), &["limit", "set", "5"]);
    assert_ne!(code, 0);
    assert!(stderr.contains("error"));

    let stdout = run_cli_success(home.path(), &["limit", "get"]);
    assert_eq!(stdout.trim(), "50");
}

#[test]
fn test_limit_presets() {
    let home = home();
    let stdout = run_cli_success(home.path(), &["limit", "presets"]);
    let presets: Vec<&str> = stdout.lines().collect();
    assert_eq!(presets, vec!["25", "50", "100", "200", "500", "1000"]);
}

#[test]
fn test_config_get_set() {
    let home = home();
    assert_eq!(
        run_cli_success(home.path(), &["config", "get", "engine.debounce_ms"]).trim(),
        "1000"
    );
    run_cli_success(home.path(), &["config", "set", "engine.debounce_ms", "1500"]);
    assert_eq!(
        run_cli_success(home.path(), &["config", "get", "engine.debounce_ms"]).trim(),
        "1500"
    );

    let (_, _, code) = run_cli(home.path(), &["config", "get", "no.such.key"]);
    assert_ne!(code, 0);
}

#[test]
fn test_classify_snapshot_file() {
    let home = home();
    let path = home.path().join("snapshot.json");
    std::fs::write(
        &path,
        r#"{
            "identifier": "com.google.android.youtube:id/watch_while_layout",
            "type_name": "FrameLayout",
            "children": [
                {"identifier": "com.google.android.youtube:id/reel_player_page_container", "type_name": "ViewGroup"}
            ]
        }"#,
    )
    .unwrap();

    let stdout = run_cli_success(
        home.path(),
        &["classify", "--app", "com.google.android.youtube", path.to_str().unwrap()],
    );
    let result: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(result["in_feed"], true);
    assert_eq!(result["matched"]["keyword"], "reel_");

    let stdout = run_cli_success(
        home.path(),
        &["classify", "--app", "com.example.other", path.to_str().unwrap()],
    );
    let result: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(result["monitored"], false);
    assert_eq!(result["nodes_visited"], 0);
}

#[test]
fn test_replay_counts_and_triggers_once() {
    let home = home();
    let mut events = String::new();
    for i in 0..14 {
        // one scroll every 2s, all on the same local date
        events.push_str(&format!(
            "{{\"app\":\"com.zhiliaoapp.musically\",\"at\":\"2026-10-15T12:00:{:02}Z\",\"kind\":\"scrolled\"}}\n",
            i * 2
        ));
        // burst inside the debounce window
        events.push_str(&format!(
            "{{\"app\":\"com.zhiliaoapp.musically\",\"at\":\"2026-10-15T12:00:{:02}.300Z\",\"kind\":\"scrolled\"}}\n",
            i * 2
        ));
    }
    events.push_str("not json\n");

    let (stdout, stderr, code) = run_cli_with_input(
        home.path(),
        &["replay", "--in-memory", "--limit", "10", "-"],
        Some(&events),
    );
    assert_eq!(code, 0, "{stderr}");

    let lines: Vec<serde_json::Value> = stdout
        .lines()
        .map(|l| serde_json::from_str(l).unwrap())
        .collect();
    assert_eq!(lines.len(), 2);
    assert_eq!(lines[0]["reason"], "daily_limit_reached");
    assert_eq!(lines[0]["count"], 10);

    let summary = &lines[1]["summary"];
    assert_eq!(summary["events"], 28);
    assert_eq!(summary["counted"], 14);
    assert_eq!(summary["triggers"], 1);
    assert_eq!(summary["skipped"], 1);
}

#[test]
fn test_usage_reset() {
    let home = home();
    let stdout = run_cli_success(home.path(), &["usage", "reset"]);
    assert!(stdout.starts_with("usage reset for "));
    let stdout = run_cli_success(home.path(), &["usage", "history"]);
    let history: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(history[0]["count"], 0);
}

#[test]
fn test_watch_prints_one_status() {
    let home = home();
    let stdout = run_cli_success(home.path(), &["watch", "--interval", "1", "--ticks", "1"]);
    let status: serde_json::Value = serde_json::from_str(stdout.trim()).unwrap();
    assert_eq!(status["count"], 0);
}
