//! Common utilities for CLI E2E tests.

use std::path::Path;
use std::process::Command;

/// Invoke the CLI against an isolated data directory at a fixed local time.
pub fn run_cli(data_dir: &Path, now: &str, args: &[&str]) -> (String, String, i32) {
    let output = Command::new(env!("CARGO_BIN_EXE_recovery-cli"))
        .args(args)
        .env("RECOVERY_DATA_DIR", data_dir)
        .env("RECOVERY_NOW", now)
        .env_remove("RECOVERY_LOG")
        .output()
        .expect("Failed to execute CLI command");

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    let code = output.status.code().unwrap_or(-1);

    (stdout, stderr, code)
}

/// Invoke a CLI command and expect success.
pub fn run_cli_success(data_dir: &Path, now: &str, args: &[&str]) -> String {
    let (stdout, stderr, code) = run_cli(data_dir, now, args);
    assert_eq!(code, 0, "CLI command failed {args:?}: {stderr}");
    stdout
}

/// Invoke a CLI command and expect failure; returns stderr.
pub fn run_cli_failure(data_dir: &Path, now: &str, args: &[&str]) -> String {
    let (_, stderr, code) = run_cli(data_dir, now, args);
    assert!(code != 0, "CLI command unexpectedly succeeded: {args:?}");
    stderr
}

/// Parse JSON output from CLI.
pub fn parse_json(json: &str) -> serde_json::Value {
    serde_json::from_str(json).expect("Failed to parse JSON output")
}
