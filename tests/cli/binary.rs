//! Runs the demo binary as a user would

use std::io::Write;
use std::process::Command;
use tempfile::NamedTempFile;

fn run_demo(extra_args: &[&str]) -> std::process::Output {
    // An explicit config file keeps the user's own configuration out of the run
    let mut config = NamedTempFile::new().unwrap();
    writeln!(config, "task-delay-ms = 1").unwrap();

    Command::new(env!("CARGO_BIN_EXE_exec-queue"))
        .arg("--config-file")
        .arg(config.path())
        .args(["--color", "false"])
        .args(extra_args)
        .output()
        .unwrap()
}

#[test]
fn test_urgent_scenario_logs_every_task() {
    let output = run_demo(&["--scenario", "urgent"]);
    let stderr = String::from_utf8_lossy(&output.stderr);

    assert!(output.status.success(), "stderr: {}", stderr);
    for value in 1..=5 {
        assert!(
            stderr.contains(&format!("iter-val: {}", value)),
            "missing task {} in: {}",
            value,
            stderr
        );
    }
}

#[test]
fn test_json_log_lines_parse() {
    let output = run_demo(&["--scenario", "cancel", "--log-format", "json"]);
    assert!(output.status.success());

    let stderr = String::from_utf8_lossy(&output.stderr);
    let mut lines = 0;
    for line in stderr.lines().filter(|line| !line.trim().is_empty()) {
        let entry: serde_json::Value = serde_json::from_str(line).unwrap();
        assert!(entry["message"].is_string());
        lines += 1;
    }
    assert!(lines > 0);
}

#[test]
fn test_missing_config_file_fails() {
    let output = Command::new(env!("CARGO_BIN_EXE_exec-queue"))
        .args(["--config-file", "/definitely/not/here/exec-queue.toml"])
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("does not exist"));
}

#[test]
fn test_version_flag() {
    let output = Command::new(env!("CARGO_BIN_EXE_exec-queue"))
        .arg("--version")
        .output()
        .unwrap();

    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).contains(env!("CARGO_PKG_VERSION")));
}
