//! CLI argument parsing tests

use clap::Parser;
use exec_queue::app::cli::args::Args;
use exec_queue::app::cli::config::Settings;
use exec_queue::app::demo::Scenario;
use std::time::Duration;

static COMMAND_NAME: &str = "exec-queue";

#[test]
fn test_short_flags() {
    let args = Args::try_parse_from([
        COMMAND_NAME, "-l", "warn", "-o", "ext", "-d", "3", "-b", "2", "-s", "urgent",
    ])
    .unwrap();

    assert_eq!(args.log_level.as_deref(), Some("warn"));
    assert_eq!(args.log_format.as_deref(), Some("ext"));
    assert_eq!(args.task_delay_ms, Some(3));
    assert_eq!(args.max_batch_size, Some(2));
    assert_eq!(args.scenario, Some(Scenario::Urgent));
}

#[test]
fn test_equals_syntax() {
    let args = Args::try_parse_from([COMMAND_NAME, "--scenario=cancel", "--color=true"]).unwrap();

    assert_eq!(args.scenario, Some(Scenario::Cancel));
    assert_eq!(args.color, Some(true));
}

#[test]
fn test_arguments_resolve_to_demo_settings() {
    let args = Args::try_parse_from([COMMAND_NAME, "--task-delay-ms", "0", "--max-batch-size", "8"])
        .unwrap();

    let settings = Settings::resolve(&args, None).unwrap();

    assert_eq!(settings.demo.task_delay, Duration::ZERO);
    assert_eq!(settings.demo.max_batch_size, Some(8));
    assert_eq!(settings.demo.scenario, Scenario::All);
}

#[test]
fn test_log_file_none_disables_file_output() {
    let args = Args::try_parse_from([COMMAND_NAME, "--log-file", "none"]).unwrap();

    let settings = Settings::resolve(&args, None).unwrap();
    assert!(settings.log_file.is_none());
}

#[test]
fn test_unknown_argument_is_rejected() {
    assert!(Args::try_parse_from([COMMAND_NAME, "--plugin-dir", "/tmp"]).is_err());
}
