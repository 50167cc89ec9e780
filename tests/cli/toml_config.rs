//! TOML configuration tests

use clap::Parser;
use exec_queue::app::cli::args::Args;
use exec_queue::app::cli::config::{load_config, ConfigError, Settings};
use exec_queue::app::demo::Scenario;
use std::io::Write;
use std::time::Duration;
use tempfile::NamedTempFile;

fn config_file(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file
}

#[tokio::test]
async fn test_file_values_fill_unset_arguments() {
    let file = config_file("task-delay-ms = 7\nscenario = \"cancel\"\nlog-level = \"debug\"\n");
    let args = Args::try_parse_from(["exec-queue", "--log-level", "error"]).unwrap();

    let config = load_config(Some(file.path())).await.unwrap();
    let settings = Settings::resolve(&args, config).unwrap();

    assert_eq!(settings.log_level, "error");
    assert_eq!(settings.demo.task_delay, Duration::from_millis(7));
    assert_eq!(settings.demo.scenario, Scenario::Cancel);
}

#[tokio::test]
async fn test_empty_file_is_valid() {
    let file = config_file("");

    let config = load_config(Some(file.path())).await.unwrap();
    assert_eq!(config, Some(Default::default()));
}

#[tokio::test]
async fn test_wrong_value_type_is_reported_with_path() {
    let file = config_file("task-delay-ms = \"fast\"\n");

    let error = load_config(Some(file.path())).await.unwrap_err();
    assert!(matches!(error, ConfigError::Parse { .. }));
    let message = error.to_string();
    assert!(message.contains(&file.path().display().to_string()), "{}", message);
}
