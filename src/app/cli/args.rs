//! Command-line arguments for the demo binary

use crate::app::demo::Scenario;
use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug, Clone, Default)]
#[command(name = "exec-queue")]
#[command(about = "Priority execution queue demonstration")]
#[command(version)]
pub struct Args {
    /// Configuration file path
    #[arg(short = 'c', long = "config-file", value_name = "FILE")]
    pub config_file: Option<PathBuf>,

    /// Log level
    #[arg(short = 'l', long = "log-level", value_name = "LEVEL", value_parser = ["trace", "debug", "info", "warn", "error", "off"])]
    pub log_level: Option<String>,

    /// Log output format
    #[arg(short = 'o', long = "log-format", value_name = "FORMAT", value_parser = ["text", "ext", "json"])]
    pub log_format: Option<String>,

    /// Log file path (use 'none' to disable file logging)
    #[arg(short = 'f', long = "log-file", value_name = "FILE")]
    pub log_file: Option<PathBuf>,

    /// Color output control: unspecified means auto-detect a terminal
    #[arg(short = 'g', long = "color")]
    pub color: Option<bool>,

    /// Simulated work per task in milliseconds
    #[arg(short = 'd', long = "task-delay-ms", value_name = "MS")]
    pub task_delay_ms: Option<u64>,

    /// Maximum tasks handed to the executor per call
    #[arg(short = 'b', long = "max-batch-size", value_name = "N", value_parser = clap::value_parser!(u64).range(1..))]
    pub max_batch_size: Option<u64>,

    /// Demonstration to run
    #[arg(short = 's', long = "scenario", value_enum)]
    pub scenario: Option<Scenario>,
}
