//! TOML configuration loading and merging
//!
//! Values come from three layers: built-in defaults, the configuration file
//! and the command line, with later layers winning. Without `--config-file`
//! the default file under the user's config directory is read if present.

use crate::app::cli::args::Args;
use crate::app::demo::{DemoSettings, Scenario};
use crate::core::error_handling::ContextualError;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("The specified configuration file does not exist: {}", .path.display())]
    Missing { path: PathBuf },

    #[error("Error reading configuration file {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Error parsing configuration file {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Invalid configuration value: {message}")]
    Invalid { message: String },
}

impl ContextualError for ConfigError {
    fn is_user_actionable(&self) -> bool {
        matches!(self, ConfigError::Invalid { .. })
    }

    fn user_message(&self) -> Option<&str> {
        match self {
            ConfigError::Invalid { message } => Some(message),
            _ => None,
        }
    }
}

/// Contents of `exec-queue.toml`; every key is optional
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct FileConfig {
    pub log_level: Option<String>,
    pub log_format: Option<String>,
    pub log_file: Option<String>,
    pub color: Option<bool>,
    pub task_delay_ms: Option<u64>,
    pub max_batch_size: Option<usize>,
    pub scenario: Option<Scenario>,
}

/// Fully merged settings for one run
#[derive(Debug, Clone)]
pub struct Settings {
    pub log_level: String,
    pub log_format: String,
    pub log_file: Option<PathBuf>,
    /// `None` means auto-detect
    pub color: Option<bool>,
    pub demo: DemoSettings,
}

pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("ExecQueue").join("exec-queue.toml"))
}

/// Load the configuration file, if there is one
///
/// An explicitly named file must exist; the default file is optional.
pub async fn load_config(config_file: Option<&Path>) -> Result<Option<FileConfig>, ConfigError> {
    let path = match config_file {
        Some(path) if !path.exists() => {
            return Err(ConfigError::Missing {
                path: path.to_path_buf(),
            })
        }
        Some(path) => path.to_path_buf(),
        None => match default_config_path() {
            Some(path) if path.exists() => path,
            _ => return Ok(None),
        },
    };

    let contents = tokio::fs::read_to_string(&path)
        .await
        .map_err(|source| ConfigError::Read {
            path: path.clone(),
            source,
        })?;
    let config = parse_config(&path, &contents)?;
    log::debug!("Loaded configuration from {}", path.display());
    Ok(Some(config))
}

fn parse_config(path: &Path, contents: &str) -> Result<FileConfig, ConfigError> {
    toml::from_str(contents).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

impl Settings {
    /// Merge defaults, file values and command-line values
    pub fn resolve(args: &Args, file: Option<FileConfig>) -> Result<Self, ConfigError> {
        let file = file.unwrap_or_default();
        let defaults = DemoSettings::default();

        let max_batch_size = match args.max_batch_size {
            Some(limit) => Some(usize::try_from(limit).map_err(|_| ConfigError::Invalid {
                message: format!("max-batch-size {} is too large", limit),
            })?),
            None => file.max_batch_size,
        };
        if max_batch_size == Some(0) {
            return Err(ConfigError::Invalid {
                message: "max-batch-size must be at least 1".to_string(),
            });
        }

        let log_format = args
            .log_format
            .clone()
            .or(file.log_format)
            .unwrap_or_else(|| "text".to_string());
        if !matches!(log_format.as_str(), "text" | "ext" | "json") {
            return Err(ConfigError::Invalid {
                message: format!("log-format '{}' must be one of text, ext, json", log_format),
            });
        }

        let log_file = args
            .log_file
            .clone()
            .or_else(|| file.log_file.map(PathBuf::from))
            .filter(|path| !is_disabled_log_file(path));

        Ok(Self {
            log_level: args
                .log_level
                .clone()
                .or(file.log_level)
                .unwrap_or_else(|| "info".to_string()),
            log_format,
            log_file,
            color: args.color.or(file.color),
            demo: DemoSettings {
                scenario: args.scenario.or(file.scenario).unwrap_or_default(),
                task_delay: args
                    .task_delay_ms
                    .or(file.task_delay_ms)
                    .map(Duration::from_millis)
                    .unwrap_or(defaults.task_delay),
                max_batch_size,
            },
        })
    }
}

/// "none" and "-" turn file logging off
fn is_disabled_log_file(path: &Path) -> bool {
    let name = path.to_string_lossy();
    name.eq_ignore_ascii_case("none") || name == "-"
}
