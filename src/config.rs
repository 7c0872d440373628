//! Configuration module for the node.
//!
//! Supports both command-line arguments and TOML configuration file.
//! CLI arguments take precedence over config file values.

use clap::Parser;
use serde::Deserialize;
use std::path::PathBuf;

use crate::runtime::{DispatchOptions, DEFAULT_MAX_LINE_SIZE};

/// Command-line arguments for the node
#[derive(Parser, Debug)]
#[command(name = "glomers-node")]
#[command(author = "glomers-node authors")]
#[command(version = "0.1.0")]
#[command(about = "A Maelstrom node speaking JSON over stdin/stdout", long_about = None)]
pub struct CliArgs {
    /// Path to TOML configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long)]
    pub log_level: Option<String>,

    /// Answer requests of unknown type with a not-supported error
    #[arg(long)]
    pub reply_not_supported: bool,

    /// Discard input lines longer than this many bytes
    #[arg(long)]
    pub max_line_size: Option<usize>,

    /// Colorize log output
    #[arg(long)]
    pub ansi: bool,
}

/// TOML configuration file structure
#[derive(Debug, Deserialize, Default)]
pub struct TomlConfig {
    #[serde(default)]
    pub node: NodeConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Node behaviour configuration
#[derive(Debug, Deserialize, Default)]
pub struct NodeConfig {
    /// Reject unknown request types instead of ignoring them
    #[serde(default)]
    pub reply_not_supported: bool,
    /// Longest accepted input line in bytes
    #[serde(default)]
    pub max_line_size: Option<usize>,
}

/// Logging configuration
#[derive(Debug, Deserialize)]
pub struct LoggingConfig {
    /// Log level
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Colorize log output
    #[serde(default)]
    pub ansi: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            ansi: false,
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Final resolved configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub log_level: String,
    pub ansi: bool,
    pub reply_not_supported: bool,
    pub max_line_size: usize,
}

impl Config {
    /// Load configuration from CLI args and optional TOML file.
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_args(CliArgs::parse())
    }

    /// Merge parsed CLI args with the TOML file they name, if any.
    /// CLI arguments take precedence over TOML file values.
    pub fn from_args(cli: CliArgs) -> Result<Self, ConfigError> {
        let toml_config = if let Some(ref config_path) = cli.config {
            let contents = std::fs::read_to_string(config_path)
                .map_err(|e| ConfigError::FileRead(config_path.clone(), e))?;
            toml::from_str(&contents)
                .map_err(|e| ConfigError::TomlParse(config_path.clone(), e))?
        } else {
            TomlConfig::default()
        };

        let max_line_size = cli
            .max_line_size
            .or(toml_config.node.max_line_size)
            .unwrap_or(DEFAULT_MAX_LINE_SIZE);
        if max_line_size == 0 {
            return Err(ConfigError::InvalidValue(
                "max_line_size",
                "must be at least 1".to_string(),
            ));
        }

        Ok(Config {
            log_level: cli.log_level.unwrap_or(toml_config.logging.level),
            ansi: cli.ansi || toml_config.logging.ansi,
            reply_not_supported: cli.reply_not_supported || toml_config.node.reply_not_supported,
            max_line_size,
        })
    }

    pub fn dispatch_options(&self) -> DispatchOptions {
        DispatchOptions {
            reply_not_supported: self.reply_not_supported,
            max_line_size: self.max_line_size,
        }
    }
}

/// Configuration loading errors
#[derive(Debug)]
pub enum ConfigError {
    FileRead(PathBuf, std::io::Error),
    TomlParse(PathBuf, toml::de::Error),
    InvalidValue(&'static str, String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::FileRead(path, e) => {
                write!(f, "Failed to read config file '{}': {}", path.display(), e)
            }
            ConfigError::TomlParse(path, e) => {
                write!(f, "Failed to parse config file '{}': {}", path.display(), e)
            }
            ConfigError::InvalidValue(field, reason) => {
                write!(f, "Invalid value for '{}': {}", field, reason)
            }
        }
    }
}

impl std::error::Error for ConfigError {}
