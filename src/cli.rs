//! CLI argument parsing for jmx-collect
//!
//! This module provides the command-line interface using clap derive macros.
//!
//! # Options
//!
//! - `--config` / `-c`: Optional settings file (default: jmx-collect.yaml, env: JMX_COLLECT_CONFIG)
//! - `--collection-files`: Comma separated absolute paths of collection files (env: COLLECTION_FILES)
//! - `--validate`: Only check that every collection file parses
//! - `--log-level` / `-l`: Log level (trace/debug/info/warn/error, env: JMX_COLLECT_LOG_LEVEL)
//! - `--output-format`: Output format for parsed requests (text/json/yaml)
//!
//! # Precedence
//!
//! Collection files are resolved in the following order (highest to lowest priority):
//! 1. CLI arguments
//! 2. Environment variables
//! 3. Configuration file
//!
//! Connection settings, timeout and metric limit are read from the settings
//! file only; they are validated here and handed to a query engine by
//! library users.

use clap::{Parser, ValueEnum};
use std::path::PathBuf;

use crate::config::{Config, ConfigError};

/// jmx-collect - normalize JMX collection files
///
/// Reads collection files written in the native `collect:` dialect or the
/// legacy agent `jmx:` dialect and prints the resulting collection requests.
#[derive(Parser, Debug)]
#[command(name = "jmx-collect")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to settings file
    #[arg(
        short,
        long,
        value_name = "FILE",
        default_value = "jmx-collect.yaml",
        env = "JMX_COLLECT_CONFIG"
    )]
    pub config: PathBuf,

    /// Comma separated list of full paths to collection files
    #[arg(
        long,
        value_name = "FILES",
        value_delimiter = ',',
        env = "COLLECTION_FILES"
    )]
    pub collection_files: Vec<PathBuf>,

    /// Check that every collection file parses, without printing requests
    #[arg(long)]
    pub validate: bool,

    /// Log level
    #[arg(
        short,
        long,
        value_enum,
        default_value = "info",
        env = "JMX_COLLECT_LOG_LEVEL"
    )]
    pub log_level: LogLevel,

    /// Output format for parsed requests
    #[arg(long, value_enum, default_value = "text")]
    pub output_format: OutputFormat,
}

impl Cli {
    /// Load the settings file and apply command line overrides
    ///
    /// # Errors
    /// Returns an error if the settings file is unreadable or the merged
    /// configuration is invalid
    pub fn resolve_config(&self) -> Result<Config, ConfigError> {
        let mut config = Config::load_or_default(&self.config)?;
        self.apply_overrides(&mut config);
        config.validate()?;
        Ok(config)
    }

    fn apply_overrides(&self, config: &mut Config) {
        if !self.collection_files.is_empty() {
            config.collection_files = self.collection_files.clone();
        }
    }
}

/// Log level options
#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum LogLevel {
    /// Trace level - most verbose
    Trace,
    /// Debug level
    Debug,
    /// Info level - default
    Info,
    /// Warn level
    Warn,
    /// Error level - least verbose
    Error,
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LogLevel::Trace => write!(f, "trace"),
            LogLevel::Debug => write!(f, "debug"),
            LogLevel::Info => write!(f, "info"),
            LogLevel::Warn => write!(f, "warn"),
            LogLevel::Error => write!(f, "error"),
        }
    }
}

/// Output format options for parsed requests
#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text output
    Text,
    /// JSON output
    Json,
    /// YAML output
    Yaml,
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Text => write!(f, "text"),
            OutputFormat::Json => write!(f, "json"),
            OutputFormat::Yaml => write!(f, "yaml"),
        }
    }
}
