//! CLI argument parsing for mysql-exporter-charm
//!
//! This module provides the command-line interface using clap derive macros.
//!
//! # Options
//!
//! - `--config` / `-c`: Charm options file (default: config.yaml, env: MYSQL_EXPORTER_CHARM_CONFIG)
//! - `--relation` / `-r`: `mysql` relation data file (env: MYSQL_EXPORTER_CHARM_RELATION)
//! - `--image`: Image details file (env: MYSQL_EXPORTER_CHARM_IMAGE)
//! - `--image-path`: Image registry path, used when no image file is given
//! - `--app-name`: Application name (default: mysqld-exporter)
//! - `--port`: Exporter port (default: 9104)
//! - `--leader`: Whether this unit is the leader (default: true)
//! - `--event`: Hook to run (default: config-changed)
//! - `--inline-env`: Put the connection string directly in the environment
//! - `--validate`: Validate the options without rendering anything
//! - `--output-format`: Output format (json/yaml)
//! - `--log-level` / `-l`: Log level (trace/debug/info/warn/error)

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

use crate::charm::Event;
use crate::{DEFAULT_APP_NAME, EXPORTER_PORT};

/// mysql-exporter-charm - pod spec renderer for the MySQL Prometheus exporter
///
/// Runs one charm hook against option, relation and image files and prints
/// the resulting status, pod spec and relation data.
#[derive(Parser, Debug)]
#[command(name = "mysql-exporter-charm")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to the charm options file
    #[arg(
        short,
        long,
        value_name = "FILE",
        default_value = "config.yaml",
        env = "MYSQL_EXPORTER_CHARM_CONFIG"
    )]
    pub config: PathBuf,

    /// Path to the `mysql` relation data file
    #[arg(short, long, value_name = "FILE", env = "MYSQL_EXPORTER_CHARM_RELATION")]
    pub relation: Option<PathBuf>,

    /// Path to the resolved image details file
    #[arg(long, value_name = "FILE", env = "MYSQL_EXPORTER_CHARM_IMAGE")]
    pub image: Option<PathBuf>,

    /// Image registry path (ignored when --image is given)
    #[arg(long, value_name = "REF", env = "MYSQL_EXPORTER_CHARM_IMAGE_PATH")]
    pub image_path: Option<String>,

    /// Application name
    #[arg(long, value_name = "NAME", default_value = DEFAULT_APP_NAME)]
    pub app_name: String,

    /// Exporter port
    #[arg(long, value_name = "PORT", default_value_t = EXPORTER_PORT)]
    pub port: u16,

    /// Whether this unit is the leader
    #[arg(long, value_name = "BOOL", default_value_t = true, action = clap::ArgAction::Set)]
    pub leader: bool,

    /// Hook to run, e.g. config-changed or prometheus-scrape-relation-joined
    #[arg(long, value_name = "HOOK", default_value = "config-changed", value_parser = parse_event)]
    pub event: Event,

    /// Put the connection string directly in the container environment
    #[arg(long)]
    pub inline_env: bool,

    /// Validate the charm options without rendering anything
    #[arg(long)]
    pub validate: bool,

    /// Log level
    #[arg(
        short,
        long,
        value_enum,
        default_value = "warn",
        env = "MYSQL_EXPORTER_CHARM_LOG_LEVEL"
    )]
    pub log_level: LogLevel,

    /// Output format
    #[arg(long, value_enum, default_value = "json")]
    pub output_format: OutputFormat,
}

fn parse_event(s: &str) -> Result<Event, String> {
    s.parse()
}

/// Log level options
#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum LogLevel {
    /// Trace level - most verbose
    Trace,
    /// Debug level
    Debug,
    /// Info level
    Info,
    /// Warn level - default
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

/// Output format options
#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// JSON output
    Json,
    /// YAML output
    Yaml,
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Json => write!(f, "json"),
            OutputFormat::Yaml => write!(f, "yaml"),
        }
    }
}
