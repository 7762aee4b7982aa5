//! mysql-exporter-charm library
//!
//! This crate renders the Kubernetes pod specification for a MySQL
//! Prometheus exporter from charm configuration and `mysql` relation data,
//! and builds the relation payloads published to Prometheus and Grafana.

pub mod charm;
pub mod cli;
pub mod config;
pub mod data_source;
pub mod error;
pub mod pod_spec;
pub mod relation;
pub mod targets;

use anyhow::Result;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Port the exporter listens on inside the container
pub const EXPORTER_PORT: u16 = 9104;

/// Path the exporter serves Prometheus metrics on
pub const METRICS_PATH: &str = "/metrics";

/// Default application name when none is given
pub const DEFAULT_APP_NAME: &str = "mysqld-exporter";

/// Initialize the logging subsystem
///
/// Logs are written to stderr so that rendered documents on stdout stay
/// machine-readable.
///
/// # Arguments
/// * `level` - Log level string (trace, debug, info, warn, error)
///
/// # Errors
/// Returns an error if the logging system fails to initialize
pub fn init_logging(level: &str) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))?;

    Ok(())
}
