//! mysql-exporter-charm - pod spec renderer for the MySQL Prometheus exporter
//!
//! This binary runs a single charm hook against option, relation and image
//! files and prints the handler outcome.

use anyhow::{bail, Context, Result};
use clap::Parser;
use tracing::info;

use mysql_exporter_charm::charm::{MysqlExporterCharm, UnitContext};
use mysql_exporter_charm::cli::{Cli, OutputFormat};
use mysql_exporter_charm::config::RawConfig;
use mysql_exporter_charm::pod_spec::{DataSourceBinding, ImageInfo};
use mysql_exporter_charm::relation::MysqlRelation;

fn main() -> Result<()> {
    // Parse CLI arguments
    let cli = Cli::parse();

    // Initialize logging
    mysql_exporter_charm::init_logging(&cli.log_level.to_string())?;

    info!(
        version = env!("CARGO_PKG_VERSION"),
        event = %cli.event,
        "Starting mysql-exporter-charm"
    );

    // Load charm options
    let config = RawConfig::load_or_default(&cli.config)?;

    if cli.validate {
        config.validate()?;
        println!("Configuration is valid");
        return Ok(());
    }

    let mysql = match &cli.relation {
        Some(path) => MysqlRelation::load(path)
            .with_context(|| format!("Failed to load relation data from {}", path.display()))?,
        None => MysqlRelation::default(),
    };

    let image = match (&cli.image, &cli.image_path) {
        (Some(path), _) => Some(
            ImageInfo::load(path)
                .with_context(|| format!("Failed to load image details from {}", path.display()))?,
        ),
        (None, Some(image_path)) => Some(ImageInfo::from_image_path(image_path)),
        (None, None) => None,
    };

    let binding = if cli.inline_env {
        DataSourceBinding::Inline
    } else {
        DataSourceBinding::Secret
    };
    let charm = MysqlExporterCharm::new(&cli.app_name)
        .with_port(cli.port)
        .with_binding(binding);

    let ctx = UnitContext {
        is_leader: cli.leader,
        image,
        config,
        mysql,
    };

    let outcome = charm.dispatch(&cli.event, &ctx);

    let rendered = match cli.output_format {
        OutputFormat::Json => serde_json::to_string_pretty(&outcome)?,
        OutputFormat::Yaml => serde_yaml::to_string(&outcome)?,
    };
    println!("{}", rendered);

    if let Some(status) = outcome.status.as_ref().filter(|s| s.is_blocked()) {
        bail!("Unit is {}", status);
    }

    Ok(())
}
