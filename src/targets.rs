//! Observability relation payloads
//!
//! Data published to Prometheus (scrape target, scrape jobs) and Grafana
//! (dashboard). Only the leader unit publishes these.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::config::{CharmConfig, Scheme};
use crate::METRICS_PATH;

/// Relation receiving the scrape target
pub const PROMETHEUS_SCRAPE_RELATION: &str = "prometheus-scrape";

/// Relation receiving the dashboard
pub const GRAFANA_DASHBOARD_RELATION: &str = "grafana-dashboard";

/// Relation receiving dashboard templates from the dashboard provider
pub const GRAFANA_DASHBOARDS_RELATION: &str = "grafana-dashboards";

/// Relation receiving scrape job definitions
pub const METRICS_ENDPOINT_RELATION: &str = "metrics-endpoint";

/// Name the bundled dashboard is published under
pub const DASHBOARD_NAME: &str = "osm-mysql";

const DASHBOARD_FILE: &str = "mysql_exporter_dashboard.json";

const DASHBOARD_TEMPLATE: &str = include_str!("../templates/mysql_exporter_dashboard.json");

/// Relation databag contents
pub type RelationData = BTreeMap<String, String>;

/// Prometheus scrape target
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScrapeTarget {
    pub hostname: String,
    pub port: String,
    pub metrics_path: String,
    pub scrape_interval: String,
    pub scrape_timeout: String,
}

impl ScrapeTarget {
    /// Target reachable through the site URL when one is configured,
    /// otherwise through the application service
    pub fn new(config: &CharmConfig, app_name: &str, port: u16) -> Self {
        let (hostname, port) = match &config.site_url {
            Some(url) => {
                let port = match url.scheme() {
                    Scheme::Https => "443",
                    Scheme::Http => "80",
                };
                (url.host().to_string(), port.to_string())
            }
            None => (app_name.to_string(), port.to_string()),
        };

        Self {
            hostname,
            port,
            metrics_path: METRICS_PATH.to_string(),
            scrape_interval: "30s".to_string(),
            scrape_timeout: "15s".to_string(),
        }
    }

    pub fn to_relation_data(&self) -> RelationData {
        [
            ("hostname", &self.hostname),
            ("port", &self.port),
            ("metrics_path", &self.metrics_path),
            ("scrape_interval", &self.scrape_interval),
            ("scrape_timeout", &self.scrape_timeout),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.clone()))
        .collect()
    }
}

/// Grafana dashboard
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DashboardTarget {
    pub name: String,
    pub dashboard: String,
}

impl DashboardTarget {
    /// Dashboard shipped with the charm
    pub fn bundled() -> Self {
        Self {
            name: DASHBOARD_NAME.to_string(),
            dashboard: DASHBOARD_TEMPLATE.to_string(),
        }
    }

    pub fn to_relation_data(&self) -> RelationData {
        let mut data = RelationData::new();
        data.insert("name".to_string(), self.name.clone());
        data.insert("dashboard".to_string(), self.dashboard.clone());
        data
    }

    /// Databag for the `grafana-dashboards` provider relation
    ///
    /// Templates are keyed by their source file and tagged with the
    /// publishing application.
    pub fn to_provider_data(&self, app_name: &str) -> serde_json::Result<RelationData> {
        let mut templates = BTreeMap::new();
        templates.insert(
            format!("file:{}", DASHBOARD_FILE),
            DashboardTemplate {
                charm: app_name.to_string(),
                content: self.dashboard.clone(),
            },
        );

        let mut data = RelationData::new();
        data.insert(
            "dashboards".to_string(),
            serde_json::to_string(&DashboardTemplates { templates })?,
        );
        Ok(data)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
struct DashboardTemplate {
    charm: String,
    content: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
struct DashboardTemplates {
    templates: BTreeMap<String, DashboardTemplate>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StaticConfig {
    pub targets: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScrapeJob {
    pub metrics_path: String,
    pub static_configs: Vec<StaticConfig>,
}

/// Scrape jobs for the `metrics-endpoint` relation
///
/// `*` stands for every unit address of the application.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MetricsEndpointJobs {
    pub jobs: Vec<ScrapeJob>,
}

impl MetricsEndpointJobs {
    pub fn new(port: u16) -> Self {
        Self {
            jobs: vec![ScrapeJob {
                metrics_path: METRICS_PATH.to_string(),
                static_configs: vec![StaticConfig {
                    targets: vec![format!("*:{}", port)],
                }],
            }],
        }
    }

    pub fn to_relation_data(&self) -> serde_json::Result<RelationData> {
        let mut data = RelationData::new();
        data.insert("scrape_jobs".to_string(), serde_json::to_string(&self.jobs)?);
        Ok(data)
    }
}
