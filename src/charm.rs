//! Charm event handling
//!
//! Events from the orchestration platform are routed through a fixed
//! table of handlers. Every platform input a handler needs (leadership,
//! image, options, relation data) is passed in explicitly through
//! [`UnitContext`], and every effect is returned in a [`HandlerOutcome`].

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::Serialize;
use tracing::{debug, info, instrument, warn};

use crate::config::{CharmConfig, RawConfig};
use crate::error::CharmError;
use crate::pod_spec::{DataSourceBinding, ImageInfo, PodSpec, SpecBuilder};
use crate::relation::{MysqlRelation, MYSQL_RELATION};
use crate::targets::{
    DashboardTarget, MetricsEndpointJobs, RelationData, ScrapeTarget, GRAFANA_DASHBOARDS_RELATION,
    GRAFANA_DASHBOARD_RELATION, METRICS_ENDPOINT_RELATION, PROMETHEUS_SCRAPE_RELATION,
};
use crate::{DEFAULT_APP_NAME, EXPORTER_PORT};

/// Lifecycle and relation events the charm reacts to
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Start,
    ConfigChanged,
    UpgradeCharm,
    LeaderElected,
    RelationJoined(String),
    RelationChanged(String),
    RelationBroken(String),
}

impl FromStr for Event {
    type Err = String;

    /// Parse a hook name such as `config-changed` or `mysql-relation-changed`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "start" => return Ok(Event::Start),
            "config-changed" => return Ok(Event::ConfigChanged),
            "upgrade-charm" => return Ok(Event::UpgradeCharm),
            "leader-elected" => return Ok(Event::LeaderElected),
            _ => {}
        }

        let relation_event = |suffix: &str| {
            s.strip_suffix(suffix)
                .filter(|name| !name.is_empty())
                .map(str::to_string)
        };

        if let Some(name) = relation_event("-relation-joined") {
            Ok(Event::RelationJoined(name))
        } else if let Some(name) = relation_event("-relation-changed") {
            Ok(Event::RelationChanged(name))
        } else if let Some(name) = relation_event("-relation-broken") {
            Ok(Event::RelationBroken(name))
        } else {
            Err(format!("unknown event '{}'", s))
        }
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Event::Start => write!(f, "start"),
            Event::ConfigChanged => write!(f, "config-changed"),
            Event::UpgradeCharm => write!(f, "upgrade-charm"),
            Event::LeaderElected => write!(f, "leader-elected"),
            Event::RelationJoined(name) => write!(f, "{}-relation-joined", name),
            Event::RelationChanged(name) => write!(f, "{}-relation-changed", name),
            Event::RelationBroken(name) => write!(f, "{}-relation-broken", name),
        }
    }
}

/// Unit workload status
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "message", rename_all = "lowercase")]
pub enum UnitStatus {
    Active(String),
    Blocked(String),
    Waiting(String),
}

impl UnitStatus {
    pub fn is_blocked(&self) -> bool {
        matches!(self, UnitStatus::Blocked(_))
    }
}

impl fmt::Display for UnitStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnitStatus::Active(msg) => write!(f, "active: {}", msg),
            UnitStatus::Blocked(msg) => write!(f, "blocked: {}", msg),
            UnitStatus::Waiting(msg) => write!(f, "waiting: {}", msg),
        }
    }
}

/// Snapshot of the platform state a handler runs against
#[derive(Debug, Clone, Default)]
pub struct UnitContext {
    pub is_leader: bool,
    pub image: Option<ImageInfo>,
    pub config: RawConfig,
    pub mysql: MysqlRelation,
}

/// Effects of one handler invocation
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct HandlerOutcome {
    /// New unit status, `None` leaves the status untouched
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<UnitStatus>,

    /// Pod spec to apply
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pod_spec: Option<PodSpec>,

    /// Data to publish, keyed by relation name
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub relation_data: BTreeMap<String, RelationData>,
}

impl HandlerOutcome {
    /// Nothing to do
    pub fn ignored() -> Self {
        Self::default()
    }

    fn with_status(status: UnitStatus) -> Self {
        Self {
            status: Some(status),
            ..Self::default()
        }
    }

    fn publish(relation: &str, data: RelationData) -> Self {
        let mut relation_data = BTreeMap::new();
        relation_data.insert(relation.to_string(), data);
        Self {
            relation_data,
            ..Self::default()
        }
    }
}

/// Event pattern a handler is registered against
#[derive(Debug, Clone, Copy)]
enum Trigger {
    Start,
    ConfigChanged,
    UpgradeCharm,
    LeaderElected,
    RelationJoined(&'static str),
    RelationChanged(&'static str),
    RelationBroken(&'static str),
}

impl Trigger {
    fn matches(self, event: &Event) -> bool {
        match (self, event) {
            (Trigger::Start, Event::Start)
            | (Trigger::ConfigChanged, Event::ConfigChanged)
            | (Trigger::UpgradeCharm, Event::UpgradeCharm)
            | (Trigger::LeaderElected, Event::LeaderElected) => true,
            (Trigger::RelationJoined(r), Event::RelationJoined(name))
            | (Trigger::RelationChanged(r), Event::RelationChanged(name))
            | (Trigger::RelationBroken(r), Event::RelationBroken(name)) => name == r,
            _ => false,
        }
    }
}

type Handler = fn(&MysqlExporterCharm, &Event, &UnitContext) -> HandlerOutcome;

const HANDLERS: &[(Trigger, Handler)] = &[
    (Trigger::Start, MysqlExporterCharm::configure_pod),
    (Trigger::ConfigChanged, MysqlExporterCharm::configure_pod),
    (Trigger::UpgradeCharm, MysqlExporterCharm::configure_pod),
    (Trigger::LeaderElected, MysqlExporterCharm::configure_pod),
    (
        Trigger::RelationChanged(MYSQL_RELATION),
        MysqlExporterCharm::configure_pod,
    ),
    (
        Trigger::RelationBroken(MYSQL_RELATION),
        MysqlExporterCharm::configure_pod,
    ),
    (
        Trigger::RelationJoined(PROMETHEUS_SCRAPE_RELATION),
        MysqlExporterCharm::publish_scrape_info,
    ),
    (
        Trigger::RelationJoined(GRAFANA_DASHBOARD_RELATION),
        MysqlExporterCharm::publish_dashboard_info,
    ),
    (
        Trigger::RelationJoined(GRAFANA_DASHBOARDS_RELATION),
        MysqlExporterCharm::publish_dashboards,
    ),
    (
        Trigger::RelationJoined(METRICS_ENDPOINT_RELATION),
        MysqlExporterCharm::publish_scrape_jobs,
    ),
];

/// The MySQL exporter charm
#[derive(Debug, Clone)]
pub struct MysqlExporterCharm {
    app_name: String,
    port: u16,
    binding: DataSourceBinding,
}

impl Default for MysqlExporterCharm {
    fn default() -> Self {
        Self::new(DEFAULT_APP_NAME)
    }
}

impl MysqlExporterCharm {
    pub fn new(app_name: &str) -> Self {
        Self {
            app_name: app_name.to_string(),
            port: EXPORTER_PORT,
            binding: DataSourceBinding::default(),
        }
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn with_binding(mut self, binding: DataSourceBinding) -> Self {
        self.binding = binding;
        self
    }

    /// Route an event to its handler
    #[instrument(skip_all, fields(event = %event, leader = ctx.is_leader))]
    pub fn dispatch(&self, event: &Event, ctx: &UnitContext) -> HandlerOutcome {
        match HANDLERS.iter().find(|(trigger, _)| trigger.matches(event)) {
            Some((_, handler)) => handler(self, event, ctx),
            None => {
                debug!("No handler registered, ignoring event");
                HandlerOutcome::ignored()
            }
        }
    }

    fn spec_builder(&self) -> SpecBuilder {
        SpecBuilder::new(&self.app_name, self.port).with_binding(self.binding)
    }

    /// Render and apply the pod spec
    fn configure_pod(&self, event: &Event, ctx: &UnitContext) -> HandlerOutcome {
        if !ctx.is_leader {
            debug!("Not the leader, pod spec left to the leader unit");
            return HandlerOutcome::with_status(UnitStatus::Active("ready".to_string()));
        }

        let broken = MysqlRelation::default();
        let relation = match event {
            Event::RelationBroken(name) if name == MYSQL_RELATION => &broken,
            _ => &ctx.mysql,
        };

        let result = match ctx.image.as_ref().filter(|image| !image.is_empty()) {
            None => Ok(None),
            Some(image) => ctx
                .config
                .validate()
                .map_err(CharmError::from)
                .and_then(|config| self.spec_builder().build(Some(image), &config, relation)),
        };

        match result {
            Ok(Some(pod_spec)) => {
                info!("Pod spec rendered");
                HandlerOutcome {
                    status: Some(UnitStatus::Active("ready".to_string())),
                    pod_spec: Some(pod_spec),
                    ..HandlerOutcome::default()
                }
            }
            Ok(None) => {
                info!("Container image not available yet");
                HandlerOutcome::with_status(UnitStatus::Waiting(
                    "waiting for container image".to_string(),
                ))
            }
            Err(e) if e.is_waiting() => {
                info!(reason = %e, "Missing dependency");
                HandlerOutcome::with_status(UnitStatus::Blocked(e.to_string()))
            }
            Err(e) => {
                warn!(error = %e, "Failed to render pod spec");
                HandlerOutcome::with_status(UnitStatus::Blocked(e.to_string()))
            }
        }
    }

    fn leader_config(&self, ctx: &UnitContext) -> Option<CharmConfig> {
        if !ctx.is_leader {
            debug!("Not the leader, skipping publication");
            return None;
        }
        match ctx.config.validate() {
            Ok(config) => Some(config),
            Err(e) => {
                warn!(error = %e, "Invalid configuration, skipping publication");
                None
            }
        }
    }

    /// Publish the Prometheus scrape target
    fn publish_scrape_info(&self, _event: &Event, ctx: &UnitContext) -> HandlerOutcome {
        let Some(config) = self.leader_config(ctx) else {
            return HandlerOutcome::ignored();
        };
        let target = ScrapeTarget::new(&config, &self.app_name, self.port);
        info!(hostname = %target.hostname, port = %target.port, "Publishing scrape target");
        HandlerOutcome::publish(PROMETHEUS_SCRAPE_RELATION, target.to_relation_data())
    }

    /// Publish the bundled Grafana dashboard
    fn publish_dashboard_info(&self, _event: &Event, ctx: &UnitContext) -> HandlerOutcome {
        if !ctx.is_leader {
            return HandlerOutcome::ignored();
        }
        info!("Publishing dashboard");
        HandlerOutcome::publish(
            GRAFANA_DASHBOARD_RELATION,
            DashboardTarget::bundled().to_relation_data(),
        )
    }

    /// Publish dashboard templates on the `grafana-dashboards` relation
    fn publish_dashboards(&self, _event: &Event, ctx: &UnitContext) -> HandlerOutcome {
        if !ctx.is_leader {
            return HandlerOutcome::ignored();
        }
        match DashboardTarget::bundled().to_provider_data(&self.app_name) {
            Ok(data) => HandlerOutcome::publish(GRAFANA_DASHBOARDS_RELATION, data),
            Err(e) => {
                warn!(error = %e, "Failed to encode dashboard templates");
                HandlerOutcome::ignored()
            }
        }
    }

    /// Publish scrape jobs on the `metrics-endpoint` relation
    fn publish_scrape_jobs(&self, _event: &Event, ctx: &UnitContext) -> HandlerOutcome {
        if !ctx.is_leader {
            return HandlerOutcome::ignored();
        }
        match MetricsEndpointJobs::new(self.port).to_relation_data() {
            Ok(data) => HandlerOutcome::publish(METRICS_ENDPOINT_RELATION, data),
            Err(e) => {
                warn!(error = %e, "Failed to encode scrape jobs");
                HandlerOutcome::ignored()
            }
        }
    }
}
