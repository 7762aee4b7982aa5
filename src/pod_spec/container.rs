//! Container descriptor builder

use std::collections::BTreeMap;

use crate::config::ImagePullPolicy;

use super::{
    Container, ContainerKubernetes, ContainerPort, ContainerSecurityContext, EnvValue,
    HttpGetAction, ImageInfo, Probe, SecretKeyRef,
};

impl Probe {
    /// HTTP GET probe with platform defaults for every optional field
    pub fn http_get(path: &str, port: u16) -> Self {
        Self {
            http_get: HttpGetAction {
                path: path.to_string(),
                port,
            },
            initial_delay_seconds: 0,
            period_seconds: None,
            timeout_seconds: 1,
            success_threshold: None,
            failure_threshold: 3,
        }
    }

    pub fn initial_delay(mut self, seconds: u32) -> Self {
        self.initial_delay_seconds = seconds;
        self
    }

    pub fn period(mut self, seconds: u32) -> Self {
        self.period_seconds = Some(seconds);
        self
    }

    pub fn timeout(mut self, seconds: u32) -> Self {
        self.timeout_seconds = seconds;
        self
    }

    pub fn success_threshold(mut self, threshold: u32) -> Self {
        self.success_threshold = Some(threshold);
        self
    }

    pub fn failure_threshold(mut self, threshold: u32) -> Self {
        self.failure_threshold = threshold;
        self
    }
}

/// Builder for the workload container
///
/// # Example
///
/// ```ignore
/// let container = ContainerBuilder::new("mysqld-exporter", image, ImagePullPolicy::Always)
///     .add_port("exporter", 9104)
///     .readiness_probe(Probe::http_get("/api/health", 9104))
///     .liveness_probe(Probe::http_get("/api/health", 9104))
///     .build();
/// ```
#[derive(Debug, Clone)]
pub struct ContainerBuilder {
    name: String,
    image: ImageInfo,
    pull_policy: ImagePullPolicy,
    run_as_non_root: bool,
    ports: Vec<ContainerPort>,
    env: BTreeMap<String, EnvValue>,
    readiness_probe: Option<Probe>,
    liveness_probe: Option<Probe>,
}

impl ContainerBuilder {
    pub fn new(name: &str, image: ImageInfo, pull_policy: ImagePullPolicy) -> Self {
        Self {
            name: name.to_string(),
            image,
            pull_policy,
            run_as_non_root: false,
            ports: Vec::new(),
            env: BTreeMap::new(),
            readiness_probe: None,
            liveness_probe: None,
        }
    }

    /// Apply the restricted security context
    pub fn run_as_non_root(mut self, enabled: bool) -> Self {
        self.run_as_non_root = enabled;
        self
    }

    /// Expose a TCP port
    pub fn add_port(mut self, name: &str, port: u16) -> Self {
        self.ports.push(ContainerPort {
            name: name.to_string(),
            container_port: port,
            protocol: "TCP".to_string(),
        });
        self
    }

    pub fn add_env(mut self, name: &str, value: &str) -> Self {
        self.env
            .insert(name.to_string(), EnvValue::Plain(value.to_string()));
        self
    }

    /// Read an environment variable from a secret key
    pub fn add_secret_env(mut self, name: &str, secret_name: &str, key: &str) -> Self {
        self.env.insert(
            name.to_string(),
            EnvValue::Secret {
                secret: SecretKeyRef {
                    name: secret_name.to_string(),
                    key: key.to_string(),
                },
            },
        );
        self
    }

    pub fn readiness_probe(mut self, probe: Probe) -> Self {
        self.readiness_probe = Some(probe);
        self
    }

    pub fn liveness_probe(mut self, probe: Probe) -> Self {
        self.liveness_probe = Some(probe);
        self
    }

    /// Finish the container
    ///
    /// Probes that were not set default to `GET /` on the first exposed port.
    pub fn build(self) -> Container {
        let port = self.ports.first().map(|p| p.container_port).unwrap_or(0);
        let default_probe = || Probe::http_get("/", port);

        Container {
            name: self.name,
            image_details: self.image,
            image_pull_policy: self.pull_policy,
            ports: self.ports,
            env_config: self.env,
            kubernetes: ContainerKubernetes {
                readiness_probe: self.readiness_probe.unwrap_or_else(default_probe),
                liveness_probe: self.liveness_probe.unwrap_or_else(default_probe),
                security_context: self
                    .run_as_non_root
                    .then(ContainerSecurityContext::restricted),
            },
        }
    }
}
