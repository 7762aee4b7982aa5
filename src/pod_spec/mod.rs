//! Pod spec (version 3) model and builder
//!
//! This module holds the serde model of the pod spec document handed to the
//! orchestration platform, and the builder that renders it from validated
//! configuration and relation data. Field names follow the platform API and
//! must not change.

pub mod builder;
pub mod container;
pub mod ingress;

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::config::{ConfigError, ImagePullPolicy};

pub use builder::{build_pod_spec, DataSourceBinding, SpecBuilder};
pub use container::ContainerBuilder;
pub use ingress::IngressResourceBuilder;

/// Pod spec format version
pub const POD_SPEC_VERSION: u8 = 3;

/// Resolved OCI image details
///
/// Opaque to this crate: whatever the image resource resolved to is passed
/// through as `imageDetails`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ImageInfo(BTreeMap<String, String>);

impl ImageInfo {
    /// Image details pointing at a registry path
    pub fn from_image_path(path: &str) -> Self {
        let mut details = BTreeMap::new();
        details.insert("imagePath".to_string(), path.to_string());
        Self(details)
    }

    /// Load image details from a YAML mapping
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path.as_ref())?;
        if contents.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(&contents)?)
    }

    /// An empty descriptor means the image is not resolvable yet
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }
}

impl From<BTreeMap<String, String>> for ImageInfo {
    fn from(details: BTreeMap<String, String>) -> Self {
        Self(details)
    }
}

/// Complete pod spec document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PodSpec {
    pub version: u8,
    pub containers: Vec<Container>,
    pub kubernetes_resources: KubernetesResources,
}

impl PodSpec {
    /// The workload container
    pub fn container(&self) -> Option<&Container> {
        self.containers.first()
    }

    /// Connection string given to the exporter, whichever way it is bound
    pub fn data_source(&self) -> Option<&str> {
        let env = self.container()?.env_config.get(builder::DATA_SOURCE_ENV)?;
        match env {
            EnvValue::Plain(value) => Some(value.as_str()),
            EnvValue::Secret { secret } => self
                .kubernetes_resources
                .secrets
                .iter()
                .find(|s| s.name == secret.name)?
                .string_data
                .get(&secret.key)
                .map(String::as_str),
        }
    }
}

/// Container descriptor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Container {
    pub name: String,
    pub image_details: ImageInfo,
    pub image_pull_policy: ImagePullPolicy,
    pub ports: Vec<ContainerPort>,
    pub env_config: BTreeMap<String, EnvValue>,
    pub kubernetes: ContainerKubernetes,
}

/// Exposed container port
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContainerPort {
    pub name: String,
    pub container_port: u16,
    pub protocol: String,
}

/// Environment variable value
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EnvValue {
    /// Literal value
    Plain(String),
    /// Value read from a key of a secret
    Secret { secret: SecretKeyRef },
}

/// Reference to one key of a secret
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecretKeyRef {
    pub name: String,
    pub key: String,
}

/// Kubernetes specific container settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContainerKubernetes {
    pub readiness_probe: Probe,
    pub liveness_probe: Probe,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub security_context: Option<ContainerSecurityContext>,
}

/// HTTP probe
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Probe {
    pub http_get: HttpGetAction,
    pub initial_delay_seconds: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub period_seconds: Option<u32>,
    pub timeout_seconds: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub success_threshold: Option<u32>,
    pub failure_threshold: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HttpGetAction {
    pub path: String,
    pub port: u16,
}

/// Restricted container security context
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContainerSecurityContext {
    pub run_as_non_root: bool,
    pub privileged: bool,
    pub allow_privilege_escalation: bool,
    pub capabilities: Capabilities,
}

impl ContainerSecurityContext {
    /// Non-root, unprivileged, every capability dropped
    pub fn restricted() -> Self {
        Self {
            run_as_non_root: true,
            privileged: false,
            allow_privilege_escalation: false,
            capabilities: Capabilities {
                drop: vec!["ALL".to_string()],
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Capabilities {
    pub drop: Vec<String>,
}

/// Extra Kubernetes resources created alongside the pod
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KubernetesResources {
    pub ingress_resources: Vec<IngressResource>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub secrets: Vec<Secret>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pod: Option<PodResources>,
}

/// Opaque secret
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Secret {
    pub name: String,
    #[serde(rename = "type")]
    pub secret_type: String,
    pub string_data: BTreeMap<String, String>,
}

impl Secret {
    pub fn opaque(name: impl Into<String>, string_data: BTreeMap<String, String>) -> Self {
        Self {
            name: name.into(),
            secret_type: "Opaque".to_string(),
            string_data,
        }
    }
}

/// Pod level settings
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PodResources {
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub annotations: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub security_context: Option<PodSecurityContext>,
}

/// Pod security context used with a restricted container
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PodSecurityContext {
    pub run_as_user: u32,
    pub run_as_group: u32,
    pub fs_group: u32,
}

impl Default for PodSecurityContext {
    fn default() -> Self {
        Self {
            run_as_user: 1000,
            run_as_group: 1000,
            fs_group: 1000,
        }
    }
}

/// Restarts the pod when any of the referenced secrets change
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PodRestartPolicy {
    secrets: Vec<String>,
}

impl PodRestartPolicy {
    /// Annotation watched by the reloader controller
    pub const SECRET_RELOAD_ANNOTATION: &'static str = "secret.reloader.stakater.com/reload";

    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_secret(mut self, name: impl Into<String>) -> Self {
        let name = name.into();
        if !self.secrets.contains(&name) {
            self.secrets.push(name);
        }
        self
    }

    /// Pod annotations implementing the policy
    pub fn annotations(&self) -> BTreeMap<String, String> {
        let mut annotations = BTreeMap::new();
        if !self.secrets.is_empty() {
            annotations.insert(
                Self::SECRET_RELOAD_ANNOTATION.to_string(),
                self.secrets.join(","),
            );
        }
        annotations
    }
}

/// Ingress resource descriptor
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngressResource {
    pub name: String,
    pub annotations: BTreeMap<String, String>,
    pub spec: IngressSpec,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngressSpec {
    pub rules: Vec<IngressRule>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tls: Option<Vec<IngressTls>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngressRule {
    pub host: String,
    pub http: HttpIngressRule,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HttpIngressRule {
    pub paths: Vec<IngressPath>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngressPath {
    pub path: String,
    pub backend: IngressBackend,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IngressBackend {
    pub service_name: String,
    pub service_port: u16,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IngressTls {
    pub hosts: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secret_name: Option<String>,
}
