//! Pod spec builder
//!
//! Renders the complete pod spec from validated configuration, the `mysql`
//! relation data and the resolved image. Rendering is pure: identical inputs
//! always produce an identical document.

use std::collections::BTreeMap;

use tracing::{debug, instrument};

use crate::config::{CharmConfig, RawConfig, Scheme};
use crate::data_source::{CredentialSource, DataSource};
use crate::error::CharmResult;
use crate::relation::MysqlRelation;

use super::container::ContainerBuilder;
use super::ingress::{
    IngressResourceBuilder, CLUSTER_ISSUER_ANNOTATION, INGRESS_CLASS_ANNOTATION,
    SSL_REDIRECT_ANNOTATION, WHITELIST_SOURCE_RANGE_ANNOTATION,
};
use super::{
    ImageInfo, IngressResource, KubernetesResources, PodResources, PodRestartPolicy,
    PodSecurityContext, PodSpec, Probe, Secret, POD_SPEC_VERSION,
};

/// Environment variable the exporter reads its DSN from
pub const DATA_SOURCE_ENV: &str = "DATA_SOURCE_NAME";

/// Key holding the DSN inside the MySQL secret
pub const DATA_SOURCE_KEY: &str = "data_source";

/// Exporter health endpoint used by both probes
pub const HEALTH_PATH: &str = "/api/health";

/// How the connection string reaches the container
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DataSourceBinding {
    /// Stored in a secret and referenced from the environment
    #[default]
    Secret,
    /// Written directly into the environment
    Inline,
}

/// Pod spec builder for one application
#[derive(Debug, Clone)]
pub struct SpecBuilder {
    app_name: String,
    port: u16,
    binding: DataSourceBinding,
}

impl SpecBuilder {
    pub fn new(app_name: &str, port: u16) -> Self {
        Self {
            app_name: app_name.to_string(),
            port,
            binding: DataSourceBinding::default(),
        }
    }

    pub fn with_binding(mut self, binding: DataSourceBinding) -> Self {
        self.binding = binding;
        self
    }

    /// Name of the secret holding the connection string
    pub fn secret_name(&self) -> String {
        format!("{}-mysql-secret", self.app_name)
    }

    fn ingress_name(&self) -> String {
        format!("{}-ingress", self.app_name)
    }

    /// Render the pod spec
    ///
    /// Returns `Ok(None)` when the image is not resolvable yet.
    ///
    /// # Errors
    /// `ConflictingCredentials` or `MissingDependency` depending on which
    /// credential sources are present, `InvalidRelationData` for a bad
    /// relation port.
    #[instrument(skip_all, fields(app = %self.app_name))]
    pub fn build(
        &self,
        image: Option<&ImageInfo>,
        config: &CharmConfig,
        relation: &MysqlRelation,
    ) -> CharmResult<Option<PodSpec>> {
        let Some(image) = image.filter(|i| !i.is_empty()) else {
            debug!("Image not resolved yet, skipping pod spec");
            return Ok(None);
        };

        let source = CredentialSource::select(config, relation)?;
        let data_source = DataSource::resolve(&source);
        debug!(
            from_uri = matches!(source, CredentialSource::Uri(_)),
            "Resolved MySQL credentials"
        );

        let secret_name = self.secret_name();
        let mut container = ContainerBuilder::new(
            &self.app_name,
            image.clone(),
            config.image_pull_policy,
        )
        .run_as_non_root(config.security_context)
        .add_port("exporter", self.port)
        .readiness_probe(
            Probe::http_get(HEALTH_PATH, self.port)
                .initial_delay(10)
                .period(10)
                .timeout(5)
                .success_threshold(1)
                .failure_threshold(3),
        )
        .liveness_probe(
            Probe::http_get(HEALTH_PATH, self.port)
                .initial_delay(60)
                .timeout(30)
                .failure_threshold(10),
        );

        let mut resources = KubernetesResources {
            ingress_resources: self.ingress_resources(config),
            ..KubernetesResources::default()
        };
        let mut pod = PodResources::default();

        match self.binding {
            DataSourceBinding::Secret => {
                container = container.add_secret_env(DATA_SOURCE_ENV, &secret_name, DATA_SOURCE_KEY);

                let mut string_data = BTreeMap::new();
                string_data.insert(DATA_SOURCE_KEY.to_string(), data_source.into_string());
                resources.secrets.push(Secret::opaque(&secret_name, string_data));

                pod.annotations = PodRestartPolicy::new().add_secret(&secret_name).annotations();
            }
            DataSourceBinding::Inline => {
                container = container.add_env(DATA_SOURCE_ENV, data_source.as_str());
            }
        }

        if config.security_context {
            pod.security_context = Some(PodSecurityContext::default());
        }
        if pod != PodResources::default() {
            resources.pod = Some(pod);
        }

        Ok(Some(PodSpec {
            version: POD_SPEC_VERSION,
            containers: vec![container.build()],
            kubernetes_resources: resources,
        }))
    }

    /// Ingress resources for the configured site URL
    ///
    /// Empty when no site URL is configured.
    pub fn ingress_resources(&self, config: &CharmConfig) -> Vec<IngressResource> {
        let Some(site_url) = &config.site_url else {
            return Vec::new();
        };
        let host = site_url.host();
        debug!(site_url = site_url.as_str(), "Rendering ingress");
        let whitelist = config
            .ingress_whitelist_source_range
            .as_ref()
            .map(ToString::to_string);

        let mut ingress = IngressResourceBuilder::new(&self.ingress_name())
            .annotate_opt(INGRESS_CLASS_ANNOTATION, config.ingress_class.as_deref())
            .annotate_opt(WHITELIST_SOURCE_RANGE_ANNOTATION, whitelist.as_deref())
            .annotate_opt(CLUSTER_ISSUER_ANNOTATION, config.cluster_issuer.as_deref());

        ingress = match site_url.scheme() {
            Scheme::Https => ingress.add_tls(&[host], config.tls_secret_name.as_deref()),
            Scheme::Http => ingress.annotate(SSL_REDIRECT_ANNOTATION, "false"),
        };

        vec![ingress.add_rule(host, &self.app_name, self.port).build()]
    }
}

/// Validate raw options and render the pod spec in one step
///
/// The image is checked before validation, so an unresolved image yields
/// `Ok(None)` whatever the other inputs hold.
pub fn build_pod_spec(
    image: Option<&ImageInfo>,
    config: &RawConfig,
    relation: &MysqlRelation,
    app_name: &str,
    port: u16,
) -> CharmResult<Option<PodSpec>> {
    if image.map_or(true, ImageInfo::is_empty) {
        return Ok(None);
    }
    let config = config.validate()?;
    SpecBuilder::new(app_name, port).build(image, &config, relation)
}
