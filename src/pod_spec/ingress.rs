//! Ingress resource builder

use std::collections::BTreeMap;

use super::{
    HttpIngressRule, IngressBackend, IngressPath, IngressResource, IngressRule, IngressSpec,
    IngressTls,
};

pub const INGRESS_CLASS_ANNOTATION: &str = "kubernetes.io/ingress.class";
pub const WHITELIST_SOURCE_RANGE_ANNOTATION: &str =
    "nginx.ingress.kubernetes.io/whitelist-source-range";
pub const CLUSTER_ISSUER_ANNOTATION: &str = "cert-manager.io/cluster-issuer";
pub const SSL_REDIRECT_ANNOTATION: &str = "nginx.ingress.kubernetes.io/ssl-redirect";

/// Builder for an ingress resource
#[derive(Debug, Clone)]
pub struct IngressResourceBuilder {
    name: String,
    annotations: BTreeMap<String, String>,
    rules: Vec<IngressRule>,
    tls: Vec<IngressTls>,
}

impl IngressResourceBuilder {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            annotations: BTreeMap::new(),
            rules: Vec::new(),
            tls: Vec::new(),
        }
    }

    pub fn annotate(mut self, key: &str, value: &str) -> Self {
        self.annotations.insert(key.to_string(), value.to_string());
        self
    }

    /// Annotate only when a value is present
    pub fn annotate_opt(self, key: &str, value: Option<&str>) -> Self {
        match value {
            Some(v) => self.annotate(key, v),
            None => self,
        }
    }

    /// Terminate TLS for `hosts`, optionally with a pre-provisioned certificate
    pub fn add_tls(mut self, hosts: &[&str], secret_name: Option<&str>) -> Self {
        self.tls.push(IngressTls {
            hosts: hosts.iter().map(|h| h.to_string()).collect(),
            secret_name: secret_name.map(str::to_string),
        });
        self
    }

    /// Route `/` on `host` to the given service
    pub fn add_rule(mut self, host: &str, service_name: &str, service_port: u16) -> Self {
        self.rules.push(IngressRule {
            host: host.to_string(),
            http: HttpIngressRule {
                paths: vec![IngressPath {
                    path: "/".to_string(),
                    backend: IngressBackend {
                        service_name: service_name.to_string(),
                        service_port,
                    },
                }],
            },
        });
        self
    }

    pub fn build(self) -> IngressResource {
        IngressResource {
            name: self.name,
            annotations: self.annotations,
            spec: IngressSpec {
                rules: self.rules,
                tls: (!self.tls.is_empty()).then_some(self.tls),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ingress_without_tls() {
        let ingress = IngressResourceBuilder::new("app-ingress")
            .annotate(SSL_REDIRECT_ANNOTATION, "false")
            .annotate_opt(CLUSTER_ISSUER_ANNOTATION, None)
            .add_rule("app.example.com", "app", 9104)
            .build();

        assert_eq!(ingress.annotations.len(), 1);
        assert!(ingress.spec.tls.is_none());
        let backend = &ingress.spec.rules[0].http.paths[0].backend;
        assert_eq!(backend.service_name, "app");
        assert_eq!(backend.service_port, 9104);
    }

    #[test]
    fn test_ingress_tls_serialization() {
        let ingress = IngressResourceBuilder::new("app-ingress")
            .add_tls(&["app.example.com"], None)
            .add_rule("app.example.com", "app", 9104)
            .build();

        let value = serde_json::to_value(&ingress).unwrap();
        assert_eq!(
            value["spec"]["tls"],
            serde_json::json!([{"hosts": ["app.example.com"]}])
        );
    }
}
