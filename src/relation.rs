//! `mysql` relation data
//!
//! The MySQL provider publishes its endpoint and credentials on the unit
//! databag. The data is only usable once every required key is present.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::config::ConfigError;
use crate::error::{CharmError, CharmResult};

/// Name of the relation endpoint providing MySQL credentials
pub const MYSQL_RELATION: &str = "mysql";

/// Data published by the MySQL provider unit
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MysqlRelation {
    #[serde(default)]
    pub host: Option<String>,
    #[serde(default)]
    pub port: Option<String>,
    #[serde(default)]
    pub user: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub root_password: Option<String>,
    #[serde(default)]
    pub database: Option<String>,
}

/// Endpoint and root credentials extracted from complete relation data
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MysqlEndpoint<'a> {
    pub host: &'a str,
    pub port: u16,
    pub root_password: &'a str,
}

fn present(value: &Option<String>) -> bool {
    value.as_deref().is_some_and(|v| !v.is_empty())
}

impl MysqlRelation {
    /// Build relation data from a string-keyed databag
    ///
    /// Unknown keys are ignored.
    pub fn from_map(data: &BTreeMap<String, String>) -> Self {
        let get = |key: &str| data.get(key).cloned();
        Self {
            host: get("host"),
            port: get("port"),
            user: get("user"),
            password: get("password"),
            root_password: get("root_password"),
            database: get("database"),
        }
    }

    /// Load relation data from a YAML file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path.as_ref())?;
        if contents.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(&contents)?)
    }

    /// Whether the unit has published every required key
    pub fn is_complete(&self) -> bool {
        self.missing_keys().is_empty()
    }

    /// Required keys that are absent or empty
    pub fn missing_keys(&self) -> Vec<&'static str> {
        [
            ("host", &self.host),
            ("port", &self.port),
            ("user", &self.user),
            ("password", &self.password),
            ("root_password", &self.root_password),
        ]
        .into_iter()
        .filter(|(_, value)| !present(value))
        .map(|(key, _)| key)
        .collect()
    }

    /// Extract the endpoint used to build the connection string
    ///
    /// # Errors
    /// `MissingDependency` if the data is incomplete, `InvalidRelationData`
    /// if the port is not a valid TCP port.
    pub fn endpoint(&self) -> CharmResult<MysqlEndpoint<'_>> {
        let (true, Some(host), Some(port), Some(root_password)) = (
            self.is_complete(),
            self.host.as_deref(),
            self.port.as_deref(),
            self.root_password.as_deref(),
        ) else {
            return Err(CharmError::missing(MYSQL_RELATION));
        };

        let port = match port.parse::<u16>() {
            Ok(p) if p > 0 => p,
            _ => {
                return Err(CharmError::InvalidRelationData {
                    field: "port".to_string(),
                    reason: format!("'{}' is not a valid TCP port", port),
                })
            }
        };

        Ok(MysqlEndpoint {
            host,
            port,
            root_password,
        })
    }
}
