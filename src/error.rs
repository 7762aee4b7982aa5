//! Error types for mysql-exporter-charm
//!
//! This module defines the errors raised while turning configuration and
//! relation data into a pod spec.

use thiserror::Error;

use crate::config::ConfigError;

/// Charm error type
///
/// Every variant is terminal for a single invocation: no partial pod spec
/// is produced and the unit status reflects the error text.
#[derive(Error, Debug)]
pub enum CharmError {
    /// One or more configuration options failed validation
    #[error(transparent)]
    InvalidConfig(#[from] ConfigError),

    /// Credentials were supplied through both `mysql_uri` and the relation
    #[error("Mysql data cannot be provided via config and relation")]
    ConflictingCredentials,

    /// No credential source is available yet
    #[error("Waiting for {} relation", .0.join(", "))]
    MissingDependency(Vec<String>),

    /// Relation data is present but unusable
    #[error("Invalid relation data in field '{field}': {reason}")]
    InvalidRelationData { field: String, reason: String },
}

impl CharmError {
    /// Build a `MissingDependency` error for a single relation
    pub fn missing(relation: &str) -> Self {
        CharmError::MissingDependency(vec![relation.to_string()])
    }

    /// Whether the error clears on its own once a relation is established
    pub fn is_waiting(&self) -> bool {
        matches!(self, CharmError::MissingDependency(_))
    }
}

/// Result type alias for charm errors
pub type CharmResult<T> = Result<T, CharmError>;
