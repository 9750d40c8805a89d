//! Runtime configuration read from the environment.
//!
//! - `CLUSTERDAG_STORE`: directory holding cluster documents (default: "./graphs")
//! - `CLUSTERDAG_CLUSTER`: cluster to operate on (default: 1, the project root)
//! - `CLUSTERDAG_LOG`: tracing filter directive (default: "warn")
//!
//! Command-line flags take precedence over the environment.

use std::path::PathBuf;

use thiserror::Error;

use clusterdag_storage::ClusterId;

pub const STORE_VAR: &str = "CLUSTERDAG_STORE";
pub const CLUSTER_VAR: &str = "CLUSTERDAG_CLUSTER";
pub const LOG_VAR: &str = "CLUSTERDAG_LOG";

/// A variable was set to something unusable.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("invalid {var} '{value}': {reason}")]
    Invalid {
        var: &'static str,
        value: String,
        reason: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub store: PathBuf,
    pub cluster: ClusterId,
    pub log_filter: String,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            store: PathBuf::from("./graphs"),
            cluster: ClusterId::ROOT,
            log_filter: "warn".to_string(),
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds a config from any variable source; unset variables keep their
    /// defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Config::default();
        if let Some(store) = lookup(STORE_VAR) {
            config.store = PathBuf::from(store);
        }
        if let Some(cluster) = lookup(CLUSTER_VAR) {
            config.cluster = cluster.parse().map_err(|e| ConfigError::Invalid {
                var: CLUSTER_VAR,
                value: cluster.clone(),
                reason: format!("{e}"),
            })?;
        }
        if let Some(filter) = lookup(LOG_VAR) {
            config.log_filter = filter;
        }
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unset_variables_keep_defaults() {
        let config = Config::from_lookup(|_| None).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn variables_override_defaults() {
        let config = Config::from_lookup(|key| match key {
            STORE_VAR => Some("/tmp/graphs".to_string()),
            CLUSTER_VAR => Some("7".to_string()),
            _ => None,
        })
        .unwrap();

        assert_eq!(config.store, PathBuf::from("/tmp/graphs"));
        assert_eq!(config.cluster, ClusterId(7));
        assert_eq!(config.log_filter, "warn");
    }

    #[test]
    fn bad_cluster_is_reported() {
        let err = Config::from_lookup(|key| (key == CLUSTER_VAR).then(|| "root".to_string()))
            .unwrap_err();

        let ConfigError::Invalid { var, value, .. } = &err;
        assert_eq!(*var, CLUSTER_VAR);
        assert_eq!(value, "root");
        assert!(err.to_string().starts_with("invalid CLUSTERDAG_CLUSTER 'root'"));
    }
}
