//! Configuration loading and management

use crate::core::error::ConfigError;
use crate::entities::catalog;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::info;

/// Environment variable overriding `server.host`
pub const ENV_HOST: &str = "RECORDBOOK_HOST";
/// Environment variable overriding `server.port`
pub const ENV_PORT: &str = "RECORDBOOK_PORT";
/// Environment variable overriding `log_level`
pub const ENV_LOG: &str = "RECORDBOOK_LOG";

/// HTTP listener settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3000,
        }
    }
}

/// Page sizes for list requests
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PaginationConfig {
    /// Used when a request has no `limit`
    pub default_page_size: usize,

    /// Larger `limit` values are clamped to this
    pub max_page_size: usize,
}

impl Default for PaginationConfig {
    fn default() -> Self {
        Self {
            default_page_size: 10,
            max_page_size: 100,
        }
    }
}

impl PaginationConfig {
    /// Resolve a requested page size
    pub fn page_size(&self, requested: Option<usize>) -> usize {
        requested
            .unwrap_or(self.default_page_size)
            .min(self.max_page_size)
    }
}

/// One enabled built-in collection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollectionConfig {
    /// Plural collection name (`students`, `feedback`, ...)
    pub name: String,

    /// JSON array of payloads loaded at startup
    #[serde(default)]
    pub seed_file: Option<PathBuf>,

    /// Load the built-in demo records
    #[serde(default)]
    pub demo_seed: bool,
}

impl CollectionConfig {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            seed_file: None,
            demo_seed: false,
        }
    }
}

/// Complete application configuration
///
/// # Example
/// ```yaml
/// server:
///   host: 0.0.0.0
///   port: 8080
/// pagination:
///   default_page_size: 20
/// log_level: debug
/// collections:
///   - name: students
///     demo_seed: true
///   - name: feedback
///     seed_file: seeds/feedback.json
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub pagination: PaginationConfig,
    pub log_level: String,
    pub collections: Vec<CollectionConfig>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            pagination: PaginationConfig::default(),
            log_level: "info".to_string(),
            collections: catalog::NAMES
                .iter()
                .map(|name| CollectionConfig::new(*name))
                .collect(),
        }
    }
}

impl AppConfig {
    /// Load configuration from a YAML file
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = read_file(path)?;
        serde_yaml::from_str(&content).map_err(|e| ConfigError::ParseError {
            file: Some(path.display().to_string()),
            message: e.to_string(),
        })
    }

    /// Load configuration from a YAML string
    pub fn from_yaml_str(yaml: &str) -> Result<Self, ConfigError> {
        serde_yaml::from_str(yaml).map_err(|e| ConfigError::ParseError {
            file: None,
            message: e.to_string(),
        })
    }

    /// Apply `RECORDBOOK_*` overrides from the process environment
    pub fn apply_env(&mut self) -> Result<(), ConfigError> {
        self.apply_env_from(|key| std::env::var(key).ok())
    }

    /// Apply overrides from any key lookup
    pub fn apply_env_from<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(host) = lookup(ENV_HOST) {
            info!("{ENV_HOST} set, using host {host}");
            self.server.host = host;
        }
        if let Some(port) = lookup(ENV_PORT) {
            self.server.port = port.trim().parse().map_err(|e| ConfigError::InvalidValue {
                field: ENV_PORT.to_string(),
                value: port.clone(),
                message: format!("{e}"),
            })?;
            info!("{ENV_PORT} set, using port {}", self.server.port);
        }
        if let Some(level) = lookup(ENV_LOG) {
            self.log_level = level;
        }
        Ok(())
    }

    /// Check values that parse fine but cannot work
    pub fn validate(&self) -> Result<(), ConfigError> {
        let pagination = &self.pagination;
        if pagination.default_page_size == 0 {
            return Err(ConfigError::InvalidValue {
                field: "pagination.default_page_size".to_string(),
                value: "0".to_string(),
                message: "must be at least 1".to_string(),
            });
        }
        if pagination.default_page_size > pagination.max_page_size {
            return Err(ConfigError::InvalidValue {
                field: "pagination.default_page_size".to_string(),
                value: pagination.default_page_size.to_string(),
                message: format!(
                    "must not exceed pagination.max_page_size ({})",
                    pagination.max_page_size
                ),
            });
        }

        let mut seen = HashSet::new();
        for collection in &self.collections {
            if catalog::builtin(&collection.name).is_none() {
                return Err(ConfigError::InvalidValue {
                    field: "collections.name".to_string(),
                    value: collection.name.clone(),
                    message: format!("expected one of: {}", catalog::NAMES.join(", ")),
                });
            }
            if !seen.insert(collection.name.as_str()) {
                return Err(ConfigError::InvalidValue {
                    field: "collections.name".to_string(),
                    value: collection.name.clone(),
                    message: "listed more than once".to_string(),
                });
            }
        }
        Ok(())
    }

    /// `host:port` for the listener
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

/// Read a text file, mapping failures to [`ConfigError`]
pub(crate) fn read_file(path: &Path) -> Result<String, ConfigError> {
    std::fs::read_to_string(path).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => ConfigError::FileNotFound {
            path: path.display().to_string(),
        },
        _ => ConfigError::IoError {
            message: format!("{}: {}", path.display(), e),
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();

        assert_eq!(config.bind_address(), "127.0.0.1:3000");
        assert_eq!(config.pagination.default_page_size, 10);
        assert_eq!(config.pagination.max_page_size, 100);
        assert_eq!(config.log_level, "info");
        assert_eq!(config.collections.len(), catalog::NAMES.len());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let config = AppConfig::from_yaml_str(
            r#"
server:
  port: 8080
collections:
  - name: students
    demo_seed: true
"#,
        )
        .unwrap();

        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.pagination, PaginationConfig::default());
        assert_eq!(config.collections.len(), 1);
        assert!(config.collections[0].demo_seed);
        assert!(config.collections[0].seed_file.is_none());
    }

    #[test]
    fn test_invalid_yaml() {
        let err = AppConfig::from_yaml_str("server: [").unwrap_err();
        assert!(matches!(err, ConfigError::ParseError { file: None, .. }));
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = HashMap::from([
            (ENV_HOST, "0.0.0.0"),
            (ENV_PORT, "9090"),
            (ENV_LOG, "debug"),
        ]);
        let mut config = AppConfig::default();
        config
            .apply_env_from(|key| env.get(key).map(|v| v.to_string()))
            .unwrap();

        assert_eq!(config.bind_address(), "0.0.0.0:9090");
        assert_eq!(config.log_level, "debug");
    }

    #[test]
    fn test_env_bad_port() {
        let mut config = AppConfig::default();
        let err = config
            .apply_env_from(|key| (key == ENV_PORT).then(|| "eighty".to_string()))
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { ref field, .. } if field == ENV_PORT));
    }

    #[test]
    fn test_validate_page_sizes() {
        let mut config = AppConfig::default();
        config.pagination.default_page_size = 0;
        assert!(config.validate().is_err());

        config.pagination.default_page_size = 200;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_collections() {
        let mut config = AppConfig::default();
        config.collections.push(CollectionConfig::new("students"));
        assert!(config.validate().is_err());

        config.collections = vec![CollectionConfig::new("invoices")];
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_page_size_clamping() {
        let pagination = PaginationConfig::default();
        assert_eq!(pagination.page_size(None), 10);
        assert_eq!(pagination.page_size(Some(25)), 25);
        assert_eq!(pagination.page_size(Some(1000)), 100);
    }
}
