//! Run configuration for jmx-collect
//!
//! Handles loading and validating the optional YAML settings file. The
//! collection file list given on the command line is applied on top by
//! [`crate::cli::Cli`]; connection settings come from the file only.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Error reading the configuration file
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    /// Error parsing the configuration file
    #[error("Failed to parse config file: {0}")]
    ParseError(#[from] serde_yaml::Error),

    /// Configuration validation error
    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// JMX connection settings, handed to the query engine
    #[serde(default)]
    pub jmx: JmxConfig,

    /// Collection files to parse, as absolute paths
    #[serde(default)]
    pub collection_files: Vec<PathBuf>,

    /// Timeout for JMX queries in milliseconds
    #[serde(default = "default_timeout")]
    pub timeout_ms: u64,

    /// Maximum metrics per entity, 0 for no limit
    #[serde(default = "default_metric_limit")]
    pub metric_limit: usize,
}

/// JMX connection configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JmxConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_credential")]
    pub username: String,

    #[serde(default = "default_credential")]
    pub password: String,

    /// Use the JMX remote URL connection format
    #[serde(default)]
    pub remote: bool,

    /// Keystore holding the client's SSL certificate
    #[serde(default)]
    pub key_store: String,

    #[serde(default)]
    pub key_store_password: String,

    /// Keystore holding the server's SSL certificate
    #[serde(default)]
    pub trust_store: String,

    #[serde(default)]
    pub trust_store_password: String,
}

/// SSL options for the JMX connection
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TlsOptions<'a> {
    pub key_store: &'a str,
    pub key_store_password: &'a str,
    pub trust_store: &'a str,
    pub trust_store_password: &'a str,
}

// Default value functions
fn default_host() -> String {
    "localhost".to_string()
}

fn default_port() -> u16 {
    9999
}

fn default_credential() -> String {
    "admin".to_string()
}

fn default_timeout() -> u64 {
    10000
}

fn default_metric_limit() -> usize {
    200
}

impl Default for JmxConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            username: default_credential(),
            password: default_credential(),
            remote: false,
            key_store: String::new(),
            key_store_password: String::new(),
            trust_store: String::new(),
            trust_store_password: String::new(),
        }
    }
}

impl JmxConfig {
    fn tls_settings(&self) -> [&str; 4] {
        [
            self.key_store.as_str(),
            self.key_store_password.as_str(),
            self.trust_store.as_str(),
            self.trust_store_password.as_str(),
        ]
    }

    /// SSL options, present only when all four keystore settings are given
    pub fn tls(&self) -> Option<TlsOptions<'_>> {
        let all_set = self.tls_settings().iter().all(|s| !s.is_empty());

        all_set.then(|| TlsOptions {
            key_store: &self.key_store,
            key_store_password: &self.key_store_password,
            trust_store: &self.trust_store,
            trust_store_password: &self.trust_store_password,
        })
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            jmx: JmxConfig::default(),
            collection_files: Vec::new(),
            timeout_ms: default_timeout(),
            metric_limit: default_metric_limit(),
        }
    }
}

impl Config {
    /// Load configuration from a YAML file
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or parsed
    ///
    /// # Note
    /// Validation is deferred to [`Config::validate`] so that command line
    /// overrides can be applied first.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path.as_ref())?;
        let config: Config = serde_yaml::from_str(&contents)?;
        Ok(config)
    }

    /// Load configuration from a YAML file, falling back to defaults if not found
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();

        if !path.exists() {
            tracing::warn!(
                path = %path.display(),
                "Config file not found, using defaults"
            );
            return Ok(Self::default());
        }

        Self::load(path)
    }

    /// Query timeout as a duration
    pub fn timeout(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.timeout_ms)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.collection_files.is_empty() {
            return Err(ConfigError::ValidationError(
                "Must specify at least one collection file".to_string(),
            ));
        }

        if self.jmx.port == 0 {
            return Err(ConfigError::ValidationError(
                "JMX port must be greater than 0".to_string(),
            ));
        }

        if self.timeout_ms == 0 {
            return Err(ConfigError::ValidationError(
                "Timeout must be greater than 0".to_string(),
            ));
        }

        let any_tls = self.jmx.tls_settings().iter().any(|s| !s.is_empty());
        if any_tls && self.jmx.tls().is_none() {
            return Err(ConfigError::ValidationError(
                "key_store, key_store_password, trust_store and trust_store_password must be set together"
                    .to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.jmx.host, "localhost");
        assert_eq!(config.jmx.port, 9999);
        assert_eq!(config.timeout_ms, 10000);
        assert_eq!(config.metric_limit, 200);
        assert!(config.jmx.tls().is_none());
    }

    #[test]
    fn test_config_validation() {
        let mut config = Config::default();
        assert!(config.validate().is_err());

        config.collection_files.push(PathBuf::from("/etc/jmx/jvm.yml"));
        assert!(config.validate().is_ok());

        config.jmx.port = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_from_yaml() {
        let yaml = r#"
jmx:
  host: jvm.internal
  port: 7199
  remote: true
collection_files:
  - /etc/jmx/jvm.yml
metric_limit: 0
"#;
        let config: Config = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.jmx.host, "jvm.internal");
        assert_eq!(config.jmx.port, 7199);
        assert_eq!(config.jmx.username, "admin");
        assert!(config.jmx.remote);
        assert_eq!(config.collection_files, vec![PathBuf::from("/etc/jmx/jvm.yml")]);
        assert_eq!(config.metric_limit, 0);
        assert_eq!(config.timeout_ms, 10000);
    }

    #[test]
    fn test_tls_requires_all_settings() {
        let mut jmx = JmxConfig {
            key_store: "/k.jks".to_string(),
            key_store_password: "kp".to_string(),
            trust_store: "/t.jks".to_string(),
            ..JmxConfig::default()
        };
        assert!(jmx.tls().is_none());

        jmx.trust_store_password = "tp".to_string();
        let tls = jmx.tls().unwrap();
        assert_eq!(tls.key_store, "/k.jks");
        assert_eq!(tls.trust_store_password, "tp");
    }

    #[test]
    fn test_partial_tls_is_invalid() {
        let mut config = Config::default();
        config.collection_files.push(PathBuf::from("/etc/jmx/jvm.yml"));
        config.jmx.key_store = "/k.jks".to_string();

        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("must be set together"));

        config.jmx.key_store_password = "kp".to_string();
        config.jmx.trust_store = "/t.jks".to_string();
        config.jmx.trust_store_password = "tp".to_string();
        assert!(config.validate().is_ok());
    }
}
