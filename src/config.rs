//! Configuration management for the lookup service
//!
//! Parses TOML configuration files and provides typed access to settings.
//! Every section is optional; an empty file yields the defaults.

use crate::error::{AppError, AppResult};
use crate::metrics::{FailurePolicy, LabelPolicy};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::str::FromStr;

/// Root configuration structure
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub observability: ObservabilityConfig,
    #[serde(default)]
    pub metrics: MetricsConfig,
}

/// Server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

/// Observability configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ObservabilityConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Metrics configuration
///
/// `namespace` prefixes every metric name, so changing it renames the whole
/// catalogue for scrapers and dashboards.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MetricsConfig {
    #[serde(default = "default_namespace")]
    pub namespace: String,
    #[serde(default)]
    pub label_policy: LabelPolicy,
    #[serde(default)]
    pub failure_policy: FailurePolicy,
    /// Upper bounds of the request duration histogram in seconds
    ///
    /// Falls back to `prometheus::DEFAULT_BUCKETS` when not set.
    #[serde(default)]
    pub duration_buckets: Option<Vec<f64>>,
}

impl MetricsConfig {
    /// Effective duration buckets
    pub fn duration_buckets(&self) -> &[f64] {
        self.duration_buckets
            .as_deref()
            .unwrap_or(prometheus::DEFAULT_BUCKETS)
    }
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            namespace: default_namespace(),
            label_policy: LabelPolicy::default(),
            failure_policy: FailurePolicy::default(),
            duration_buckets: None,
        }
    }
}

fn default_namespace() -> String {
    "demo".to_string()
}

impl Config {
    /// Load configuration from a TOML file
    ///
    /// Reading, parsing and validation failures are reported separately so
    /// the message says which phase went wrong.
    pub fn from_file<P: AsRef<Path>>(path: P) -> AppResult<Self> {
        let path_display = path.as_ref().display().to_string();

        let content = std::fs::read_to_string(path.as_ref()).map_err(|source| {
            AppError::ConfigFileRead {
                path: path_display.clone(),
                source,
            }
        })?;

        let config: Self =
            toml::from_str(&content).map_err(|source| AppError::ConfigParseFailed {
                path: path_display.clone(),
                source,
            })?;

        config
            .validate()
            .map_err(|e| AppError::ConfigValidationFailed {
                path: path_display,
                reason: e.to_string(),
            })?;

        Ok(config)
    }

    /// Validate configuration after parsing
    ///
    /// Called by `from_file()` and `from_str()`; call it explicitly when
    /// building a `Config` by hand.
    pub fn validate(&self) -> AppResult<()> {
        if self.server.port == 0 {
            return Err(AppError::Config(
                "server.port must be greater than 0".to_string(),
            ));
        }

        // Prometheus metric names: [a-zA-Z_:][a-zA-Z0-9_:]*
        let namespace = &self.metrics.namespace;
        let valid_namespace = namespace
            .chars()
            .next()
            .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
            && namespace
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_');
        if !valid_namespace {
            return Err(AppError::Config(format!(
                "metrics.namespace '{}' is not a valid Prometheus metric prefix. \
                Use letters, digits and underscores, starting with a letter or underscore.",
                namespace
            )));
        }

        if let Some(buckets) = &self.metrics.duration_buckets {
            if buckets.is_empty() {
                return Err(AppError::Config(
                    "metrics.duration_buckets must not be empty when set".to_string(),
                ));
            }
            if buckets.iter().any(|b| !b.is_finite()) {
                return Err(AppError::Config(format!(
                    "metrics.duration_buckets must be finite numbers, got {:?}. \
                    The +Inf bucket is always added implicitly.",
                    buckets
                )));
            }
            if buckets.windows(2).any(|pair| pair[0] >= pair[1]) {
                return Err(AppError::Config(format!(
                    "metrics.duration_buckets must be strictly increasing, got {:?}",
                    buckets
                )));
            }
        }

        Ok(())
    }
}

impl FromStr for Config {
    type Err = AppError;

    fn from_str(toml_str: &str) -> Result<Self, Self::Err> {
        let config: Config =
            toml::from_str(toml_str).map_err(|source| AppError::ConfigParseFailed {
                path: "<string>".to_string(),
                source,
            })?;

        config.validate()?;
        Ok(config)
    }
}
