//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the extension.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Root configuration for the extension.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ExtensionConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Monitoring backend (Datadog) settings.
    pub datadog: DatadogConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8090").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8090".to_string(),
        }
    }
}

/// Datadog API settings.
///
/// See <https://docs.datadoghq.com/getting_started/site/> for the valid
/// site parameters.
#[derive(Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct DatadogConfig {
    /// Site parameter (e.g., "datadoghq.eu").
    pub site_parameter: String,

    /// Web UI base URL used for deep links (e.g., "https://app.datadoghq.eu").
    pub site_url: String,

    /// Explicit API base URL. Derived from `site_parameter` when unset.
    pub api_base_url: Option<String>,

    /// API key sent as `DD-API-KEY`.
    pub api_key: String,

    /// Application key sent as `DD-APPLICATION-KEY`.
    pub application_key: String,

    /// Outbound request timeout in seconds.
    pub request_timeout_secs: u64,
}

impl DatadogConfig {
    /// The base URL API calls are issued against.
    pub fn api_base_url(&self) -> String {
        match &self.api_base_url {
            Some(url) => url.trim_end_matches('/').to_string(),
            None => format!("https://api.{}", self.site_parameter),
        }
    }
}

impl Default for DatadogConfig {
    fn default() -> Self {
        Self {
            site_parameter: "datadoghq.com".to_string(),
            site_url: "https://app.datadoghq.com".to_string(),
            api_base_url: None,
            api_key: String::new(),
            application_key: String::new(),
            request_timeout_secs: 30,
        }
    }
}

// Keys stay out of logs.
impl std::fmt::Debug for DatadogConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DatadogConfig")
            .field("site_parameter", &self.site_parameter)
            .field("site_url", &self.site_url)
            .field("api_base_url", &self.api_base_url)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .finish_non_exhaustive()
    }
}

/// Timeout configuration for inbound requests.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Request timeout (total time for request/response) in seconds.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self { request_secs: 60 }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ExtensionConfig::default();
        assert_eq!(config.listener.bind_address, "0.0.0.0:8090");
        assert_eq!(config.datadog.api_base_url(), "https://api.datadoghq.com");
        assert!(!config.observability.metrics_enabled);
    }

    #[test]
    fn test_explicit_api_base_url_wins() {
        let config = DatadogConfig {
            api_base_url: Some("http://127.0.0.1:9999/".to_string()),
            ..Default::default()
        };
        assert_eq!(config.api_base_url(), "http://127.0.0.1:9999");
    }

    #[test]
    fn test_partial_toml() {
        let config: ExtensionConfig = toml::from_str(
            r#"
            [datadog]
            site_parameter = "datadoghq.eu"
            site_url = "https://app.datadoghq.eu"
            api_key = "k"
            application_key = "a"
            "#,
        )
        .unwrap();
        assert_eq!(config.datadog.api_base_url(), "https://api.datadoghq.eu");
        assert_eq!(config.datadog.request_timeout_secs, 30);
        assert_eq!(config.timeouts.request_secs, 60);
    }

    #[test]
    fn test_debug_hides_keys() {
        let config = DatadogConfig {
            api_key: "super-secret".to_string(),
            ..Default::default()
        };
        assert!(!format!("{:?}", config).contains("super-secret"));
    }
}
