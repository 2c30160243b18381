//! Configuration loading from disk and environment.

use std::fs;
use std::path::Path;

use thiserror::Error;

use crate::config::schema::ExtensionConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

const ENV_SITE_PARAMETER: &str = "STEADYBIT_EXTENSION_SITE_PARAMETER";
const ENV_SITE_URL: &str = "STEADYBIT_EXTENSION_SITE_URL";
const ENV_API_KEY: &str = "STEADYBIT_EXTENSION_API_KEY";
const ENV_APPLICATION_KEY: &str = "STEADYBIT_EXTENSION_APPLICATION_KEY";
const ENV_PORT: &str = "STEADYBIT_EXTENSION_PORT";

/// Load the configuration: TOML file (optional), then environment overrides,
/// then validation.
pub fn load_config(path: Option<&Path>) -> Result<ExtensionConfig, ConfigError> {
    let mut config = match path {
        Some(path) => {
            let content = fs::read_to_string(path)?;
            toml::from_str(&content)?
        }
        None => ExtensionConfig::default(),
    };

    apply_env_overrides(&mut config, |key| std::env::var(key).ok());

    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

/// Apply overrides from a key lookup. The lookup is injected so tests do not
/// have to mutate the process environment.
pub fn apply_env_overrides<F>(config: &mut ExtensionConfig, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(v) = lookup(ENV_SITE_PARAMETER) {
        config.datadog.site_parameter = v;
    }
    if let Some(v) = lookup(ENV_SITE_URL) {
        config.datadog.site_url = v;
    }
    if let Some(v) = lookup(ENV_API_KEY) {
        config.datadog.api_key = v;
    }
    if let Some(v) = lookup(ENV_APPLICATION_KEY) {
        config.datadog.application_key = v;
    }
    if let Some(port) = lookup(ENV_PORT) {
        let host = config
            .listener
            .bind_address
            .rsplit_once(':')
            .map(|(host, _)| host.to_string())
            .unwrap_or_else(|| "0.0.0.0".to_string());
        config.listener.bind_address = format!("{}:{}", host, port);
    }
}
