//! Configuration validation.
//!
//! Semantic checks only; serde already handled the syntax. Every problem is
//! collected so an operator sees the full list in one go.

use std::net::SocketAddr;

use thiserror::Error;
use url::Url;

use crate::config::schema::ExtensionConfig;

/// A single semantic problem with the configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("listener.bind_address '{0}' is not a socket address")]
    BindAddress(String),

    #[error("{field} '{value}' is not an absolute http(s) URL")]
    InvalidUrl { field: &'static str, value: String },

    #[error("{0} must not be empty")]
    Missing(&'static str),

    #[error("{0} must be greater than zero")]
    ZeroTimeout(&'static str),
}

/// Validate a loaded configuration.
pub fn validate_config(config: &ExtensionConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::BindAddress(config.listener.bind_address.clone()));
    }

    check_url(&mut errors, "datadog.site_url", &config.datadog.site_url);
    check_url(&mut errors, "datadog.api_base_url", &config.datadog.api_base_url());

    if config.datadog.api_key.trim().is_empty() {
        errors.push(ValidationError::Missing("datadog.api_key"));
    }
    if config.datadog.application_key.trim().is_empty() {
        errors.push(ValidationError::Missing("datadog.application_key"));
    }

    if config.datadog.request_timeout_secs == 0 {
        errors.push(ValidationError::ZeroTimeout("datadog.request_timeout_secs"));
    }
    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::ZeroTimeout("timeouts.request_secs"));
    }

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::BindAddress(
            config.observability.metrics_address.clone(),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn check_url(errors: &mut Vec<ValidationError>, field: &'static str, value: &str) {
    let valid = Url::parse(value)
        .map(|u| matches!(u.scheme(), "http" | "https") && u.has_host())
        .unwrap_or(false);
    if !valid {
        errors.push(ValidationError::InvalidUrl {
            field,
            value: value.to_string(),
        });
    }
}
