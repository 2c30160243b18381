//! Datadog HTTP client.
//!
//! # Responsibilities
//! - Authenticate every call with the API and application key headers
//! - Fetch single monitors, optionally with per-group states
//! - Create and cancel monitor downtimes
//! - Map transport failures and non-2xx statuses to `ApiError`

use std::time::Duration;

use reqwest::{Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;

use crate::config::DatadogConfig;
use crate::datadog::types::{
    ApiError, ApiResult, DowntimeCreateRequest, DowntimeResponse, DowntimeSpec, MonitorSnapshot,
};
use crate::datadog::{DowntimeSource, MonitorSource};

const API_KEY_HEADER: &str = "DD-API-KEY";
const APPLICATION_KEY_HEADER: &str = "DD-APPLICATION-KEY";

/// Thin client over the Datadog REST API.
#[derive(Clone)]
pub struct DatadogClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    application_key: String,
}

impl DatadogClient {
    /// Create a new client from configuration.
    pub fn new(config: &DatadogConfig) -> ApiResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| ApiError::Transport(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http,
            base_url: config.api_base_url(),
            api_key: config.api_key.clone(),
            application_key: config.application_key.clone(),
        })
    }

    /// Base URL requests are sent to.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.http
            .request(method, format!("{}{}", self.base_url, path))
            .header(API_KEY_HEADER, &self.api_key)
            .header(APPLICATION_KEY_HEADER, &self.application_key)
            .header(reqwest::header::ACCEPT, "application/json")
    }

    async fn send(builder: RequestBuilder) -> ApiResult<Response> {
        let response = builder.send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        Err(ApiError::Status {
            status: status.as_u16(),
            body,
        })
    }

    async fn send_json<T: DeserializeOwned>(builder: RequestBuilder) -> ApiResult<T> {
        let response = Self::send(builder).await?;
        response
            .json::<T>()
            .await
            .map_err(|e| ApiError::Decode(e.to_string()))
    }
}

impl MonitorSource for DatadogClient {
    async fn get_monitor(&self, monitor_id: i64, with_group_states: bool) -> ApiResult<MonitorSnapshot> {
        let mut builder = self.request(Method::GET, &format!("/api/v1/monitor/{}", monitor_id));
        if with_group_states {
            builder = builder.query(&[("group_states", "all")]);
        }

        tracing::debug!(monitor_id, with_group_states, "Fetching monitor");
        Self::send_json(builder).await
    }
}

impl DowntimeSource for DatadogClient {
    async fn create_downtime(&self, spec: &DowntimeSpec) -> ApiResult<String> {
        let body = DowntimeCreateRequest::from(spec);
        let builder = self.request(Method::POST, "/api/v2/downtime").json(&body);

        tracing::debug!(monitor_id = spec.monitor_id, end = %spec.end, "Creating downtime");
        let response: DowntimeResponse = Self::send_json(builder).await?;

        response
            .data
            .and_then(|d| d.id)
            .ok_or_else(|| ApiError::Decode("downtime response carries no id".to_string()))
    }

    async fn cancel_downtime(&self, downtime_id: &str) -> ApiResult<()> {
        let builder = self.request(Method::DELETE, &format!("/api/v2/downtime/{}", downtime_id));

        tracing::debug!(downtime_id, "Canceling downtime");
        Self::send(builder).await.map(|_| ())
    }
}

impl std::fmt::Debug for DatadogClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DatadogClient")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}
