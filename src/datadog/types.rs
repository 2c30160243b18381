//! Datadog wire types and error definitions.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Monitor state labels as reported by Datadog.
pub mod states {
    pub const OK: &str = "OK";
    pub const ALERT: &str = "Alert";
    pub const WARN: &str = "Warn";
    pub const NO_DATA: &str = "No Data";
    pub const UNKNOWN: &str = "Unknown";
    pub const SKIPPED: &str = "Skipped";
    pub const IGNORED: &str = "Ignored";
}

/// Snapshot of a single monitor as returned by `GET /api/v1/monitor/{id}`.
///
/// Only the fields the status check reads are modelled; everything else in
/// the payload is ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonitorSnapshot {
    #[serde(default)]
    pub id: i64,

    #[serde(default)]
    pub name: String,

    #[serde(default)]
    pub tags: Vec<String>,

    /// Aggregated state over all groups.
    #[serde(default)]
    pub overall_state: Option<String>,

    /// Per-group states, only present when requested with `group_states`.
    #[serde(default)]
    pub state: Option<MonitorGroupStates>,
}

/// The `state` object of a monitor.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonitorGroupStates {
    #[serde(default)]
    pub groups: HashMap<String, MonitorGroupState>,
}

/// State of one group of a multi alert monitor.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonitorGroupState {
    #[serde(default)]
    pub status: Option<String>,
}

impl MonitorSnapshot {
    /// Iterate `(group name, status)` pairs. Groups without a status are skipped.
    pub fn group_states(&self) -> impl Iterator<Item = (&str, &str)> {
        self.state
            .iter()
            .flat_map(|s| s.groups.iter())
            .filter_map(|(name, group)| group.status.as_deref().map(|status| (name.as_str(), status)))
    }
}

/// Describes a downtime to create for a single monitor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DowntimeSpec {
    pub monitor_id: i64,
    pub end: DateTime<Utc>,
    pub message: String,
    /// Notify after the downtime if the monitor is unhealthy.
    pub notify: bool,
}

/// Body of `POST /api/v2/downtime`.
#[derive(Debug, Clone, Serialize)]
pub struct DowntimeCreateRequest {
    pub data: DowntimeCreateData,
}

#[derive(Debug, Clone, Serialize)]
pub struct DowntimeCreateData {
    #[serde(rename = "type")]
    pub resource_type: &'static str,
    pub attributes: DowntimeCreateAttributes,
}

#[derive(Debug, Clone, Serialize)]
pub struct DowntimeCreateAttributes {
    pub monitor_identifier: DowntimeMonitorIdentifier,
    pub message: String,
    pub schedule: DowntimeSchedule,
    pub mute_first_recovery_notification: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub notify_end_types: Vec<&'static str>,
    pub scope: &'static str,
}

#[derive(Debug, Clone, Serialize)]
pub struct DowntimeMonitorIdentifier {
    pub monitor_id: i64,
}

/// One-time schedule; the downtime starts immediately.
#[derive(Debug, Clone, Serialize)]
pub struct DowntimeSchedule {
    pub end: DateTime<Utc>,
}

impl From<&DowntimeSpec> for DowntimeCreateRequest {
    fn from(spec: &DowntimeSpec) -> Self {
        let notify_end_types = if spec.notify {
            vec!["canceled", "expired"]
        } else {
            Vec::new()
        };

        Self {
            data: DowntimeCreateData {
                resource_type: "downtime",
                attributes: DowntimeCreateAttributes {
                    monitor_identifier: DowntimeMonitorIdentifier {
                        monitor_id: spec.monitor_id,
                    },
                    message: spec.message.clone(),
                    schedule: DowntimeSchedule { end: spec.end },
                    mute_first_recovery_notification: true,
                    notify_end_types,
                    scope: "*",
                },
            },
        }
    }
}

/// Response of `POST /api/v2/downtime`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DowntimeResponse {
    #[serde(default)]
    pub data: Option<DowntimeResponseData>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DowntimeResponseData {
    #[serde(default)]
    pub id: Option<String>,
}

/// Errors talking to the Datadog API.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiError {
    /// Connection, timeout or other transport failure.
    #[error("transport error: {0}")]
    Transport(String),

    /// The API answered with a non-2xx status.
    #[error("unexpected status {status}: {body}")]
    Status { status: u16, body: String },

    /// The response body could not be interpreted.
    #[error("invalid response: {0}")]
    Decode(String),
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            ApiError::Decode(err.to_string())
        } else {
            ApiError::Transport(err.to_string())
        }
    }
}

/// Result type for Datadog API operations.
pub type ApiResult<T> = Result<T, ApiError>;
