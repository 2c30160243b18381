//! Action lifecycle wire types exchanged with the orchestrator.
//!
//! Field names are camelCase on the wire.

use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Body of a `prepare` call.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PrepareRequest {
    #[serde(default)]
    pub target: Option<Target>,

    /// User supplied parameter values, keyed by parameter name.
    #[serde(default)]
    pub config: Map<String, Value>,

    #[serde(default)]
    pub execution_context: Option<ExecutionContext>,
}

/// The target an action runs against.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Target {
    #[serde(default)]
    pub attributes: HashMap<String, Vec<String>>,
}

/// Links back to the experiment that triggered the action.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionContext {
    #[serde(default)]
    pub experiment_uri: Option<String>,

    #[serde(default)]
    pub execution_uri: Option<String>,
}

/// Body of `start`, `status` and `stop` calls: the state handed out by `prepare`.
///
/// Kept as raw JSON so a malformed state surfaces as an action error rather
/// than an extractor rejection.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ActionStateRequest {
    #[serde(default)]
    pub state: Value,
}

#[derive(Debug, Clone, Serialize)]
pub struct PrepareResult<S> {
    pub state: S,
}

#[derive(Debug, Clone, Serialize)]
pub struct StartResult<S> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<S>,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub messages: Vec<Message>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct StopResult {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub messages: Vec<Message>,
}

/// Result of one `status` poll.
#[derive(Debug, Clone, Serialize)]
pub struct StatusResult<S> {
    pub completed: bool,

    pub state: S,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<CheckError>,

    pub metrics: Vec<Metric>,
}

/// Status of a check error. Errors that stop evaluation are `ActionError` responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorStatus {
    Failed,
}

/// A check failure attached to an otherwise successful response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckError {
    pub title: String,
    pub status: ErrorStatus,
}

impl CheckError {
    pub fn failed(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            status: ErrorStatus::Failed,
        }
    }
}

/// One data point for the state-over-time widget.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Metric {
    pub name: String,
    pub metric: BTreeMap<String, String>,
    pub timestamp: DateTime<Utc>,
    pub value: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageLevel {
    Debug,
    Info,
    Warn,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Message {
    pub level: MessageLevel,
    pub message: String,
}

impl Message {
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            level: MessageLevel::Info,
            message: message.into(),
        }
    }
}

// ---------------------------------------------------------------------------
// Describe documents
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionKind {
    Check,
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TimeControl {
    Internal,
    External,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ParameterType {
    Duration,
    String,
    StringArray,
    Boolean,
    KeyValue,
}

/// Reference to an endpoint the orchestrator calls.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EndpointReference {
    pub method: &'static str,
    pub path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub call_interval: Option<&'static str>,
}

impl EndpointReference {
    pub fn post(path: impl Into<String>) -> Self {
        Self {
            method: "POST",
            path: path.into(),
            call_interval: None,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self {
            method: "GET",
            path: path.into(),
            call_interval: None,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TargetSelection {
    pub target_type: &'static str,
    pub quantity_restriction: &'static str,
    pub selection_templates: Vec<SelectionTemplate>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SelectionTemplate {
    pub label: &'static str,
    pub query: &'static str,
}

#[derive(Debug, Clone, Serialize)]
pub struct ParameterOption {
    pub label: &'static str,
    pub value: &'static str,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionParameter {
    pub name: &'static str,
    pub label: &'static str,
    pub description: &'static str,
    #[serde(rename = "type")]
    pub parameter_type: ParameterType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_value: Option<&'static str>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<ParameterOption>,
    pub required: bool,
    pub advanced: bool,
    pub deprecated: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deprecation_message: Option<&'static str>,
    pub order: u32,
}

impl ActionParameter {
    pub fn new(name: &'static str, label: &'static str, parameter_type: ParameterType, order: u32) -> Self {
        Self {
            name,
            label,
            description: "",
            parameter_type,
            default_value: None,
            options: Vec::new(),
            required: false,
            advanced: false,
            deprecated: false,
            deprecation_message: None,
            order,
        }
    }
}

/// The state-over-time widget; each field names the metric attribute it reads.
#[derive(Debug, Clone, Serialize)]
pub struct StateOverTimeWidget {
    #[serde(rename = "type")]
    pub widget_type: &'static str,
    pub title: &'static str,
    pub identity: WidgetField,
    pub label: WidgetField,
    pub state: WidgetField,
    pub tooltip: WidgetField,
    pub url: WidgetField,
    pub value: WidgetValue,
}

#[derive(Debug, Clone, Serialize)]
pub struct WidgetField {
    pub from: &'static str,
}

#[derive(Debug, Clone, Serialize)]
pub struct WidgetValue {
    pub hide: bool,
}

/// Static capability document returned by the describe endpoint.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionDescription {
    pub id: String,
    pub label: &'static str,
    pub description: &'static str,
    pub version: &'static str,
    pub technology: &'static str,
    pub kind: ActionKind,
    pub time_control: TimeControl,
    pub target_selection: TargetSelection,
    pub parameters: Vec<ActionParameter>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub widgets: Vec<StateOverTimeWidget>,
    pub prepare: EndpointReference,
    pub start: EndpointReference,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<EndpointReference>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stop: Option<EndpointReference>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prepare_request_from_orchestrator_json() {
        let request: PrepareRequest = serde_json::from_str(
            r#"{
                "config": {"duration": 60000, "statusCheckMode": "allTheTime"},
                "target": {"name": "m", "attributes": {"datadog.monitor.id": ["42"]}},
                "executionContext": {"experimentUri": "https://x/e", "executionUri": "https://x/x"}
            }"#,
        )
        .unwrap();

        assert_eq!(request.config["duration"], 60000);
        let target = request.target.unwrap();
        assert_eq!(target.attributes["datadog.monitor.id"], vec!["42".to_string()]);
        let ctx = request.execution_context.unwrap();
        assert_eq!(ctx.experiment_uri.as_deref(), Some("https://x/e"));
    }

    #[test]
    fn test_status_result_serialization() {
        let result = StatusResult {
            completed: false,
            state: serde_json::json!({"a": 1}),
            error: Some(CheckError::failed("nope")),
            metrics: Vec::new(),
        };
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["error"]["status"], "failed");
        assert!(serde_json::from_str::<ErrorStatus>(r#""errored""#).is_err());
        assert_eq!(json["completed"], false);
        assert_eq!(json["state"]["a"], 1);
    }

    #[test]
    fn test_start_result_omits_empty_fields() {
        let result: StartResult<()> = StartResult {
            state: None,
            messages: Vec::new(),
        };
        assert_eq!(serde_json::to_string(&result).unwrap(), "{}");
    }
}
