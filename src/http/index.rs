//! Extension index: tells the orchestrator which endpoints this extension offers.

use axum::Json;
use serde::Serialize;

use crate::actions::{downtime, status_check};
use crate::actions::types::EndpointReference;
use crate::observability::metrics;

pub const EVENT_STEP_STARTED: &str = "/events/experiment-step-started";
pub const EVENT_TARGET_STARTED: &str = "/events/experiment-target-started";
pub const EVENT_TARGET_COMPLETED: &str = "/events/experiment-target-completed";
pub const EVENT_EXPERIMENT_COMPLETED: &str = "/events/experiment-completed";

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EventListener {
    pub method: &'static str,
    pub path: &'static str,
    pub listen_to: Vec<&'static str>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtensionIndex {
    pub actions: Vec<EndpointReference>,
    pub event_listeners: Vec<EventListener>,
}

fn listener(path: &'static str, event: &'static str) -> EventListener {
    EventListener {
        method: "POST",
        path,
        listen_to: vec![event],
    }
}

pub fn index() -> ExtensionIndex {
    ExtensionIndex {
        actions: vec![
            EndpointReference::get(status_check::PATH),
            EndpointReference::get(downtime::PATH),
        ],
        event_listeners: vec![
            listener(EVENT_STEP_STARTED, "experiment.step.started"),
            listener(EVENT_TARGET_STARTED, "experiment.step.target.started"),
            listener(EVENT_TARGET_COMPLETED, "experiment.step.target.completed"),
            listener(EVENT_EXPERIMENT_COMPLETED, "experiment.execution.completed"),
        ],
    }
}

pub async fn extension_index() -> Json<ExtensionIndex> {
    metrics::record_request("index");
    Json(index())
}
