//! Event listener endpoints.
//!
//! Only step bookkeeping happens here; every endpoint answers `{}`.

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};
use thiserror::Error;

use crate::events::registry::{integer_id, StepExecution};
use crate::http::server::AppState;
use crate::observability::metrics;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExperimentExecution {
    #[serde(deserialize_with = "integer_id")]
    pub execution_id: i64,

    #[serde(default)]
    pub experiment_key: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TargetExecution {
    pub step_execution_id: String,

    #[serde(default)]
    pub target_name: Option<String>,
}

/// Body of every event endpoint; which section is present depends on the event.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventRequest {
    #[serde(default)]
    pub event_name: Option<String>,

    #[serde(default)]
    pub experiment_execution: Option<ExperimentExecution>,

    #[serde(default)]
    pub experiment_step_execution: Option<StepExecution>,

    #[serde(default)]
    pub experiment_step_target_execution: Option<TargetExecution>,
}

#[derive(Debug, Error)]
pub enum EventError {
    #[error("missing {0} in event")]
    Missing(&'static str),
}

impl IntoResponse for EventError {
    fn into_response(self) -> Response {
        tracing::warn!(error = %self, "Rejected event");
        (StatusCode::BAD_REQUEST, Json(json!({ "title": self.to_string() }))).into_response()
    }
}

fn ack() -> Json<Value> {
    Json(json!({}))
}

pub async fn step_started(
    State(state): State<AppState>,
    Json(event): Json<EventRequest>,
) -> Result<Json<Value>, EventError> {
    metrics::record_request("event_step_started");
    let step = event
        .experiment_step_execution
        .ok_or(EventError::Missing("experimentStepExecution"))?;

    tracing::debug!(step_id = %step.id, execution_id = step.execution_id, "Step started");
    state.steps.insert(step);
    Ok(ack())
}

fn lookup_step(state: &AppState, event: EventRequest, phase: &'static str) -> Result<Json<Value>, EventError> {
    let target = event
        .experiment_step_target_execution
        .ok_or(EventError::Missing("experimentStepTargetExecution"))?;

    match state.steps.get(&target.step_execution_id) {
        Some(step) => tracing::debug!(
            step_id = %step.id,
            action = step.display_name(),
            target = target.target_name.as_deref().unwrap_or_default(),
            phase,
            "Target event"
        ),
        None => tracing::warn!(
            step_id = %target.step_execution_id,
            phase,
            "Could not find step infos for step execution"
        ),
    }
    Ok(ack())
}

pub async fn target_started(
    State(state): State<AppState>,
    Json(event): Json<EventRequest>,
) -> Result<Json<Value>, EventError> {
    metrics::record_request("event_target_started");
    lookup_step(&state, event, "started")
}

pub async fn target_completed(
    State(state): State<AppState>,
    Json(event): Json<EventRequest>,
) -> Result<Json<Value>, EventError> {
    metrics::record_request("event_target_completed");
    lookup_step(&state, event, "completed")
}

pub async fn experiment_completed(
    State(state): State<AppState>,
    Json(event): Json<EventRequest>,
) -> Result<Json<Value>, EventError> {
    metrics::record_request("event_experiment_completed");
    let execution = event
        .experiment_execution
        .ok_or(EventError::Missing("experimentExecution"))?;

    let removed = state.steps.remove_execution(execution.execution_id);
    tracing::debug!(execution_id = execution.execution_id, removed, "Dropped step executions");
    Ok(ack())
}
