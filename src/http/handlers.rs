//! Action endpoints.
//!
//! Each handler decodes the body, delegates to the action module and wraps
//! the result. Errors render through `ActionError`'s `IntoResponse`.

use axum::{extract::State, Json};
use chrono::Utc;
use serde_json::{json, Value};

use crate::actions::downtime::{self, DowntimeState};
use crate::actions::status_check::{self, StatusCheckState};
use crate::actions::types::{
    ActionDescription, ActionStateRequest, PrepareRequest, PrepareResult, StartResult, StatusResult,
    StopResult,
};
use crate::actions::{decode_state, ActionError};
use crate::http::server::AppState;
use crate::observability::metrics;

pub async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

// ---------------------------------------------------------------------------
// Status check
// ---------------------------------------------------------------------------

pub async fn describe_status_check() -> Json<ActionDescription> {
    metrics::record_request("status_check_describe");
    Json(status_check::describe())
}

pub async fn prepare_status_check(
    Json(request): Json<PrepareRequest>,
) -> Result<Json<PrepareResult<StatusCheckState>>, ActionError> {
    metrics::record_request("status_check_prepare");
    let state = status_check::prepare(&request, Utc::now())?;
    Ok(Json(PrepareResult { state }))
}

pub async fn start_status_check(
    Json(request): Json<ActionStateRequest>,
) -> Result<Json<StartResult<StatusCheckState>>, ActionError> {
    metrics::record_request("status_check_start");
    let state: StatusCheckState = decode_state(request.state)?;
    Ok(Json(status_check::start(&state)))
}

pub async fn status_status_check(
    State(app): State<AppState>,
    Json(request): Json<ActionStateRequest>,
) -> Result<Json<StatusResult<StatusCheckState>>, ActionError> {
    metrics::record_request("status_check_status");
    let state: StatusCheckState = decode_state(request.state)?;
    let result = status_check::status(
        app.datadog.as_ref(),
        state,
        &app.config.datadog.site_url,
        Utc::now(),
    )
    .await?;
    Ok(Json(result))
}

// ---------------------------------------------------------------------------
// Downtime
// ---------------------------------------------------------------------------

pub async fn describe_downtime() -> Json<ActionDescription> {
    metrics::record_request("downtime_describe");
    Json(downtime::describe())
}

pub async fn prepare_downtime(
    Json(request): Json<PrepareRequest>,
) -> Result<Json<PrepareResult<DowntimeState>>, ActionError> {
    metrics::record_request("downtime_prepare");
    let state = downtime::prepare(&request, Utc::now())?;
    Ok(Json(PrepareResult { state }))
}

pub async fn start_downtime(
    State(app): State<AppState>,
    Json(request): Json<ActionStateRequest>,
) -> Result<Json<StartResult<DowntimeState>>, ActionError> {
    metrics::record_request("downtime_start");
    let state: DowntimeState = decode_state(request.state)?;
    Ok(Json(downtime::start(app.datadog.as_ref(), state).await?))
}

pub async fn stop_downtime(
    State(app): State<AppState>,
    Json(request): Json<ActionStateRequest>,
) -> Result<Json<StopResult>, ActionError> {
    metrics::record_request("downtime_stop");
    let state: DowntimeState = decode_state(request.state)?;
    Ok(Json(downtime::stop(app.datadog.as_ref(), &state).await?))
}
