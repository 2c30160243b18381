//! Monitor downtime: mute a monitor for the duration of an experiment step.
//!
//! `start` creates the downtime and records its id in the state; `stop`
//! cancels it. A stop without a recorded id does nothing.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::actions::error::ActionError;
use crate::actions::params;
use crate::actions::types::{
    ActionDescription, ActionKind, ActionParameter, EndpointReference, Message, ParameterType,
    PrepareRequest, StartResult, StopResult, TimeControl,
};
use crate::actions::{monitor_target_selection, MONITOR_TARGET_TYPE, TECHNOLOGY};
use crate::datadog::{DowntimeSource, DowntimeSpec};
use crate::observability::metrics;

/// Route prefix of this action.
pub const PATH: &str = "/monitor/action/downtime";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DowntimeState {
    pub monitor_id: i64,
    pub end: DateTime<Utc>,
    pub notify: bool,

    /// Set once the downtime exists.
    #[serde(default)]
    pub downtime_id: Option<String>,

    #[serde(default)]
    pub experiment_uri: Option<String>,

    #[serde(default)]
    pub execution_uri: Option<String>,
}

impl DowntimeState {
    /// Message attached to the downtime, linking back to the experiment.
    pub fn message(&self) -> String {
        let mut message = String::from("Created by Steadybit");
        if let Some(uri) = &self.experiment_uri {
            message.push_str(&format!("\n\n[Open Experiment]({})", uri));
        }
        if let Some(uri) = &self.execution_uri {
            message.push_str(&format!("\n\n[Open Execution]({})", uri));
        }
        message
    }
}

pub fn prepare(request: &PrepareRequest, now: DateTime<Utc>) -> Result<DowntimeState, ActionError> {
    let monitor_id = params::monitor_id(request.target.as_ref())?;
    let end = params::deadline(&request.config, now)?;
    let notify = params::boolean(&request.config, "notify", true)?;
    let context = request.execution_context.clone().unwrap_or_default();

    Ok(DowntimeState {
        monitor_id,
        end,
        notify,
        downtime_id: None,
        experiment_uri: context.experiment_uri,
        execution_uri: context.execution_uri,
    })
}

/// Create the downtime. Failure is fatal for the step.
pub async fn start<D: DowntimeSource>(
    api: &D,
    mut state: DowntimeState,
) -> Result<StartResult<DowntimeState>, ActionError> {
    let spec = DowntimeSpec {
        monitor_id: state.monitor_id,
        end: state.end,
        message: state.message(),
        notify: state.notify,
    };

    let downtime_id = api.create_downtime(&spec).await.map_err(|source| {
        metrics::record_downtime("create", false);
        ActionError::DowntimeCreate {
            monitor_id: state.monitor_id,
            source,
        }
    })?;
    metrics::record_downtime("create", true);

    tracing::info!(monitor_id = state.monitor_id, downtime_id = %downtime_id, end = %state.end, "Downtime started");
    let message = Message::info(format!(
        "Downtime started. (monitor {}, downtime {})",
        state.monitor_id, downtime_id
    ));
    state.downtime_id = Some(downtime_id);

    Ok(StartResult {
        state: Some(state),
        messages: vec![message],
    })
}

/// Cancel the downtime created by `start`, if any.
pub async fn stop<D: DowntimeSource>(api: &D, state: &DowntimeState) -> Result<StopResult, ActionError> {
    let Some(downtime_id) = state.downtime_id.as_deref() else {
        tracing::debug!(monitor_id = state.monitor_id, "No downtime to cancel");
        return Ok(StopResult::default());
    };

    api.cancel_downtime(downtime_id).await.map_err(|source| {
        metrics::record_downtime("cancel", false);
        ActionError::DowntimeCancel {
            monitor_id: state.monitor_id,
            downtime_id: downtime_id.to_string(),
            source,
        }
    })?;
    metrics::record_downtime("cancel", true);

    tracing::info!(monitor_id = state.monitor_id, downtime_id, "Downtime canceled");
    Ok(StopResult {
        messages: vec![Message::info(format!(
            "Downtime canceled. (monitor {}, downtime {})",
            state.monitor_id, downtime_id
        ))],
    })
}

pub fn describe() -> ActionDescription {
    ActionDescription {
        id: format!("{}.downtime", MONITOR_TARGET_TYPE),
        label: "Create Downtime",
        description: "Start a Monitor Downtime for a given duration.",
        version: env!("CARGO_PKG_VERSION"),
        technology: TECHNOLOGY,
        kind: ActionKind::Other,
        time_control: TimeControl::External,
        target_selection: monitor_target_selection("by monitor name"),
        parameters: vec![
            ActionParameter {
                default_value: Some("30s"),
                required: true,
                ..ActionParameter::new("duration", "Duration", ParameterType::Duration, 1)
            },
            ActionParameter {
                description: "Should datadog notify after the Downtime if the monitor is in an unhealthy state?",
                default_value: Some("true"),
                required: true,
                ..ActionParameter::new("notify", "Notify after Downtime if unhealthy", ParameterType::Boolean, 2)
            },
        ],
        widgets: Vec::new(),
        prepare: EndpointReference::post(format!("{}/prepare", PATH)),
        start: EndpointReference::post(format!("{}/start", PATH)),
        status: None,
        stop: Some(EndpointReference::post(format!("{}/stop", PATH))),
    }
}
