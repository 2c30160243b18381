//! Experiment actions.
//!
//! # Data Flow
//! ```text
//! orchestrator
//!     → prepare(request)          → state
//!     → start({state})            → state', messages
//!     → status({state}) (polled)  → completed, state', error?, metrics
//!     → stop({state})             → messages
//! ```
//!
//! # Design Decisions
//! - The extension keeps no per-action memory; the state blob round-trips
//!   through the orchestrator on every call
//! - Each action is a set of free functions generic over the Datadog traits

use serde::de::DeserializeOwned;
use serde_json::Value;

pub mod downtime;
pub mod error;
pub mod params;
pub mod status_check;
pub mod types;

pub use error::ActionError;

use types::{SelectionTemplate, TargetSelection};

/// Target type of Datadog monitors; action ids are derived from it.
pub const MONITOR_TARGET_TYPE: &str = "com.steadybit.extension_datadog.monitor";

pub const TECHNOLOGY: &str = "Datadog";

/// Decode the state blob of a start, status or stop call.
pub fn decode_state<S: DeserializeOwned>(state: Value) -> Result<S, ActionError> {
    serde_json::from_value(state).map_err(|e| ActionError::MalformedState(e.to_string()))
}

pub(crate) fn monitor_target_selection(template_label: &'static str) -> TargetSelection {
    TargetSelection {
        target_type: MONITOR_TARGET_TYPE,
        quantity_restriction: "ALL",
        selection_templates: vec![SelectionTemplate {
            label: template_label,
            query: "datadog.monitor.name=\"\"",
        }],
    }
}
