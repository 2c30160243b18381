//! Action-level errors.
//!
//! Every variant is an "errored" outcome: the orchestrator receives an HTTP
//! error with `{title, detail}`. Check mismatches are not errors and travel
//! inside a successful status response instead.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use crate::datadog::ApiError;

#[derive(Debug, Error)]
pub enum ActionError {
    /// Unusable input on prepare: missing or unparsable parameters.
    #[error("{0}")]
    Validation(String),

    /// Input that parses but cannot be honoured for this target.
    #[error("{0}")]
    Domain(String),

    /// The state blob handed back by the orchestrator does not decode.
    #[error("Failed to decode action state: {0}")]
    MalformedState(String),

    #[error("Failed to retrieve monitor {monitor_id} from Datadog after {attempts} attempts.")]
    Fetch {
        monitor_id: i64,
        attempts: u32,
        #[source]
        source: ApiError,
    },

    #[error("Failed to create Downtime for monitor {monitor_id}.")]
    DowntimeCreate {
        monitor_id: i64,
        #[source]
        source: ApiError,
    },

    #[error("Failed to cancel Downtime (monitor {monitor_id}, downtime {downtime_id}).")]
    DowntimeCancel {
        monitor_id: i64,
        downtime_id: String,
        #[source]
        source: ApiError,
    },
}

impl ActionError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ActionError::Validation(_) | ActionError::Domain(_) | ActionError::MalformedState(_) => {
                StatusCode::BAD_REQUEST
            }
            ActionError::Fetch { .. }
            | ActionError::DowntimeCreate { .. }
            | ActionError::DowntimeCancel { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn detail(&self) -> Option<String> {
        match self {
            ActionError::Fetch { source, .. }
            | ActionError::DowntimeCreate { source, .. }
            | ActionError::DowntimeCancel { source, .. } => Some(source.to_string()),
            _ => None,
        }
    }
}

/// Error body understood by the orchestrator.
#[derive(Debug, Serialize)]
struct ErrorBody {
    title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    detail: Option<String>,
}

impl IntoResponse for ActionError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(error = %self, detail = ?self.detail(), "Action failed");
        } else {
            tracing::warn!(error = %self, "Action rejected");
        }

        let body = ErrorBody {
            title: self.to_string(),
            detail: self.detail(),
        };
        (status, Json(body)).into_response()
    }
}
