//! Monitor status check.
//!
//! # Data Flow
//! ```text
//! prepare(request) → StatusCheckState
//! status(state)
//!     → get_monitor (up to FETCH_ATTEMPTS)
//!     → observed_states(snapshot, filter)
//!     → evaluate(expected, mode, success) → Option<CheckError>
//!     → to_metric(observed) → widget data point
//! ```
//!
//! # Design Decisions
//! - Evaluation and metric mapping are pure; only `status` performs I/O
//! - `now` is passed in so polls are reproducible in tests
//! - An empty observed set means "not enough data": no verdict is computed
//! - `success` only ever goes from false to true

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::actions::error::ActionError;
use crate::actions::params;
use crate::actions::types::{
    ActionDescription, ActionKind, ActionParameter, CheckError, EndpointReference, Metric,
    ParameterOption, ParameterType, PrepareRequest, StartResult, StateOverTimeWidget,
    StatusResult, TimeControl, WidgetField, WidgetValue,
};
use crate::actions::{monitor_target_selection, MONITOR_TARGET_TYPE, TECHNOLOGY};
use crate::datadog::types::states;
use crate::datadog::{MonitorSnapshot, MonitorSource};
use crate::observability::metrics::{self, PollOutcome};
use crate::resilience::retries::{retry_fixed, FETCH_ATTEMPTS};

/// Name of the metric feeding the state-over-time widget.
pub const METRIC_NAME: &str = "datadog_monitor_status";

/// Route prefix of this action.
pub const PATH: &str = "/monitor/action/status-check";

/// How the expected states are enforced over the check window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CheckMode {
    /// Every poll must observe only expected states.
    AllTheTime,
    /// At least one poll before the end must observe only expected states.
    AtLeastOnce,
}

impl CheckMode {
    pub const ALL_THE_TIME: &'static str = "allTheTime";
    pub const AT_LEAST_ONCE: &'static str = "atLeastOnce";

    pub fn from_wire(value: &str) -> Option<Self> {
        match value {
            Self::ALL_THE_TIME => Some(CheckMode::AllTheTime),
            Self::AT_LEAST_ONCE => Some(CheckMode::AtLeastOnce),
            _ => None,
        }
    }
}

/// State carried between the lifecycle calls of one status check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusCheckState {
    pub monitor_id: i64,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,

    /// Expected states, deduplicated, in the order given.
    #[serde(default)]
    pub expected_states: Vec<String>,

    #[serde(default)]
    pub check_mode: Option<CheckMode>,

    /// Tag key → value. Only set for multi alert monitors.
    #[serde(default)]
    pub multi_alert_filter: BTreeMap<String, String>,

    #[serde(default)]
    pub success: bool,
}

impl StatusCheckState {
    fn uses_filter(&self) -> bool {
        !self.multi_alert_filter.is_empty()
    }

    /// Decide the verdict for one poll.
    ///
    /// Returns `None` when the poll passes or cannot be evaluated. May set
    /// `success` in `AtLeastOnce` mode.
    pub fn evaluate(
        &mut self,
        monitor: &MonitorSnapshot,
        observed: &BTreeSet<String>,
        completed: bool,
    ) -> Option<CheckError> {
        if self.expected_states.is_empty() || observed.is_empty() {
            return None;
        }

        let matches = observed.iter().all(|s| self.expected_states.contains(s));
        tracing::debug!(
            monitor = %monitor.name,
            monitor_id = self.monitor_id,
            observed = ?observed,
            expected = ?self.expected_states,
            matches,
            "Monitor status"
        );

        match self.check_mode? {
            CheckMode::AllTheTime if !matches => Some(CheckError::failed(format!(
                "Monitor '{}' (id {}, tags: {}) has status '{}' whereas '{}' is expected.",
                monitor.name,
                self.monitor_id,
                format_tags(&monitor.tags),
                observed.iter().map(String::as_str).collect::<Vec<_>>().join(", "),
                format_expected(&self.expected_states),
            ))),
            CheckMode::AllTheTime => None,
            CheckMode::AtLeastOnce => {
                if matches {
                    self.success = true;
                }
                if completed && !self.success {
                    Some(CheckError::failed(format!(
                        "Monitor '{}' (id {}, tags: {}) didn't have status '{}' at least once.",
                        monitor.name,
                        self.monitor_id,
                        format_tags(&monitor.tags),
                        format_expected(&self.expected_states),
                    )))
                } else {
                    None
                }
            }
        }
    }
}

fn format_tags(tags: &[String]) -> String {
    if tags.is_empty() {
        "<none>".to_string()
    } else {
        tags.join(", ")
    }
}

fn format_expected(expected: &[String]) -> String {
    format!("[{}]", expected.join(", "))
}

/// Distinct states the (possibly filtered) monitor currently reports.
///
/// Without a filter this is the overall state, if any. With a filter it is
/// the states of every group whose name contains each `key:value` term.
pub fn observed_states(monitor: &MonitorSnapshot, filter: &BTreeMap<String, String>) -> BTreeSet<String> {
    if filter.is_empty() {
        return monitor.overall_state.iter().cloned().collect();
    }

    let terms: Vec<String> = filter.iter().map(|(k, v)| format!("{}:{}", k, v)).collect();
    monitor
        .group_states()
        .filter(|(group, _)| terms.iter().all(|term| group.contains(term.as_str())))
        .map(|(_, status)| status.to_string())
        .collect()
}

/// Widget severity bucket for a set of observed states.
pub fn severity(observed: &BTreeSet<String>) -> &'static str {
    let has = |state: &str| observed.contains(state);

    if has(states::ALERT) {
        "danger"
    } else if has(states::WARN) || has(states::IGNORED) {
        "warn"
    } else if has(states::NO_DATA) || has(states::SKIPPED) {
        "info"
    } else {
        "warn"
    }
}

pub fn tooltip(observed: &BTreeSet<String>) -> String {
    let labels: Vec<&str> = observed.iter().map(String::as_str).collect();
    match labels.as_slice() {
        [] => format!("Monitor status is: {}", states::UNKNOWN),
        [single] => format!("Monitor status is: {}", single),
        many => format!("Monitor multi alert group status are: {}", many.join(", ")),
    }
}

/// Deep link into the Datadog UI for the check window.
pub fn monitor_url(
    site_url: &str,
    monitor_id: i64,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    filter: &BTreeMap<String, String>,
) -> String {
    let mut url = format!(
        "{}/monitors/{}?from_ts={}&to_ts={}",
        site_url.trim_end_matches('/'),
        monitor_id,
        start.timestamp_millis(),
        end.timestamp_millis()
    );

    if !filter.is_empty() {
        let query = filter
            .iter()
            .map(|(k, v)| format!("{}%3A{}", encode(k), encode(v)))
            .collect::<Vec<_>>()
            .join("%20AND%20");
        url.push_str("&q=");
        url.push_str(&query);
    }
    url
}

fn encode(value: &str) -> String {
    url::form_urlencoded::byte_serialize(value.as_bytes()).collect()
}

/// Build the widget data point for one poll.
pub fn to_metric(
    monitor: &MonitorSnapshot,
    state: &StatusCheckState,
    observed: &BTreeSet<String>,
    site_url: &str,
    now: DateTime<Utc>,
) -> Metric {
    let mut attributes = BTreeMap::new();
    attributes.insert("datadog.monitor.id".to_string(), state.monitor_id.to_string());
    attributes.insert("datadog.monitor.name".to_string(), monitor.name.clone());
    attributes.insert("state".to_string(), severity(observed).to_string());
    attributes.insert("tooltip".to_string(), tooltip(observed));
    attributes.insert(
        "url".to_string(),
        monitor_url(site_url, state.monitor_id, state.start, state.end, &state.multi_alert_filter),
    );

    Metric {
        name: METRIC_NAME.to_string(),
        metric: attributes,
        timestamp: now,
        value: 0.0,
    }
}

/// Build the check state from a prepare request.
pub fn prepare(request: &PrepareRequest, now: DateTime<Utc>) -> Result<StatusCheckState, ActionError> {
    let target = request.target.as_ref();
    let config = &request.config;

    let monitor_id = params::monitor_id(target)?;
    let end = params::deadline(config, now)?;

    let mut expected = params::string_list(config, "expectedStatusList");
    if expected.is_empty() {
        expected.extend(params::optional_string(config, "expectedStatus"));
    }
    let mut expected_states = Vec::with_capacity(expected.len());
    for state in expected {
        if !expected_states.contains(&state) {
            expected_states.push(state);
        }
    }

    let check_mode = match params::optional_string(config, "statusCheckMode") {
        Some(raw) => {
            let mode = CheckMode::from_wire(&raw);
            if mode.is_none() {
                tracing::warn!(monitor_id, mode = %raw, "Unknown status check mode, no verdict will be computed");
            }
            mode
        }
        None => None,
    };

    let multi_alert_filter = params::key_value(config, "multiAlertFilter")?;
    if !multi_alert_filter.is_empty() && !params::is_multi_alert(target) {
        return Err(ActionError::Domain(
            "Multi Alert Filter can only be used for monitors having a multi alert.".into(),
        ));
    }

    tracing::info!(
        monitor_id,
        end = %end,
        expected = ?expected_states,
        mode = ?check_mode,
        "Prepared monitor status check"
    );

    Ok(StatusCheckState {
        monitor_id,
        start: now,
        end,
        expected_states,
        check_mode,
        multi_alert_filter,
        success: false,
    })
}

/// Nothing happens on start; all work is done by `status`.
pub fn start(_state: &StatusCheckState) -> StartResult<StatusCheckState> {
    StartResult {
        state: None,
        messages: Vec::new(),
    }
}

/// Run one poll: fetch the monitor, evaluate it and report the widget metric.
///
/// A fetch that fails `FETCH_ATTEMPTS` times is a fatal error without metrics.
pub async fn status<S: MonitorSource>(
    api: &S,
    mut state: StatusCheckState,
    site_url: &str,
    now: DateTime<Utc>,
) -> Result<StatusResult<StatusCheckState>, ActionError> {
    let monitor_id = state.monitor_id;
    let with_group_states = state.uses_filter();

    let monitor = retry_fixed(FETCH_ATTEMPTS, "get_monitor", |_| {
        api.get_monitor(monitor_id, with_group_states)
    })
    .await
    .map_err(|source| {
        metrics::record_status_poll(PollOutcome::Errored);
        ActionError::Fetch {
            monitor_id,
            attempts: FETCH_ATTEMPTS,
            source,
        }
    })?;

    let completed = now >= state.end;
    let observed = observed_states(&monitor, &state.multi_alert_filter);
    let error = state.evaluate(&monitor, &observed, completed);
    let metric = to_metric(&monitor, &state, &observed, site_url, now);

    metrics::record_status_poll(if error.is_some() {
        PollOutcome::Failed
    } else {
        PollOutcome::Passed
    });

    Ok(StatusResult {
        completed,
        state,
        error,
        metrics: vec![metric],
    })
}

fn state_options() -> Vec<ParameterOption> {
    [
        ("Ok", states::OK),
        ("Alert", states::ALERT),
        ("Warn", states::WARN),
        ("No Data", states::NO_DATA),
        ("Unknown", states::UNKNOWN),
        ("Skipped", states::SKIPPED),
        ("Ignored", states::IGNORED),
    ]
    .into_iter()
    .map(|(label, value)| ParameterOption { label, value })
    .collect()
}

pub fn describe() -> ActionDescription {
    let duration = ActionParameter {
        default_value: Some("30s"),
        required: true,
        ..ActionParameter::new("duration", "Duration", ParameterType::Duration, 1)
    };
    let expected_status = ActionParameter {
        options: state_options(),
        deprecated: true,
        deprecation_message: Some("Use 'Expected Status List' instead."),
        ..ActionParameter::new("expectedStatus", "Expected Status", ParameterType::String, 2)
    };
    let expected_status_list = ActionParameter {
        options: state_options(),
        ..ActionParameter::new("expectedStatusList", "Expected Status List", ParameterType::StringArray, 3)
    };
    let check_mode = ActionParameter {
        description: "How often should the status be expected?",
        default_value: Some(CheckMode::ALL_THE_TIME),
        options: vec![
            ParameterOption {
                label: "All the time",
                value: CheckMode::ALL_THE_TIME,
            },
            ParameterOption {
                label: "At least once",
                value: CheckMode::AT_LEAST_ONCE,
            },
        ],
        required: true,
        ..ActionParameter::new("statusCheckMode", "Status Check Mode", ParameterType::String, 4)
    };
    let multi_alert_filter = ActionParameter {
        description: "Filter to only consider alerts for specific groups of a multi alert.",
        advanced: true,
        ..ActionParameter::new("multiAlertFilter", "Multi Alert Filter", ParameterType::KeyValue, 5)
    };

    ActionDescription {
        id: format!("{}.status_check", MONITOR_TARGET_TYPE),
        label: "Monitor Status",
        description: "collects information about the monitor status and optionally verifies that the monitor has an expected status.",
        version: env!("CARGO_PKG_VERSION"),
        technology: TECHNOLOGY,
        kind: ActionKind::Check,
        time_control: TimeControl::Internal,
        target_selection: monitor_target_selection("monitor name"),
        parameters: vec![duration, expected_status, expected_status_list, check_mode, multi_alert_filter],
        widgets: vec![StateOverTimeWidget {
            widget_type: "com.steadybit.widget.state_over_time",
            title: "Datadog Monitor Status",
            identity: WidgetField { from: "datadog.monitor.id" },
            label: WidgetField { from: "datadog.monitor.name" },
            state: WidgetField { from: "state" },
            tooltip: WidgetField { from: "tooltip" },
            url: WidgetField { from: "url" },
            value: WidgetValue { hide: true },
        }],
        prepare: EndpointReference::post(format!("{}/prepare", PATH)),
        start: EndpointReference::post(format!("{}/start", PATH)),
        status: Some(EndpointReference {
            call_interval: Some("5s"),
            ..EndpointReference::post(format!("{}/status", PATH))
        }),
        stop: None,
    }
}
