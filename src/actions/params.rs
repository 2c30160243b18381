//! Extraction of target attributes and parameter values from a prepare request.

use std::collections::BTreeMap;

use chrono::{DateTime, Duration, Utc};
use serde_json::{Map, Value};

use crate::actions::error::ActionError;
use crate::actions::types::Target;

/// Target attribute carrying the monitor id.
pub const MONITOR_ID_ATTRIBUTE: &str = "datadog.monitor.id";

/// Target attribute flagging multi alert monitors (`"true"` / `"false"`).
pub const MULTI_ALERT_ATTRIBUTE: &str = "datadog.monitor.multi-alert";

fn first_attribute<'a>(target: Option<&'a Target>, name: &str) -> Option<&'a str> {
    target
        .and_then(|t| t.attributes.get(name))
        .and_then(|values| values.first())
        .map(String::as_str)
}

/// Parse the monitor id from the target attributes.
pub fn monitor_id(target: Option<&Target>) -> Result<i64, ActionError> {
    let raw = first_attribute(target, MONITOR_ID_ATTRIBUTE).ok_or_else(|| {
        ActionError::Validation(format!(
            "Target is missing the '{}' attribute.",
            MONITOR_ID_ATTRIBUTE
        ))
    })?;

    raw.trim().parse::<i64>().map_err(|_| {
        ActionError::Validation(format!("Failed to parse monitor ID '{}' as int64.", raw))
    })
}

/// A missing or unrecognised attribute value counts as not multi alert.
pub fn is_multi_alert(target: Option<&Target>) -> bool {
    first_attribute(target, MULTI_ALERT_ATTRIBUTE)
        .map(|v| v.trim().eq_ignore_ascii_case("true"))
        .unwrap_or(false)
}

/// Required `duration` parameter, in milliseconds.
pub fn duration(config: &Map<String, Value>) -> Result<Duration, ActionError> {
    let millis = match config.get("duration") {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
        _ => None,
    };

    match millis {
        Some(ms) if ms.is_finite() && ms >= 0.0 => Ok(Duration::milliseconds(ms as i64)),
        Some(ms) => Err(ActionError::Validation(format!(
            "Parameter 'duration' must be a non-negative number of milliseconds, got {}.",
            ms
        ))),
        None => Err(ActionError::Validation(
            "Parameter 'duration' is required and must be a number of milliseconds.".into(),
        )),
    }
}

/// `now` plus the `duration` parameter.
pub fn deadline(config: &Map<String, Value>, now: DateTime<Utc>) -> Result<DateTime<Utc>, ActionError> {
    now.checked_add_signed(duration(config)?)
        .ok_or_else(|| ActionError::Validation("Parameter 'duration' is too large.".into()))
}

fn value_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Optional scalar parameter rendered as a string. `null` counts as absent.
pub fn optional_string(config: &Map<String, Value>, key: &str) -> Option<String> {
    match config.get(key) {
        None | Some(Value::Null) => None,
        Some(value) => Some(value_to_string(value)),
    }
}

/// String list parameter. A bare string is treated as a one element list.
pub fn string_list(config: &Map<String, Value>, key: &str) -> Vec<String> {
    match config.get(key) {
        Some(Value::Array(items)) => items
            .iter()
            .filter(|v| !v.is_null())
            .map(value_to_string)
            .collect(),
        Some(Value::String(s)) if !s.is_empty() => vec![s.clone()],
        _ => Vec::new(),
    }
}

/// Boolean parameter, accepting JSON booleans and `"true"`/`"false"` strings.
pub fn boolean(config: &Map<String, Value>, key: &str, default: bool) -> Result<bool, ActionError> {
    match config.get(key) {
        None | Some(Value::Null) => Ok(default),
        Some(Value::Bool(b)) => Ok(*b),
        Some(Value::String(s)) => s.trim().parse::<bool>().map_err(|_| {
            ActionError::Validation(format!("Parameter '{}' must be a boolean, got '{}'.", key, s))
        }),
        Some(other) => Err(ActionError::Validation(format!(
            "Parameter '{}' must be a boolean, got {}.",
            key, other
        ))),
    }
}

/// Key/value parameter.
///
/// Accepts the list form `[{"key": k, "value": v}, ...]` as well as a plain
/// object. Entries with an empty key are skipped.
pub fn key_value(config: &Map<String, Value>, key: &str) -> Result<BTreeMap<String, String>, ActionError> {
    let invalid = || ActionError::Validation(format!("Parameter '{}' must be a list of key/value pairs.", key));

    let mut pairs = BTreeMap::new();
    match config.get(key) {
        None | Some(Value::Null) => {}
        Some(Value::Array(items)) => {
            for item in items {
                let entry = item.as_object().ok_or_else(invalid)?;
                let k = entry.get("key").map(value_to_string).unwrap_or_default();
                let v = entry.get("value").map(value_to_string).unwrap_or_default();
                if !k.is_empty() {
                    pairs.insert(k, v);
                }
            }
        }
        Some(Value::Object(entries)) => {
            for (k, v) in entries {
                if !k.is_empty() {
                    pairs.insert(k.clone(), value_to_string(v));
                }
            }
        }
        Some(_) => return Err(invalid()),
    }
    Ok(pairs)
}
