//! In-memory registry of running experiment steps.
//!
//! Target events only carry the id of their step, so step details are kept
//! here from `experiment-step-started` until the experiment completes.

use std::sync::Arc;

use dashmap::DashMap;
use serde::{Deserialize, Deserializer, Serialize};

/// The step execution as delivered by the orchestrator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StepExecution {
    pub id: String,

    #[serde(deserialize_with = "integer_id")]
    pub execution_id: i64,

    #[serde(default)]
    pub experiment_key: Option<String>,

    #[serde(default)]
    pub action_id: Option<String>,

    #[serde(default)]
    pub action_name: Option<String>,

    #[serde(default)]
    pub action_kind: Option<String>,

    #[serde(default)]
    pub custom_label: Option<String>,
}

impl StepExecution {
    /// Label shown for the step: custom label, then action name, then id.
    pub fn display_name(&self) -> &str {
        self.custom_label
            .as_deref()
            .or(self.action_name.as_deref())
            .or(self.action_id.as_deref())
            .unwrap_or(&self.id)
    }
}

/// Execution ids arrive as JSON numbers, sometimes written as `42.0`.
/// Anything that is not a whole number within `i64` is rejected.
pub(crate) fn integer_id<'de, D: Deserializer<'de>>(deserializer: D) -> Result<i64, D::Error> {
    let value = f64::deserialize(deserializer)?;
    if !value.is_finite() || value.fract() != 0.0 || value < i64::MIN as f64 || value >= i64::MAX as f64 {
        return Err(serde::de::Error::custom(format!("execution id {value} is not an integer")));
    }
    Ok(value as i64)
}

/// Concurrent map of step execution id → step.
#[derive(Clone, Default)]
pub struct StepRegistry {
    inner: Arc<DashMap<String, StepExecution>>,
}

impl StepRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, step: StepExecution) {
        self.inner.insert(step.id.clone(), step);
    }

    pub fn get(&self, step_id: &str) -> Option<StepExecution> {
        self.inner.get(step_id).map(|r| r.value().clone())
    }

    /// Drop every step belonging to `execution_id`. Returns how many were removed.
    pub fn remove_execution(&self, execution_id: i64) -> usize {
        let before = self.inner.len();
        self.inner.retain(|_, step| step.execution_id != execution_id);
        before.saturating_sub(self.inner.len())
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}
