//! Datadog integration subsystem.
//!
//! # Data Flow
//! ```text
//! status check action
//!     → MonitorSource::get_monitor (retried, see resilience)
//!     → MonitorSnapshot
//!
//! downtime action
//!     → DowntimeSource::create_downtime / cancel_downtime
//! ```
//!
//! # Design Decisions
//! - Actions depend on the traits, never on the HTTP client directly
//! - Transport errors and non-2xx statuses are the same failure to callers

use std::future::Future;

pub mod client;
pub mod types;

pub use client::DatadogClient;
pub use types::{ApiError, ApiResult, DowntimeSpec, MonitorSnapshot};

/// Read access to monitor definitions and their current state.
pub trait MonitorSource: Send + Sync {
    /// Fetch one monitor. `with_group_states` requests the per-group state map.
    fn get_monitor(
        &self,
        monitor_id: i64,
        with_group_states: bool,
    ) -> impl Future<Output = ApiResult<MonitorSnapshot>> + Send;
}

/// Creation and cancellation of monitor downtimes.
pub trait DowntimeSource: Send + Sync {
    /// Create a downtime and return its identifier.
    fn create_downtime(&self, spec: &DowntimeSpec) -> impl Future<Output = ApiResult<String>> + Send;

    /// Cancel a previously created downtime.
    fn cancel_downtime(&self, downtime_id: &str) -> impl Future<Output = ApiResult<()>> + Send;
}
