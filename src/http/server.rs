//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the Axum router with every action and event endpoint
//! - Wire up middleware (tracing, timeout, request ID)
//! - Bind the listener and serve until shutdown

use std::sync::Arc;
use std::time::Duration;

use axum::{
    http::HeaderName,
    routing::{get, post},
    Router,
};
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::{
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::actions::{downtime, status_check};
use crate::config::ExtensionConfig;
use crate::datadog::DatadogClient;
use crate::events::{handlers as events, StepRegistry};
use crate::http::{handlers, index};
use crate::lifecycle::Shutdown;

pub const X_REQUEST_ID: &str = "x-request-id";

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ExtensionConfig>,
    pub datadog: Arc<DatadogClient>,
    pub steps: StepRegistry,
}

impl AppState {
    pub fn new(config: ExtensionConfig, datadog: DatadogClient) -> Self {
        Self {
            config: Arc::new(config),
            datadog: Arc::new(datadog),
            steps: StepRegistry::new(),
        }
    }
}

/// HTTP server for the extension.
pub struct HttpServer {
    router: Router,
    config: Arc<ExtensionConfig>,
}

impl HttpServer {
    pub fn new(state: AppState) -> Self {
        let config = state.config.clone();
        let router = build_router(state);
        Self { router, config }
    }

    /// Run the server until `shutdown` fires, then drain in-flight requests.
    pub async fn run(self, listener: TcpListener, shutdown: Shutdown) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            datadog_api = %self.config.datadog.api_base_url(),
            "HTTP server starting"
        );

        axum::serve(listener, self.router)
            .with_graceful_shutdown(shutdown.wait())
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

/// Build the Axum router with all middleware layers.
#[allow(deprecated)]
pub fn build_router(state: AppState) -> Router {
    let request_timeout = Duration::from_secs(state.config.timeouts.request_secs);
    let request_id = HeaderName::from_static(X_REQUEST_ID);

    let check = status_check::PATH;
    let mute = downtime::PATH;

    Router::new()
        .route("/", get(index::extension_index))
        .route("/health", get(handlers::health))
        .route(check, get(handlers::describe_status_check))
        .route(&format!("{}/prepare", check), post(handlers::prepare_status_check))
        .route(&format!("{}/start", check), post(handlers::start_status_check))
        .route(&format!("{}/status", check), post(handlers::status_status_check))
        .route(mute, get(handlers::describe_downtime))
        .route(&format!("{}/prepare", mute), post(handlers::prepare_downtime))
        .route(&format!("{}/start", mute), post(handlers::start_downtime))
        .route(&format!("{}/stop", mute), post(handlers::stop_downtime))
        .route(index::EVENT_STEP_STARTED, post(events::step_started))
        .route(index::EVENT_TARGET_STARTED, post(events::target_started))
        .route(index::EVENT_TARGET_COMPLETED, post(events::target_completed))
        .route(index::EVENT_EXPERIMENT_COMPLETED, post(events::experiment_completed))
        .with_state(state)
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::new(request_id.clone(), MakeRequestUuid))
                .layer(TraceLayer::new_for_http())
                .layer(PropagateRequestIdLayer::new(request_id))
                .layer(TimeoutLayer::new(request_timeout)),
        )
}
