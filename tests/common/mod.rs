//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    response::{IntoResponse, Response},
    Router,
};
use http_body_util::BodyExt;
use serde_json::Value;
use tokio::net::TcpListener;
use tower::ServiceExt;

use datadog_extension::config::ExtensionConfig;
use datadog_extension::datadog::DatadogClient;
use datadog_extension::http::{build_router, AppState};

/// A request received by the mock Datadog backend.
#[derive(Debug, Clone)]
pub struct Recorded {
    pub method: String,
    pub path: String,
    pub query: Option<String>,
    pub api_key: Option<String>,
    pub application_key: Option<String>,
    pub body: String,
}

impl Recorded {
    pub fn json(&self) -> Value {
        serde_json::from_str(&self.body).unwrap_or(Value::Null)
    }
}

/// Handle to a running mock backend.
#[derive(Clone)]
pub struct MockDatadog {
    pub url: String,
    requests: Arc<Mutex<Vec<Recorded>>>,
}

impl MockDatadog {
    pub fn requests(&self) -> Vec<Recorded> {
        self.requests.lock().unwrap().clone()
    }
}

fn header_value(request: &Request<Body>, name: &str) -> Option<String> {
    request
        .headers()
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(String::from)
}

/// Start a programmable mock Datadog API on an ephemeral port.
///
/// `respond` receives every request (already recorded) and returns the
/// status code and JSON body to answer with.
pub async fn start_mock_datadog<F>(respond: F) -> MockDatadog
where
    F: Fn(&Recorded) -> (u16, String) + Send + Sync + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let requests = Arc::new(Mutex::new(Vec::new()));
    let respond = Arc::new(respond);

    let recorded = requests.clone();
    let app = Router::new().fallback(move |request: Request<Body>| {
        let recorded = recorded.clone();
        let respond = respond.clone();
        async move {
            let method = request.method().to_string();
            let path = request.uri().path().to_string();
            let query = request.uri().query().map(String::from);
            let api_key = header_value(&request, "dd-api-key");
            let application_key = header_value(&request, "dd-application-key");
            let bytes = request.into_body().collect().await.unwrap().to_bytes();

            let entry = Recorded {
                method,
                path,
                query,
                api_key,
                application_key,
                body: String::from_utf8_lossy(&bytes).into_owned(),
            };
            let (status, body) = respond(&entry);
            recorded.lock().unwrap().push(entry);

            let response: Response = (
                StatusCode::from_u16(status).unwrap(),
                [(header::CONTENT_TYPE, "application/json")],
                body,
            )
                .into_response();
            response
        }
    });

    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });

    MockDatadog {
        url: format!("http://{}", addr),
        requests,
    }
}

/// Configuration pointing the extension at `api_base_url`.
pub fn test_config(api_base_url: &str) -> ExtensionConfig {
    let mut config = ExtensionConfig::default();
    config.datadog.api_base_url = Some(api_base_url.to_string());
    config.datadog.site_url = "https://app.datadoghq.eu".to_string();
    config.datadog.api_key = "test-api-key".to_string();
    config.datadog.application_key = "test-app-key".to_string();
    config.datadog.request_timeout_secs = 5;
    config
}

/// Router of the extension wired to the given backend.
pub fn extension(api_base_url: &str) -> Router {
    let config = test_config(api_base_url);
    let client = DatadogClient::new(&config.datadog).unwrap();
    build_router(AppState::new(config, client))
}

/// Send one request through the router and decode the JSON answer.
pub async fn call(router: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(json) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, json)
}
