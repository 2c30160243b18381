//! End-to-end tests of the action endpoints against a mock Datadog API.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use axum::http::StatusCode;
use serde_json::{json, Value};

mod common;

fn monitor_body(overall_state: &str) -> String {
    json!({
        "id": 42,
        "name": "gateway pods ready",
        "tags": ["env:test"],
        "multi": false,
        "overall_state": overall_state
    })
    .to_string()
}

fn status_check_prepare(duration_ms: u64, expected: &[&str], mode: &str) -> Value {
    json!({
        "target": {"attributes": {"datadog.monitor.id": ["42"]}},
        "config": {
            "duration": duration_ms,
            "expectedStatusList": expected,
            "statusCheckMode": mode
        }
    })
}

#[tokio::test]
async fn test_index_and_health() {
    let app = common::extension("http://127.0.0.1:9");

    let (status, body) = common::call(&app, "GET", "/", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["actions"].as_array().unwrap().len(), 2);

    let (status, body) = common::call(&app, "GET", "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn test_describe_endpoints() {
    let app = common::extension("http://127.0.0.1:9");

    let (status, body) = common::call(&app, "GET", "/monitor/action/status-check", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["id"], "com.steadybit.extension_datadog.monitor.status_check");
    assert_eq!(body["status"]["callInterval"], "5s");
    assert_eq!(body["widgets"][0]["url"]["from"], "url");

    let (status, body) = common::call(&app, "GET", "/monitor/action/downtime", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["id"], "com.steadybit.extension_datadog.monitor.downtime");
    assert_eq!(body["stop"]["path"], "/monitor/action/downtime/stop");
}

#[tokio::test]
async fn test_status_check_lifecycle_passes() {
    let mock = common::start_mock_datadog(|_| (200, monitor_body("OK"))).await;
    let app = common::extension(&mock.url);

    let (status, prepared) = common::call(
        &app,
        "POST",
        "/monitor/action/status-check/prepare",
        Some(status_check_prepare(0, &["OK"], "allTheTime")),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let state = prepared["state"].clone();
    assert_eq!(state["monitorId"], 42);

    let (status, _) = common::call(
        &app,
        "POST",
        "/monitor/action/status-check/start",
        Some(json!({ "state": state })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, result) = common::call(
        &app,
        "POST",
        "/monitor/action/status-check/status",
        Some(json!({ "state": state })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(result["completed"], true);
    assert!(result.get("error").is_none());

    let metric = &result["metrics"][0];
    assert_eq!(metric["name"], "datadog_monitor_status");
    assert_eq!(metric["metric"]["datadog.monitor.id"], "42");
    assert_eq!(metric["metric"]["tooltip"], "Monitor status is: OK");
    assert!(metric["metric"]["url"]
        .as_str()
        .unwrap()
        .starts_with("https://app.datadoghq.eu/monitors/42?from_ts="));

    let requests = mock.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].method, "GET");
    assert_eq!(requests[0].path, "/api/v1/monitor/42");
    assert_eq!(requests[0].query, None);
    assert_eq!(requests[0].api_key.as_deref(), Some("test-api-key"));
    assert_eq!(requests[0].application_key.as_deref(), Some("test-app-key"));
}

#[tokio::test]
async fn test_status_check_mismatch_is_reported() {
    let mock = common::start_mock_datadog(|_| (200, monitor_body("Alert"))).await;
    let app = common::extension(&mock.url);

    let (_, prepared) = common::call(
        &app,
        "POST",
        "/monitor/action/status-check/prepare",
        Some(status_check_prepare(600_000, &["OK"], "allTheTime")),
    )
    .await;

    let (status, result) = common::call(
        &app,
        "POST",
        "/monitor/action/status-check/status",
        Some(json!({ "state": prepared["state"] })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(result["completed"], false);
    assert_eq!(result["error"]["status"], "failed");
    assert_eq!(
        result["error"]["title"],
        "Monitor 'gateway pods ready' (id 42, tags: env:test) has status 'Alert' whereas '[OK]' is expected."
    );
    assert_eq!(result["metrics"][0]["metric"]["state"], "danger");
}

#[tokio::test]
async fn test_status_check_multi_alert_filter() {
    let mock = common::start_mock_datadog(|_| {
        (
            200,
            json!({
                "id": 42,
                "name": "deployments",
                "multi": true,
                "overall_state": "Alert",
                "state": {"groups": {
                    "kube_namespace:shop,kube_deployment:gateway": {"status": "OK"},
                    "kube_namespace:demo,kube_deployment:gateway": {"status": "Alert"}
                }}
            })
            .to_string(),
        )
    })
    .await;
    let app = common::extension(&mock.url);

    let (status, prepared) = common::call(
        &app,
        "POST",
        "/monitor/action/status-check/prepare",
        Some(json!({
            "target": {"attributes": {
                "datadog.monitor.id": ["42"],
                "datadog.monitor.multi-alert": ["true"]
            }},
            "config": {
                "duration": 600000,
                "expectedStatusList": ["OK"],
                "statusCheckMode": "allTheTime",
                "multiAlertFilter": [{"key": "kube_namespace", "value": "shop"}]
            }
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (_, result) = common::call(
        &app,
        "POST",
        "/monitor/action/status-check/status",
        Some(json!({ "state": prepared["state"] })),
    )
    .await;

    assert!(result.get("error").is_none());
    assert_eq!(result["metrics"][0]["metric"]["state"], "warn");
    assert!(result["metrics"][0]["metric"]["url"]
        .as_str()
        .unwrap()
        .ends_with("&q=kube_namespace%3Ashop"));
    assert_eq!(mock.requests()[0].query.as_deref(), Some("group_states=all"));
}

#[tokio::test]
async fn test_status_check_retries_then_succeeds() {
    let calls = Arc::new(AtomicU32::new(0));
    let counter = calls.clone();
    let mock = common::start_mock_datadog(move |_| {
        if counter.fetch_add(1, Ordering::SeqCst) < 2 {
            (500, r#"{"errors": ["Internal Server Error"]}"#.to_string())
        } else {
            (200, monitor_body("OK"))
        }
    })
    .await;
    let app = common::extension(&mock.url);

    let (_, prepared) = common::call(
        &app,
        "POST",
        "/monitor/action/status-check/prepare",
        Some(status_check_prepare(0, &["OK"], "atLeastOnce")),
    )
    .await;

    let (status, result) = common::call(
        &app,
        "POST",
        "/monitor/action/status-check/status",
        Some(json!({ "state": prepared["state"] })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(result["completed"], true);
    assert!(result.get("error").is_none());
    assert_eq!(result["state"]["success"], true);
    assert_eq!(calls.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn test_status_check_fetch_exhaustion_is_fatal() {
    let mock = common::start_mock_datadog(|_| (404, r#"{"errors": ["Monitor not found"]}"#.to_string())).await;
    let app = common::extension(&mock.url);

    let (_, prepared) = common::call(
        &app,
        "POST",
        "/monitor/action/status-check/prepare",
        Some(status_check_prepare(1000, &["OK"], "allTheTime")),
    )
    .await;

    let (status, body) = common::call(
        &app,
        "POST",
        "/monitor/action/status-check/status",
        Some(json!({ "state": prepared["state"] })),
    )
    .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["title"], "Failed to retrieve monitor 42 from Datadog after 3 attempts.");
    assert!(body["detail"].as_str().unwrap().contains("404"));
    assert!(body.get("metrics").is_none());
    assert_eq!(mock.requests().len(), 3);
}

#[tokio::test]
async fn test_prepare_rejects_bad_input() {
    let app = common::extension("http://127.0.0.1:9");

    let (status, body) = common::call(
        &app,
        "POST",
        "/monitor/action/status-check/prepare",
        Some(json!({"target": {"attributes": {}}, "config": {"duration": 1000}})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["title"].as_str().unwrap().contains("datadog.monitor.id"));

    let (status, body) = common::call(
        &app,
        "POST",
        "/monitor/action/status-check/prepare",
        Some(json!({
            "target": {"attributes": {"datadog.monitor.id": ["42"], "datadog.monitor.multi-alert": ["false"]}},
            "config": {"duration": 1000, "multiAlertFilter": {"env": "prod"}}
        })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body["title"],
        "Multi Alert Filter can only be used for monitors having a multi alert."
    );
}

#[tokio::test]
async fn test_malformed_state_is_rejected() {
    let app = common::extension("http://127.0.0.1:9");

    let (status, body) = common::call(
        &app,
        "POST",
        "/monitor/action/status-check/status",
        Some(json!({"state": {"monitorId": "not a number"}})),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["title"].as_str().unwrap().starts_with("Failed to decode action state"));
}

#[tokio::test]
async fn test_downtime_lifecycle() {
    let mock = common::start_mock_datadog(|request| match request.method.as_str() {
        "POST" => (200, json!({"data": {"id": "dt-1", "type": "downtime"}}).to_string()),
        _ => (204, String::new()),
    })
    .await;
    let app = common::extension(&mock.url);

    let (status, prepared) = common::call(
        &app,
        "POST",
        "/monitor/action/downtime/prepare",
        Some(json!({
            "target": {"attributes": {"datadog.monitor.id": ["42"]}},
            "config": {"duration": 60000, "notify": true},
            "executionContext": {
                "experimentUri": "https://platform/experiments/ADM-1",
                "executionUri": "https://platform/experiments/ADM-1/executions/7"
            }
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, started) = common::call(
        &app,
        "POST",
        "/monitor/action/downtime/start",
        Some(json!({ "state": prepared["state"] })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(started["state"]["downtimeId"], "dt-1");
    assert_eq!(started["messages"][0]["message"], "Downtime started. (monitor 42, downtime dt-1)");

    let (status, stopped) = common::call(
        &app,
        "POST",
        "/monitor/action/downtime/stop",
        Some(json!({ "state": started["state"] })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(stopped["messages"][0]["message"], "Downtime canceled. (monitor 42, downtime dt-1)");

    let requests = mock.requests();
    assert_eq!(requests.len(), 2);
    assert_eq!(requests[0].path, "/api/v2/downtime");
    let created = requests[0].json();
    let attributes = &created["data"]["attributes"];
    assert_eq!(attributes["monitor_identifier"]["monitor_id"], 42);
    assert_eq!(attributes["notify_end_types"], json!(["canceled", "expired"]));
    assert!(attributes["message"]
        .as_str()
        .unwrap()
        .contains("[Open Execution](https://platform/experiments/ADM-1/executions/7)"));

    assert_eq!(requests[1].method, "DELETE");
    assert_eq!(requests[1].path, "/api/v2/downtime/dt-1");
}

#[tokio::test]
async fn test_downtime_stop_without_start_is_noop() {
    let mock = common::start_mock_datadog(|_| (500, String::new())).await;
    let app = common::extension(&mock.url);

    let (status, body) = common::call(
        &app,
        "POST",
        "/monitor/action/downtime/stop",
        Some(json!({"state": {"monitorId": 42, "end": "2030-01-01T00:00:00Z", "notify": false}})),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert!(body.get("messages").is_none());
    assert!(mock.requests().is_empty());
}

#[tokio::test]
async fn test_downtime_create_failure_is_fatal() {
    let mock = common::start_mock_datadog(|_| (403, r#"{"errors": ["Forbidden"]}"#.to_string())).await;
    let app = common::extension(&mock.url);

    let (status, body) = common::call(
        &app,
        "POST",
        "/monitor/action/downtime/start",
        Some(json!({"state": {"monitorId": 42, "end": "2030-01-01T00:00:00Z", "notify": false}})),
    )
    .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["title"], "Failed to create Downtime for monitor 42.");
}
