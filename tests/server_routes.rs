//! HTTP routes driven through the axum router without binding a port

mod common;

use axum::{
    body::{to_bytes, Body},
    http::{Method, Request, StatusCode},
    response::Response,
};
use common::{components, mapping, test_config, MemoryCluster, MemoryStore};
use serde_json::{json, Value};
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use tower::ServiceExt;
use vault_secret_sync::config::ServiceConfig;
use vault_secret_sync::observability::metrics;
use vault_secret_sync::server::{router, AppState};

struct TestApp {
    state: Arc<AppState>,
    store: Arc<MemoryStore>,
    cluster: Arc<MemoryCluster>,
}

fn app_with(config: ServiceConfig, store: MemoryStore, cluster: MemoryCluster) -> TestApp {
    let store = Arc::new(store);
    let cluster = Arc::new(cluster);
    let parts = components(&config, &store, &cluster);
    let state = Arc::new(AppState {
        config,
        engine: parts.engine,
        health: parts.health,
        is_ready: Arc::new(AtomicBool::new(true)),
    });
    TestApp {
        state,
        store,
        cluster,
    }
}

fn default_app() -> TestApp {
    let mut config = test_config(&[("OPENSHIFT_NAMESPACE", "apps")]);
    config.secret_mappings = vec![mapping("db/creds", "password", "db-secret", "password")];
    app_with(
        config,
        MemoryStore::default()
            .with_secret("db/creds", &[("password", "p@ss")])
            .with_secret("api/keys", &[("token", "t0k")]),
        MemoryCluster::default(),
    )
}

async fn send(app: &TestApp, method: Method, path: &str, body: Option<Value>) -> Response {
    let builder = Request::builder().method(method).uri(path);
    let request = match body {
        Some(json) => builder
            .header("content-type", "application/json")
            .body(Body::from(serde_json::to_vec(&json).expect("serialize body")))
            .expect("build request"),
        None => builder.body(Body::empty()).expect("build request"),
    };
    router(Arc::clone(&app.state))
        .oneshot(request)
        .await
        .expect("request")
}

async fn read_json(response: Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("read response body");
    serde_json::from_slice(&bytes).expect("parse json response")
}

#[tokio::test]
async fn test_refresh_with_configured_defaults() {
    let app = default_app();

    let response = send(&app, Method::POST, "/api/refreshsecret", None).await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = read_json(response).await;
    assert_eq!(body["status"], "success");
    assert_eq!(body["message"], "Successfully updated 1 secrets");
    assert_eq!(body["updated_secrets"], json!(["db-secret/password"]));
    assert_eq!(body["results"][0]["outcome"], "synced");
    assert!(body["timestamp"].is_string());
    assert!(app.cluster.get("apps", "db-secret").await.is_some());
}

#[tokio::test]
async fn test_refresh_overrides_replace_defaults() {
    let app = default_app();

    let response = send(
        &app,
        Method::POST,
        "/api/refreshsecret",
        Some(json!({
            "namespace": "payments",
            "secrets": [
                {"vault_path": "api/keys", "vault_key": "token", "openshift_secret": "api-secret", "openshift_key": "token"},
                {"vault_path": "api/keys", "vault_key": "missing", "openshift_secret": "api-secret", "openshift_key": "other"}
            ]
        })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = read_json(response).await;
    assert_eq!(body["updated_secrets"], json!(["api-secret/token"]));
    assert_eq!(body["results"][1]["outcome"], "skipped");
    assert!(app.cluster.get("payments", "api-secret").await.is_some());
    assert!(app.cluster.get("apps", "db-secret").await.is_none());
}

#[tokio::test]
async fn test_refresh_empty_override_is_bad_request() {
    let app = default_app();

    let response = send(
        &app,
        Method::POST,
        "/api/refreshsecret",
        Some(json!({"secrets": []})),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = read_json(response).await;
    assert_eq!(
        body["detail"],
        "No secret mappings configured. Provide mappings in request or configmap."
    );
}

#[tokio::test]
async fn test_refresh_without_any_mappings_is_bad_request() {
    let app = app_with(
        test_config(&[]),
        MemoryStore::default(),
        MemoryCluster::default(),
    );
    let response = send(&app, Method::POST, "/api/refreshsecret", Some(json!({}))).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    // Rejected before any backend call
    assert_eq!(app.store.login_count(), 0);
}

#[tokio::test]
async fn test_refresh_invalid_namespace_is_bad_request() {
    let app = default_app();
    let response = send(
        &app,
        Method::POST,
        "/api/refreshsecret",
        Some(json!({"namespace": "Not_Valid"})),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_refresh_authentication_failure_is_server_error() {
    let mut config = test_config(&[]);
    config.secret_mappings = vec![mapping("db/creds", "password", "db-secret", "password")];
    let app = app_with(
        config,
        MemoryStore::default().rejecting_login(),
        MemoryCluster::default(),
    );

    let response = send(&app, Method::POST, "/api/refreshsecret", None).await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = read_json(response).await;
    assert!(body["detail"]
        .as_str()
        .unwrap()
        .starts_with("Vault authentication failed"));
    assert!(app.cluster.secrets.lock().await.is_empty());
}

#[tokio::test]
async fn test_health_reports_degraded_cluster() {
    let app = app_with(
        test_config(&[]),
        MemoryStore::default(),
        MemoryCluster::default().unreachable(),
    );

    let response = send(&app, Method::GET, "/health", None).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json(response).await;
    assert_eq!(body["status"], "degraded");
    assert_eq!(body["vault_connectivity"], true);
    assert_eq!(body["openshift_connectivity"], false);
}

#[tokio::test]
async fn test_health_reports_healthy() {
    let app = default_app();
    let body = read_json(send(&app, Method::GET, "/health", None).await).await;
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
async fn test_config_hides_credentials() {
    let app = default_app();
    let response = send(&app, Method::GET, "/api/config", None).await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = read_json(response).await;
    assert_eq!(body["vault_address"], "http://vault.test:8200");
    assert_eq!(body["openshift_namespace"], "apps");
    assert_eq!(body["secret_mappings_count"], 1);
    let text = body.to_string();
    assert!(!text.contains("secret-id"));
    assert!(!text.contains("role-id"));
}

#[tokio::test]
async fn test_root_and_probes() {
    let app = default_app();

    let body = read_json(send(&app, Method::GET, "/", None).await).await;
    assert_eq!(body["service"], "Vault-OpenShift Secret Sync");
    assert_eq!(body["endpoints"]["refresh"], "/api/refreshsecret");

    let response = send(&app, Method::GET, "/healthz", None).await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = send(&app, Method::GET, "/readyz", None).await;
    assert_eq!(response.status(), StatusCode::OK);

    app.state
        .is_ready
        .store(false, std::sync::atomic::Ordering::Relaxed);
    let response = send(&app, Method::GET, "/readyz", None).await;
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn test_metrics_endpoint_exposes_run_counters() {
    metrics::register_metrics().unwrap();
    let app = default_app();
    send(&app, Method::POST, "/api/refreshsecret", None).await;

    let response = send(&app, Method::GET, "/metrics", None).await;
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let text = String::from_utf8(bytes.to_vec()).unwrap();
    assert!(text.contains("vault_secret_sync_runs_total"));
    assert!(text.contains("vault_secret_sync_mappings_total"));
}
