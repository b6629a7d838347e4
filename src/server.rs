//! # HTTP Server
//!
//! Trigger surface for the sync engine plus metrics and Kubernetes probes.
//!
//! Provides endpoints:
//! - `POST /api/refreshsecret` - Run a sync with optional namespace/mapping overrides
//! - `GET /health` - Vault and cluster reachability
//! - `GET /api/config` - Configuration with credentials removed
//! - `GET /` - Service info and endpoint index
//! - `/metrics` - Prometheus metrics in text format
//! - `/healthz` - Liveness probe (always returns 200)
//! - `/readyz` - Readiness probe (returns 200 once startup finished)
//!
//! The server listens on port 8000 by default (`PORT`).

use crate::build_info::build_info;
use crate::config::ServiceConfig;
use crate::constants::SERVICE_NAME;
use crate::error::SyncError;
use crate::health::HealthProbe;
use crate::mapping::SecretMapping;
use crate::observability::metrics;
use crate::sync::{resolve_run, ResultEntry, SyncEngine};
use axum::{
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use prometheus::{Encoder, TextEncoder};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{error, info};

pub struct AppState {
    pub config: ServiceConfig,
    pub engine: Arc<SyncEngine>,
    pub health: Arc<HealthProbe>,
    pub is_ready: Arc<AtomicBool>,
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("config", &self.config)
            .field("is_ready", &self.is_ready.load(Ordering::Relaxed))
            .finish_non_exhaustive()
    }
}

/// Refresh request body; both fields fall back to the configured defaults
#[derive(Debug, Default, Deserialize)]
pub struct RefreshRequest {
    pub namespace: Option<String>,
    pub secrets: Option<Vec<SecretMapping>>,
}

#[derive(Debug, Serialize)]
pub struct RefreshResponse {
    pub status: &'static str,
    pub message: String,
    pub updated_secrets: Vec<String>,
    pub results: Vec<ResultEntry>,
    pub timestamp: String,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub timestamp: String,
    pub vault_connectivity: bool,
    pub openshift_connectivity: bool,
}

/// Error returned by the API as `{"detail": "..."}`
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    detail: String,
}

impl From<SyncError> for ApiError {
    fn from(err: SyncError) -> Self {
        let status = if err.is_client_error() {
            StatusCode::BAD_REQUEST
        } else {
            StatusCode::INTERNAL_SERVER_ERROR
        };
        Self {
            status,
            detail: err.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(json!({ "detail": self.detail }))).into_response()
    }
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(root_handler))
        .route("/api/refreshsecret", post(refresh_handler))
        .route("/api/config", get(config_handler))
        .route("/health", get(health_handler))
        .route("/metrics", get(metrics_handler))
        .route("/healthz", get(healthz_handler))
        .route("/readyz", get(readyz_handler))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Bind `0.0.0.0:{port}` and serve until the process exits
///
/// # Errors
/// Returns an error if the port cannot be bound or the server fails
pub async fn start_server(port: u16, state: Arc<AppState>) -> Result<(), anyhow::Error> {
    let is_ready = Arc::clone(&state.is_ready);
    let app = router(state);

    let addr = format!("0.0.0.0:{port}");
    let listener = TcpListener::bind(&addr).await?;

    info!("HTTP server listening on {}", addr);
    is_ready.store(true, Ordering::Relaxed);

    axum::serve(listener, app).await?;

    Ok(())
}

fn now() -> String {
    chrono::Utc::now().to_rfc3339()
}

async fn refresh_handler(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<Json<RefreshResponse>, ApiError> {
    let request: RefreshRequest = if body.iter().all(u8::is_ascii_whitespace) {
        RefreshRequest::default()
    } else {
        serde_json::from_slice(&body)
            .map_err(|e| ApiError::from(SyncError::InvalidRequest(e.to_string())))?
    };

    let plan = resolve_run(
        &state.config.default_namespace,
        &state.config.secret_mappings,
        request.namespace,
        request.secrets,
    )?;

    let report = state
        .engine
        .run(&plan.namespace, &plan.mappings)
        .await
        .inspect_err(|e| error!("Error refreshing secrets: {}", e))?;

    let updated = report.updated();
    Ok(Json(RefreshResponse {
        status: "success",
        message: format!("Successfully updated {} secrets", updated.len()),
        updated_secrets: updated,
        results: report.entries(),
        timestamp: now(),
    }))
}

async fn health_handler(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let report = state.health.check().await;
    Json(HealthResponse {
        status: report.status().as_str(),
        timestamp: now(),
        vault_connectivity: report.store_reachable,
        openshift_connectivity: report.target_reachable,
    })
}

async fn config_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(state.config.public_view())
}

async fn root_handler() -> impl IntoResponse {
    Json(json!({
        "service": SERVICE_NAME,
        "version": env!("CARGO_PKG_VERSION"),
        "build": build_info(),
        "endpoints": {
            "refresh": "/api/refreshsecret",
            "health": "/health",
            "config": "/api/config",
            "metrics": "/metrics",
        },
    }))
}

async fn metrics_handler() -> impl IntoResponse {
    let encoder = TextEncoder::new();
    let metric_families = metrics::gather();

    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        error!("Failed to encode metrics: {}", e);
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            [("content-type", "text/plain")],
            format!("Failed to encode metrics: {e}").into_bytes(),
        );
    }

    (
        StatusCode::OK,
        [("content-type", "text/plain; version=0.0.4; charset=utf-8")],
        buffer,
    )
}

async fn healthz_handler() -> impl IntoResponse {
    StatusCode::OK
}

async fn readyz_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    if state.is_ready.load(Ordering::Relaxed) {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    }
}
