//! # Vault Secret Sync
//!
//! HTTP service that syncs secrets from HashiCorp Vault into OpenShift/Kubernetes
//! Secrets on demand.
//!
//! ## Overview
//!
//! 1. **Configuration** - Vault address and AppRole credentials from the environment,
//!    default mappings from a mounted YAML file
//! 2. **Refresh** - `POST /api/refreshsecret` runs the mapping set against a namespace
//! 3. **Health** - `GET /health` reports Vault and cluster API reachability
//!
//! Scheduling is external: a CronJob or CI step calls the refresh endpoint.

use anyhow::{Context, Result};
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use tracing::{error, info};
use vault_secret_sync::build_info::{BUILD_DATETIME, BUILD_GIT_HASH, BUILD_TIMESTAMP};
use vault_secret_sync::config::ServiceConfig;
use vault_secret_sync::observability::{init_logging, metrics};
use vault_secret_sync::runtime;
use vault_secret_sync::server::{start_server, AppState};

#[tokio::main]
async fn main() -> Result<()> {
    // Configure rustls crypto provider before any TLS client exists
    runtime::install_crypto_provider();

    // Optional .env for local runs; real deployments use envFrom
    let _ = dotenvy::dotenv();

    let config = match ServiceConfig::load() {
        Ok(config) => config,
        Err(e) => {
            // Logging is not configured yet
            eprintln!("Configuration error: {e}");
            std::process::exit(1);
        }
    };

    init_logging(&config.log_level, config.log_format);

    info!("Starting Vault Secret Sync");
    info!(
        "Build info: timestamp={}, datetime={}, git_hash={}",
        BUILD_TIMESTAMP, BUILD_DATETIME, BUILD_GIT_HASH
    );
    info!(
        "Vault: {} (mount: {}), default namespace: {}, {} configured mappings",
        config.vault_address,
        config.vault_mount_path,
        config.default_namespace,
        config.secret_mappings.len()
    );

    metrics::register_metrics().context("Failed to register metrics")?;

    let components = runtime::connect(&config).await?;
    let port = config.port;

    let state = Arc::new(AppState {
        config,
        engine: components.engine,
        health: components.health,
        is_ready: Arc::new(AtomicBool::new(false)),
    });

    if let Err(e) = start_server(port, state).await {
        error!("HTTP server error: {}", e);
        return Err(e);
    }

    Ok(())
}
