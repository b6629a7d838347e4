//! # Initialization
//!
//! Wires configuration into live backends. Shared by the service binary and `vssctl`.

use crate::config::ServiceConfig;
use crate::health::HealthProbe;
use crate::store::{SecretStoreBackend, TokenProvider, VaultClient};
use crate::sync::SyncEngine;
use crate::target::{KubeSecretApi, TargetClusterApi, TargetSecretWriter};
use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::info;

/// Engine and probe built over one set of backend clients
pub struct Components {
    pub engine: Arc<SyncEngine>,
    pub health: Arc<HealthProbe>,
}

impl std::fmt::Debug for Components {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Components").finish_non_exhaustive()
    }
}

/// Install ring as the rustls crypto provider
///
/// Must run before any TLS client (reqwest, kube) is created.
pub fn install_crypto_provider() {
    // Err means a provider is already installed
    let _ = rustls::crypto::ring::default_provider().install_default();
}

/// Assemble the engine and probe from explicit backends
pub fn assemble(
    config: &ServiceConfig,
    store: Arc<dyn SecretStoreBackend>,
    target: Arc<dyn TargetClusterApi>,
) -> Components {
    let tokens = Arc::new(TokenProvider::new(
        Arc::clone(&store),
        config.vault_role_id.clone(),
        config.vault_secret_id.clone(),
    ));
    let writer = TargetSecretWriter::new(Arc::clone(&target));
    let engine = SyncEngine::new(tokens, Arc::clone(&store), writer)
        .with_invalidate_on_forbidden(config.invalidate_token_on_forbidden);
    let health = HealthProbe::new(store, target, config.health_timeout());

    Components {
        engine: Arc::new(engine),
        health: Arc::new(health),
    }
}

/// Connect to Vault and the cluster using `config`
///
/// # Errors
/// Returns an error if either client cannot be created
pub async fn connect(config: &ServiceConfig) -> Result<Components> {
    let vault = VaultClient::new(
        &config.vault_address,
        &config.vault_mount_path,
        config.http_timeout(),
    )?;
    let kube = KubeSecretApi::try_default(config.http_timeout())
        .await
        .context("Failed to connect to the cluster API")?;

    info!(
        "Connected backends: vault={} namespace={}",
        config.vault_address, config.default_namespace
    );
    Ok(assemble(config, Arc::new(vault), Arc::new(kube)))
}
