//! Common test utilities
//!
//! Rustls setup for tests that talk HTTP, plus in-memory Vault and cluster
//! backends for engine, probe and route tests.

#![allow(dead_code, reason = "each test binary uses a different subset")]

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Once};
use std::time::Duration;
use tokio::sync::Mutex;
use vault_secret_sync::config::ServiceConfig;
use vault_secret_sync::error::{AuthenticationError, StoreError, TargetWriteError};
use vault_secret_sync::mapping::SecretMapping;
use vault_secret_sync::runtime::{assemble, Components};
use vault_secret_sync::store::{Credential, SecretStoreBackend, SecretValues};
use vault_secret_sync::target::{SecretData, TargetClusterApi};

static RUSTLS_INIT: Once = Once::new();

/// Initialize rustls crypto provider for tests
///
/// Uses a `Once` so it runs a single time per test binary.
pub fn init_rustls() {
    RUSTLS_INIT.call_once(|| {
        rustls::crypto::ring::default_provider()
            .install_default()
            .expect("Failed to install rustls crypto provider");
    });
}

/// In-memory Vault
#[derive(Default)]
pub struct MemoryStore {
    pub secrets: HashMap<String, SecretValues>,
    pub forbidden: HashSet<String>,
    pub reject_login: bool,
    pub unreachable: bool,
    pub logins: AtomicUsize,
    pub reads: Mutex<Vec<String>>,
}

impl MemoryStore {
    pub fn with_secret(mut self, path: &str, values: &[(&str, &str)]) -> Self {
        self.secrets.insert(
            path.to_string(),
            values
                .iter()
                .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
                .collect(),
        );
        self
    }

    pub fn with_forbidden(mut self, path: &str) -> Self {
        self.forbidden.insert(path.to_string());
        self
    }

    pub fn rejecting_login(mut self) -> Self {
        self.reject_login = true;
        self
    }

    pub fn unreachable(mut self) -> Self {
        self.unreachable = true;
        self
    }

    pub fn login_count(&self) -> usize {
        self.logins.load(Ordering::SeqCst)
    }

    pub async fn read_count(&self) -> usize {
        self.reads.lock().await.len()
    }
}

#[async_trait]
impl SecretStoreBackend for MemoryStore {
    async fn authenticate(
        &self,
        _role_id: &str,
        _role_secret: &str,
    ) -> Result<Credential, AuthenticationError> {
        let n = self.logins.fetch_add(1, Ordering::SeqCst) + 1;
        if self.reject_login {
            return Err(AuthenticationError::Rejected {
                status: 400,
                body: "invalid role or secret ID".to_string(),
            });
        }
        Ok(Credential::new(format!("hvs.token-{n}")))
    }

    async fn read_secret(
        &self,
        _credential: &Credential,
        path: &str,
    ) -> Result<SecretValues, StoreError> {
        self.reads.lock().await.push(path.to_string());
        if self.forbidden.contains(path) {
            return Err(StoreError::Authorization {
                path: path.to_string(),
            });
        }
        self.secrets
            .get(path)
            .cloned()
            .ok_or_else(|| StoreError::NotFound {
                path: path.to_string(),
            })
    }

    async fn probe(&self, _timeout: Duration) -> anyhow::Result<()> {
        if self.unreachable {
            anyhow::bail!("connection refused");
        }
        Ok(())
    }
}

/// In-memory cluster keyed by `(namespace, name)`; values are in base64 wire form
#[derive(Default)]
pub struct MemoryCluster {
    pub secrets: Mutex<HashMap<(String, String), SecretData>>,
    pub read_only: HashSet<String>,
    pub timed_out: HashSet<String>,
    pub unreachable: bool,
    pub hang_probe: bool,
}

impl MemoryCluster {
    pub async fn seed(&self, namespace: &str, name: &str, data: &[(&str, &str)]) {
        self.secrets.lock().await.insert(
            (namespace.to_string(), name.to_string()),
            data.iter()
                .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
                .collect(),
        );
    }

    pub async fn get(&self, namespace: &str, name: &str) -> Option<SecretData> {
        self.secrets
            .lock()
            .await
            .get(&(namespace.to_string(), name.to_string()))
            .cloned()
    }

    pub fn with_read_only(mut self, name: &str) -> Self {
        self.read_only.insert(name.to_string());
        self
    }

    pub fn with_timed_out(mut self, name: &str) -> Self {
        self.timed_out.insert(name.to_string());
        self
    }

    pub fn unreachable(mut self) -> Self {
        self.unreachable = true;
        self
    }

    pub fn hanging(mut self) -> Self {
        self.hang_probe = true;
        self
    }

    fn check_responsive(&self, namespace: &str, name: &str) -> Result<(), TargetWriteError> {
        if self.timed_out.contains(name) {
            return Err(TargetWriteError::Timeout {
                namespace: namespace.to_string(),
                name: name.to_string(),
            });
        }
        Ok(())
    }

    fn check_writable(&self, namespace: &str, name: &str) -> Result<(), TargetWriteError> {
        self.check_responsive(namespace, name)?;
        if self.read_only.contains(name) {
            return Err(TargetWriteError::Patch {
                namespace: namespace.to_string(),
                name: name.to_string(),
                reason: "secrets is forbidden".to_string(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl TargetClusterApi for MemoryCluster {
    async fn get_secret(
        &self,
        namespace: &str,
        name: &str,
    ) -> Result<Option<SecretData>, TargetWriteError> {
        self.check_responsive(namespace, name)?;
        Ok(self.get(namespace, name).await)
    }

    async fn create_secret(
        &self,
        namespace: &str,
        name: &str,
        data: SecretData,
    ) -> Result<(), TargetWriteError> {
        self.check_writable(namespace, name)?;
        self.secrets
            .lock()
            .await
            .insert((namespace.to_string(), name.to_string()), data);
        Ok(())
    }

    async fn patch_secret(
        &self,
        namespace: &str,
        name: &str,
        data: SecretData,
    ) -> Result<(), TargetWriteError> {
        self.check_writable(namespace, name)?;
        self.secrets
            .lock()
            .await
            .insert((namespace.to_string(), name.to_string()), data);
        Ok(())
    }

    async fn list_namespaces(&self, _timeout: Duration) -> anyhow::Result<()> {
        if self.hang_probe {
            tokio::time::sleep(Duration::from_secs(3600)).await;
        }
        if self.unreachable {
            anyhow::bail!("the server has asked for the client to provide credentials");
        }
        Ok(())
    }
}

/// Service configuration with required variables set and the given extras
pub fn test_config(extra: &[(&str, &str)]) -> ServiceConfig {
    let mut vars: HashMap<String, String> = [
        ("VAULT_ADDRESS", "http://vault.test:8200"),
        ("VAULT_ROLE_ID", "role-id"),
        ("VAULT_SECRET_ID", "secret-id"),
        ("HEALTH_TIMEOUT", "1"),
    ]
    .iter()
    .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
    .collect();
    for (k, v) in extra {
        vars.insert((*k).to_string(), (*v).to_string());
    }
    ServiceConfig::from_lookup(|key| vars.get(key).cloned()).expect("valid test config")
}

/// Engine and probe over the in-memory backends
pub fn components(
    config: &ServiceConfig,
    store: &Arc<MemoryStore>,
    cluster: &Arc<MemoryCluster>,
) -> Components {
    assemble(
        config,
        Arc::clone(store) as Arc<dyn SecretStoreBackend>,
        Arc::clone(cluster) as Arc<dyn TargetClusterApi>,
    )
}

pub fn mapping(path: &str, key: &str, secret: &str, target_key: &str) -> SecretMapping {
    SecretMapping::new(path, key, secret, target_key)
}
