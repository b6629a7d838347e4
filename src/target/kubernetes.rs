//! # Kubernetes Secret API
//!
//! [`TargetClusterApi`] backed by `kube`. Works against any Kubernetes-compatible
//! API server, OpenShift included.

use crate::error::TargetWriteError;
use crate::target::{SecretData, TargetClusterApi};
use anyhow::Context;
use async_trait::async_trait;
use base64::{engine::general_purpose, Engine as _};
use k8s_openapi::api::core::v1::{Namespace, Secret};
use kube::{
    api::{Api, ListParams, Patch, PatchParams, PostParams},
    Client,
};
use std::future::Future;
use std::time::Duration;
use tracing::{debug, info_span, Instrument};

const FIELD_MANAGER: &str = "vault-secret-sync";

/// Secret reads and writes through the cluster API
#[derive(Clone)]
pub struct KubeSecretApi {
    client: Client,
    timeout: Duration,
}

impl std::fmt::Debug for KubeSecretApi {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KubeSecretApi")
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

impl KubeSecretApi {
    /// Wrap an existing client; every call is bounded by `timeout`
    pub fn new(client: Client, timeout: Duration) -> Self {
        Self { client, timeout }
    }

    /// Connect using in-cluster config, falling back to the local kubeconfig
    ///
    /// # Errors
    /// Returns an error if no usable cluster configuration is found
    pub async fn try_default(timeout: Duration) -> anyhow::Result<Self> {
        let client = Client::try_default()
            .await
            .context("Failed to create Kubernetes client")?;
        Ok(Self::new(client, timeout))
    }

    fn secrets(&self, namespace: &str) -> Api<Secret> {
        Api::namespaced(self.client.clone(), namespace)
    }

    async fn bounded<T, F>(
        &self,
        namespace: &str,
        name: &str,
        call: F,
    ) -> Result<kube::Result<T>, TargetWriteError>
    where
        F: Future<Output = kube::Result<T>>,
    {
        tokio::time::timeout(self.timeout, call)
            .await
            .map_err(|_elapsed| TargetWriteError::Timeout {
                namespace: namespace.to_string(),
                name: name.to_string(),
            })
    }
}

/// Secret data as base64 text, the form the API server returns it in
fn to_wire(secret: Secret) -> SecretData {
    secret
        .data
        .unwrap_or_default()
        .into_iter()
        .map(|(key, bytes)| (key, general_purpose::STANDARD.encode(bytes.0)))
        .collect()
}

fn new_secret(namespace: &str, name: &str, data: SecretData) -> Result<Secret, serde_json::Error> {
    serde_json::from_value(serde_json::json!({
        "apiVersion": "v1",
        "kind": "Secret",
        "type": "Opaque",
        "metadata": {
            "name": name,
            "namespace": namespace,
        },
        "data": data,
    }))
}

#[async_trait]
impl TargetClusterApi for KubeSecretApi {
    async fn get_secret(
        &self,
        namespace: &str,
        name: &str,
    ) -> Result<Option<SecretData>, TargetWriteError> {
        let api = self.secrets(namespace);
        let secret = self
            .bounded(namespace, name, api.get_opt(name))
            .instrument(info_span!("k8s.secret.get", secret.namespace = namespace, secret.name = name))
            .await?
            .map_err(|e| TargetWriteError::Lookup {
                namespace: namespace.to_string(),
                name: name.to_string(),
                reason: e.to_string(),
            })?;

        Ok(secret.map(to_wire))
    }

    async fn create_secret(
        &self,
        namespace: &str,
        name: &str,
        data: SecretData,
    ) -> Result<(), TargetWriteError> {
        let create_error = |reason: String| TargetWriteError::Create {
            namespace: namespace.to_string(),
            name: name.to_string(),
            reason,
        };

        let secret = new_secret(namespace, name, data).map_err(|e| create_error(e.to_string()))?;
        let api = self.secrets(namespace);
        let params = PostParams {
            field_manager: Some(FIELD_MANAGER.to_string()),
            ..PostParams::default()
        };

        self.bounded(namespace, name, api.create(&params, &secret))
            .instrument(info_span!("k8s.secret.create", secret.namespace = namespace, secret.name = name))
            .await?
            .map_err(|e| create_error(e.to_string()))?;

        debug!("Created secret {}/{}", namespace, name);
        Ok(())
    }

    async fn patch_secret(
        &self,
        namespace: &str,
        name: &str,
        data: SecretData,
    ) -> Result<(), TargetWriteError> {
        let api = self.secrets(namespace);
        let patch = serde_json::json!({ "data": data });
        let params = PatchParams {
            field_manager: Some(FIELD_MANAGER.to_string()),
            ..PatchParams::default()
        };

        self.bounded(namespace, name, api.patch(name, &params, &Patch::Merge(&patch)))
            .instrument(info_span!("k8s.secret.patch", secret.namespace = namespace, secret.name = name))
            .await?
            .map_err(|e| TargetWriteError::Patch {
                namespace: namespace.to_string(),
                name: name.to_string(),
                reason: e.to_string(),
            })?;

        debug!("Patched secret {}/{}", namespace, name);
        Ok(())
    }

    async fn list_namespaces(&self, timeout: Duration) -> anyhow::Result<()> {
        let api: Api<Namespace> = Api::all(self.client.clone());
        tokio::time::timeout(timeout, api.list(&ListParams::default().limit(1)))
            .await
            .context("Namespace list timed out")?
            .context("Failed to list namespaces")?;
        Ok(())
    }
}
