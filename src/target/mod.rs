//! # Target Cluster
//!
//! Capability interface for namespace-scoped Secret objects in the destination
//! cluster, the `kube` implementation, and the upsert writer built on top of it.

pub mod kubernetes;
pub mod writer;

use crate::error::TargetWriteError;
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::time::Duration;

pub use kubernetes::KubeSecretApi;
pub use writer::{TargetSecretWriter, UpsertOutcome};

/// Secret `data` in wire form: key to base64-encoded value
pub type SecretData = BTreeMap<String, String>;

/// Cluster API capability used by [`TargetSecretWriter`] and the health probe
#[async_trait]
pub trait TargetClusterApi: Send + Sync {
    /// Read the `data` of a Secret; `Ok(None)` when the object does not exist
    async fn get_secret(
        &self,
        namespace: &str,
        name: &str,
    ) -> Result<Option<SecretData>, TargetWriteError>;

    async fn create_secret(
        &self,
        namespace: &str,
        name: &str,
        data: SecretData,
    ) -> Result<(), TargetWriteError>;

    /// Replace the Secret's `data` with the full merged map
    async fn patch_secret(
        &self,
        namespace: &str,
        name: &str,
        data: SecretData,
    ) -> Result<(), TargetWriteError>;

    /// Reachability check bounded by `timeout`
    async fn list_namespaces(&self, timeout: Duration) -> anyhow::Result<()>;
}
