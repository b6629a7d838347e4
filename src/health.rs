//! # Health Probe
//!
//! Independent reachability checks of Vault and the cluster API.
//!
//! Each check runs with the short health timeout. Any error or timeout counts as
//! unreachable; [`HealthProbe::check`] itself never fails.

use crate::observability::metrics;
use crate::store::SecretStoreBackend;
use crate::target::TargetClusterApi;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Degraded,
}

impl HealthStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            HealthStatus::Healthy => "healthy",
            HealthStatus::Degraded => "degraded",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HealthReport {
    pub store_reachable: bool,
    pub target_reachable: bool,
}

impl HealthReport {
    /// Healthy only when both backends are reachable
    pub fn status(&self) -> HealthStatus {
        if self.store_reachable && self.target_reachable {
            HealthStatus::Healthy
        } else {
            HealthStatus::Degraded
        }
    }
}

pub struct HealthProbe {
    store: Arc<dyn SecretStoreBackend>,
    target: Arc<dyn TargetClusterApi>,
    timeout: Duration,
}

impl std::fmt::Debug for HealthProbe {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HealthProbe")
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

impl HealthProbe {
    pub fn new(
        store: Arc<dyn SecretStoreBackend>,
        target: Arc<dyn TargetClusterApi>,
        timeout: Duration,
    ) -> Self {
        Self {
            store,
            target,
            timeout,
        }
    }

    pub async fn check(&self) -> HealthReport {
        let (store, target) = tokio::join!(self.check_store(), self.check_target());
        metrics::set_backend_reachable("vault", store);
        metrics::set_backend_reachable("openshift", target);
        HealthReport {
            store_reachable: store,
            target_reachable: target,
        }
    }

    async fn check_store(&self) -> bool {
        // Outer bound in case a backend ignores its own timeout
        match tokio::time::timeout(self.timeout, self.store.probe(self.timeout)).await {
            Ok(Ok(())) => true,
            Ok(Err(e)) => {
                warn!("Vault health check failed: {}", e);
                false
            }
            Err(_) => {
                warn!("Vault health check timed out after {:?}", self.timeout);
                false
            }
        }
    }

    async fn check_target(&self) -> bool {
        match tokio::time::timeout(self.timeout, self.target.list_namespaces(self.timeout)).await {
            Ok(Ok(())) => true,
            Ok(Err(e)) => {
                warn!("OpenShift health check failed: {}", e);
                false
            }
            Err(_) => {
                warn!("OpenShift health check timed out after {:?}", self.timeout);
                false
            }
        }
    }
}
