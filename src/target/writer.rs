//! # Target Secret Writer
//!
//! Idempotent single-key upsert into a target Secret.
//!
//! Values are base64-encoded here and nowhere else. Keys already present in the
//! Secret are carried through in their stored form, so an update never touches
//! bytes it did not write.

use crate::error::TargetWriteError;
use crate::observability::metrics;
use crate::target::{SecretData, TargetClusterApi};
use base64::{engine::general_purpose, Engine as _};
use std::sync::Arc;
use tracing::{debug, info};

/// What an upsert did to the target Secret
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    Created,
    Updated,
}

pub struct TargetSecretWriter {
    api: Arc<dyn TargetClusterApi>,
}

impl std::fmt::Debug for TargetSecretWriter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TargetSecretWriter").finish_non_exhaustive()
    }
}

impl TargetSecretWriter {
    pub fn new(api: Arc<dyn TargetClusterApi>) -> Self {
        Self { api }
    }

    /// Write `key = value` into Secret `namespace/name`, creating the Secret if absent
    ///
    /// # Errors
    /// Returns [`TargetWriteError`] if the lookup, create or patch fails
    pub async fn upsert(
        &self,
        namespace: &str,
        name: &str,
        key: &str,
        value: &str,
    ) -> Result<UpsertOutcome, TargetWriteError> {
        let encoded = general_purpose::STANDARD.encode(value.as_bytes());

        match self.api.get_secret(namespace, name).await? {
            Some(mut data) => {
                data.insert(key.to_string(), encoded);
                self.api.patch_secret(namespace, name, data).await?;
                metrics::record_target_write("patch");
                info!("Updated secret {}/{} key {}", namespace, name, key);
                Ok(UpsertOutcome::Updated)
            }
            None => {
                debug!("Secret {}/{} not found, creating", namespace, name);
                let data = SecretData::from([(key.to_string(), encoded)]);
                self.api.create_secret(namespace, name, data).await?;
                metrics::record_target_write("create");
                info!("Created secret {}/{} with key {}", namespace, name, key);
                Ok(UpsertOutcome::Created)
            }
        }
    }
}
