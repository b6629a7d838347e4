//! # Sync Engine
//!
//! Runs one mapping set against one namespace:
//!
//! 1. Obtain a credential; failure aborts the run with no partial result.
//! 2. For each mapping in order: fetch the store path, pick the key, upsert it
//!    into the target Secret.
//! 3. A missing key skips the mapping; a fetch or write error fails it. Neither
//!    stops the remaining mappings.
//!
//! Mappings run sequentially. Writes are not rolled back if a later mapping fails.

use crate::error::SyncError;
use crate::mapping::SecretMapping;
use crate::observability::metrics;
use crate::store::{Credential, SecretStoreBackend, TokenProvider};
use crate::sync::report::{MappingOutcome, MappingResult, SyncReport};
use crate::target::TargetSecretWriter;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug_span, error, info, info_span, warn, Instrument};

pub struct SyncEngine {
    tokens: Arc<TokenProvider>,
    store: Arc<dyn SecretStoreBackend>,
    writer: TargetSecretWriter,
    invalidate_on_forbidden: bool,
}

impl std::fmt::Debug for SyncEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SyncEngine")
            .field("invalidate_on_forbidden", &self.invalidate_on_forbidden)
            .finish_non_exhaustive()
    }
}

impl SyncEngine {
    pub fn new(
        tokens: Arc<TokenProvider>,
        store: Arc<dyn SecretStoreBackend>,
        writer: TargetSecretWriter,
    ) -> Self {
        Self {
            tokens,
            store,
            writer,
            invalidate_on_forbidden: true,
        }
    }

    /// Drop the cached token when a read is denied (default: on)
    #[must_use]
    pub fn with_invalidate_on_forbidden(mut self, enabled: bool) -> Self {
        self.invalidate_on_forbidden = enabled;
        self
    }

    pub fn tokens(&self) -> &Arc<TokenProvider> {
        &self.tokens
    }

    /// Sync `mappings` into `namespace`
    ///
    /// # Errors
    /// Returns [`SyncError::Authentication`] if no credential can be obtained.
    /// Per-mapping failures are reported in the [`SyncReport`], never as an error.
    pub async fn run(
        &self,
        namespace: &str,
        mappings: &[SecretMapping],
    ) -> Result<SyncReport, SyncError> {
        let run_id = uuid::Uuid::new_v4().to_string();
        let span = info_span!(
            "sync.run",
            run_id = %run_id,
            namespace = namespace,
            mappings = mappings.len()
        );

        async move {
            let start = Instant::now();
            metrics::increment_sync_runs();

            let credential = match self.tokens.credential().await {
                Ok(credential) => credential,
                Err(e) => {
                    metrics::increment_sync_run_errors();
                    metrics::observe_sync_run_duration(start.elapsed().as_secs_f64());
                    error!("Sync run aborted: {}", e);
                    return Err(SyncError::Authentication(e));
                }
            };

            let mut results = Vec::with_capacity(mappings.len());
            let mut token_invalidated = false;

            for mapping in mappings {
                let outcome = self
                    .sync_mapping(&credential, namespace, mapping)
                    .instrument(debug_span!("sync.mapping", mapping = %mapping))
                    .await;
                metrics::record_mapping_outcome(outcome.label());

                if self.invalidate_on_forbidden
                    && !token_invalidated
                    && matches!(outcome, MappingOutcome::Failed { kind: "authorization", .. })
                {
                    self.tokens.invalidate().await;
                    token_invalidated = true;
                }

                results.push(MappingResult {
                    mapping: mapping.clone(),
                    outcome,
                });
            }

            let report = SyncReport {
                run_id,
                namespace: namespace.to_string(),
                results,
            };
            metrics::observe_sync_run_duration(start.elapsed().as_secs_f64());
            info!(
                synced = report.count("synced"),
                skipped = report.count("skipped"),
                failed = report.count("failed"),
                "Sync run complete"
            );
            Ok(report)
        }
        .instrument(span)
        .await
    }

    async fn sync_mapping(
        &self,
        credential: &Credential,
        namespace: &str,
        mapping: &SecretMapping,
    ) -> MappingOutcome {
        let values = match self.store.read_secret(credential, &mapping.store_path).await {
            Ok(values) => values,
            Err(e) => {
                error!("Failed to sync {}: {}", mapping, e);
                return MappingOutcome::Failed {
                    kind: e.kind(),
                    reason: e.to_string(),
                };
            }
        };

        let Some(value) = values.get(&mapping.store_key) else {
            warn!(
                "Key '{}' not found in Vault path '{}'",
                mapping.store_key, mapping.store_path
            );
            return MappingOutcome::Skipped {
                reason: format!(
                    "key '{}' not found at '{}'",
                    mapping.store_key, mapping.store_path
                ),
            };
        };

        match self
            .writer
            .upsert(namespace, &mapping.target_secret, &mapping.target_key, value)
            .await
        {
            Ok(action) => MappingOutcome::Synced(action),
            Err(e) => {
                error!("Failed to sync {}: {}", mapping, e);
                MappingOutcome::Failed {
                    kind: "target",
                    reason: e.to_string(),
                }
            }
        }
    }
}
