//! # Store Operations
//!
//! Implementation of [`SecretStoreBackend`] for the Vault REST API.

use super::responses::{KvReadResponse, LoginResponse};
use super::{error_message, AppRoleLoginRequest, VaultClient};
use crate::constants::VAULT_REACHABLE_STATUS_CODES;
use crate::error::{AuthenticationError, StoreError};
use crate::observability::metrics;
use crate::store::{Credential, SecretStoreBackend, SecretValues};
use async_trait::async_trait;
use reqwest::StatusCode;
use std::time::{Duration, Instant};
use tracing::{debug, info_span, warn, Instrument};

#[async_trait]
impl SecretStoreBackend for VaultClient {
    async fn authenticate(
        &self,
        role_id: &str,
        role_secret: &str,
    ) -> Result<Credential, AuthenticationError> {
        let span = info_span!("vault.auth.approle_login", vault.address = self.base_url());

        async move {
            let start = Instant::now();
            let body = AppRoleLoginRequest {
                role_id,
                secret_id: role_secret,
            };

            let response = self
                .http_client
                .post(self.login_url())
                .json(&body)
                .send()
                .await
                .map_err(|e| {
                    metrics::increment_store_operation_errors("login");
                    AuthenticationError::Transport(e)
                })?;

            let status = response.status();
            if !status.is_success() {
                metrics::increment_store_operation_errors("login");
                let text = response.text().await.unwrap_or_default();
                return Err(AuthenticationError::Rejected {
                    status: status.as_u16(),
                    body: error_message(&text),
                });
            }

            let login: LoginResponse = response.json().await.map_err(|e| {
                metrics::increment_store_operation_errors("login");
                AuthenticationError::MalformedResponse(e.to_string())
            })?;

            let auth = login
                .auth
                .filter(|a| !a.client_token.is_empty())
                .ok_or_else(|| {
                    metrics::increment_store_operation_errors("login");
                    AuthenticationError::MalformedResponse(
                        "response has no auth.client_token".to_string(),
                    )
                })?;

            metrics::record_store_operation("login", start.elapsed().as_secs_f64());
            debug!(
                lease_duration = auth.lease_duration,
                renewable = auth.renewable,
                "AppRole login succeeded"
            );
            Ok(Credential::new(auth.client_token))
        }
        .instrument(span)
        .await
    }

    async fn read_secret(
        &self,
        credential: &Credential,
        path: &str,
    ) -> Result<SecretValues, StoreError> {
        let span = info_span!("vault.secret.read", secret.path = path);

        async move {
            let start = Instant::now();
            let result = self.read_secret_inner(credential, path).await;
            match &result {
                Ok(values) => {
                    metrics::record_store_operation("read", start.elapsed().as_secs_f64());
                    debug!("Read {} keys from Vault path {}", values.len(), path);
                }
                Err(e) => {
                    metrics::increment_store_operation_errors("read");
                    debug!("Vault read for {} failed: {}", path, e);
                }
            }
            result
        }
        .instrument(span)
        .await
    }

    async fn probe(&self, timeout: Duration) -> anyhow::Result<()> {
        let start = Instant::now();
        let response = self
            .http_client
            .get(self.health_url())
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| {
                metrics::increment_store_operation_errors("health");
                anyhow::anyhow!("Vault health request failed: {e}")
            })?;

        let status = response.status().as_u16();
        if VAULT_REACHABLE_STATUS_CODES.contains(&status) {
            metrics::record_store_operation("health", start.elapsed().as_secs_f64());
            Ok(())
        } else {
            metrics::increment_store_operation_errors("health");
            warn!("Vault health check returned status {}", status);
            Err(anyhow::anyhow!("Vault health returned status {status}"))
        }
    }
}

impl VaultClient {
    async fn read_secret_inner(
        &self,
        credential: &Credential,
        path: &str,
    ) -> Result<SecretValues, StoreError> {
        let response = self
            .authorized_get(&self.data_url(path), credential)
            .send()
            .await
            .map_err(|source| StoreError::Transport {
                path: path.to_string(),
                source,
            })?;

        let status = response.status();
        match status {
            StatusCode::NOT_FOUND => {
                return Err(StoreError::NotFound {
                    path: path.to_string(),
                })
            }
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                return Err(StoreError::Authorization {
                    path: path.to_string(),
                })
            }
            s if !s.is_success() => {
                let text = response.text().await.unwrap_or_default();
                return Err(StoreError::Unexpected {
                    path: path.to_string(),
                    status: s.as_u16(),
                    body: error_message(&text),
                });
            }
            _ => {}
        }

        let body: KvReadResponse = response.json().await.map_err(|e| StoreError::Malformed {
            path: path.to_string(),
            reason: e.to_string(),
        })?;

        // Deleted or destroyed latest version
        let Some(data) = body.data.data else {
            return Err(StoreError::NotFound {
                path: path.to_string(),
            });
        };

        Ok(data
            .into_iter()
            .map(|(key, value)| (key, render_value(value)))
            .collect())
    }
}

/// Strings pass through unchanged; any other JSON value becomes its compact JSON text
fn render_value(value: serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s,
        other => other.to_string(),
    }
}
