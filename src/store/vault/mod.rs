//! Vault KV v2 REST Client
//!
//! Native REST implementation of [`SecretStoreBackend`](crate::store::SecretStoreBackend)
//! for HashiCorp Vault, using reqwest with rustls.
//!
//! - Login: `POST /v1/auth/approle/login`
//! - Read: `GET /v1/{mount}/data/{path}` with the `X-Vault-Token` header
//! - Probe: `GET /v1/sys/health`
//!
//! References:
//! - [Vault AppRole auth API](https://developer.hashicorp.com/vault/api-docs/auth/approle)
//! - [Vault KV v2 API](https://developer.hashicorp.com/vault/api-docs/secret/kv/kv-v2)

mod operations;
mod requests;
mod responses;

pub use requests::*;
pub use responses::*;

use crate::constants::VAULT_TOKEN_HEADER;
use crate::store::Credential;
use anyhow::{Context, Result};
use reqwest::{Client, RequestBuilder};
use std::time::Duration;
use tracing::info;

/// Vault REST client
pub struct VaultClient {
    http_client: Client,
    base_url: String,
    mount_path: String,
}

impl std::fmt::Debug for VaultClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VaultClient")
            .field("base_url", &self.base_url)
            .field("mount_path", &self.mount_path)
            .finish_non_exhaustive()
    }
}

impl VaultClient {
    /// Create a client for the Vault server at `base_url`
    ///
    /// Every request is bounded by `timeout`.
    ///
    /// # Errors
    /// Returns an error if the HTTP client cannot be built
    pub fn new(base_url: &str, mount_path: &str, timeout: Duration) -> Result<Self> {
        let http_client = Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to create HTTP client")?;

        let base_url = base_url.trim_end_matches('/').to_string();
        let mount_path = mount_path.trim_matches('/').to_string();
        info!(
            "Initializing Vault REST client for {} (mount: {})",
            base_url, mount_path
        );

        Ok(Self {
            http_client,
            base_url,
            mount_path,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn mount_path(&self) -> &str {
        &self.mount_path
    }

    pub(crate) fn login_url(&self) -> String {
        format!("{}/v1/auth/approle/login", self.base_url)
    }

    /// KV v2 data URL; leading slashes in `path` are ignored
    pub(crate) fn data_url(&self, path: &str) -> String {
        format!(
            "{}/v1/{}/data/{}",
            self.base_url,
            self.mount_path,
            path.trim_start_matches('/')
        )
    }

    pub(crate) fn health_url(&self) -> String {
        format!("{}/v1/sys/health", self.base_url)
    }

    /// Authenticated GET
    pub(crate) fn authorized_get(&self, url: &str, credential: &Credential) -> RequestBuilder {
        self.http_client
            .get(url)
            .header(VAULT_TOKEN_HEADER, credential.expose())
    }
}

/// Extract the first message from a Vault error body, falling back to the raw text
pub(crate) fn error_message(body: &str) -> String {
    serde_json::from_str::<VaultErrorResponse>(body)
        .ok()
        .and_then(|e| e.errors.into_iter().next())
        .unwrap_or_else(|| body.trim().to_string())
}
